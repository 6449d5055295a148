//! Tool registry for conversations.
//!
//! The selectable tool set is closed by design: exactly four capabilities,
//! dispatched through [`ToolIdentity`] rather than open-ended polymorphism.
//! The registry builds the backend-specific request fragment for each
//! identity and resolves response artifacts back to a canonical identity for
//! citation rendering.

use crate::error::ToolError;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeSet;
use std::fmt;

/// A selectable backend capability.
///
/// Variant order is the stable display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolIdentity {
    /// Search the web in real time.
    WebSearch,
    /// Search X posts and threads.
    XSearch,
    /// Run code in a sandbox.
    CodeExecution,
    /// Search configured private collections.
    CollectionsSearch,
}

impl ToolIdentity {
    /// All identities in stable display order.
    pub const ALL: [Self; 4] = [
        Self::WebSearch,
        Self::XSearch,
        Self::CodeExecution,
        Self::CollectionsSearch,
    ];

    /// The snake_case wire name used in backend requests and artifacts.
    #[must_use]
    pub const fn wire_name(&self) -> &'static str {
        match self {
            Self::WebSearch => "web_search",
            Self::XSearch => "x_search",
            Self::CodeExecution => "code_execution",
            Self::CollectionsSearch => "collections_search",
        }
    }

    /// Human-readable label for menus.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::WebSearch => "Web Search",
            Self::XSearch => "X Search",
            Self::CodeExecution => "Code Execution",
            Self::CollectionsSearch => "Collections Search",
        }
    }

    /// One-line description for menus.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::WebSearch => "Search the web in real time.",
            Self::XSearch => "Search X posts and threads.",
            Self::CodeExecution => "Run Python code in a sandbox.",
            Self::CollectionsSearch => "Search configured collections.",
        }
    }

    /// Parses a wire name back to an identity.
    #[must_use]
    pub fn from_wire_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.wire_name() == name)
    }
}

impl fmt::Display for ToolIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

/// A built tool: canonical identity plus the backend request fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Canonical identity, kept for resolving artifacts later.
    pub identity: ToolIdentity,
    /// Backend-specific request fragment.
    pub fragment: JsonValue,
}

/// Registry of the selectable tools.
///
/// Collections search is gated on process-wide configuration: it can only be
/// built when at least one collection ID is configured.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    collection_ids: Vec<String>,
}

impl ToolRegistry {
    /// Creates a registry with the configured collection IDs.
    #[must_use]
    pub fn new(collection_ids: Vec<String>) -> Self {
        Self { collection_ids }
    }

    /// Creates a registry with no collections configured.
    #[must_use]
    pub fn without_collections() -> Self {
        Self::default()
    }

    /// Returns true if collections search can be activated.
    #[must_use]
    pub fn has_collections(&self) -> bool {
        !self.collection_ids.is_empty()
    }

    /// Returns the configured collection IDs.
    #[must_use]
    pub fn collection_ids(&self) -> &[String] {
        &self.collection_ids
    }

    /// Builds the request fragment for one identity.
    pub fn build(&self, identity: ToolIdentity) -> Result<ToolSpec, ToolError> {
        let fragment = match identity {
            ToolIdentity::WebSearch
            | ToolIdentity::XSearch
            | ToolIdentity::CodeExecution => {
                serde_json::json!({ "type": identity.wire_name() })
            }
            ToolIdentity::CollectionsSearch => {
                if self.collection_ids.is_empty() {
                    return Err(ToolError::CollectionsNotConfigured);
                }
                serde_json::json!({
                    "type": identity.wire_name(),
                    "collection_ids": self.collection_ids,
                })
            }
        };

        Ok(ToolSpec { identity, fragment })
    }

    /// Builds fragments for a whole set, in stable display order.
    ///
    /// All-or-nothing: the first guard failure aborts the build.
    pub fn build_set(
        &self,
        identities: &BTreeSet<ToolIdentity>,
    ) -> Result<Vec<ToolSpec>, ToolError> {
        identities.iter().map(|id| self.build(*id)).collect()
    }

    /// Builds just the request fragments for a set.
    pub fn fragments_for(
        &self,
        identities: &BTreeSet<ToolIdentity>,
    ) -> Result<Vec<JsonValue>, ToolError> {
        Ok(self
            .build_set(identities)?
            .into_iter()
            .map(|spec| spec.fragment)
            .collect())
    }

    /// Resolves a response artifact name back to a canonical identity.
    ///
    /// Unknown artifacts resolve to `None`; callers degrade to generic
    /// rendering rather than failing.
    #[must_use]
    pub fn resolve_identity(&self, artifact: &str) -> Option<ToolIdentity> {
        ToolIdentity::from_wire_name(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_roundtrip() {
        for identity in ToolIdentity::ALL {
            assert_eq!(
                ToolIdentity::from_wire_name(identity.wire_name()),
                Some(identity)
            );
        }
    }

    #[test]
    fn display_order_is_stable() {
        let set: BTreeSet<ToolIdentity> = [
            ToolIdentity::CollectionsSearch,
            ToolIdentity::WebSearch,
            ToolIdentity::CodeExecution,
        ]
        .into_iter()
        .collect();

        let ordered: Vec<ToolIdentity> = set.into_iter().collect();
        assert_eq!(
            ordered,
            vec![
                ToolIdentity::WebSearch,
                ToolIdentity::CodeExecution,
                ToolIdentity::CollectionsSearch,
            ]
        );
    }

    #[test]
    fn build_simple_tool() {
        let registry = ToolRegistry::without_collections();
        let spec = registry.build(ToolIdentity::WebSearch).expect("should build");
        assert_eq!(spec.identity, ToolIdentity::WebSearch);
        assert_eq!(spec.fragment["type"], "web_search");
    }

    #[test]
    fn collections_search_requires_configuration() {
        let registry = ToolRegistry::without_collections();
        let result = registry.build(ToolIdentity::CollectionsSearch);
        assert_eq!(result, Err(ToolError::CollectionsNotConfigured));
    }

    #[test]
    fn collections_search_with_configuration() {
        let registry = ToolRegistry::new(vec!["docs".to_string(), "wiki".to_string()]);
        let spec = registry
            .build(ToolIdentity::CollectionsSearch)
            .expect("should build");
        assert_eq!(spec.fragment["type"], "collections_search");
        assert_eq!(spec.fragment["collection_ids"][0], "docs");
        assert_eq!(spec.fragment["collection_ids"][1], "wiki");
    }

    #[test]
    fn build_set_is_all_or_nothing() {
        let registry = ToolRegistry::without_collections();
        let set: BTreeSet<ToolIdentity> =
            [ToolIdentity::WebSearch, ToolIdentity::CollectionsSearch]
                .into_iter()
                .collect();

        assert_eq!(
            registry.build_set(&set),
            Err(ToolError::CollectionsNotConfigured)
        );
    }

    #[test]
    fn resolve_unknown_artifact_degrades() {
        let registry = ToolRegistry::without_collections();
        assert_eq!(registry.resolve_identity("mystery_tool"), None);
        assert_eq!(
            registry.resolve_identity("x_search"),
            Some(ToolIdentity::XSearch)
        );
    }
}
