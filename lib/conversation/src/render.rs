//! Response rendering policy.
//!
//! Shapes a backend completion into gateway-postable segments: the response
//! body is capped and chunked to the gateway's message limits, the reasoning
//! trace is capped for a collapsible aside, and citations become a short
//! source list. All length arithmetic is in characters, cut on character
//! boundaries, so multi-byte text never splits mid-scalar.

use crate::tool::ToolRegistry;
use palaver_backend::TurnOutput;
use serde::{Deserialize, Serialize};

/// Hard cap on rendered response characters.
pub const RESPONSE_CHAR_CAP: usize = 20_000;

/// Where an over-cap response is cut, leaving room for the notice.
pub const RESPONSE_CUT_AT: usize = 19_500;

/// Appended to a cut response.
pub const RESPONSE_TRUNCATION_NOTICE: &str = "\n\n... [Response truncated due to length]";

/// Hard cap on rendered reasoning characters.
pub const REASONING_CHAR_CAP: usize = 3_500;

/// Where an over-cap reasoning trace is cut.
pub const REASONING_CUT_AT: usize = 3_450;

/// Appended to a cut reasoning trace.
pub const REASONING_TRUNCATION_NOTICE: &str = "\n\n... [reasoning truncated]";

/// Maximum characters per posted message chunk.
pub const CHUNK_CHAR_SIZE: usize = 3_500;

/// Maximum citation lines rendered under a response.
pub const MAX_CITATION_LINES: usize = 8;

/// Caps text at `cap` characters, cutting at `cut_at` and appending the
/// notice when over. Under-cap text is returned unchanged.
#[must_use]
pub fn truncate_text(text: &str, cap: usize, cut_at: usize, notice: &str) -> String {
    if text.chars().count() <= cap {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(cut_at).collect();
    cut.push_str(notice);
    cut
}

/// Splits text into chunks of at most `size` characters.
///
/// Empty input produces no chunks.
#[must_use]
pub fn chunk_text(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// A completion shaped for posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedResponse {
    /// Response body, capped and split into postable chunks in order.
    pub chunks: Vec<String>,
    /// Capped reasoning trace, when the model produced one.
    pub reasoning: Option<String>,
    /// Citation lines, at most [`MAX_CITATION_LINES`].
    pub citation_lines: Vec<String>,
}

impl RenderedResponse {
    /// Returns true if there is nothing to post.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty() && self.reasoning.is_none() && self.citation_lines.is_empty()
    }
}

/// Shapes one completion for posting.
#[must_use]
pub fn render_output(output: &TurnOutput, registry: &ToolRegistry) -> RenderedResponse {
    let body = truncate_text(
        &output.text,
        RESPONSE_CHAR_CAP,
        RESPONSE_CUT_AT,
        RESPONSE_TRUNCATION_NOTICE,
    );
    let chunks = chunk_text(&body, CHUNK_CHAR_SIZE);

    let reasoning = output.reasoning.as_deref().map(|trace| {
        truncate_text(
            trace,
            REASONING_CHAR_CAP,
            REASONING_CUT_AT,
            REASONING_TRUNCATION_NOTICE,
        )
    });

    let citation_lines = output
        .citations
        .iter()
        .take(MAX_CITATION_LINES)
        .map(|citation| {
            // Web links are pasted bare so the gateway renders them as
            // links; anything else goes in code text so internal schemes
            // are not mangled into dead links.
            let source = if citation.is_web_link() {
                citation.source.clone()
            } else {
                format!("`{}`", citation.source)
            };
            let label = citation
                .tool_artifact
                .as_deref()
                .and_then(|artifact| registry.resolve_identity(artifact));
            match label {
                Some(identity) => format!("- {}: {}", identity.label(), source),
                None => format!("- {source}"),
            }
        })
        .collect();

    RenderedResponse {
        chunks,
        reasoning,
        citation_lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palaver_backend::Citation;

    #[test]
    fn short_text_passes_through() {
        let text = "a short answer";
        assert_eq!(
            truncate_text(text, RESPONSE_CHAR_CAP, RESPONSE_CUT_AT, RESPONSE_TRUNCATION_NOTICE),
            text
        );
    }

    #[test]
    fn over_cap_text_is_cut_with_notice() {
        let text = "x".repeat(RESPONSE_CHAR_CAP + 1);
        let cut = truncate_text(
            &text,
            RESPONSE_CHAR_CAP,
            RESPONSE_CUT_AT,
            RESPONSE_TRUNCATION_NOTICE,
        );
        assert!(cut.ends_with(RESPONSE_TRUNCATION_NOTICE));
        assert_eq!(
            cut.chars().count(),
            RESPONSE_CUT_AT + RESPONSE_TRUNCATION_NOTICE.chars().count()
        );
    }

    #[test]
    fn truncation_notices_use_exact_wording() {
        assert_eq!(
            RESPONSE_TRUNCATION_NOTICE,
            "\n\n... [Response truncated due to length]"
        );
        assert_eq!(REASONING_TRUNCATION_NOTICE, "\n\n... [reasoning truncated]");

        let body = truncate_text(
            &"b".repeat(RESPONSE_CHAR_CAP + 1),
            RESPONSE_CHAR_CAP,
            RESPONSE_CUT_AT,
            RESPONSE_TRUNCATION_NOTICE,
        );
        assert!(body.ends_with("\n\n... [Response truncated due to length]"));
        let trace = truncate_text(
            &"t".repeat(REASONING_CHAR_CAP + 1),
            REASONING_CHAR_CAP,
            REASONING_CUT_AT,
            REASONING_TRUNCATION_NOTICE,
        );
        assert!(trace.ends_with("\n\n... [reasoning truncated]"));
    }

    #[test]
    fn exactly_at_cap_is_not_cut() {
        let text = "y".repeat(RESPONSE_CHAR_CAP);
        let out = truncate_text(
            &text,
            RESPONSE_CHAR_CAP,
            RESPONSE_CUT_AT,
            RESPONSE_TRUNCATION_NOTICE,
        );
        assert_eq!(out, text);
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        // Four bytes per char; byte-indexed slicing would split a scalar.
        let text = "\u{1F980}".repeat(20);
        let cut = truncate_text(&text, 10, 5, "...");
        assert_eq!(cut.chars().count(), 8);
        assert!(cut.starts_with('\u{1F980}'));
    }

    #[test]
    fn chunking_respects_size_and_order() {
        let text = "abcdefghij";
        let chunks = chunk_text(text, 4);
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn chunking_empty_text_yields_nothing() {
        assert!(chunk_text("", CHUNK_CHAR_SIZE).is_empty());
    }

    #[test]
    fn chunking_multibyte_text_keeps_scalars_whole() {
        let text = "\u{00E9}".repeat(7);
        let chunks = chunk_text(&text, 3);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 3);
        assert_eq!(chunks[2].chars().count(), 1);
    }

    #[test]
    fn capped_response_fits_chunk_grid() {
        let output = TurnOutput::text("z".repeat(RESPONSE_CHAR_CAP * 2));
        let rendered = render_output(&output, &ToolRegistry::without_collections());

        let total: usize = rendered.chunks.iter().map(|c| c.chars().count()).sum();
        assert_eq!(
            total,
            RESPONSE_CUT_AT + RESPONSE_TRUNCATION_NOTICE.chars().count()
        );
        assert!(rendered
            .chunks
            .iter()
            .all(|c| c.chars().count() <= CHUNK_CHAR_SIZE));
    }

    #[test]
    fn reasoning_is_capped_separately() {
        let output = TurnOutput {
            text: "short".to_string(),
            reasoning: Some("r".repeat(REASONING_CHAR_CAP + 100)),
            citations: Vec::new(),
        };
        let rendered = render_output(&output, &ToolRegistry::without_collections());

        let reasoning = rendered.reasoning.expect("reasoning present");
        assert!(reasoning.ends_with(REASONING_TRUNCATION_NOTICE));
        assert_eq!(
            reasoning.chars().count(),
            REASONING_CUT_AT + REASONING_TRUNCATION_NOTICE.chars().count()
        );
    }

    #[test]
    fn web_citations_render_as_bare_links() {
        let output = TurnOutput {
            text: "answer".to_string(),
            reasoning: None,
            citations: vec![Citation::new("https://example.com/article")],
        };
        let rendered = render_output(&output, &ToolRegistry::without_collections());
        assert_eq!(rendered.citation_lines, vec!["- https://example.com/article"]);
    }

    #[test]
    fn non_web_citations_render_as_code_text() {
        let output = TurnOutput {
            text: "answer".to_string(),
            reasoning: None,
            citations: vec![Citation::new("collection://docs/handbook#12")],
        };
        let rendered = render_output(&output, &ToolRegistry::without_collections());
        assert_eq!(
            rendered.citation_lines,
            vec!["- `collection://docs/handbook#12`"]
        );
    }

    #[test]
    fn attributed_citations_carry_tool_label() {
        let output = TurnOutput {
            text: "answer".to_string(),
            reasoning: None,
            citations: vec![
                Citation::new("https://x.com/post/1").from_tool("x_search"),
                Citation::new("https://example.com").from_tool("mystery_tool"),
            ],
        };
        let rendered = render_output(&output, &ToolRegistry::without_collections());
        assert_eq!(rendered.citation_lines[0], "- X Search: https://x.com/post/1");
        // Unknown artifacts degrade to an unattributed line.
        assert_eq!(rendered.citation_lines[1], "- https://example.com");
    }

    #[test]
    fn citation_lines_are_capped() {
        let citations: Vec<Citation> = (0..20)
            .map(|i| Citation::new(format!("https://example.com/{i}")))
            .collect();
        let output = TurnOutput {
            text: "answer".to_string(),
            reasoning: None,
            citations,
        };
        let rendered = render_output(&output, &ToolRegistry::without_collections());
        assert_eq!(rendered.citation_lines.len(), MAX_CITATION_LINES);
        assert_eq!(rendered.citation_lines[0], "- https://example.com/0");
    }

    #[test]
    fn empty_output_renders_empty() {
        let rendered = render_output(
            &TurnOutput::default(),
            &ToolRegistry::without_collections(),
        );
        assert!(rendered.is_empty());
    }
}
