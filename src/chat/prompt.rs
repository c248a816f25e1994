//! Fixed instructions appended to every prompt.

/// Output rules for plain-text answers rendered in a terminal.
pub const TERMINAL_FORMATTING_DIRECTIVE: &str = "\n\n\
====================================\n\
OUTPUT FORMAT: TERMINAL PLAIN TEXT\n\
====================================\n\
Rules:\n\
- ASCII only (no Unicode/emoji)\n\
- No Markdown (**, __, ##, ```)\n\
\n\
Visual Elements:\n\
\x20 Headers:     === TITLE ===\n\
\x20 Subheaders:  --- Title ---\n\
\x20 Dividers:    ----------------\n\
\x20 Emphasis:    _text_\n\
\x20 Lists:       * item or 1. item\n\
\x20 Code:        (indent 4 spaces)\n\
\x20 Links:       Name (url)\n\
\n\
Add blank lines between sections.\n\
====================================\n";

/// Output rules when the response is constrained to typed lines.
pub const STRUCTURED_DIRECTIVE: &str = "\n\n\
====================================\n\
OUTPUT FORMAT: TYPED LINES\n\
====================================\n\
Answer as a list of lines. Give each line exactly one type:\n\
- heading: a section title\n\
- subheading: a sub-section title\n\
- text: ordinary prose, one paragraph or list item per line\n\
- code: one line of source code, without fences\n\
- quote: quoted material\n\
No Markdown inside lineContent.\n\
====================================\n";

/// Preamble placed before the resent transcript.
pub const HISTORY_HEADER: &str = "CONVERSATION HISTORY:\n\
Below is the complete conversation between user and assistant. \
Maintain context from all previous exchanges. \
user: indicates messages from the user. \
model: indicates your previous responses.\n\
---\n";

/// Preamble used when older turns were left out of the resent transcript.
pub const WINDOWED_HISTORY_HEADER: &str = "CONVERSATION HISTORY:\n\
Below are the most recent exchanges between user and assistant; \
earlier ones are omitted. \
Maintain context from the exchanges shown. \
user: indicates messages from the user. \
model: indicates your previous responses.\n\
---\n";

/// Directive matching the requested output mode.
pub fn directive_for(structured: bool) -> &'static str {
    if structured {
        STRUCTURED_DIRECTIVE
    } else {
        TERMINAL_FORMATTING_DIRECTIVE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_selection() {
        assert!(directive_for(false).contains("TERMINAL PLAIN TEXT"));
        assert!(directive_for(true).contains("TYPED LINES"));
    }

    #[test]
    fn test_formatting_directive_keeps_indentation() {
        assert!(TERMINAL_FORMATTING_DIRECTIVE.contains("\n  Headers:     === TITLE ===\n"));
        assert!(TERMINAL_FORMATTING_DIRECTIVE.starts_with("\n\n===="));
    }

    #[test]
    fn test_history_header_ends_with_separator() {
        for header in [HISTORY_HEADER, WINDOWED_HISTORY_HEADER] {
            assert!(header.starts_with("CONVERSATION HISTORY:\n"));
            assert!(header.ends_with("---\n"));
        }
        assert!(!WINDOWED_HISTORY_HEADER.contains("complete"));
    }
}
