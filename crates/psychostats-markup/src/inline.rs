//! Inline span recognition.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::Span;

/// Bold runs (`**x**`) and code runs (`` `x` ``), shortest match first.
static INLINE_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\*\*.*?\*\*|`.*?`").ok());

/// Splits text into plain, bold and code spans.
///
/// Unmatched or empty delimiters stay in the text literally. Adjacent plain
/// text is merged into one span.
#[must_use]
pub fn parse_inline(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let Some(pattern) = INLINE_PATTERN.as_ref() else {
        push_plain(&mut spans, text);
        return spans;
    };

    let mut last = 0;
    for found in pattern.find_iter(text) {
        push_plain(&mut spans, &text[last..found.start()]);
        let run = found.as_str();
        if let Some(inner) = run.strip_prefix("**").and_then(|r| r.strip_suffix("**")) {
            if inner.is_empty() {
                push_plain(&mut spans, run);
            } else {
                spans.push(Span::Bold(inner.to_string()));
            }
        } else if let Some(inner) = run.strip_prefix('`').and_then(|r| r.strip_suffix('`')) {
            if inner.is_empty() {
                push_plain(&mut spans, run);
            } else {
                spans.push(Span::Code(inner.to_string()));
            }
        } else {
            push_plain(&mut spans, run);
        }
        last = found.end();
    }
    push_plain(&mut spans, &text[last..]);

    spans
}

fn push_plain(spans: &mut Vec<Span>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Span::Plain(previous)) = spans.last_mut() {
        previous.push_str(text);
    } else {
        spans.push(Span::Plain(text.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(text: &str) -> Span {
        Span::Plain(text.to_string())
    }

    #[test]
    fn test_plain_text_is_single_span() {
        assert_eq!(
            parse_inline("Sin marcas de formato"),
            vec![plain("Sin marcas de formato")]
        );
    }

    #[test]
    fn test_bold_and_code() {
        assert_eq!(
            parse_inline("Usa **DESVEST.M** así: `=DESVEST.M(B2:B31)` al final"),
            vec![
                plain("Usa "),
                Span::Bold("DESVEST.M".to_string()),
                plain(" así: "),
                Span::Code("=DESVEST.M(B2:B31)".to_string()),
                plain(" al final"),
            ]
        );
    }

    #[test]
    fn test_unmatched_delimiters_stay_literal() {
        assert_eq!(
            parse_inline("Esto **no cierra y `tampoco"),
            vec![plain("Esto **no cierra y `tampoco")]
        );
    }

    #[test]
    fn test_empty_delimiters_stay_literal() {
        assert_eq!(parse_inline("a **** b `` c"), vec![plain("a **** b `` c")]);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_inline("").is_empty());
    }

    #[test]
    fn test_code_wins_when_first() {
        assert_eq!(
            parse_inline("`**x**`"),
            vec![Span::Code("**x**".to_string())]
        );
    }
}
