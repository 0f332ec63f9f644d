//! Span-level substitutions: code spans, emphasis, and links. These rewrite a
//! single unit of text (a header, a list item, a joined paragraph) and never
//! look at the surrounding lines; block structure is handled by
//! [`crate::markdown`].
//!
//! The rules run in a fixed order. Code spans are matched first and masked so
//! that their contents are never touched by the later rules (while bold and
//! links can still wrap them), and bold runs before italic so that `**x**`
//! isn't half-matched as `*x*`.

use regex::{Captures, Regex};
use std::sync::OnceLock;

fn code_span() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"`[^`]+`").expect("invalid code span regex"))
}

fn bold() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*([^*]+)\*\*").expect("invalid bold regex"))
}

fn italic() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*([^*]+)\*").expect("invalid italic regex"))
}

fn link() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("invalid link regex"))
}

// Code spans are swapped for `\u{E000}N\u{E001}` while the other rules run.
// The markers sit in the private use area and carry none of the characters
// the emphasis and link patterns look for.
const SPAN_START: char = '\u{E000}';
const SPAN_END: char = '\u{E001}';

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("\u{E000}([0-9]+)\u{E001}").expect("invalid placeholder regex"))
}

/// Rewrites the span-level markdown in `text` into HTML. Anything that
/// doesn't match a rule (an unmatched `**`, a lone backtick) is passed
/// through as literal text.
pub fn render(text: &str) -> String {
    let mut spans: Vec<String> = Vec::new();
    let masked = code_span().replace_all(text, |caps: &Captures| {
        let span = caps.get(0).map_or("", |m| m.as_str());
        // Backticks are single bytes, so trimming one off each end is safe.
        spans.push(span[1..span.len() - 1].to_owned());
        format!("{}{}{}", SPAN_START, spans.len() - 1, SPAN_END)
    });

    let html = emphasis_and_links(&masked);

    placeholder()
        .replace_all(&html, |caps: &Captures| {
            let whole = caps.get(0).map_or("", |m| m.as_str());
            caps.get(1)
                .and_then(|m| m.as_str().parse::<usize>().ok())
                .and_then(|i| spans.get(i))
                .map_or_else(|| whole.to_owned(), |span| format!("<code>{}</code>", span))
        })
        .into_owned()
}

fn emphasis_and_links(text: &str) -> String {
    let text = bold().replace_all(text, "<strong>$1</strong>");
    let text = italic().replace_all(&text, "<em>$1</em>");
    link()
        .replace_all(&text, r#"<a href="$2">$1</a>"#)
        .into_owned()
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bold_and_italic() {
        assert_eq!(
            "<strong>b</strong> and <em>i</em>",
            render("**b** and *i*")
        );
    }

    #[test]
    fn test_triple_star_nests_bold_in_italic() {
        assert_eq!("<em><strong>x</strong></em>", render("***x***"));
    }

    #[test]
    fn test_link() {
        assert_eq!(r#"<a href="http://x">text</a>"#, render("[text](http://x)"));
    }

    #[test]
    fn test_link_with_bold_label() {
        assert_eq!(
            r#"see <a href="/a.html"><strong>this</strong></a>"#,
            render("see [**this**](/a.html)")
        );
    }

    #[test]
    fn test_code_span_is_not_escaped() {
        assert_eq!("<code><br></code>", render("`<br>`"));
    }

    #[test]
    fn test_code_span_contents_are_left_alone() {
        assert_eq!(
            "<code>a*b*c</code> and <em>d</em>",
            render("`a*b*c` and *d*")
        );
    }

    #[test]
    fn test_code_span_inside_link_label() {
        assert_eq!(
            r#"see <a href="https://x"><code>cargo</code></a>"#,
            render("see [`cargo`](https://x)")
        );
    }

    #[test]
    fn test_bold_around_code_span() {
        assert_eq!("<strong><code>x</code></strong>", render("**`x`**"));
    }

    #[test]
    fn test_several_code_spans() {
        assert_eq!(
            "<code>a</code>, <em><code>b</code></em> and <code>[c](d)</code>",
            render("`a`, *`b`* and `[c](d)`")
        );
    }

    #[test]
    fn test_unterminated_constructs_are_literal() {
        assert_eq!("**open and `tick", render("**open and `tick"));
    }

    #[test]
    fn test_plain_text_is_unchanged() {
        assert_eq!("nothing to see", render("nothing to see"));
    }
}
