//! Converts markdown to HTML with a single forward scan over the source
//! lines. Each line is classified (blank, rule, header, quote, list item,
//! fence, or plain text) and fed to a small state machine that buffers
//! paragraphs, lists, and fenced code until a line of an incompatible kind
//! arrives. Span-level markup inside each finished block is handled by
//! [`crate::inline`].
//!
//! The converter never fails: anything it doesn't recognize is passed through
//! as literal text.

use crate::inline;
use regex::Regex;
use std::sync::OnceLock;

const FENCE: &str = "```";

fn header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(#{1,3}) (.*)$").expect("invalid header regex"))
}

fn quote() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^> (.*)$").expect("invalid blockquote regex"))
}

fn unordered_item() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^- (.*)$").expect("invalid list item regex"))
}

fn ordered_item() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\. (.*)$").expect("invalid list item regex"))
}

/// Converts `markdown` into an HTML string. Top-level elements are separated
/// by newlines. This is a pure function: the same input always yields the
/// same output, and no input is an error.
pub fn convert(markdown: &str) -> String {
    let lines: Vec<&str> = markdown.lines().collect();

    // A fence only opens a code block if something later closes it; an
    // unclosed fence is literal text.
    let last_fence_end = lines.iter().rposition(|line| is_fence_end(line));

    let mut converter = Converter::default();
    for (i, &line) in lines.iter().enumerate() {
        if converter.in_code_block() {
            match is_fence_end(line) {
                true => converter.flush(),
                false => converter.push_code(line),
            }
            continue;
        }
        let fence_closes = matches!(last_fence_end, Some(end) if end > i);
        converter.feed(classify(line, fence_closes));
    }
    converter.finish()
}

fn is_fence_end(line: &str) -> bool {
    line.trim_end() == FENCE
}

/// The two flavors of list. An item of one kind never joins a list of the
/// other kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    fn tag(self) -> &'static str {
        match self {
            ListKind::Unordered => "ul",
            ListKind::Ordered => "ol",
        }
    }
}

/// The classification of a single source line outside of a code block.
#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    Blank,
    Rule,
    Header(usize, &'a str),
    Quote(&'a str),
    Item(ListKind, &'a str),

    /// An opening fence with its (possibly empty) language tag.
    FenceStart(&'a str),
    Text(&'a str),
}

fn classify(line: &str, fence_closes: bool) -> Line<'_> {
    if line.trim().is_empty() {
        return Line::Blank;
    }
    if line.trim_end() == "---" {
        return Line::Rule;
    }
    if fence_closes && line.starts_with(FENCE) && !line[FENCE.len()..].starts_with('`') {
        let language = line[FENCE.len()..].split_whitespace().next();
        return Line::FenceStart(language.unwrap_or(""));
    }
    if let Some(caps) = header().captures(line) {
        let level = caps.get(1).map_or(1, |m| m.as_str().len());
        let text = caps.get(2).map_or("", |m| m.as_str().trim_start());
        return Line::Header(level, text);
    }
    if let Some(caps) = quote().captures(line) {
        return Line::Quote(caps.get(1).map_or("", |m| m.as_str()));
    }
    if let Some(caps) = unordered_item().captures(line) {
        return Line::Item(
            ListKind::Unordered,
            caps.get(1).map_or("", |m| m.as_str()),
        );
    }
    if let Some(caps) = ordered_item().captures(line) {
        return Line::Item(
            ListKind::Ordered,
            caps.get(1).map_or("", |m| m.as_str()),
        );
    }
    Line::Text(line)
}

/// The block currently being buffered. At most one block is open at any
/// point in the scan.
enum Block<'a> {
    None,
    Paragraph(Vec<&'a str>),
    List(ListKind, Vec<&'a str>),
    Code { language: &'a str, lines: Vec<&'a str> },
}

impl Default for Block<'_> {
    fn default() -> Self {
        Block::None
    }
}

#[derive(Default)]
struct Converter<'a> {
    block: Block<'a>,
    out: Vec<String>,
}

impl<'a> Converter<'a> {
    fn in_code_block(&self) -> bool {
        matches!(self.block, Block::Code { .. })
    }

    fn push_code(&mut self, line: &'a str) {
        if let Block::Code { lines, .. } = &mut self.block {
            lines.push(line);
        }
    }

    fn feed(&mut self, line: Line<'a>) {
        match line {
            Line::Blank => self.flush(),
            Line::Text(text) => {
                if let Block::Paragraph(lines) = &mut self.block {
                    lines.push(text);
                    return;
                }
                self.flush();
                self.block = Block::Paragraph(vec![text]);
            }
            Line::Item(kind, text) => {
                if let Block::List(open, items) = &mut self.block {
                    if *open == kind {
                        items.push(text);
                        return;
                    }
                }
                self.flush();
                self.block = Block::List(kind, vec![text]);
            }
            Line::FenceStart(language) => {
                self.flush();
                self.block = Block::Code {
                    language,
                    lines: Vec::new(),
                };
            }
            Line::Header(level, text) => {
                self.flush();
                self.out
                    .push(format!("<h{0}>{1}</h{0}>", level, inline::render(text)));
            }
            Line::Quote(text) => {
                self.flush();
                self.out.push(format!(
                    "<blockquote>{}</blockquote>",
                    inline::render(text)
                ));
            }
            Line::Rule => {
                self.flush();
                self.out.push(String::from("<hr>"));
            }
        }
    }

    /// Emits the open block (if any) as one finished HTML element and closes
    /// it.
    fn flush(&mut self) {
        match std::mem::take(&mut self.block) {
            Block::None => {}
            Block::Paragraph(lines) => self
                .out
                .push(format!("<p>{}</p>", inline::render(&lines.join(" ")))),
            Block::List(kind, items) => {
                let mut html = format!("<{}>", kind.tag());
                for item in items {
                    html.push_str("<li>");
                    html.push_str(&inline::render(item));
                    html.push_str("</li>");
                }
                html.push_str(&format!("</{}>", kind.tag()));
                self.out.push(html);
            }
            Block::Code { language, lines } => self.out.push(format!(
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                language,
                html_escape::encode_text(&lines.join("\n")),
            )),
        }
    }

    fn finish(mut self) -> String {
        self.flush();
        self.out.join("\n")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_lines_join_into_one_paragraph() {
        assert_eq!(
            "<p>one two three</p>",
            convert("one\ntwo\nthree")
        );
    }

    #[test]
    fn test_blank_line_separates_paragraphs() {
        assert_eq!("<p>one</p>\n<p>two</p>", convert("one\n\n\ntwo\n"));
    }

    #[test]
    fn test_headers() {
        assert_eq!("<h1>Title</h1>", convert("# Title"));
        assert_eq!("<h2>X</h2>", convert("## X"));
        assert_eq!("<h3>X</h3>", convert("### X"));
    }

    #[test]
    fn test_deep_or_unspaced_header_is_text() {
        assert_eq!("<p>#### deep</p>", convert("#### deep"));
        assert_eq!("<p>#tag</p>", convert("#tag"));
    }

    #[test]
    fn test_header_text_is_trimmed() {
        assert_eq!("<h1>x</h1>", convert("#  x"));
    }

    #[test]
    fn test_header_flushes_paragraph() {
        assert_eq!(
            "<p>intro</p>\n<h2>Next</h2>\n<p>body</p>",
            convert("intro\n## Next\nbody")
        );
    }

    #[test]
    fn test_unordered_list() {
        assert_eq!("<ul><li>a</li><li>b</li></ul>", convert("- a\n- b"));
    }

    #[test]
    fn test_ordered_list() {
        assert_eq!(
            "<ol><li>first</li><li>second</li></ol>",
            convert("1. first\n2. second\n")
        );
    }

    #[test]
    fn test_unordered_to_ordered_flushes() {
        assert_eq!(
            "<ul><li>a</li></ul>\n<ol><li>b</li></ol>",
            convert("- a\n1. b")
        );
    }

    #[test]
    fn test_ordered_to_unordered_flushes() {
        assert_eq!(
            "<ol><li>a</li></ol>\n<ul><li>b</li></ul>",
            convert("1. a\n- b")
        );
    }

    #[test]
    fn test_blank_line_closes_list() {
        assert_eq!(
            "<ul><li>a</li></ul>\n<ul><li>b</li></ul>",
            convert("- a\n\n- b")
        );
    }

    #[test]
    fn test_text_after_list_opens_paragraph() {
        assert_eq!(
            "<ul><li>a</li></ul>\n<p>after</p>",
            convert("- a\nafter")
        );
    }

    #[test]
    fn test_trailing_list_is_flushed() {
        assert_eq!("<ul><li>only item</li></ul>", convert("- only item"));
    }

    #[test]
    fn test_list_items_get_inline_markup() {
        assert_eq!(
            r#"<ul><li><strong>b</strong></li><li><a href="/x">x</a></li></ul>"#,
            convert("- **b**\n- [x](/x)")
        );
    }

    #[test]
    fn test_fenced_code_is_escaped_with_language() {
        assert_eq!(
            r#"<pre><code class="language-js">const x = 1 &lt; 2;</code></pre>"#,
            convert("```js\nconst x = 1 < 2;\n```")
        );
    }

    #[test]
    fn test_fenced_code_without_language() {
        assert_eq!(
            r#"<pre><code class="language-">a &amp;&amp; b
**not bold**
- not a list</code></pre>"#,
            convert("```\na && b\n**not bold**\n- not a list\n```")
        );
    }

    #[test]
    fn test_fence_flushes_open_list_and_paragraph() {
        assert_eq!(
            "<ul><li>a</li></ul>\n\
             <pre><code class=\"language-sh\">ls</code></pre>\n\
             <p>text</p>\n\
             <pre><code class=\"language-\"></code></pre>",
            convert("- a\n```sh\nls\n```\ntext\n```\n```")
        );
    }

    #[test]
    fn test_four_backticks_do_not_open_a_fence() {
        assert_eq!(
            "<p>```` x</p>\n<p>y</p>\n<pre><code class=\"language-\">z</code></pre>",
            convert("````\nx\n\ny\n```\nz\n```")
        );
    }

    #[test]
    fn test_unclosed_fence_is_literal() {
        assert_eq!("<p>```js foo</p>", convert("```js\nfoo"));
    }

    #[test]
    fn test_escaping_happens_once() {
        let html = convert("```\n<b>\n```");
        assert_eq!(r#"<pre><code class="language-">&lt;b&gt;</code></pre>"#, html);

        // Feeding the output back in treats it as text, not as code to be
        // escaped again.
        let again = convert(&html);
        assert!(again.contains("&lt;b&gt;"));
        assert!(!again.contains("&amp;lt;"));
    }

    #[test]
    fn test_horizontal_rule() {
        assert_eq!("<p>above</p>\n<hr>\n<p>below</p>", convert("above\n---\nbelow"));
    }

    #[test]
    fn test_blockquote_lines_are_not_merged() {
        assert_eq!(
            "<blockquote>one</blockquote>\n<blockquote><em>two</em></blockquote>",
            convert("> one\n> *two*")
        );
    }

    #[test]
    fn test_span_markup() {
        assert_eq!(
            r#"<p><a href="http://x">text</a></p>"#,
            convert("[text](http://x)")
        );
        assert_eq!(
            "<p><strong>b</strong> and <em>i</em></p>",
            convert("**b** and *i*")
        );
    }

    #[test]
    fn test_markup_wrapping_code_spans() {
        assert_eq!(
            r#"<p>see <a href="https://x"><code>cargo</code></a></p>"#,
            convert("see [`cargo`](https://x)")
        );
        assert_eq!(
            "<p><strong><code>x</code></strong></p>",
            convert("**`x`**")
        );
    }

    #[test]
    fn test_emphasis_spans_joined_lines() {
        assert_eq!(
            "<p><strong>across lines</strong></p>",
            convert("**across\nlines**")
        );
    }

    #[test]
    fn test_crlf_line_endings() {
        assert_eq!(
            "<h1>T</h1>\n<ul><li>a</li></ul>",
            convert("# T\r\n- a\r\n")
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!("", convert(""));
        assert_eq!("", convert("\n\n  \n"));
    }

    #[test]
    fn test_classify() {
        assert_eq!(Line::Blank, classify("   ", false));
        assert_eq!(Line::Rule, classify("---", false));
        assert_eq!(Line::FenceStart("rust"), classify("```rust", true));
        assert_eq!(Line::Text("```rust"), classify("```rust", false));
        assert_eq!(Line::Item(ListKind::Ordered, "x"), classify("12. x", false));
        assert_eq!(Line::Text("-x"), classify("-x", false));
    }
}
