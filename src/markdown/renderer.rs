//! Regex-based markdown conversion.
//!
//! The rules run in a fixed order over the whole text, each one seeing the
//! output of the previous ones. Code block contents are not protected from
//! later rules and no HTML escaping is done. Line rules accept `\n` and
//! `\r\n` endings.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static FENCED_CODE: LazyLock<Regex> = LazyLock::new(|| compile(r"(?s)```(\w+)?\r?\n(.*?)```"));
static HEADING_3: LazyLock<Regex> = LazyLock::new(|| compile(r"(?mR)^### (.*)$"));
static HEADING_2: LazyLock<Regex> = LazyLock::new(|| compile(r"(?mR)^## (.*)$"));
static HEADING_1: LazyLock<Regex> = LazyLock::new(|| compile(r"(?mR)^# (.*)$"));
static BOLD_STARS: LazyLock<Regex> = LazyLock::new(|| compile(r"\*\*(.+?)\*\*"));
static BOLD_UNDERSCORES: LazyLock<Regex> = LazyLock::new(|| compile(r"__(.+?)__"));
static ITALIC_STAR: LazyLock<Regex> = LazyLock::new(|| compile(r"\*(.+?)\*"));
static ITALIC_UNDERSCORE: LazyLock<Regex> = LazyLock::new(|| compile(r"_(.+?)_"));
static INLINE_CODE: LazyLock<Regex> = LazyLock::new(|| compile(r"`([^`]+)`"));
static LINK: LazyLock<Regex> = LazyLock::new(|| compile(r"(!?)\[([^\]]+)\]\(([^)]+)\)"));
static IMAGE: LazyLock<Regex> = LazyLock::new(|| compile(r"!\[([^\]]*)\]\(([^)]+)\)"));
static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| compile(r"(?mR)^\* (.+)"));
static LIST_RUN: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?mR)^<li>.*</li>(?:\r?\n<li>.*</li>)*"));
static BLOCKQUOTE: LazyLock<Regex> = LazyLock::new(|| compile(r"(?mR)^> (.+)"));
static HORIZONTAL_RULE: LazyLock<Regex> = LazyLock::new(|| compile(r"(?mR)^---$"));
static PARAGRAPH_BREAK: LazyLock<Regex> = LazyLock::new(|| compile(r"\r?\n\r?\n"));

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("markdown rule pattern must compile")
}

/// Returns true for sources that are used verbatim instead of being resolved.
pub fn is_remote_source(src: &str) -> bool {
    src.starts_with("http://") || src.starts_with("https://")
}

/// Convert markdown into an HTML fragment.
///
/// `resolve_image_path` maps a relative image source to a URI the display
/// surface can load. It is never called for `http://` or `https://` sources.
///
/// # Example
///
/// ```
/// use readme_preview::markdown::render;
///
/// let html = render("# Title\n\nSome **bold** text", |src: &str| src.to_string());
/// assert_eq!(html, "<p><h1>Title</h1></p><p>Some <strong>bold</strong> text</p>");
/// ```
pub fn render<F>(markdown: &str, resolve_image_path: F) -> String
where
    F: Fn(&str) -> String,
{
    let _scope = crate::perf::scope("markdown.render");

    let html = FENCED_CODE.replace_all(
        markdown,
        r#"<pre><code class="language-${1}">${2}</code></pre>"#,
    );

    let html = HEADING_3.replace_all(&html, "<h3>${1}</h3>");
    let html = HEADING_2.replace_all(&html, "<h2>${1}</h2>");
    let html = HEADING_1.replace_all(&html, "<h1>${1}</h1>");

    let html = BOLD_STARS.replace_all(&html, "<strong>${1}</strong>");
    let html = BOLD_UNDERSCORES.replace_all(&html, "<strong>${1}</strong>");

    let html = ITALIC_STAR.replace_all(&html, "<em>${1}</em>");
    let html = ITALIC_UNDERSCORE.replace_all(&html, "<em>${1}</em>");

    let html = INLINE_CODE.replace_all(&html, "<code>${1}</code>");

    // A leading `!` marks image syntax, which the image rule handles next.
    let html = LINK.replace_all(&html, |caps: &Captures<'_>| {
        if caps[1].is_empty() {
            format!(r#"<a href="{}">{}</a>"#, &caps[3], &caps[2])
        } else {
            caps[0].to_string()
        }
    });

    let html = IMAGE.replace_all(&html, |caps: &Captures<'_>| {
        let alt = &caps[1];
        let src = &caps[2];
        let resolved = if is_remote_source(src) {
            src.to_string()
        } else {
            resolve_image_path(src)
        };
        format!(r#"<img alt="{alt}" src="{resolved}">"#)
    });

    let html = format!("<p>{}</p>", PARAGRAPH_BREAK.replace_all(&html, "</p><p>"));

    let html = LIST_ITEM.replace_all(&html, "<li>${1}</li>");
    let html = LIST_RUN.replace(&html, "<ul>${0}</ul>");

    let html = BLOCKQUOTE.replace_all(&html, "<blockquote>${1}</blockquote>");
    let html = HORIZONTAL_RULE.replace_all(&html, "<hr>");

    html.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn identity(src: &str) -> String {
        src.to_string()
    }

    #[test]
    fn test_fenced_code_block_with_language() {
        let html = render("```rust\nfn main() {}\n```", identity);
        assert!(html.contains(r#"<pre><code class="language-rust">fn main() {}"#));
        assert!(html.contains("</code></pre>"));
    }

    #[test]
    fn test_fenced_code_block_without_language_has_empty_class() {
        let html = render("```\nplain\n```", identity);
        assert!(html.contains(r#"<code class="language-">plain"#));
    }

    #[test]
    fn test_headings_levels() {
        let html = render("# One\n## Two\n### Three", identity);
        assert!(html.contains("<h1>One</h1>"));
        assert!(html.contains("<h2>Two</h2>"));
        assert!(html.contains("<h3>Three</h3>"));
    }

    #[test]
    fn test_heading_requires_line_start() {
        let html = render("not # a heading", identity);
        assert!(!html.contains("<h1>"));
    }

    #[test]
    fn test_bold_with_stars_and_underscores() {
        let html = render("**a** and __b__", identity);
        assert!(html.contains("<strong>a</strong>"));
        assert!(html.contains("<strong>b</strong>"));
        assert!(!html.contains('*'));
    }

    #[test]
    fn test_italic_runs_after_bold() {
        let html = render("***both***", identity);
        assert!(html.contains("<strong>"));
        assert!(html.contains("<em>"));
        assert!(!html.contains("<em></em>"));
    }

    #[test]
    fn test_italic_with_stars_and_underscores() {
        let html = render("*a* and _b_", identity);
        assert!(html.contains("<em>a</em>"));
        assert!(html.contains("<em>b</em>"));
    }

    #[test]
    fn test_inline_code() {
        let html = render("run `cargo test` now", identity);
        assert!(html.contains("<code>cargo test</code>"));
    }

    #[test]
    fn test_link() {
        let html = render("[docs](https://example.com/docs)", identity);
        assert!(html.contains(r#"<a href="https://example.com/docs">docs</a>"#));
    }

    #[test]
    fn test_relative_image_is_resolved() {
        let html = render("![x](./img.png)", |src: &str| {
            assert_eq!(src, "./img.png");
            "resolved://img.png".to_string()
        });
        assert!(html.contains(r#"<img alt="x" src="resolved://img.png">"#));
        assert!(!html.contains("<a "));
    }

    #[test]
    fn test_remote_image_skips_resolver() {
        let calls = Cell::new(0);
        let html = render("![x](https://example.com/i.png)", |src: &str| {
            calls.set(calls.get() + 1);
            src.to_string()
        });
        assert!(html.contains(r#"<img alt="x" src="https://example.com/i.png">"#));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_image_with_empty_alt() {
        let html = render("![](logo.svg)", |_: &str| "file:///logo.svg".to_string());
        assert!(html.contains(r#"<img alt="" src="file:///logo.svg">"#));
    }

    #[test]
    fn test_paragraphs_split_on_blank_lines() {
        let html = render("first\n\nsecond", identity);
        assert_eq!(html, "<p>first</p><p>second</p>");
    }

    #[test]
    fn test_list_items_wrapped_in_single_ul() {
        let html = render("Items:\n* one\n* two\nafter", identity);
        assert!(html.contains("<ul><li>one</li>\n<li>two</li></ul>"));
    }

    #[test]
    fn test_only_first_list_run_is_wrapped() {
        let html = render("A\n* one\nbreak\n* two\nend", identity);
        assert_eq!(html.matches("<ul>").count(), 1);
        assert!(html.contains("<ul><li>one</li></ul>"));
        assert!(html.contains("\n<li>two</li>"));
    }

    #[test]
    fn test_blockquote() {
        let html = render("Quote:\n> wise words\nend", identity);
        assert!(html.contains("<blockquote>wise words</blockquote>"));
    }

    #[test]
    fn test_horizontal_rule() {
        let html = render("above\n---\nbelow", identity);
        assert!(html.contains("\n<hr>\n"));
    }

    #[test]
    fn test_html_is_not_escaped() {
        let html = render("<b>raw</b>", identity);
        assert_eq!(html, "<p><b>raw</b></p>");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(render("", identity), "<p></p>");
    }

    #[test]
    fn test_unterminated_syntax_degrades_to_text() {
        let html = render("**open and [broken](link", identity);
        assert_eq!(html, "<p>**open and [broken](link</p>");
    }

    #[test]
    fn test_windows_line_endings() {
        let html = render(
            "# Title\r\nabove\r\n---\r\nbelow\r\n\r\nintro\r\n* one\r\n* two\r\n> quote\r\nend",
            identity,
        );
        assert!(html.contains("<h1>Title</h1>\r\n"));
        assert!(!html.contains("\r</h1>"));
        assert!(html.contains("above\r\n<hr>\r\nbelow"));
        assert!(html.contains("below</p><p>intro"));
        assert!(html.contains("<ul><li>one</li>\r\n<li>two</li></ul>"));
        assert!(html.contains("<blockquote>quote</blockquote>\r\nend"));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn bold_always_becomes_strong(
                before in "[a-z ]{0,20}",
                word in "[a-zA-Z0-9]{1,12}",
                after in "[a-z ]{0,20}",
            ) {
                let source = format!("{before}**{word}**{after}");
                let html = render(&source, identity);
                let expected = format!("<strong>{word}</strong>");
                prop_assert!(html.contains(&expected));
                prop_assert!(!html.contains('*'));
            }

            #[test]
            fn render_never_panics(source in "\\PC{0,200}") {
                let html = render(&source, identity);
                prop_assert!(html.starts_with("<p>"));
            }

            #[test]
            fn remote_images_pass_through(
                host in "[a-z]{1,10}",
                file in "[a-z]{1,10}",
            ) {
                let src = format!("https://{host}.com/{file}.png");
                let html = render(&format!("![pic]({src})"), |_: &str| "resolved".to_string());
                let expected = format!(r#"src="{src}""#);
                prop_assert!(html.contains(&expected));
            }
        }
    }
}
