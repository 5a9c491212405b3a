//! Markup compilation: Markdown to HTML.

use pulldown_cmark::{Options, Parser, html};

/// Compile Markdown source to HTML.
///
/// Production output is collapsed onto as few lines as possible;
/// development output keeps the readable line structure.
pub fn compile(source: &str, minify: bool) -> String {
    let options =
        Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_FOOTNOTES;

    let mut out = String::with_capacity(source.len() * 2);
    html::push_html(&mut out, Parser::new_ext(source, options));

    if minify { collapse_whitespace(&out) } else { out }
}

/// Collapse inter-tag line breaks without merging words of inline text.
fn collapse_whitespace(html: &str) -> String {
    let mut out = String::with_capacity(html.len());

    for line in html.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        // A break between a closing tag and an opening tag carries no
        // text content; anywhere else it stands in for a space.
        if !out.is_empty() && !(out.ends_with('>') && line.starts_with('<')) {
            out.push(' ');
        }
        out.push_str(line);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_basic() {
        let html = compile("# Title\n\nhello *world*\n", false);
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<em>world</em>"));
    }

    #[test]
    fn test_minified_is_single_line() {
        let html = compile("# Title\n\nparagraph\n\n- a\n- b\n", true);
        assert!(!html.contains('\n'));
        assert!(html.contains("<h1>Title</h1><p>paragraph</p>"));
    }

    #[test]
    fn test_minify_preserves_inline_text_spacing() {
        let html = compile("line one\nline two\n", true);
        assert!(html.contains("line one line two"));
    }

    #[test]
    fn test_pretty_keeps_line_structure() {
        let html = compile("# Title\n\nparagraph\n", false);
        assert!(html.contains('\n'));
    }
}
