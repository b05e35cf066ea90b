//! Markdown rendering
//!
//! Content bodies are stored as Markdown and rendered once on save. The
//! rendered HTML is sanitized with ammonia before it is stored, so public
//! endpoints can hand `content_html` straight to the front-end.

use pulldown_cmark::{html, Event, Options, Parser};

#[derive(Clone)]
pub struct MarkdownRenderer {
    options: Options,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_SMART_PUNCTUATION);
        Self { options }
    }

    /// Render to sanitized HTML
    pub fn render(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.options);
        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, parser);
        ammonia::clean(&out)
    }

    /// Text content only, whitespace collapsed
    pub fn plain_text(&self, markdown: &str) -> String {
        let mut text = String::new();
        for event in Parser::new_ext(markdown, self.options) {
            match event {
                Event::Text(t) | Event::Code(t) => {
                    text.push_str(&t);
                    text.push(' ');
                }
                Event::SoftBreak | Event::HardBreak => text.push(' '),
                _ => {}
            }
        }
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// First `max_chars` characters of the plain text, cut at a word boundary
    pub fn excerpt(&self, markdown: &str, max_chars: usize) -> String {
        let text = self.plain_text(markdown);
        if text.chars().count() <= max_chars {
            return text;
        }
        let cut: String = text.chars().take(max_chars).collect();
        let trimmed = match cut.rfind(' ') {
            Some(pos) if pos > 0 => &cut[..pos],
            _ => cut.as_str(),
        };
        format!("{}…", trimmed.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_basic_markdown() {
        let r = MarkdownRenderer::new();
        let html = r.render("# Budget\n\nThis is **important**.");
        assert!(html.contains("<h1>Budget</h1>"));
        assert!(html.contains("<strong>important</strong>"));
    }

    #[test]
    fn test_render_strips_scripts() {
        let r = MarkdownRenderer::new();
        let html = r.render("Hello <script>alert(1)</script> <a href=\"javascript:x()\">x</a>");
        assert!(!html.contains("<script"));
        assert!(!html.contains("javascript:"));
    }

    #[test]
    fn test_render_tables() {
        let r = MarkdownRenderer::new();
        let html = r.render("| a | b |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_plain_text_and_excerpt() {
        let r = MarkdownRenderer::new();
        assert_eq!(r.plain_text("## Title\n\nSome *em* text"), "Title Some em text");

        let excerpt = r.excerpt("one two three four five", 10);
        assert_eq!(excerpt, "one two…");
        assert_eq!(r.excerpt("short", 10), "short");
    }
}
