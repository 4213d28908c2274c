//! Markdown to HTML conversion for note previews.
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

/// Converts a markdown string into HTML that is safe to display.
pub trait MarkdownRenderer: Send {
    fn render(&self, markdown: &str) -> String;
}

/// CommonMark renderer that neutralizes raw HTML and script-capable URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SanitizedMarkdown;

const BLOCKED_SCHEMES: [&str; 3] = ["javascript:", "vbscript:", "data:"];

fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    let normalized = url.trim().to_ascii_lowercase();
    if BLOCKED_SCHEMES
        .iter()
        .any(|scheme| normalized.starts_with(scheme))
    {
        CowStr::Borrowed("#")
    } else {
        url
    }
}

fn sanitize(event: Event<'_>) -> Event<'_> {
    match event {
        // Raw HTML is shown as text instead of being interpreted
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        other => other,
    }
}

impl MarkdownRenderer for SanitizedMarkdown {
    fn render(&self, markdown: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        let parser = Parser::new_ext(markdown, options).map(sanitize);
        let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut html_output, parser);
        html_output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_headings_and_emphasis() {
        let html = SanitizedMarkdown.render("# Hello\n\nsome *text*");
        assert!(html.contains("<h1>Hello</h1>"));
        assert!(html.contains("<em>text</em>"));
    }

    #[test]
    fn escapes_raw_html() {
        let html = SanitizedMarkdown.render("<script>alert(1)</script>\n\nhi <b>there</b>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn neutralizes_script_urls() {
        let html = SanitizedMarkdown
            .render("[click](javascript:alert(1)) ![img](data:image/png;base64,AAAA)");
        assert!(!html.contains("javascript:"));
        assert!(!html.contains("data:image"));
        assert!(html.contains(r##"href="#""##));
    }

    #[test]
    fn keeps_regular_links_and_tables() {
        let html = SanitizedMarkdown
            .render("[site](https://example.com)\n\n| a | b |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains(r#"href="https://example.com""#));
        assert!(html.contains("<table>"));
    }
}
