//! Text sanitization for display strings carried in document metadata.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref URL_REGEX: Regex =
        Regex::new(r"https?://[^\s<>]+").expect("Failed to compile URL regex");
}

const LINK_TEMPLATE: &str = r#"<a href="$0" target="_blank" rel="noopener noreferrer">$0</a>"#;

/// Options for [`RichTextProcessor::wrap_rich_text`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RichTextOptions {
    pub no_links: bool,
    pub no_linebreaks: bool,
}

/// Turns untrusted text into display-safe fragments.
pub trait RichTextProcessor: Send + Sync {
    /// Escape text so it can be shown verbatim.
    fn wrap_plain_text(&self, text: &str) -> String;

    /// Escape text and optionally decorate links and line breaks.
    fn wrap_rich_text(&self, text: &str, options: RichTextOptions) -> String;
}

/// HTML-producing text processor.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlTextProcessor;

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

impl RichTextProcessor for HtmlTextProcessor {
    fn wrap_plain_text(&self, text: &str) -> String {
        escape_html(text)
    }

    fn wrap_rich_text(&self, text: &str, options: RichTextOptions) -> String {
        let mut html = escape_html(text);

        if !options.no_links {
            html = URL_REGEX.replace_all(&html, LINK_TEMPLATE).into_owned();
        }

        if options.no_linebreaks {
            html.replace('\n', " ")
        } else {
            html.replace('\n', "<br/>")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_escaping() {
        let processor = HtmlTextProcessor;
        assert_eq!(
            processor.wrap_plain_text(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
        assert_eq!(processor.wrap_plain_text("report.pdf"), "report.pdf");
    }

    #[test]
    fn test_rich_text_links() {
        let processor = HtmlTextProcessor;
        let html =
            processor.wrap_rich_text("see https://example.com/x", RichTextOptions::default());
        assert_eq!(
            html,
            r#"see <a href="https://example.com/x" target="_blank" rel="noopener noreferrer">https://example.com/x</a>"#
        );
    }

    #[test]
    fn test_rich_text_no_links_no_linebreaks() {
        let processor = HtmlTextProcessor;
        let options = RichTextOptions {
            no_links: true,
            no_linebreaks: true,
        };
        assert_eq!(
            processor.wrap_rich_text("😀\nhttps://example.com", options),
            "😀 https://example.com"
        );
    }

    #[test]
    fn test_rich_text_linebreaks() {
        let processor = HtmlTextProcessor;
        let options = RichTextOptions {
            no_links: true,
            no_linebreaks: false,
        };
        assert_eq!(processor.wrap_rich_text("a\nb", options), "a<br/>b");
    }
}
