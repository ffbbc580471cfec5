//! Html fragments embedded in comment responses.

use crate::error::CmsError;
use crate::model::comments::Comment;
use askama::Template;
use chrono::{DateTime, Utc};

/// Everything a comment fragment displays.
#[derive(Debug, Clone, Copy)]
pub struct CommentView<'a> {
    pub comment: &'a Comment,
    pub author: &'a str,
}

pub trait Renderer: Send + Sync {
    /// Full display fragment for a single comment.
    fn comment(&self, view: CommentView<'_>) -> Result<String, CmsError>;

    /// The comment body, escaped and with line breaks turned into `<br />`.
    fn comment_text(&self, body: &str) -> String;
}

#[derive(Template)]
#[template(path = "comment.html")]
struct CommentTemplate<'a> {
    id: i32,
    version: i32,
    author: &'a str,
    iso: String,
    human: String,
    text: String,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlRenderer;

impl Renderer for HtmlRenderer {
    fn comment(&self, view: CommentView<'_>) -> Result<String, CmsError> {
        let comment = view.comment;
        let template = CommentTemplate {
            id: comment.id,
            version: comment.version,
            author: view.author,
            iso: comment.created_at.to_rfc3339(),
            human: human_date(&comment.created_at),
            text: self.comment_text(&comment.body),
        };
        Ok(template.render()?)
    }

    fn comment_text(&self, body: &str) -> String {
        nl2br(&html_escape::encode_quoted_attribute(body))
    }
}

fn human_date(at: &DateTime<Utc>) -> String {
    at.format("%A %-d %B %Y at %H:%M").to_string()
}

/// Inserts `<br />` in front of every line break, treating `\r\n` and `\n\r`
/// as a single break. The line breaks themselves are kept.
pub fn nl2br(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' | '\n' => {
                out.push_str("<br />");
                out.push(c);
                let pair = if c == '\r' { '\n' } else { '\r' };
                if chars.peek() == Some(&pair) {
                    out.push(pair);
                    chars.next();
                }
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    #[case("plain", "plain")]
    #[case("a\nb", "a<br />\nb")]
    #[case("a\r\nb", "a<br />\r\nb")]
    #[case("a\n\rb", "a<br />\n\rb")]
    #[case("a\n\nb", "a<br />\n<br />\nb")]
    fn converts_line_breaks(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(nl2br(input), expected);
    }

    #[test]
    fn escapes_markup_before_converting_breaks() {
        let text = HtmlRenderer.comment_text("<b>\"Tom & Jerry's\"</b>\nbye");
        assert_eq!(
            text,
            "&lt;b&gt;&quot;Tom &amp; Jerry&#x27;s&quot;&lt;/b&gt;<br />\nbye"
        );
    }

    #[test]
    fn renders_comment_fragment() {
        let comment = Comment {
            id: 7,
            post_id: 1,
            user_id: 3,
            body: "Hi <there>".to_owned(),
            version: 2,
            approved: true,
            created_at: Utc.with_ymd_and_hms(2019, 11, 10, 12, 30, 0).unwrap(),
        };
        let html = HtmlRenderer
            .comment(CommentView {
                comment: &comment,
                author: "<Ferris>",
            })
            .unwrap();

        assert!(html.starts_with("<div id=\"comment_7\""));
        assert!(html.contains("data-ver=\"2\""));
        assert!(html.contains("<strong>&lt;Ferris&gt;</strong>"));
        assert!(html.contains("Sunday 10 November 2019 at 12:30"));
        assert!(html.contains("<p id=\"main_comment_7\" class=\"main\">Hi &lt;there&gt;</p>"));
    }
}
