use crate::schema::comments;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Queryable, Identifiable, Debug, Clone, PartialEq)]
#[diesel(table_name = comments)]
pub struct Comment {
    pub id: i32,
    pub post_id: i32,
    pub user_id: i32,
    pub body: String,
    pub version: i32,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = comments)]
pub struct NewComment {
    pub post_id: i32,
    pub user_id: i32,
    pub body: String,
    pub version: i32,
    pub approved: bool,
}

/// Entry of a post's comment listing, as polled by the browser to find
/// comments that were added or edited since the page was rendered.
#[derive(Serialize, Deserialize, Queryable, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentVersion {
    #[serde(rename = "comment_id")]
    pub id: i32,
    #[serde(rename = "comment_ver")]
    pub version: i32,
}

impl From<&Comment> for CommentVersion {
    fn from(comment: &Comment) -> Self {
        CommentVersion {
            id: comment.id,
            version: comment.version,
        }
    }
}

/// One page of the moderation queue.
#[derive(Serialize, Debug)]
pub struct CommentPage {
    pub page_number: i64,
    pub total_pages: i64,
    pub comments: Vec<Comment>,
}
