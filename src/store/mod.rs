//! Persistence seams for comments and pages.
//!
//! Every method is blocking; the http layer moves calls onto actix's blocking
//! pool. [`pg::PgStore`] is the production implementation,
//! [`memory::MemoryStore`] keeps everything in process.

pub mod memory;
pub mod pg;

use crate::error::CmsError;
use crate::model::comments::{Comment, CommentVersion, NewComment};
use crate::model::pages::{NewPage, Page, PageChangeset, PageSearchHit};

pub use self::memory::MemoryStore;
pub use self::pg::PgStore;

pub type StoreResult<T> = Result<T, CmsError>;

pub trait CommentStore: Send + Sync {
    fn post_exists(&self, post_id: i32) -> StoreResult<bool>;

    fn author_name(&self, user_id: i32) -> StoreResult<Option<String>>;

    /// Comments of a post in ascending id order.
    fn comments_for_post(
        &self,
        post_id: i32,
        include_unapproved: bool,
    ) -> StoreResult<Vec<CommentVersion>>;

    fn insert_comment(&self, comment: NewComment) -> StoreResult<Comment>;

    fn find_comment(&self, id: i32) -> StoreResult<Option<Comment>>;

    /// Replaces the body and bumps the version, but only while the stored
    /// version still equals `expected_version`. Returns `None` when no row
    /// matched.
    fn update_comment_body(
        &self,
        id: i32,
        expected_version: i32,
        body: &str,
    ) -> StoreResult<Option<Comment>>;

    /// Returns whether a row was removed.
    fn delete_comment(&self, id: i32) -> StoreResult<bool>;

    /// Returns whether a row was touched.
    fn approve_comment(&self, id: i32) -> StoreResult<bool>;

    /// Unapproved comments, oldest first, and the total number of pages.
    /// `page` is 1-based.
    fn unapproved_comments(&self, page: i64, per_page: i64) -> StoreResult<(Vec<Comment>, i64)>;
}

pub trait PageStore: Send + Sync {
    fn find_page(&self, slug: &str) -> StoreResult<Option<Page>>;

    fn insert_page(&self, page: NewPage) -> StoreResult<Page>;

    fn update_page(&self, id: i32, changes: PageChangeset) -> StoreResult<Page>;

    fn delete_page(&self, id: i32) -> StoreResult<()>;

    fn page_categories(&self, page_id: i32) -> StoreResult<Vec<String>>;

    fn save_page_categories(&self, page_id: i32, categories: &[String]) -> StoreResult<()>;

    fn delete_page_categories(&self, page_id: i32) -> StoreResult<()>;

    /// Pages whose title starts with `prefix`.
    fn search_pages(&self, prefix: &str) -> StoreResult<Vec<PageSearchHit>>;
}

pub(crate) fn total_pages(count: i64, per_page: i64) -> i64 {
    if count <= 0 {
        0
    } else {
        (count - 1) / per_page + 1
    }
}

/// Rows to skip for the 1-based `page`. Saturates instead of overflowing, so
/// an absurd page number reads as past the end.
pub(crate) fn page_offset(page: i64, per_page: i64) -> i64 {
    (page.max(1) - 1).saturating_mul(per_page)
}

#[cfg(test)]
mod tests {
    use super::{page_offset, total_pages};
    use rstest::rstest;

    #[rstest]
    #[case(0, 10, 0)]
    #[case(1, 10, 1)]
    #[case(10, 10, 1)]
    #[case(11, 10, 2)]
    #[case(3, i64::MAX, 1)]
    fn counts_pages(#[case] count: i64, #[case] per_page: i64, #[case] expected: i64) {
        assert_eq!(total_pages(count, per_page), expected);
    }

    #[rstest]
    #[case(1, 10, 0)]
    #[case(3, 10, 20)]
    #[case(0, 10, 0)]
    #[case(i64::MAX, 10, i64::MAX)]
    fn offsets_saturate(#[case] page: i64, #[case] per_page: i64, #[case] expected: i64) {
        assert_eq!(page_offset(page, per_page), expected);
    }
}
