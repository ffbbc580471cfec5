use super::{page_offset, total_pages, CommentStore, PageStore, StoreResult};
use crate::model::comments::{Comment, CommentVersion, NewComment};
use crate::model::pages::{NewPage, Page, PageChangeset, PageSearchHit};
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Default)]
struct Tables {
    users: HashMap<i32, String>,
    posts: BTreeSet<i32>,
    comments: BTreeMap<i32, Comment>,
    pages: BTreeMap<i32, Page>,
    page_categories: BTreeMap<i32, BTreeSet<String>>,
    next_comment_id: i32,
    next_page_id: i32,
}

/// Store backed by process memory. Ids are handed out sequentially starting
/// at 1, like a fresh `SERIAL` column.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, id: i32, name: &str) {
        self.tables.write().users.insert(id, name.to_owned());
    }

    pub fn add_post(&self, id: i32) {
        self.tables.write().posts.insert(id);
    }

    pub fn remove_post(&self, id: i32) {
        let mut tables = self.tables.write();
        tables.posts.remove(&id);
        tables.comments.retain(|_, comment| comment.post_id != id);
    }
}

impl CommentStore for MemoryStore {
    fn post_exists(&self, post_id: i32) -> StoreResult<bool> {
        Ok(self.tables.read().posts.contains(&post_id))
    }

    fn author_name(&self, user_id: i32) -> StoreResult<Option<String>> {
        Ok(self.tables.read().users.get(&user_id).cloned())
    }

    fn comments_for_post(
        &self,
        post_id: i32,
        include_unapproved: bool,
    ) -> StoreResult<Vec<CommentVersion>> {
        Ok(self
            .tables
            .read()
            .comments
            .values()
            .filter(|c| c.post_id == post_id && (include_unapproved || c.approved))
            .map(CommentVersion::from)
            .collect())
    }

    fn insert_comment(&self, comment: NewComment) -> StoreResult<Comment> {
        let mut tables = self.tables.write();
        tables.next_comment_id += 1;
        let stored = Comment {
            id: tables.next_comment_id,
            post_id: comment.post_id,
            user_id: comment.user_id,
            body: comment.body,
            version: comment.version,
            approved: comment.approved,
            created_at: Utc::now(),
        };
        tables.comments.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn find_comment(&self, id: i32) -> StoreResult<Option<Comment>> {
        Ok(self.tables.read().comments.get(&id).cloned())
    }

    fn update_comment_body(
        &self,
        id: i32,
        expected_version: i32,
        body: &str,
    ) -> StoreResult<Option<Comment>> {
        let mut tables = self.tables.write();
        Ok(match tables.comments.get_mut(&id) {
            Some(comment) if comment.version == expected_version => {
                comment.body = body.to_owned();
                comment.version += 1;
                Some(comment.clone())
            }
            _ => None,
        })
    }

    fn delete_comment(&self, id: i32) -> StoreResult<bool> {
        Ok(self.tables.write().comments.remove(&id).is_some())
    }

    fn approve_comment(&self, id: i32) -> StoreResult<bool> {
        Ok(match self.tables.write().comments.get_mut(&id) {
            Some(comment) => {
                comment.approved = true;
                true
            }
            None => false,
        })
    }

    fn unapproved_comments(&self, page: i64, per_page: i64) -> StoreResult<(Vec<Comment>, i64)> {
        let tables = self.tables.read();
        let mut pending = tables
            .comments
            .values()
            .filter(|c| !c.approved)
            .cloned()
            .collect::<Vec<_>>();
        pending.sort_by_key(|c| (c.created_at, c.id));

        let count = pending.len() as i64;
        let items = pending
            .into_iter()
            .skip(usize::try_from(page_offset(page, per_page)).unwrap_or(usize::MAX))
            .take(usize::try_from(per_page).unwrap_or(0))
            .collect();

        Ok((items, total_pages(count, per_page)))
    }
}

impl PageStore for MemoryStore {
    fn find_page(&self, slug: &str) -> StoreResult<Option<Page>> {
        Ok(self
            .tables
            .read()
            .pages
            .values()
            .find(|page| page.slug == slug)
            .cloned())
    }

    fn insert_page(&self, page: NewPage) -> StoreResult<Page> {
        let mut tables = self.tables.write();
        tables.next_page_id += 1;
        let now = Utc::now();
        let stored = Page {
            id: tables.next_page_id,
            title: page.title,
            nav_title: page.nav_title,
            slug: page.slug,
            body: page.body,
            css: page.css,
            js: page.js,
            show_title: page.show_title,
            show_nav: page.show_nav,
            icon: page.icon,
            user_id: page.user_id,
            created_at: now,
            updated_at: now,
        };
        tables.pages.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn update_page(&self, id: i32, changes: PageChangeset) -> StoreResult<Page> {
        let mut tables = self.tables.write();
        let page = tables
            .pages
            .get_mut(&id)
            .ok_or(diesel::result::Error::NotFound)?;

        page.title = changes.title;
        page.nav_title = changes.nav_title;
        page.slug = changes.slug;
        page.body = changes.body;
        page.css = changes.css;
        page.js = changes.js;
        page.show_title = changes.show_title;
        page.show_nav = changes.show_nav;
        page.icon = changes.icon;
        page.updated_at = Utc::now();
        Ok(page.clone())
    }

    fn delete_page(&self, id: i32) -> StoreResult<()> {
        let mut tables = self.tables.write();
        tables.pages.remove(&id);
        tables.page_categories.remove(&id);
        Ok(())
    }

    fn page_categories(&self, page_id: i32) -> StoreResult<Vec<String>> {
        Ok(self
            .tables
            .read()
            .page_categories
            .get(&page_id)
            .map(|categories| categories.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn save_page_categories(&self, page_id: i32, categories: &[String]) -> StoreResult<()> {
        self.tables
            .write()
            .page_categories
            .entry(page_id)
            .or_default()
            .extend(categories.iter().cloned());
        Ok(())
    }

    fn delete_page_categories(&self, page_id: i32) -> StoreResult<()> {
        self.tables.write().page_categories.remove(&page_id);
        Ok(())
    }

    fn search_pages(&self, prefix: &str) -> StoreResult<Vec<PageSearchHit>> {
        let mut hits = self
            .tables
            .read()
            .pages
            .values()
            .filter(|page| page.title.starts_with(prefix))
            .map(|page| PageSearchHit {
                id: page.id,
                text: page.title.clone(),
            })
            .collect::<Vec<_>>();
        hits.sort_by(|a, b| a.text.cmp(&b.text));
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_comment(post_id: i32, approved: bool) -> NewComment {
        NewComment {
            post_id,
            user_id: 1,
            body: "Hello".to_owned(),
            version: 1,
            approved,
        }
    }

    #[test]
    fn compare_and_swap_only_matches_current_version() {
        let store = MemoryStore::new();
        let comment = store.insert_comment(new_comment(1, true)).unwrap();

        let updated = store.update_comment_body(comment.id, 1, "Hi").unwrap().unwrap();
        assert_eq!(updated.version, 2);
        assert_eq!(updated.body, "Hi");

        assert_eq!(store.update_comment_body(comment.id, 1, "Stale").unwrap(), None);
        let stored = store.find_comment(comment.id).unwrap().unwrap();
        assert_eq!(stored.body, "Hi");
        assert_eq!(stored.version, 2);
    }

    #[test]
    fn lists_comments_in_insertion_order() {
        let store = MemoryStore::new();
        let first = store.insert_comment(new_comment(1, true)).unwrap();
        let hidden = store.insert_comment(new_comment(1, false)).unwrap();
        store.insert_comment(new_comment(2, true)).unwrap();
        let last = store.insert_comment(new_comment(1, true)).unwrap();

        let ids = |rows: Vec<CommentVersion>| rows.into_iter().map(|r| r.id).collect::<Vec<_>>();
        assert_eq!(ids(store.comments_for_post(1, false).unwrap()), vec![first.id, last.id]);
        assert_eq!(
            ids(store.comments_for_post(1, true).unwrap()),
            vec![first.id, hidden.id, last.id]
        );
    }

    #[test]
    fn paginates_unapproved_comments() {
        let store = MemoryStore::new();
        for _ in 0..5 {
            store.insert_comment(new_comment(1, false)).unwrap();
        }
        store.insert_comment(new_comment(1, true)).unwrap();

        let (first, pages) = store.unapproved_comments(1, 2).unwrap();
        assert_eq!(pages, 3);
        assert_eq!(first.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1, 2]);

        let (last, _) = store.unapproved_comments(3, 2).unwrap();
        assert_eq!(last.iter().map(|c| c.id).collect::<Vec<_>>(), vec![5]);
    }

    #[test]
    fn removing_a_post_drops_its_comments() {
        let store = MemoryStore::new();
        store.add_post(1);
        let comment = store.insert_comment(new_comment(1, true)).unwrap();

        store.remove_post(1);
        assert!(!store.post_exists(1).unwrap());
        assert_eq!(store.find_comment(comment.id).unwrap(), None);
    }
}
