use crate::config::Settings;
use crate::error::CmsError;
use crate::identity::Identity;
use crate::model::comments::{Comment, CommentPage, CommentVersion, NewComment};
use crate::store::CommentStore;
use std::sync::Arc;

/// Comment business rules, independent of how requests arrive.
#[derive(Clone)]
pub struct CommentService {
    store: Arc<dyn CommentStore>,
    moderation: bool,
    per_page: i64,
}

impl CommentService {
    pub fn new(store: Arc<dyn CommentStore>, settings: &Settings) -> Self {
        CommentService {
            store,
            moderation: settings.moderation,
            per_page: settings.per_page,
        }
    }

    /// Comment ids and versions of a post, newest first.
    pub fn list_by_post(
        &self,
        post_id: i32,
        viewer_can_moderate: bool,
    ) -> Result<Vec<CommentVersion>, CmsError> {
        if !self.store.post_exists(post_id)? {
            return Err(CmsError::PostNotFound);
        }

        let mut listing = self.store.comments_for_post(post_id, viewer_can_moderate)?;
        listing.reverse();
        Ok(listing)
    }

    pub fn create(&self, post_id: i32, author_id: i32, body: &str) -> Result<Comment, CmsError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(CmsError::EmptyComment);
        }
        if !self.store.post_exists(post_id)? {
            return Err(CmsError::PostNotFound);
        }

        let comment = self.store.insert_comment(NewComment {
            post_id,
            user_id: author_id,
            body: body.to_owned(),
            version: 1,
            approved: !self.moderation,
        })?;

        log::info!(
            "comment {} created on post {} by user {} (approved: {})",
            comment.id,
            post_id,
            author_id,
            comment.approved
        );
        Ok(comment)
    }

    pub fn get(&self, id: i32) -> Result<Comment, CmsError> {
        self.store.find_comment(id)?.ok_or(CmsError::CommentNotFound)
    }

    /// Replaces the body of a comment if `supplied_version` is still the
    /// stored version. Zero counts as no version at all.
    pub fn update(
        &self,
        id: i32,
        new_body: &str,
        supplied_version: Option<i32>,
    ) -> Result<Comment, CmsError> {
        let new_body = new_body.trim();
        if new_body.is_empty() {
            return Err(CmsError::EmptyComment);
        }

        let stored = self.get(id)?;

        let version = match supplied_version {
            Some(version) if version != 0 => version,
            _ => return Err(CmsError::MissingVersion),
        };

        if version != stored.version {
            log::debug!(
                "rejecting update of comment {}: version {} is stale, stored is {}",
                id,
                version,
                stored.version
            );
            return Err(CmsError::VersionConflict);
        }

        match self.store.update_comment_body(id, version, new_body)? {
            Some(updated) => Ok(updated),
            // Lost a race with another writer between the read and the write.
            None => match self.store.find_comment(id)? {
                Some(_) => Err(CmsError::VersionConflict),
                None => Err(CmsError::CommentNotFound),
            },
        }
    }

    pub fn delete(&self, id: i32) -> Result<(), CmsError> {
        if self.store.delete_comment(id)? {
            log::info!("comment {} deleted", id);
            Ok(())
        } else {
            Err(CmsError::CommentNotFound)
        }
    }

    /// Marks a comment as approved. Approving a comment that does not exist
    /// is not an error.
    pub fn approve(&self, id: i32) -> Result<(), CmsError> {
        if self.store.approve_comment(id)? {
            log::info!("comment {} approved", id);
        } else {
            log::debug!("ignoring approval of missing comment {}", id);
        }
        Ok(())
    }

    /// Approves each of `ids` and returns the ones that exist.
    pub fn approve_many(&self, ids: &[i32]) -> Result<Vec<i32>, CmsError> {
        let mut approved = Vec::with_capacity(ids.len());
        for &id in ids {
            if self.store.approve_comment(id)? {
                approved.push(id);
            }
        }
        log::info!("approved comments {:?}", approved);
        Ok(approved)
    }

    /// Deletes each of `ids` and returns the ones that were removed.
    pub fn delete_many(&self, ids: &[i32]) -> Result<Vec<i32>, CmsError> {
        let mut deleted = Vec::with_capacity(ids.len());
        for &id in ids {
            if self.store.delete_comment(id)? {
                deleted.push(id);
            }
        }
        log::info!("deleted comments {:?}", deleted);
        Ok(deleted)
    }

    /// Comments waiting for approval. Pages start at 1.
    pub fn moderation_queue(&self, page: i64) -> Result<CommentPage, CmsError> {
        let page = page.max(1);
        let (comments, total_pages) = self.store.unapproved_comments(page, self.per_page)?;
        Ok(CommentPage {
            page_number: page,
            total_pages,
            comments,
        })
    }

    /// Only the author and moderators may change or remove a comment. A
    /// missing comment passes, so the operation itself reports it.
    pub fn authorize(&self, id: i32, identity: &Identity) -> Result<(), CmsError> {
        match self.store.find_comment(id)? {
            Some(comment) if comment.user_id != identity.user_id && !identity.can_moderate() => {
                Err(CmsError::Forbidden)
            }
            _ => Ok(()),
        }
    }

    pub fn author_name(&self, user_id: i32) -> Result<String, CmsError> {
        Ok(self
            .store
            .author_name(user_id)?
            .unwrap_or_else(|| format!("User #{}", user_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Role;
    use crate::store::{MemoryStore, StoreResult};
    use rstest::{fixture, rstest};

    const POST: i32 = 1;
    const AUTHOR: i32 = 7;

    fn service_with(moderation: bool) -> (Arc<MemoryStore>, CommentService) {
        let store = Arc::new(MemoryStore::new());
        store.add_post(POST);
        store.add_user(AUTHOR, "Ferris");
        let settings = Settings {
            moderation,
            ..Settings::default()
        };
        let service = CommentService::new(store.clone(), &settings);
        (store, service)
    }

    #[fixture]
    fn service() -> CommentService {
        service_with(false).1
    }

    #[rstest]
    fn create_starts_at_version_one(service: CommentService) {
        let comment = service.create(POST, AUTHOR, "Hello").unwrap();
        assert_eq!(comment.version, 1);
        assert_eq!(comment.body, "Hello");
        assert_eq!(comment.user_id, AUTHOR);
        assert!(comment.approved);
    }

    #[rstest]
    #[case(true, false)]
    #[case(false, true)]
    fn moderation_decides_default_approval(#[case] moderation: bool, #[case] approved: bool) {
        let (_, service) = service_with(moderation);
        let comment = service.create(POST, AUTHOR, "Hello").unwrap();
        assert_eq!(comment.approved, approved);
    }

    #[rstest]
    #[case("")]
    #[case("   \n")]
    fn create_rejects_empty_body(service: CommentService, #[case] body: &str) {
        assert!(matches!(
            service.create(POST, AUTHOR, body),
            Err(CmsError::EmptyComment)
        ));
        assert!(service.list_by_post(POST, true).unwrap().is_empty());
    }

    #[rstest]
    fn create_requires_existing_post(service: CommentService) {
        assert!(matches!(
            service.create(404, AUTHOR, "Hello"),
            Err(CmsError::PostNotFound)
        ));
    }

    #[rstest]
    fn only_authors_and_moderators_may_modify(service: CommentService) {
        let comment = service.create(POST, AUTHOR, "Hello").unwrap();
        let stranger = Identity {
            user_id: AUTHOR + 1,
            role: Role::User,
        };
        let moderator = Identity {
            role: Role::Moderator,
            ..stranger
        };
        let author = Identity {
            user_id: AUTHOR,
            role: Role::User,
        };

        assert!(matches!(
            service.authorize(comment.id, &stranger),
            Err(CmsError::Forbidden)
        ));
        assert!(service.authorize(comment.id, &moderator).is_ok());
        assert!(service.authorize(comment.id, &author).is_ok());
        assert!(service.authorize(comment.id + 1, &stranger).is_ok());
    }

    #[rstest]
    fn version_counts_successful_updates(service: CommentService) {
        let comment = service.create(POST, AUTHOR, "Hello").unwrap();
        for n in 1..=5 {
            let updated = service
                .update(comment.id, &format!("edit {}", n), Some(n))
                .unwrap();
            assert_eq!(updated.version, 1 + n);
        }
        assert_eq!(service.get(comment.id).unwrap().version, 6);
    }

    #[rstest]
    fn stale_update_conflicts_and_leaves_comment_alone(service: CommentService) {
        let comment = service.create(POST, AUTHOR, "Hello").unwrap();

        let updated = service.update(comment.id, "Hi", Some(1)).unwrap();
        assert_eq!(updated.version, 2);
        assert_eq!(updated.body, "Hi");

        assert!(matches!(
            service.update(comment.id, "Too late", Some(1)),
            Err(CmsError::VersionConflict)
        ));
        let stored = service.get(comment.id).unwrap();
        assert_eq!(stored.version, 2);
        assert_eq!(stored.body, "Hi");
    }

    /// Loses every compare-and-swap to a concurrent writer. When
    /// `writer_deletes` is set, that writer removed the comment.
    struct RacingStore {
        inner: MemoryStore,
        writer_deletes: bool,
    }

    impl CommentStore for RacingStore {
        fn post_exists(&self, post_id: i32) -> StoreResult<bool> {
            self.inner.post_exists(post_id)
        }

        fn author_name(&self, user_id: i32) -> StoreResult<Option<String>> {
            self.inner.author_name(user_id)
        }

        fn comments_for_post(
            &self,
            post_id: i32,
            include_unapproved: bool,
        ) -> StoreResult<Vec<CommentVersion>> {
            self.inner.comments_for_post(post_id, include_unapproved)
        }

        fn insert_comment(&self, comment: NewComment) -> StoreResult<Comment> {
            self.inner.insert_comment(comment)
        }

        fn find_comment(&self, id: i32) -> StoreResult<Option<Comment>> {
            self.inner.find_comment(id)
        }

        fn update_comment_body(&self, id: i32, _: i32, _: &str) -> StoreResult<Option<Comment>> {
            if self.writer_deletes {
                self.inner.delete_comment(id)?;
            }
            Ok(None)
        }

        fn delete_comment(&self, id: i32) -> StoreResult<bool> {
            self.inner.delete_comment(id)
        }

        fn approve_comment(&self, id: i32) -> StoreResult<bool> {
            self.inner.approve_comment(id)
        }

        fn unapproved_comments(&self, page: i64, per_page: i64) -> StoreResult<(Vec<Comment>, i64)> {
            self.inner.unapproved_comments(page, per_page)
        }
    }

    fn racing_service(writer_deletes: bool) -> CommentService {
        let inner = MemoryStore::new();
        inner.add_post(POST);
        let store = RacingStore {
            inner,
            writer_deletes,
        };
        CommentService::new(Arc::new(store), &Settings::default())
    }

    #[test]
    fn lost_race_against_an_edit_conflicts() {
        let service = racing_service(false);
        let comment = service.create(POST, AUTHOR, "Hello").unwrap();

        assert!(matches!(
            service.update(comment.id, "Hi", Some(1)),
            Err(CmsError::VersionConflict)
        ));
        assert_eq!(service.get(comment.id).unwrap(), comment);
    }

    #[test]
    fn lost_race_against_a_delete_is_not_found() {
        let service = racing_service(true);
        let comment = service.create(POST, AUTHOR, "Hello").unwrap();

        assert!(matches!(
            service.update(comment.id, "Hi", Some(1)),
            Err(CmsError::CommentNotFound)
        ));
    }

    #[rstest]
    #[case(None)]
    #[case(Some(0))]
    fn update_requires_version(service: CommentService, #[case] version: Option<i32>) {
        let comment = service.create(POST, AUTHOR, "Hello").unwrap();
        assert!(matches!(
            service.update(comment.id, "Hi", version),
            Err(CmsError::MissingVersion)
        ));
        assert_eq!(service.get(comment.id).unwrap().version, 1);
    }

    #[rstest]
    fn update_checks_body_before_lookup(service: CommentService) {
        assert!(matches!(
            service.update(99, "", Some(1)),
            Err(CmsError::EmptyComment)
        ));
        assert!(matches!(
            service.update(99, "Hi", None),
            Err(CmsError::CommentNotFound)
        ));
    }

    #[rstest]
    fn lists_newest_first(service: CommentService) {
        let a = service.create(POST, AUTHOR, "A").unwrap();
        let b = service.create(POST, AUTHOR, "B").unwrap();
        let c = service.create(POST, AUTHOR, "C").unwrap();

        let ids = service
            .list_by_post(POST, false)
            .unwrap()
            .into_iter()
            .map(|entry| entry.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![c.id, b.id, a.id]);
    }

    #[rstest]
    fn listing_unknown_post_fails(service: CommentService) {
        assert!(matches!(
            service.list_by_post(404, false),
            Err(CmsError::PostNotFound)
        ));
    }

    #[test]
    fn unapproved_comments_are_only_listed_for_moderators() {
        let (_, service) = service_with(true);
        let pending = service.create(POST, AUTHOR, "Pending").unwrap();

        assert!(service.list_by_post(POST, false).unwrap().is_empty());
        assert_eq!(
            service.list_by_post(POST, true).unwrap(),
            vec![CommentVersion {
                id: pending.id,
                version: 1
            }]
        );

        service.approve(pending.id).unwrap();
        assert_eq!(service.list_by_post(POST, false).unwrap().len(), 1);
    }

    #[rstest]
    fn delete_is_permanent(service: CommentService) {
        for n in 1..=5 {
            service.create(POST, AUTHOR, &format!("comment {}", n)).unwrap();
        }
        service.delete(5).unwrap();

        assert!(matches!(service.get(5), Err(CmsError::CommentNotFound)));
        assert!(matches!(service.delete(5), Err(CmsError::CommentNotFound)));
        assert_eq!(service.list_by_post(POST, false).unwrap().len(), 4);
    }

    #[test]
    fn approve_is_idempotent() {
        let (_, service) = service_with(true);
        let comment = service.create(POST, AUTHOR, "Hello").unwrap();
        assert!(!comment.approved);

        service.approve(comment.id).unwrap();
        let once = service.get(comment.id).unwrap();
        service.approve(comment.id).unwrap();
        let twice = service.get(comment.id).unwrap();

        assert!(once.approved);
        assert_eq!(once, twice);
    }

    #[test]
    fn approving_missing_comment_is_a_no_op() {
        let (_, service) = service_with(true);
        let comment = service.create(POST, AUTHOR, "Hello").unwrap();

        service.approve(comment.id + 100).unwrap();
        assert_eq!(service.get(comment.id).unwrap(), comment);
    }

    #[test]
    fn moderation_queue_holds_unapproved_comments() {
        let (_, service) = service_with(true);
        let first = service.create(POST, AUTHOR, "one").unwrap();
        let second = service.create(POST, AUTHOR, "two").unwrap();
        service.approve(first.id).unwrap();

        let page = service.moderation_queue(0).unwrap();
        assert_eq!(page.page_number, 1);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.comments, vec![second]);
    }

    #[test]
    fn moderation_queue_past_the_end_is_empty() {
        let (_, service) = service_with(true);
        service.create(POST, AUTHOR, "Pending").unwrap();

        let page = service.moderation_queue(i64::MAX).unwrap();
        assert_eq!(page.page_number, i64::MAX);
        assert_eq!(page.total_pages, 1);
        assert!(page.comments.is_empty());
    }

    #[test]
    fn bulk_actions_report_affected_comments() {
        let (_, service) = service_with(true);
        let first = service.create(POST, AUTHOR, "one").unwrap();
        let second = service.create(POST, AUTHOR, "two").unwrap();
        let third = service.create(POST, AUTHOR, "three").unwrap();

        let approved = service.approve_many(&[first.id, second.id, 99]).unwrap();
        assert_eq!(approved, vec![first.id, second.id]);
        assert_eq!(service.moderation_queue(1).unwrap().comments, vec![third.clone()]);

        let deleted = service.delete_many(&[second.id, third.id, 99]).unwrap();
        assert_eq!(deleted, vec![second.id, third.id]);
        assert_eq!(service.list_by_post(POST, true).unwrap().len(), 1);
    }

    #[test]
    fn author_name_falls_back_to_id() {
        let (_, service) = service_with(false);
        assert_eq!(service.author_name(AUTHOR).unwrap(), "Ferris");
        assert_eq!(service.author_name(3).unwrap(), "User #3");
    }
}
