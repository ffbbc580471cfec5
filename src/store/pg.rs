use super::{page_offset, total_pages, CommentStore, PageStore, StoreResult};
use crate::model::comments::{Comment, CommentVersion, NewComment};
use crate::model::pages::{NewPage, Page, PageChangeset, PageSearchHit};
use crate::schema::{comments, page_categories, pages, posts, users};
use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub type PgPool = Pool<ConnectionManager<PgConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn connect(database_url: &str) -> Result<Self, failure::Error> {
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let pool = Pool::builder().build(manager)?;
        Ok(PgStore { pool })
    }

    pub fn run_pending_migrations(&self) -> Result<(), failure::Error> {
        let mut conn = self.pool.get()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| failure::format_err!("failed to run migrations: {}", e))?;
        for version in applied {
            log::info!("applied migration {}", version);
        }
        Ok(())
    }

    fn conn(&self) -> StoreResult<PooledConnection<ConnectionManager<PgConnection>>> {
        Ok(self.pool.get()?)
    }
}

impl CommentStore for PgStore {
    fn post_exists(&self, post_id: i32) -> StoreResult<bool> {
        let mut conn = self.conn()?;
        Ok(diesel::select(diesel::dsl::exists(posts::table.find(post_id))).get_result(&mut conn)?)
    }

    fn author_name(&self, user_id: i32) -> StoreResult<Option<String>> {
        let mut conn = self.conn()?;
        Ok(users::table
            .find(user_id)
            .select(users::name)
            .first(&mut conn)
            .optional()?)
    }

    fn comments_for_post(
        &self,
        post_id: i32,
        include_unapproved: bool,
    ) -> StoreResult<Vec<CommentVersion>> {
        let mut conn = self.conn()?;
        let mut query = comments::table
            .filter(comments::post_id.eq(post_id))
            .select((comments::id, comments::version))
            .order_by(comments::id)
            .into_boxed();

        if !include_unapproved {
            query = query.filter(comments::approved.eq(true));
        }

        Ok(query.load(&mut conn)?)
    }

    fn insert_comment(&self, comment: NewComment) -> StoreResult<Comment> {
        let mut conn = self.conn()?;
        Ok(diesel::insert_into(comments::table)
            .values(comment)
            .get_result(&mut conn)?)
    }

    fn find_comment(&self, id: i32) -> StoreResult<Option<Comment>> {
        let mut conn = self.conn()?;
        Ok(comments::table.find(id).first(&mut conn).optional()?)
    }

    fn update_comment_body(
        &self,
        id: i32,
        expected_version: i32,
        body: &str,
    ) -> StoreResult<Option<Comment>> {
        let mut conn = self.conn()?;
        let target = comments::table
            .filter(comments::id.eq(id))
            .filter(comments::version.eq(expected_version));

        Ok(diesel::update(target)
            .set((
                comments::body.eq(body),
                comments::version.eq(comments::version + 1),
            ))
            .get_result(&mut conn)
            .optional()?)
    }

    fn delete_comment(&self, id: i32) -> StoreResult<bool> {
        let mut conn = self.conn()?;
        let removed = diesel::delete(comments::table.find(id)).execute(&mut conn)?;
        Ok(removed > 0)
    }

    fn approve_comment(&self, id: i32) -> StoreResult<bool> {
        let mut conn = self.conn()?;
        let touched = diesel::update(comments::table.find(id))
            .set(comments::approved.eq(true))
            .execute(&mut conn)?;
        Ok(touched > 0)
    }

    fn unapproved_comments(&self, page: i64, per_page: i64) -> StoreResult<(Vec<Comment>, i64)> {
        let mut conn = self.conn()?;
        let count: i64 = comments::table
            .filter(comments::approved.eq(false))
            .count()
            .get_result(&mut conn)?;

        let items = comments::table
            .filter(comments::approved.eq(false))
            .order_by(comments::created_at)
            .then_order_by(comments::id)
            .limit(per_page)
            .offset(page_offset(page, per_page))
            .load(&mut conn)?;

        Ok((items, total_pages(count, per_page)))
    }
}

impl PageStore for PgStore {
    fn find_page(&self, slug: &str) -> StoreResult<Option<Page>> {
        let mut conn = self.conn()?;
        Ok(pages::table
            .filter(pages::slug.eq(slug))
            .first(&mut conn)
            .optional()?)
    }

    fn insert_page(&self, page: NewPage) -> StoreResult<Page> {
        let mut conn = self.conn()?;
        Ok(diesel::insert_into(pages::table)
            .values(page)
            .get_result(&mut conn)?)
    }

    fn update_page(&self, id: i32, changes: PageChangeset) -> StoreResult<Page> {
        let mut conn = self.conn()?;
        Ok(diesel::update(pages::table.find(id))
            .set((changes, pages::updated_at.eq(Utc::now())))
            .get_result(&mut conn)?)
    }

    fn delete_page(&self, id: i32) -> StoreResult<()> {
        let mut conn = self.conn()?;
        diesel::delete(pages::table.find(id)).execute(&mut conn)?;
        Ok(())
    }

    fn page_categories(&self, page_id: i32) -> StoreResult<Vec<String>> {
        let mut conn = self.conn()?;
        Ok(page_categories::table
            .filter(page_categories::page_id.eq(page_id))
            .select(page_categories::category)
            .order_by(page_categories::category)
            .load(&mut conn)?)
    }

    fn save_page_categories(&self, page_id: i32, categories: &[String]) -> StoreResult<()> {
        if categories.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn()?;
        let rows = categories
            .iter()
            .map(|category| {
                (
                    page_categories::page_id.eq(page_id),
                    page_categories::category.eq(category),
                )
            })
            .collect::<Vec<_>>();

        diesel::insert_into(page_categories::table)
            .values(rows)
            .on_conflict_do_nothing()
            .execute(&mut conn)?;
        Ok(())
    }

    fn delete_page_categories(&self, page_id: i32) -> StoreResult<()> {
        let mut conn = self.conn()?;
        diesel::delete(page_categories::table.filter(page_categories::page_id.eq(page_id)))
            .execute(&mut conn)?;
        Ok(())
    }

    fn search_pages(&self, prefix: &str) -> StoreResult<Vec<PageSearchHit>> {
        let mut conn = self.conn()?;
        let pattern = format!("{}%", escape_like(prefix));
        Ok(pages::table
            .filter(pages::title.like(pattern))
            .select((pages::id, pages::title))
            .order_by(pages::title)
            .load(&mut conn)?)
    }
}

fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn escapes_like_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("About"), "About");
    }
}
