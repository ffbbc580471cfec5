use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use diesel::r2d2::PoolError;
use failure::Fail;
use serde_json::json;

#[derive(Debug, Fail)]
pub enum CmsError {
    #[fail(display = "Your comment was empty.")]
    EmptyComment,
    #[fail(display = "No version data was supplied.")]
    MissingVersion,
    #[fail(display = "The comment was modified by someone else.")]
    VersionConflict,
    #[fail(display = "Comment Not Found.")]
    CommentNotFound,
    #[fail(display = "Post Not Found.")]
    PostNotFound,
    #[fail(display = "Page Not Found")]
    PageNotFound,
    #[fail(display = "The homepage is missing.")]
    HomepageMissing,
    #[fail(display = "The homepage slug cannot be changed.")]
    HomepageSlug,
    #[fail(display = "The homepage must be shown in the navigation bar.")]
    HomepageNav,
    #[fail(display = "The homepage cannot be deleted.")]
    HomepageDelete,
    #[fail(display = "{}", _0)]
    InvalidPage(String),
    #[fail(display = "You must be signed in to do that.")]
    Unauthenticated,
    #[fail(display = "You do not have permission to do that.")]
    Forbidden,
    #[fail(display = "database error: {}", _0)]
    Database(#[cause] diesel::result::Error),
    #[fail(display = "connection pool error: {}", _0)]
    Pool(#[cause] PoolError),
    #[fail(display = "blocking task was cancelled")]
    Canceled,
    #[fail(display = "failed to render template: {}", _0)]
    Render(#[cause] askama::Error),
}

impl CmsError {
    /// Whether the failure comes from the storage layer rather than the caller.
    pub fn is_internal(&self) -> bool {
        match self {
            CmsError::Database(_)
            | CmsError::Pool(_)
            | CmsError::Canceled
            | CmsError::Render(_)
            | CmsError::HomepageMissing => true,
            _ => false,
        }
    }
}

impl From<diesel::result::Error> for CmsError {
    fn from(e: diesel::result::Error) -> Self {
        CmsError::Database(e)
    }
}

impl From<PoolError> for CmsError {
    fn from(e: PoolError) -> Self {
        CmsError::Pool(e)
    }
}

impl From<askama::Error> for CmsError {
    fn from(e: askama::Error) -> Self {
        CmsError::Render(e)
    }
}

impl From<actix_web::error::BlockingError> for CmsError {
    fn from(_: actix_web::error::BlockingError) -> Self {
        CmsError::Canceled
    }
}

impl ResponseError for CmsError {
    fn status_code(&self) -> StatusCode {
        match self {
            CmsError::EmptyComment
            | CmsError::MissingVersion
            | CmsError::HomepageSlug
            | CmsError::HomepageNav
            | CmsError::HomepageDelete
            | CmsError::InvalidPage(_) => StatusCode::BAD_REQUEST,
            CmsError::VersionConflict => StatusCode::CONFLICT,
            CmsError::CommentNotFound | CmsError::PostNotFound | CmsError::PageNotFound => {
                StatusCode::NOT_FOUND
            }
            CmsError::Unauthenticated => StatusCode::UNAUTHORIZED,
            CmsError::Forbidden => StatusCode::FORBIDDEN,
            CmsError::HomepageMissing
            | CmsError::Database(_)
            | CmsError::Pool(_)
            | CmsError::Canceled
            | CmsError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let msg = if self.is_internal() {
            log::error!("request failed: {}", self);
            "Something went wrong on our end.".to_owned()
        } else {
            self.to_string()
        };

        HttpResponse::build(status).json(json!({
            "success": false,
            "code": status.as_u16(),
            "msg": msg,
        }))
    }
}
