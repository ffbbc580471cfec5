pub mod comments;
pub mod pages;

use crate::error::CmsError;
use actix_web::web;

pub fn config(cfg: &mut web::ServiceConfig) {
    comments::config(cfg);
    pages::config(cfg);
}

/// Runs store-bound work on the blocking thread pool.
pub(crate) async fn blocking<F, T>(f: F) -> Result<T, CmsError>
where
    F: FnOnce() -> Result<T, CmsError> + Send + 'static,
    T: Send + 'static,
{
    web::block(f).await?
}
