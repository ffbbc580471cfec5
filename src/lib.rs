#[macro_use]
extern crate diesel;

pub mod client;
pub mod config;
pub mod error;
pub mod identity;
pub mod messages;
pub mod model;
pub mod render;
pub mod routes;
pub mod schema;
pub mod service;
pub mod store;

use crate::config::Settings;
use crate::identity::{HeaderIdentity, IdentityProvider};
use crate::messages::{English, Messages};
use crate::render::{HtmlRenderer, Renderer};
use crate::service::{CommentService, PageService};
use crate::store::{CommentStore, PageStore};
use std::sync::Arc;

/// Shared by every worker of the http server.
pub struct AppState {
    pub comments: CommentService,
    pub pages: PageService,
    pub renderer: Arc<dyn Renderer>,
    pub messages: Arc<dyn Messages>,
    pub identity: Arc<dyn IdentityProvider>,
    pub settings: Settings,
}

impl AppState {
    /// Wires the services to `store` with the default collaborators.
    pub fn new<S>(store: Arc<S>, settings: Settings) -> Self
    where
        S: CommentStore + PageStore + 'static,
    {
        let comment_store: Arc<dyn CommentStore> = store.clone();
        let page_store: Arc<dyn PageStore> = store;

        AppState {
            comments: CommentService::new(comment_store, &settings),
            pages: PageService::new(page_store),
            renderer: Arc::new(HtmlRenderer),
            messages: Arc::new(English),
            identity: Arc::new(HeaderIdentity),
            settings,
        }
    }
}
