//! Client side of the comment endpoints.
//!
//! A [`CommentAgent`] drives one comment list view. It lets a single mutating
//! request per view be in flight: an action that arrives while another one is
//! still running is dropped, not queued. Server responses that do not have
//! the expected success shape are ignored without surfacing an error, the
//! same as the browser scripts do.

use crate::messages::{English, MessageKey, Messages};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};

/// The part of the page that shows a post's comments.
pub trait CommentListView: Send {
    /// Removes a comment. Returns once the removal is fully rendered.
    fn remove_comment(&mut self, comment_id: i32);

    /// Replaces the rendered body of a comment and remembers its version.
    fn replace_comment(&mut self, comment_id: i32, html: &str, version: i32);

    fn is_empty(&self) -> bool;

    /// Shows the "no comments" placeholder in place of the list.
    fn show_placeholder(&mut self, text: &str);
}

/// What became of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Another action of this view was still running.
    Dropped,
    /// The request failed or the server answered with an error status.
    Failed,
    /// The server answered, but not with a success payload.
    Ignored,
    Applied { comment_id: i32 },
}

#[derive(Deserialize, Debug)]
struct Envelope {
    #[serde(default)]
    success: Value,
    #[serde(default)]
    msg: Value,
    #[serde(default)]
    comment_id: Value,
    #[serde(default)]
    comment_text: Option<String>,
    #[serde(default)]
    comment_ver: Option<i32>,
}

impl Envelope {
    /// The id of the affected comment if this is a well formed success
    /// response.
    fn accepted_id(&self) -> Option<i32> {
        if self.success != Value::Bool(true) {
            return None;
        }
        match &self.msg {
            Value::String(msg) if !msg.is_empty() => {}
            _ => return None,
        }
        let id = match &self.comment_id {
            Value::Number(n) => n.as_i64()?,
            Value::String(s) => s.trim().parse().ok()?,
            _ => return None,
        };
        i32::try_from(id).ok().filter(|id| *id != 0)
    }
}

pub struct CommentAgent<V> {
    http: reqwest::Client,
    token: String,
    gate: Arc<Semaphore>,
    messages: Arc<dyn Messages>,
    view: Mutex<V>,
}

impl<V: CommentListView> CommentAgent<V> {
    /// `token` is the csrf token sent along with every mutating request.
    pub fn new(view: V, token: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), view, token)
    }

    pub fn with_client(http: reqwest::Client, view: V, token: impl Into<String>) -> Self {
        CommentAgent {
            http,
            token: token.into(),
            gate: Arc::new(Semaphore::new(1)),
            messages: Arc::new(English),
            view: Mutex::new(view),
        }
    }

    pub fn with_messages(mut self, messages: Arc<dyn Messages>) -> Self {
        self.messages = messages;
        self
    }

    /// Whether an action is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.gate.available_permits() == 0
    }

    pub fn view(&self) -> &Mutex<V> {
        &self.view
    }

    pub fn into_view(self) -> V {
        self.view.into_inner()
    }

    /// Deletes the comment behind `url` and removes it from the view.
    pub async fn delete(&self, url: &str) -> ActionOutcome {
        let _permit = match self.enter() {
            Some(permit) => permit,
            None => return ActionOutcome::Dropped,
        };

        let request = self
            .http
            .delete(url)
            .form(&[("_token", self.token.as_str())]);
        let envelope = match send(request).await {
            Ok(Some(envelope)) => envelope,
            Ok(None) => return ActionOutcome::Ignored,
            Err(()) => return ActionOutcome::Failed,
        };
        let comment_id = match envelope.accepted_id() {
            Some(id) => id,
            None => return ActionOutcome::Ignored,
        };

        let mut view = self.view.lock().await;
        view.remove_comment(comment_id);
        if view.is_empty() {
            view.show_placeholder(&self.messages.get(MessageKey::NoComments));
        }
        ActionOutcome::Applied { comment_id }
    }

    /// Saves a new body for the comment behind `url`, guarded by the version
    /// the view last saw.
    pub async fn update(&self, url: &str, body: &str, version: i32) -> ActionOutcome {
        let _permit = match self.enter() {
            Some(permit) => permit,
            None => return ActionOutcome::Dropped,
        };

        let version = version.to_string();
        let request = self.http.put(url).form(&[
            ("_token", self.token.as_str()),
            ("body", body),
            ("version", version.as_str()),
        ]);
        let envelope = match send(request).await {
            Ok(Some(envelope)) => envelope,
            Ok(None) => return ActionOutcome::Ignored,
            Err(()) => return ActionOutcome::Failed,
        };
        let (comment_id, html, version) = match (
            envelope.accepted_id(),
            envelope.comment_text.as_deref(),
            envelope.comment_ver,
        ) {
            (Some(id), Some(html), Some(version)) => (id, html, version),
            _ => return ActionOutcome::Ignored,
        };

        self.view
            .lock()
            .await
            .replace_comment(comment_id, html, version);
        ActionOutcome::Applied { comment_id }
    }

    fn enter(&self) -> Option<OwnedSemaphorePermit> {
        match self.gate.clone().try_acquire_owned() {
            Ok(permit) => Some(permit),
            Err(_) => {
                log::debug!("comment action dropped, another one is in flight");
                None
            }
        }
    }
}

/// Sends a request. `Err` for transport failures and error statuses,
/// `Ok(None)` for a 2xx answer that is not a json object.
async fn send(request: reqwest::RequestBuilder) -> Result<Option<Envelope>, ()> {
    let response = match request.send().await.and_then(|r| r.error_for_status()) {
        Ok(response) => response,
        Err(e) => {
            log::debug!("comment request failed: {}", e);
            return Err(());
        }
    };

    match response.json::<Envelope>().await {
        Ok(envelope) => Ok(Some(envelope)),
        Err(e) => {
            log::debug!("ignoring unexpected comment response: {}", e);
            Ok(None)
        }
    }
}
