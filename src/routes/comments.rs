use super::blocking;
use crate::error::CmsError;
use crate::identity::Identity;
use crate::messages::MessageKey;
use crate::model::comments::Comment;
use crate::render::CommentView;
use crate::AppState;
use actix_web::http::header;
use actix_web::web::{self, Data, Form, Json, Path, Query};
use actix_web::{Either, HttpRequest, HttpResponse};
use serde::{Deserialize, Deserializer};
use serde_json::json;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/posts/{post_id}/comments")
            .route(web::get().to(index))
            .route(web::post().to(store)),
    );

    cfg.service(web::resource("/posts/{post_id}/comments/{id}").route(web::get().to(show)));

    cfg.service(
        web::resource("/comments/{id}")
            .route(web::put().to(update))
            .route(web::patch().to(update))
            .route(web::delete().to(destroy)),
    );

    cfg.service(web::resource("/comments/{id}/approve").route(web::get().to(approve)));

    cfg.service(
        web::resource("/manage/comments")
            .route(web::get().to(manage))
            .route(web::post().to(bulk)),
    );
}

/// Comment form fields. Browsers post these urlencoded, scripts as json.
#[derive(Deserialize, Debug, Default)]
struct CommentInput {
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    version: Option<VersionField>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
enum VersionField {
    Number(i64),
    Text(String),
}

impl VersionField {
    /// The version as the service understands it. Anything that is not a
    /// usable integer counts as no version at all.
    fn value(&self) -> Option<i32> {
        let number = match self {
            VersionField::Number(n) => *n,
            VersionField::Text(text) => text.trim().parse().ok()?,
        };
        i32::try_from(number).ok().filter(|v| *v != 0)
    }
}

type CommentForm = Either<Json<CommentInput>, Form<CommentInput>>;

fn form_input(form: CommentForm) -> CommentInput {
    match form {
        Either::Left(Json(input)) => input,
        Either::Right(Form(input)) => input,
    }
}

fn render(state: &AppState, comment: &Comment, author: &str) -> Result<String, CmsError> {
    state.renderer.comment(CommentView { comment, author })
}

async fn index(
    state: Data<AppState>,
    post_id: Path<i32>,
    viewer: Option<Identity>,
) -> Result<HttpResponse, CmsError> {
    let post_id = post_id.into_inner();
    let can_moderate = viewer.map_or(false, |v| v.can_moderate());
    let comments = state.comments.clone();

    match blocking(move || comments.list_by_post(post_id, can_moderate)).await {
        Ok(listing) => Ok(HttpResponse::Ok().json(listing)),
        Err(CmsError::PostNotFound) => {
            log::debug!("comment listing requested for missing post {}", post_id);
            Ok(HttpResponse::NotFound().json(json!({
                "success": false,
                "code": 404,
                "msg": state.messages.get(MessageKey::CommentViewError),
                "url": state.settings.posts_url,
            })))
        }
        Err(e) => Err(e),
    }
}

async fn store(
    state: Data<AppState>,
    post_id: Path<i32>,
    identity: Identity,
    form: CommentForm,
) -> Result<HttpResponse, CmsError> {
    let post_id = post_id.into_inner();
    let body = form_input(form).body.unwrap_or_default();
    let comments = state.comments.clone();

    let (comment, author) = blocking(move || {
        let comment = comments.create(post_id, identity.user_id, &body)?;
        let author = comments.author_name(comment.user_id)?;
        Ok((comment, author))
    })
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "msg": state.messages.get(MessageKey::CommentStoreSuccess),
        "contents": render(&state, &comment, &author)?,
        "comment_id": comment.id,
    })))
}

async fn show(state: Data<AppState>, path: Path<(i32, i32)>) -> Result<HttpResponse, CmsError> {
    let (_post_id, id) = path.into_inner();
    let comments = state.comments.clone();

    let (comment, author) = blocking(move || {
        let comment = comments.get(id)?;
        let author = comments.author_name(comment.user_id)?;
        Ok((comment, author))
    })
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "contents": render(&state, &comment, &author)?,
        "comment_text": state.renderer.comment_text(&comment.body),
        "comment_id": comment.id,
        "comment_ver": comment.version,
    })))
}

async fn update(
    state: Data<AppState>,
    id: Path<i32>,
    identity: Identity,
    form: CommentForm,
) -> Result<HttpResponse, CmsError> {
    let id = id.into_inner();
    let input = form_input(form);
    let body = input.body.unwrap_or_default();
    let version = input.version.as_ref().and_then(VersionField::value);
    let comments = state.comments.clone();

    let (comment, author) = blocking(move || {
        comments.authorize(id, &identity)?;
        let comment = comments.update(id, &body, version)?;
        let author = comments.author_name(comment.user_id)?;
        Ok((comment, author))
    })
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "msg": state.messages.get(MessageKey::CommentUpdateSuccess),
        "contents": render(&state, &comment, &author)?,
        "comment_text": state.renderer.comment_text(&comment.body),
        "comment_id": comment.id,
        "comment_ver": comment.version,
    })))
}

async fn destroy(
    state: Data<AppState>,
    id: Path<i32>,
    identity: Identity,
) -> Result<HttpResponse, CmsError> {
    let id = id.into_inner();
    let comments = state.comments.clone();

    blocking(move || {
        comments.authorize(id, &identity)?;
        comments.delete(id)
    })
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "msg": state.messages.get(MessageKey::CommentDeleteSuccess),
        "comment_id": id,
    })))
}

async fn approve(
    state: Data<AppState>,
    req: HttpRequest,
    id: Path<i32>,
    identity: Identity,
) -> Result<HttpResponse, CmsError> {
    identity.require_moderator()?;

    let id = id.into_inner();
    let comments = state.comments.clone();
    blocking(move || comments.approve(id)).await?;

    let back = req
        .headers()
        .get(header::REFERER)
        .and_then(|referer| referer.to_str().ok())
        .unwrap_or(&state.settings.posts_url)
        .to_owned();

    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, back))
        .finish())
}

#[derive(Deserialize, Debug)]
struct PageQuery {
    page: Option<i64>,
}

async fn manage(
    state: Data<AppState>,
    identity: Identity,
    Query(query): Query<PageQuery>,
) -> Result<HttpResponse, CmsError> {
    identity.require_moderator()?;

    let comments = state.comments.clone();
    let page = blocking(move || comments.moderation_queue(query.page.unwrap_or(1))).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum BulkAction {
    Approve,
    Delete,
}

/// Selection posted by the manager view.
#[derive(Deserialize, Debug)]
struct BulkInput {
    action: BulkAction,
    #[serde(default, deserialize_with = "id_list")]
    ids: Vec<i32>,
}

/// A json array of ids, or the comma separated list a form sends.
fn id_list<'de, D>(deserializer: D) -> Result<Vec<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Ids {
        Many(Vec<i32>),
        Joined(String),
    }

    match Ids::deserialize(deserializer)? {
        Ids::Many(ids) => Ok(ids),
        Ids::Joined(joined) => joined
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| id.parse().map_err(serde::de::Error::custom))
            .collect(),
    }
}

async fn bulk(
    state: Data<AppState>,
    identity: Identity,
    form: Either<Json<BulkInput>, Form<BulkInput>>,
) -> Result<HttpResponse, CmsError> {
    identity.require_moderator()?;

    let BulkInput { action, ids } = match form {
        Either::Left(Json(input)) => input,
        Either::Right(Form(input)) => input,
    };
    let comments = state.comments.clone();
    let affected = blocking(move || match action {
        BulkAction::Approve => comments.approve_many(&ids),
        BulkAction::Delete => comments.delete_many(&ids),
    })
    .await?;

    let msg = match action {
        BulkAction::Approve => MessageKey::CommentsApproveSuccess,
        BulkAction::Delete => MessageKey::CommentsDeleteSuccess,
    };
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "msg": state.messages.get(msg),
        "comment_ids": affected,
    })))
}
