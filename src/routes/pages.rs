use super::blocking;
use crate::error::CmsError;
use crate::identity::Identity;
use crate::messages::MessageKey;
use crate::model::pages::{PageInput, HOMEPAGE_SLUG};
use crate::AppState;
use actix_web::http::header;
use actix_web::web::{self, Data, Form, Json, Path, Query};
use actix_web::{Either, HttpResponse};
use serde::Deserialize;
use serde_json::json;

/// Page forms arrive as json from scripts and urlencoded from browsers.
type PageForm = Either<Json<PageInput>, Form<PageInput>>;

fn form_input(form: PageForm) -> PageInput {
    match form {
        Either::Left(Json(input)) => input,
        Either::Right(Form(input)) => input,
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/pages")
            .route(web::get().to(index))
            .route(web::post().to(store)),
    );

    cfg.service(web::resource("/pages/search").route(web::get().to(search)));

    cfg.service(
        web::resource("/pages/{slug}")
            .route(web::get().to(show))
            .route(web::put().to(update))
            .route(web::patch().to(update))
            .route(web::delete().to(destroy)),
    );
}

async fn index() -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, format!("/pages/{}", HOMEPAGE_SLUG)))
        .finish()
}

async fn store(
    state: Data<AppState>,
    identity: Identity,
    form: PageForm,
) -> Result<HttpResponse, CmsError> {
    identity.require_editor()?;

    let input = form_input(form);
    let pages = state.pages.clone();
    let page = blocking(move || pages.create(input, identity.user_id)).await?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "msg": state.messages.get(MessageKey::PageStoreSuccess),
        "page": page,
    })))
}

async fn show(state: Data<AppState>, slug: Path<String>) -> Result<HttpResponse, CmsError> {
    let pages = state.pages.clone();
    let page = blocking(move || pages.show(&slug)).await?;
    Ok(HttpResponse::Ok().json(page))
}

async fn update(
    state: Data<AppState>,
    identity: Identity,
    slug: Path<String>,
    form: PageForm,
) -> Result<HttpResponse, CmsError> {
    identity.require_editor()?;

    let input = form_input(form);
    let pages = state.pages.clone();
    let page = blocking(move || pages.update(&slug, input)).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "msg": state.messages.get(MessageKey::PageUpdateSuccess),
        "page": page,
    })))
}

async fn destroy(
    state: Data<AppState>,
    identity: Identity,
    slug: Path<String>,
) -> Result<HttpResponse, CmsError> {
    identity.require_editor()?;

    let pages = state.pages.clone();
    blocking(move || pages.destroy(&slug)).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "msg": state.messages.get(MessageKey::PageDeleteSuccess),
    })))
}

#[derive(Deserialize, Debug)]
struct SearchQuery {
    #[serde(default)]
    query: String,
}

async fn search(
    state: Data<AppState>,
    Query(search): Query<SearchQuery>,
) -> Result<HttpResponse, CmsError> {
    let pages = state.pages.clone();
    let hits = blocking(move || pages.search(&search.query)).await?;
    Ok(HttpResponse::Ok().json(hits))
}
