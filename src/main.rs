use actix_web::{middleware, web, App, HttpServer};
use cms_comments::config::{Opt, Settings};
use cms_comments::model::pages::{NewPage, HOMEPAGE_SLUG};
use cms_comments::store::{MemoryStore, PageStore, PgStore};
use cms_comments::AppState;
use env_logger::Env;
use std::sync::Arc;
use structopt::StructOpt;

fn demo_store() -> Result<MemoryStore, failure::Error> {
    let store = MemoryStore::new();
    store.add_user(1, "admin");
    store.add_post(1);
    store.insert_page(NewPage {
        title: "Welcome".to_owned(),
        nav_title: "Home".to_owned(),
        slug: HOMEPAGE_SLUG.to_owned(),
        body: "This is the homepage.".to_owned(),
        css: String::new(),
        js: String::new(),
        show_title: true,
        show_nav: true,
        icon: None,
        user_id: 1,
    })?;
    Ok(store)
}

#[actix_web::main]
async fn main() -> Result<(), failure::Error> {
    let opt = Opt::from_args();
    env_logger::Builder::from_env(
        Env::default().default_filter_or("actix_web=info,cms_comments=info"),
    )
    .init();

    let settings = Settings::from(&opt);
    let state = if opt.memory {
        log::info!("Using in-memory store with demo data");
        AppState::new(Arc::new(demo_store()?), settings)
    } else {
        let url = opt
            .database_url
            .as_deref()
            .ok_or_else(|| failure::err_msg("--db-url or DATABASE_URL is required without --memory"))?;
        let store = PgStore::connect(url)?;
        store.run_pending_migrations()?;
        AppState::new(Arc::new(store), settings)
    };
    let data = web::Data::new(state);

    log::info!("Started http server: http://{}", opt.socket);

    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .configure(cms_comments::routes::config)
            .wrap(middleware::Logger::default())
    })
    .bind(&opt.socket)?
    .run()
    .await?;

    Ok(())
}
