use structopt::StructOpt;

/// Number of items on one page of the moderation queue.
pub const DEFAULT_PER_PAGE: i64 = 10;

#[derive(Debug, StructOpt)]
#[structopt(name = "cms_comments")]
pub struct Opt {
    /// PostgreSQL connection url
    #[structopt(short = "u", long = "db-url", env = "DATABASE_URL")]
    pub database_url: Option<String>,
    #[structopt(short = "s", long = "socket", default_value = "127.0.0.1:8000")]
    pub socket: String,
    /// Hold new comments back until a moderator approves them
    #[structopt(long = "moderation")]
    pub moderation: bool,
    /// Where clients are sent when the post they were viewing is gone
    #[structopt(long = "posts-url", default_value = "/posts")]
    pub posts_url: String,
    #[structopt(long = "per-page", default_value = "10")]
    pub per_page: i64,
    /// Keep everything in memory instead of connecting to a database
    #[structopt(long = "memory")]
    pub memory: bool,
}

/// Process wide settings handed to the services at construction time.
#[derive(Debug, Clone)]
pub struct Settings {
    pub moderation: bool,
    pub posts_url: String,
    pub per_page: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            moderation: false,
            posts_url: "/posts".to_owned(),
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl From<&Opt> for Settings {
    fn from(opt: &Opt) -> Self {
        Settings {
            moderation: opt.moderation,
            posts_url: opt.posts_url.clone(),
            per_page: if opt.per_page > 0 {
                opt.per_page
            } else {
                DEFAULT_PER_PAGE
            },
        }
    }
}
