pub mod comments;
pub mod pages;

pub use self::comments::CommentService;
pub use self::pages::PageService;
