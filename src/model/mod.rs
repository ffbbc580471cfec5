pub mod comments;
pub mod pages;
