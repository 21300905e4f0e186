//! Data models for Inkwell

mod comment;
mod post;
mod term;

pub use comment::{Comment, Rendered};
pub use post::{Post, PostId};
pub use term::{Category, Tag, Term};
