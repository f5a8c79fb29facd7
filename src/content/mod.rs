//! Blog content helpers: slug/excerpt derivation and markdown rendering.

pub mod markdown;
pub mod slug;

pub use markdown::render_markdown;
pub use slug::{derive_excerpt, derive_slug, ELLIPSIS, EXCERPT_LENGTH};
