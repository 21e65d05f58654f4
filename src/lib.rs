//! Language-server support for wireview component templates.
//!
//! The heart of the crate is [`template`]: a pure cursor-context parser that
//! turns `(document, offset)` into a [`template::CursorContext`]. The [`lsp`]
//! module is a thin host adapter that feeds those contexts to completion,
//! hover, and go-to-definition providers backed by the [`metadata`] registry.

pub mod lsp;
pub mod metadata;
pub mod template;

pub use lsp::WireviewLanguageServer;
