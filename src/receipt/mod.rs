//! Receipt composition: upstream models, the pure rendering rules, the cached
//! loader, and the HTTP handlers that expose them.

pub mod address;
pub mod clause;
pub mod document;
pub mod format;
pub mod handlers;
pub mod loader;
pub mod models;
pub mod words;

pub use document::ReceiptDocument;
pub use loader::{LoadError, LoadState, ReceiptLoader, ReceiptSource};
pub use models::ReceiptSnapshot;
