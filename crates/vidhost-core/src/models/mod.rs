//! Data models for the client
//!
//! Each sub-module covers one feature area: the binary payload chosen by the
//! user, the upload lifecycle, and per-resource engagement state.

mod engagement;
mod payload;
mod response;
mod upload;

// Re-export all models for convenient imports
pub use engagement::*;
pub use payload::*;
pub use response::*;
pub use upload::*;
