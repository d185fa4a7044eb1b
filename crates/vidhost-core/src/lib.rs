//! vidhost Core Library
//!
//! Domain models, the client error taxonomy, configuration, and the trait seams
//! (UI sink, confirmation gate, playback signal) shared by the vidhost client
//! and its front ends.

pub mod config;
pub mod error;
pub mod models;
pub mod sink;

// Re-export commonly used types
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult, ErrorMetadata, LogLevel};
pub use sink::{ConfirmPrompt, EngagementAction, FixedConfirm, NoOpSink, PlaybackSignal, UiSink};
