//! Session library for the Afina chat/RAG client.
//!
//! Everything here is independent of the terminal frontend: user gestures are
//! plain method calls on [`session::Session`], and network work runs on tokio
//! tasks that report back as [`session::SessionEvent`]s.

pub mod api;
pub mod composer;
pub mod config;
pub mod intake;
pub mod selector;
pub mod session;
pub mod settings;
pub mod storage;
pub mod transcript;
pub mod typing;
pub mod uploader;

pub use api::{BackendClient, UploadOutcome};
pub use config::Config;
pub use session::{Notice, NoticeLevel, Session, SessionEvent};
