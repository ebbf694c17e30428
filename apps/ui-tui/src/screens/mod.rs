pub mod chat;
pub mod library;
pub mod settings;
