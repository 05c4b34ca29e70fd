pub mod models;
pub mod views;
pub mod controllers;
pub mod cli;
pub mod error;

// Re-exports for convenience
pub use models::{Config, HttpClient, Post, PostStore, Session, SocialApi};
pub use controllers::{start_app, Notice, Panel, PostInteraction};
pub use error::{ApiError, GramtuiError};
