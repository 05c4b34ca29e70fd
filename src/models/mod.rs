pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod datauri;
pub mod post;
pub mod session;
pub mod store;
pub mod user;

// Re-export important structs for convenience
pub use auth::Credential;
pub use client::{ApiResponse, HttpClient, SocialApi};
pub use config::Config;
pub use post::{Author, Comment, Post};
pub use session::Session;
pub use store::PostStore;
pub use user::{CurrentUser, PictureUpload, ProfileEdit, User};
