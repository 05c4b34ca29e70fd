pub mod account_controller;
pub mod app_controller;
pub mod interaction;
pub mod post_controller;

// Re-export key functions
pub use app_controller::start_app;
pub use interaction::{Notice, Panel, PostInteraction, PostView};
