pub mod tui;
pub mod widgets;

pub use tui::FeedScreen;
pub use widgets::FeedList;
