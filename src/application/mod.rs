pub mod app;
pub mod cli;
pub mod config;
pub mod tracker;
pub mod tui;

pub use app::*;
pub use cli::*;
pub use config::*;
pub use tracker::*;
pub use tui::*;
