pub mod application;
pub mod calendar;
pub mod entities;
pub mod infrastructure;
pub mod stats;

pub use application::*;
pub use entities::*;
pub use infrastructure::*;
