pub mod render;
pub mod theme;
pub mod week_view;

pub use render::*;
pub use theme::*;
pub use week_view::*;
