pub mod formatter;
pub mod screen;

pub use formatter::{render_snapshot, RenderMode, DEFAULT_SENSITIVITY};
pub use screen::{ConsoleDisplay, StatusDisplay};
