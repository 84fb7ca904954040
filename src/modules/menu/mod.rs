pub mod tray_menu;
pub mod console;

pub use tray_menu::{Menu, MenuController, MenuOutcome};
