pub mod action;
pub mod animation;
pub mod display;
pub mod menu;
pub mod perception;
pub mod updater;
