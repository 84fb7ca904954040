pub mod state;
pub mod trigger;
pub mod presenter;
pub mod update_loop;

pub use presenter::Presenter;
pub use state::{StateHandle, TrackerState};
pub use trigger::TriggerPolicy;
pub use update_loop::{LoopSettings, UpdateLoop};
