pub mod tracker_profile;

pub use tracker_profile::TrackerProfile;
