pub mod effects;
pub mod animator;

use serde::Deserialize;
use std::time::Duration;

pub use animator::{AnimationRequest, Animator};

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AnimationStyle {
    /// 跑马灯
    Scroll,
    /// 先显示文字，再逐个随机抹掉
    Dissolve,
}

#[derive(Debug, Clone)]
pub struct AnimationSettings {
    pub style: AnimationStyle,
    pub width: usize,
    pub tick: Duration,
    pub hold: Duration,
    pub rotations: usize,
    pub bull_run: bool,
    pub bull_run_duration: Duration,
}
