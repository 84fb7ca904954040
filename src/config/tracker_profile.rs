use serde::Deserialize;
use config::{Config, Environment, File};
use anyhow::Result;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::modules::animation::{AnimationSettings, AnimationStyle};
use crate::modules::perception::FeedKind;
use crate::modules::updater::TriggerPolicy;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AnimationConfig {
    pub style: AnimationStyle,
    pub tick_ms: u64,
    pub hold_ms: u64,
    pub rotations: usize,
    pub bull_run: bool,
    pub bull_run_ms: u64,
    pub up_text: String,
    pub down_text: String,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            style: AnimationStyle::Dissolve,
            tick_ms: 100,
            hold_ms: 1000,
            rotations: 1,
            bull_run: true,
            bull_run_ms: 1000,
            up_text: "ALABADO!!!".to_string(),
            down_text: "PUTA MADRE!".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TriggerConfig {
    pub policy: TriggerKind,
    /// `fixed` 和 `consecutive_delta` 策略使用
    pub fixed_threshold: f64,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self { policy: TriggerKind::Sensitivity, fixed_threshold: 5.0 }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    Fixed,
    Sensitivity,
    ConsecutiveDelta,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TrackerProfile {
    pub feed: FeedKind,
    pub update_interval_sec: u64,
    pub warmup_ms: u64,
    pub settle_sec: u64,
    pub screen_width: usize,
    pub default_sensitivity: f64,
    pub sensitivity_choices: Vec<f64>,
    pub data_dir: Option<PathBuf>,
    pub data_file: String,
    pub lock_file: String,
    pub animation: AnimationConfig,
    pub trigger: TriggerConfig,
}

impl Default for TrackerProfile {
    fn default() -> Self {
        Self {
            feed: FeedKind::Binance,
            update_interval_sec: 30,
            warmup_ms: 1000,
            settle_sec: 5,
            screen_width: 20,
            default_sensitivity: 0.5,
            sensitivity_choices: vec![0.5, 1.0, 2.5, 5.0],
            data_dir: None,
            data_file: "bitcoin_tracker_data.bin".to_string(),
            lock_file: "bitcoin_tracker.lock".to_string(),
            animation: AnimationConfig::default(),
            trigger: TriggerConfig::default(),
        }
    }
}

impl TrackerProfile {
    /// 读取 `tracker_config.*` (可选) 以及 `BTC_TRAY_*` 环境变量 (嵌套字段用 `__`，如 `BTC_TRAY_ANIMATION__STYLE`)
    pub fn load() -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::with_name("tracker_config").required(false))
            .add_source(
                Environment::with_prefix("BTC_TRAY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let profile: TrackerProfile = settings.try_deserialize()?;
        Ok(profile)
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_sec.max(1))
    }

    pub fn warmup(&self) -> Duration {
        Duration::from_millis(self.warmup_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_secs(self.settle_sec)
    }

    /// 找不到 home 时退回当前目录
    pub fn home_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        env::var_os("HOME")
            .or_else(|| env::var_os("USERPROFILE"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn data_path(&self) -> PathBuf {
        self.home_dir().join(&self.data_file)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.home_dir().join(&self.lock_file)
    }

    pub fn default_sensitivity(&self) -> f64 {
        if self.default_sensitivity.is_finite() && self.default_sensitivity > 0.0 {
            self.default_sensitivity
        } else {
            crate::modules::display::DEFAULT_SENSITIVITY
        }
    }

    pub fn trigger_policy(&self) -> TriggerPolicy {
        match self.trigger.policy {
            TriggerKind::Fixed => TriggerPolicy::Fixed(self.trigger.fixed_threshold),
            TriggerKind::Sensitivity => TriggerPolicy::Sensitivity,
            TriggerKind::ConsecutiveDelta => TriggerPolicy::ConsecutiveDelta(self.trigger.fixed_threshold),
        }
    }

    pub fn animation_settings(&self) -> AnimationSettings {
        let a = &self.animation;
        AnimationSettings {
            style: a.style,
            width: self.screen_width,
            tick: Duration::from_millis(a.tick_ms.max(1)),
            hold: Duration::from_millis(a.hold_ms),
            rotations: a.rotations.max(1),
            bull_run: a.bull_run,
            bull_run_duration: Duration::from_millis(a.bull_run_ms),
        }
    }
}
