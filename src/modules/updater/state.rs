use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::modules::action::snapshot::StoreError;
use crate::modules::action::{PersistedRecord, SnapshotStore};
use crate::modules::display::formatter::effective_sensitivity;
use crate::modules::perception::Quote;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PriceSnapshot {
    pub price: f64,
    pub change_percent: f64,
    pub observed_at: Option<DateTime<Utc>>,
}

impl PriceSnapshot {
    pub fn has_price(&self) -> bool {
        self.price > 0.0
    }

    /// 覆盖当前读数。系统时钟回拨时 `observed_at` 也不后退
    pub fn observe(&mut self, quote: Quote, now: DateTime<Utc>) {
        self.price = quote.price;
        self.change_percent = quote.change_percent;
        self.observed_at = Some(match self.observed_at {
            Some(prev) if prev > now => prev,
            _ => now,
        });
    }

    /// 没有读数，或读数超过 `max_age`
    pub fn is_stale(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        match self.observed_at {
            None => true,
            Some(at) => match (now - at).to_std() {
                Ok(age) => age > max_age,
                // 时间戳在未来，按新鲜处理
                Err(_) => false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayPreferences {
    pub sensitivity_factor: f64,
    pub abbreviated: bool,
}

impl Default for DisplayPreferences {
    fn default() -> Self {
        Self {
            sensitivity_factor: crate::modules::display::DEFAULT_SENSITIVITY,
            abbreviated: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackerState {
    pub snapshot: PriceSnapshot,
    pub prefs: DisplayPreferences,
    /// 本进程第一次成功拉取前为 true
    pub first_update_pending: bool,
}

impl TrackerState {
    pub fn new(default_sensitivity: f64) -> Self {
        Self {
            snapshot: PriceSnapshot::default(),
            prefs: DisplayPreferences {
                sensitivity_factor: effective_sensitivity(default_sensitivity),
                abbreviated: false,
            },
            first_update_pending: true,
        }
    }

    /// 从磁盘记录恢复；灵敏度为 0 或非法时用默认值
    pub fn restore(record: &PersistedRecord, default_sensitivity: f64) -> Self {
        let mut state = Self::new(default_sensitivity);
        state.snapshot = PriceSnapshot {
            price: record.last_price,
            change_percent: record.last_change_percent,
            observed_at: record.last_update(),
        };
        if record.sensitivity_factor.is_finite() && record.sensitivity_factor > 0.0 {
            state.prefs.sensitivity_factor = record.sensitivity_factor;
        }
        state.prefs.abbreviated = record.abbreviated;
        state
    }

    pub fn to_record(&self) -> PersistedRecord {
        PersistedRecord {
            last_price: self.snapshot.price,
            last_change_percent: self.snapshot.change_percent,
            last_update_millis: self.snapshot.observed_at.map(|t| t.timestamp_millis()).unwrap_or(0),
            sensitivity_factor: self.prefs.sensitivity_factor,
            abbreviated: self.prefs.abbreviated,
        }
    }
}

/// 全局唯一的状态句柄 (一把 Mutex)，读者拿到的是一致的副本
#[derive(Clone)]
pub struct StateHandle {
    inner: Arc<Mutex<TrackerState>>,
}

impl StateHandle {
    pub fn new(state: TrackerState) -> Self {
        Self { inner: Arc::new(Mutex::new(state)) }
    }

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        // 所有修改都是字段赋值，panic 不会留下写了一半的快照
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn read(&self) -> TrackerState {
        self.lock().clone()
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut TrackerState) -> R) -> R {
        let mut guard = self.lock();
        f(&mut guard)
    }

    /// 持锁写盘：记录和写入之间不会插进别的修改，磁盘上永远是最后一次的状态
    pub fn persist(&self, store: &SnapshotStore) -> Result<(), StoreError> {
        let guard = self.lock();
        store.save(&guard.to_record())
    }
}
