use chrono::Utc;
use std::time::Duration;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{info, warn};

use super::presenter::Presenter;
use super::state::StateHandle;
use super::trigger::{Direction, TriggerPolicy};
use crate::config::TrackerProfile;
use crate::modules::action::SnapshotStore;
use crate::modules::animation::{AnimationRequest, Animator};
use crate::modules::display::RenderMode;
use crate::modules::perception::PriceFeed;

#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub interval: Duration,
    pub warmup: Duration,
    pub settle: Duration,
    pub policy: TriggerPolicy,
    pub up_text: String,
    pub down_text: String,
}

impl LoopSettings {
    pub fn from_profile(profile: &TrackerProfile) -> Self {
        Self {
            interval: profile.update_interval(),
            warmup: profile.warmup(),
            settle: profile.settle(),
            policy: profile.trigger_policy(),
            up_text: profile.animation.up_text.clone(),
            down_text: profile.animation.down_text.clone(),
        }
    }

    fn request_for(&self, direction: Direction) -> AnimationRequest {
        match direction {
            Direction::Up => AnimationRequest::new(self.up_text.clone(), true),
            Direction::Down => AnimationRequest::new(self.down_text.clone(), false),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Updated { animated: bool },
    Failed,
}

/// 每个周期：拉取 → 写盘 → 显示 → (可能) 动画
pub struct UpdateLoop {
    feed: Box<dyn PriceFeed>,
    store: SnapshotStore,
    state: StateHandle,
    presenter: Presenter,
    animator: Animator,
    settings: LoopSettings,
}

impl UpdateLoop {
    pub fn new(
        feed: Box<dyn PriceFeed>,
        store: SnapshotStore,
        state: StateHandle,
        presenter: Presenter,
        animator: Animator,
        settings: LoopSettings,
    ) -> Self {
        Self { feed, store, state, presenter, animator, settings }
    }

    pub async fn run(self) {
        sleep(self.settings.warmup).await;

        let stale = self.state.read().snapshot.is_stale(Utc::now(), self.settings.interval);
        if stale {
            self.tick().await;
        } else {
            info!("Stored price is recent, waiting for the next tick");
        }

        let period = self.settings.interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("✅ Price updater running every {}s via {}", period.as_secs(), self.feed.name());
        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }

    /// 单次更新。失败时不动快照，也不写盘
    pub async fn tick(&self) -> TickOutcome {
        let quote = match self.feed.fetch_quote().await {
            Ok(q) => q,
            Err(e) => {
                warn!("⚠️ Error fetching price from {}: {}", self.feed.name(), e);
                self.presenter.show_error(&e);
                return TickOutcome::Failed;
            }
        };

        let (previous_change, first) = self.state.update(|s| {
            let previous = s.snapshot.change_percent;
            let first = std::mem::replace(&mut s.first_update_pending, false);
            s.snapshot.observe(quote, Utc::now());
            (previous, first)
        });
        info!("📈 BTC {}", quote);

        if let Err(e) = self.state.persist(&self.store) {
            warn!("Error saving data file {}: {}", self.store.path().display(), e);
        }

        if first {
            self.presenter.show_state(&self.state.read(), RenderMode::Initial);
            sleep(self.settings.settle).await;
        }
        let current = self.state.read();
        self.presenter.show_state(&current, RenderMode::Steady);

        let animated = match self.settings.policy.evaluate(
            previous_change,
            quote.change_percent,
            current.prefs.sensitivity_factor,
        ) {
            Some(direction) => self.animator.trigger(self.settings.request_for(direction)),
            None => false,
        };

        TickOutcome::Updated { animated }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::action::PersistedRecord;
    use crate::modules::animation::{AnimationSettings, AnimationStyle};
    use crate::modules::display::formatter::{pad_width, ERROR_TITLE};
    use crate::modules::display::screen::testing::RecordingDisplay;
    use crate::modules::perception::fetcher::FetchError;
    use crate::modules::perception::Quote;
    use crate::modules::updater::state::TrackerState;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// 按顺序回放预设结果，用完后一律 503
    #[derive(Clone)]
    struct ScriptedFeed {
        responses: Arc<Mutex<VecDeque<Result<Quote, FetchError>>>>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedFeed {
        fn with(responses: Vec<Result<Quote, FetchError>>) -> Self {
            Self { responses: Arc::new(Mutex::new(responses.into())), calls: Arc::default() }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PriceFeed for ScriptedFeed {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn fetch_quote(&self) -> Result<Quote, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses.lock().unwrap().pop_front().unwrap_or(Err(FetchError::Status(503)))
        }
    }

    struct Harness {
        _dir: TempDir,
        display: Arc<RecordingDisplay>,
        state: StateHandle,
        store: SnapshotStore,
        animator: Animator,
        updater: UpdateLoop,
    }

    fn settings() -> LoopSettings {
        LoopSettings {
            interval: Duration::from_secs(30),
            warmup: Duration::from_secs(1),
            settle: Duration::from_secs(5),
            policy: TriggerPolicy::Sensitivity,
            up_text: "ALABADO!!!".to_string(),
            down_text: "PUTA MADRE!".to_string(),
        }
    }

    fn harness(feed: ScriptedFeed, initial: TrackerState) -> Harness {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("bitcoin_tracker_data.bin"));
        let display = Arc::new(RecordingDisplay::default());
        let state = StateHandle::new(initial);
        let (animator, _) = Animator::spawn(
            display.clone(),
            state.clone(),
            AnimationSettings {
                style: AnimationStyle::Scroll,
                width: 20,
                tick: Duration::from_millis(100),
                hold: Duration::from_millis(1000),
                rotations: 1,
                bull_run: false,
                bull_run_duration: Duration::ZERO,
            },
        );
        let presenter = Presenter::new(display.clone(), animator.clone(), 20);
        let updater = UpdateLoop::new(
            Box::new(feed),
            store.clone(),
            state.clone(),
            presenter,
            animator.clone(),
            settings(),
        );
        Harness { _dir: dir, display, state, store, animator, updater }
    }

    fn state_with_sensitivity(sensitivity: f64) -> TrackerState {
        TrackerState::new(sensitivity)
    }

    #[tokio::test(start_paused = true)]
    async fn small_rise_updates_without_animation() {
        let feed = ScriptedFeed::with(vec![Ok(Quote::new(50000.0, 2.0))]);
        let h = harness(feed, state_with_sensitivity(2.5));

        assert_eq!(h.updater.tick().await, TickOutcome::Updated { animated: false });
        assert_eq!(h.display.last_title().unwrap(), "₿ 🟢 $50,000.00 (+2.00%)");
        assert!(!h.animator.is_animating());

        let saved = h.store.load();
        assert_eq!(saved.last_price, 50000.0);
        assert_eq!(saved.last_change_percent, 2.0);
        assert_eq!(saved.sensitivity_factor, 2.5);
        assert!(saved.last_update().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn big_rise_triggers_animation() {
        let feed = ScriptedFeed::with(vec![Ok(Quote::new(50000.0, 6.0))]);
        let h = harness(feed, state_with_sensitivity(2.5));

        assert_eq!(h.updater.tick().await, TickOutcome::Updated { animated: true });
        assert!(h.display.titles().contains(&"₿ 🟢 $50,000.00 (+6.00%) 🚀🚀".to_string()));
        assert!(h.animator.is_animating());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_fetch_keeps_snapshot_and_skips_write() {
        let feed = ScriptedFeed::with(vec![Err(FetchError::Status(503))]);
        let mut initial = state_with_sensitivity(2.5);
        initial.snapshot.observe(Quote::new(49000.0, 1.0), Utc::now());
        let before = initial.snapshot;
        let h = harness(feed, initial);

        assert_eq!(h.updater.tick().await, TickOutcome::Failed);
        assert_eq!(h.display.last_title().unwrap(), pad_width(ERROR_TITLE, 20));
        assert_eq!(h.display.last_tooltip().unwrap(), "API error: status code 503");
        assert_eq!(h.state.read().snapshot, before);
        assert!(!h.store.path().exists());
    }

    #[tokio::test(start_paused = true)]
    async fn first_reading_flashes_full_price_then_settles() {
        let feed = ScriptedFeed::with(vec![
            Ok(Quote::new(50000.0, 1.0)),
            Ok(Quote::new(50100.0, 1.0)),
        ]);
        let mut initial = state_with_sensitivity(2.5);
        initial.prefs.abbreviated = true;
        let h = harness(feed, initial);

        let started = Instant::now();
        h.updater.tick().await;
        assert!(started.elapsed() >= Duration::from_secs(5));
        assert_eq!(
            h.display.titles(),
            vec!["₿ 🟢 $50,000.00 (+1.00%)".to_string(), "₿ 🟢 $0.050M (+1.00%)".to_string()]
        );

        let second = Instant::now();
        h.updater.tick().await;
        assert!(second.elapsed() < Duration::from_secs(1));
        assert_eq!(h.display.last_title().unwrap(), "₿ 🟢 $0.050M (+1.00%)");
    }

    #[tokio::test(start_paused = true)]
    async fn failure_then_recovery() {
        let feed = ScriptedFeed::with(vec![
            Err(FetchError::Decode("bad json".to_string())),
            Ok(Quote::new(42000.0, -0.4)),
        ]);
        let h = harness(feed, state_with_sensitivity(0.5));

        assert_eq!(h.updater.tick().await, TickOutcome::Failed);
        assert!(!h.store.path().exists());
        assert_eq!(h.updater.tick().await, TickOutcome::Updated { animated: false });
        assert_eq!(h.display.last_title().unwrap(), "₿ 🔴 $42,000.00 (-0.40%)");
        assert!(h.store.path().exists());
    }

    #[tokio::test(start_paused = true)]
    async fn title_is_left_alone_while_animating() {
        let feed = ScriptedFeed::with(vec![
            Ok(Quote::new(50000.0, 6.0)),
            Ok(Quote::new(50500.0, 7.0)),
        ]);
        let h = harness(feed, state_with_sensitivity(2.5));
        h.updater.tick().await;
        assert!(h.animator.is_animating());

        let titles_before = h.display.titles().len();
        assert_eq!(h.updater.tick().await, TickOutcome::Updated { animated: false });
        let new_titles: Vec<String> = h.display.titles()[titles_before..].to_vec();
        assert!(!new_titles.iter().any(|t| t.starts_with('₿')));
        assert_eq!(h.display.last_tooltip().unwrap(), "₿ 🟢 $50,500.00 (+7.00%) 🚀🚀");
    }

    #[tokio::test(start_paused = true)]
    async fn run_skips_immediate_fetch_when_stored_price_is_fresh() {
        let feed = ScriptedFeed::with(vec![Ok(Quote::new(50000.0, 0.1)), Ok(Quote::new(50001.0, 0.1))]);
        let counter = feed.clone();
        let mut initial = state_with_sensitivity(2.5);
        initial.snapshot.observe(Quote::new(49000.0, 0.0), Utc::now());
        let h = harness(feed, initial);

        let task = tokio::spawn(h.updater.run());
        sleep(Duration::from_secs(2)).await;
        assert_eq!(counter.calls(), 0);

        sleep(Duration::from_secs(30)).await;
        assert_eq!(counter.calls(), 1);
        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn run_fetches_after_warmup_when_nothing_stored() {
        let feed = ScriptedFeed::with(vec![Ok(Quote::new(50000.0, 0.1))]);
        let counter = feed.clone();
        let initial = TrackerState::restore(&PersistedRecord::default(), 0.5);
        let h = harness(feed, initial);
        let display = h.display.clone();

        let task = tokio::spawn(h.updater.run());
        sleep(Duration::from_millis(500)).await;
        assert_eq!(counter.calls(), 0);

        sleep(Duration::from_millis(600)).await;
        assert_eq!(counter.calls(), 1);
        assert_eq!(display.last_title().unwrap(), "₿ 🟢 $50,000.00 (+0.10%)");
        task.abort();
    }
}
