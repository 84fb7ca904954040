use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::effects::{bull_run_frames, dissolve_frames, scroll_frames};
use super::{AnimationSettings, AnimationStyle};
use crate::modules::display::formatter::fit_width;
use crate::modules::display::{render_snapshot, RenderMode, StatusDisplay};
use crate::modules::updater::state::StateHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationRequest {
    pub text: String,
    /// 文字动画前先跑一遍公牛
    pub bull_run: bool,
}

impl AnimationRequest {
    pub fn new(text: impl Into<String>, bull_run: bool) -> Self {
        Self { text: text.into(), bull_run }
    }
}

/// 动画 worker 的句柄。同一时间最多一个动画，播放中到达的请求直接丢弃，不排队
#[derive(Clone)]
pub struct Animator {
    busy: Arc<AtomicBool>,
    tx: mpsc::Sender<AnimationRequest>,
}

impl Animator {
    pub fn spawn(
        display: Arc<dyn StatusDisplay>,
        state: StateHandle,
        settings: AnimationSettings,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(1);
        let busy = Arc::new(AtomicBool::new(false));
        let worker = AnimationWorker { display, state, settings, busy: busy.clone() };
        let handle = tokio::spawn(worker.run(rx));
        (Self { busy, tx }, handle)
    }

    /// 请求被接受时返回 `true`
    pub fn trigger(&self, request: AnimationRequest) -> bool {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Animation already running, dropping '{}'", request.text);
            return false;
        }

        if let Err(e) = self.tx.try_send(request) {
            self.busy.store(false, Ordering::Release);
            warn!("Animation worker unavailable: {}", e);
            return false;
        }
        true
    }

    pub fn is_animating(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// 无论动画如何结束都清掉 busy 标志
struct BusyReset(Arc<AtomicBool>);

impl Drop for BusyReset {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

struct AnimationWorker {
    display: Arc<dyn StatusDisplay>,
    state: StateHandle,
    settings: AnimationSettings,
    busy: Arc<AtomicBool>,
}

impl AnimationWorker {
    async fn run(self, mut rx: mpsc::Receiver<AnimationRequest>) {
        while let Some(request) = rx.recv().await {
            let _reset = BusyReset(self.busy.clone());
            self.play(&request).await;
            self.restore();
        }
        debug!("Animation worker stopped");
    }

    async fn play(&self, request: &AnimationRequest) {
        info!("🎬 Animating: {}", request.text);
        let s = &self.settings;

        if request.bull_run && s.bull_run {
            let count = frame_count(s.bull_run_duration, s.tick);
            self.show_frames(bull_run_frames(s.width, count)).await;
        }

        match s.style {
            AnimationStyle::Scroll => {
                self.show_frames(scroll_frames(&request.text, s.width, s.rotations)).await;
            }
            AnimationStyle::Dissolve => {
                self.display.set_title(&fit_width(&request.text, s.width));
                sleep(s.hold).await;
                let frames = {
                    let mut rng = rand::thread_rng();
                    dissolve_frames(&request.text, s.width, &mut rng)
                };
                self.show_frames(frames).await;
            }
        }
    }

    async fn show_frames(&self, frames: Vec<String>) {
        for frame in frames {
            self.display.set_title(&frame);
            sleep(self.settings.tick).await;
        }
    }

    /// 写回最新价格 (可能比触发动画的那次更新)
    fn restore(&self) {
        let state = self.state.read();
        self.display.set_title(&render_snapshot(&state.snapshot, &state.prefs, RenderMode::Steady));
    }
}

fn frame_count(duration: Duration, tick: Duration) -> usize {
    let tick_ms = tick.as_millis().max(1);
    (duration.as_millis() / tick_ms) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::effects::BULL_GLYPH;
    use crate::modules::display::screen::testing::RecordingDisplay;
    use crate::modules::perception::Quote;
    use crate::modules::updater::state::TrackerState;
    use chrono::Utc;

    fn settings(style: AnimationStyle) -> AnimationSettings {
        AnimationSettings {
            style,
            width: 20,
            tick: Duration::from_millis(100),
            hold: Duration::from_millis(1000),
            rotations: 1,
            bull_run: true,
            bull_run_duration: Duration::from_millis(1000),
        }
    }

    fn priced_state(price: f64, change: f64) -> StateHandle {
        let state = StateHandle::new(TrackerState::new(2.5));
        state.update(|s| s.snapshot.observe(Quote::new(price, change), Utc::now()));
        state
    }

    async fn wait_idle(animator: &Animator) {
        for _ in 0..10_000 {
            if !animator.is_animating() {
                return;
            }
            sleep(Duration::from_millis(50)).await;
        }
        panic!("animation never finished");
    }

    #[tokio::test(start_paused = true)]
    async fn second_trigger_is_dropped_while_running() {
        let display = Arc::new(RecordingDisplay::default());
        let state = priced_state(50000.0, 6.0);
        let (animator, _worker) = Animator::spawn(display.clone(), state, settings(AnimationStyle::Dissolve));

        assert!(animator.trigger(AnimationRequest::new("ALABADO!!!", false)));
        assert!(animator.is_animating());
        assert!(!animator.trigger(AnimationRequest::new("PUTA MADRE!", false)));
        assert!(animator.is_animating());

        wait_idle(&animator).await;
        assert!(!animator.is_animating());

        let titles = display.titles();
        assert!(titles.iter().any(|t| t.starts_with("ALABADO!!!")));
        assert!(!titles.iter().any(|t| t.contains("PUTA")));
        assert_eq!(display.last_title().unwrap(), "₿ 🟢 $50,000.00 (+6.00%) 🚀🚀");
    }

    #[tokio::test(start_paused = true)]
    async fn can_animate_again_after_finishing() {
        let display = Arc::new(RecordingDisplay::default());
        let (animator, _worker) =
            Animator::spawn(display.clone(), priced_state(100.0, -6.0), settings(AnimationStyle::Scroll));

        assert!(animator.trigger(AnimationRequest::new("ONE", false)));
        wait_idle(&animator).await;
        assert!(animator.trigger(AnimationRequest::new("TWO", false)));
        wait_idle(&animator).await;

        let titles = display.titles();
        assert!(titles.iter().any(|t| t.starts_with("ONE")));
        assert!(titles.iter().any(|t| t.starts_with("TWO")));
    }

    #[tokio::test(start_paused = true)]
    async fn restores_latest_snapshot_not_trigger_snapshot() {
        let display = Arc::new(RecordingDisplay::default());
        let state = priced_state(50000.0, 6.0);
        let (animator, _worker) =
            Animator::spawn(display.clone(), state.clone(), settings(AnimationStyle::Scroll));

        assert!(animator.trigger(AnimationRequest::new("ALABADO!!!", true)));
        sleep(Duration::from_millis(250)).await;
        state.update(|s| s.snapshot.observe(Quote::new(51000.0, 1.0), Utc::now()));

        wait_idle(&animator).await;
        assert_eq!(display.last_title().unwrap(), "₿ 🟢 $51,000.00 (+1.00%)");
    }

    #[tokio::test(start_paused = true)]
    async fn bull_run_plays_before_text() {
        let display = Arc::new(RecordingDisplay::default());
        let (animator, _worker) =
            Animator::spawn(display.clone(), priced_state(50000.0, 6.0), settings(AnimationStyle::Scroll));

        assert!(animator.trigger(AnimationRequest::new("ALABADO!!!", true)));
        wait_idle(&animator).await;

        let titles = display.titles();
        assert_eq!(titles.iter().filter(|t| t.contains(BULL_GLYPH)).count(), 10);
        let first_text = titles.iter().position(|t| t.starts_with("ALABADO")).unwrap();
        let last_bull = titles.iter().rposition(|t| t.contains('🐂')).unwrap();
        assert!(last_bull < first_text);
    }

    #[tokio::test]
    async fn dead_worker_does_not_leave_flag_set() {
        let display = Arc::new(RecordingDisplay::default());
        let (animator, worker) =
            Animator::spawn(display, priced_state(1.0, 0.0), settings(AnimationStyle::Scroll));
        worker.abort();
        let _ = worker.await;

        assert!(!animator.trigger(AnimationRequest::new("ALABADO!!!", false)));
        assert!(!animator.is_animating());
    }

    #[test]
    fn busy_reset_clears_on_drop() {
        let flag = Arc::new(AtomicBool::new(true));
        drop(BusyReset(flag.clone()));
        assert!(!flag.load(Ordering::Acquire));
    }

    #[test]
    fn frame_count_from_duration() {
        assert_eq!(frame_count(Duration::from_secs(1), Duration::from_millis(100)), 10);
        assert_eq!(frame_count(Duration::from_secs(1), Duration::ZERO), 1000);
    }
}
