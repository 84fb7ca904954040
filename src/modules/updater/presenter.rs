use std::sync::Arc;
use tracing::info;

use super::state::TrackerState;
use crate::modules::animation::Animator;
use crate::modules::display::formatter::{pad_width, CURRENCY_SYMBOL, ERROR_TITLE};
use crate::modules::display::{render_snapshot, RenderMode, StatusDisplay};

pub const IDLE_TOOLTIP: &str = "Bitcoin Price Tracker";

/// 更新循环和菜单共用的状态栏出口
/// 动画播放期间标题归动画所有，这里只改 tooltip；动画结束后由 animator 写回最新价格
#[derive(Clone)]
pub struct Presenter {
    display: Arc<dyn StatusDisplay>,
    animator: Animator,
    width: usize,
}

impl Presenter {
    pub fn new(display: Arc<dyn StatusDisplay>, animator: Animator, width: usize) -> Self {
        Self { display, animator, width }
    }

    fn set_title(&self, title: &str) {
        if !self.animator.is_animating() {
            self.display.set_title(title);
        }
    }

    pub fn show_line(&self, line: &str) {
        self.set_title(line);
        self.display.set_tooltip(line);
    }

    pub fn show_state(&self, state: &TrackerState, mode: RenderMode) {
        self.show_line(&render_snapshot(&state.snapshot, &state.prefs, mode));
    }

    pub fn show_error(&self, error: &dyn std::fmt::Display) {
        self.set_title(&pad_width(ERROR_TITLE, self.width));
        self.display.set_tooltip(&error.to_string());
    }

    /// 启动画面：没有价格时只显示 ₿，磁盘上有旧价格就立即显示
    pub fn show_startup(&self, state: &TrackerState) {
        self.display.set_title(CURRENCY_SYMBOL);
        self.display.set_tooltip(IDLE_TOOLTIP);
        if state.snapshot.has_price() {
            self.show_state(state, RenderMode::Steady);
            info!(
                "📂 Loaded price from disk: ${:.2} ({:+.2}%)",
                state.snapshot.price, state.snapshot.change_percent
            );
        }
    }
}
