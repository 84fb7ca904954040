use tracing::{info, warn};

use crate::modules::action::SnapshotStore;
use crate::modules::display::RenderMode;
use crate::modules::updater::state::{DisplayPreferences, StateHandle};
use crate::modules::updater::Presenter;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MenuEvent {
    SetSensitivity(f64),
    ToggleAbbreviated,
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuItem {
    pub label: String,
    pub enabled: bool,
    pub checked: bool,
    /// 点击后的事件；纯展示条目为 `None`
    pub event: Option<MenuEvent>,
    pub children: Vec<MenuItem>,
}

impl MenuItem {
    fn info(label: impl Into<String>) -> Self {
        Self { label: label.into(), enabled: false, checked: false, event: None, children: Vec::new() }
    }

    fn action(label: impl Into<String>, event: MenuEvent, checked: bool) -> Self {
        Self { label: label.into(), enabled: true, checked, event: Some(event), children: Vec::new() }
    }
}

/// 托盘菜单的静态结构
#[derive(Debug, Clone)]
pub struct Menu {
    version: String,
    sensitivity_choices: Vec<f64>,
}

impl Menu {
    pub fn new(version: impl Into<String>, sensitivity_choices: Vec<f64>) -> Self {
        Self { version: version.into(), sensitivity_choices }
    }

    pub fn choices(&self) -> &[f64] {
        &self.sensitivity_choices
    }

    pub fn accepts_sensitivity(&self, value: f64) -> bool {
        self.sensitivity_choices.iter().any(|c| (c - value).abs() < f64::EPSILON)
    }

    pub fn items(&self, prefs: &DisplayPreferences) -> Vec<MenuItem> {
        let mut items = vec![
            MenuItem::info("OAB"),
            MenuItem::action("Set price in millions", MenuEvent::ToggleAbbreviated, prefs.abbreviated),
        ];

        if !self.sensitivity_choices.is_empty() {
            let children = self
                .sensitivity_choices
                .iter()
                .map(|&c| {
                    let checked = (c - prefs.sensitivity_factor).abs() < f64::EPSILON;
                    MenuItem::action(format!("{}%", c), MenuEvent::SetSensitivity(c), checked)
                })
                .collect();
            items.push(MenuItem {
                label: "Sensitivity".to_string(),
                enabled: true,
                checked: false,
                event: None,
                children,
            });
        }

        items.push(MenuItem::info(format!("Version: {}", self.version)));
        items.push(MenuItem::action("Quit", MenuEvent::Quit, false));
        items
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOutcome {
    Continue,
    Quit,
}

/// 把菜单操作应用到共享状态
pub struct MenuController {
    menu: Menu,
    state: StateHandle,
    store: SnapshotStore,
    presenter: Presenter,
}

impl MenuController {
    pub fn new(menu: Menu, state: StateHandle, store: SnapshotStore, presenter: Presenter) -> Self {
        Self { menu, state, store, presenter }
    }

    pub fn handle(&self, event: MenuEvent) -> MenuOutcome {
        match event {
            MenuEvent::Quit => return MenuOutcome::Quit,
            MenuEvent::ToggleAbbreviated => {
                let on = self.state.update(|s| {
                    s.prefs.abbreviated = !s.prefs.abbreviated;
                    s.prefs.abbreviated
                });
                info!("Price in millions: {}", if on { "on" } else { "off" });
            }
            MenuEvent::SetSensitivity(value) => {
                if !(value.is_finite() && value > 0.0 && self.menu.accepts_sensitivity(value)) {
                    warn!("Ignoring sensitivity {}: not one of {:?}", value, self.menu.choices());
                    return MenuOutcome::Continue;
                }
                self.state.update(|s| s.prefs.sensitivity_factor = value);
                info!("Sensitivity set to {}%", value);
            }
        }

        self.persist();
        let state = self.state.read();
        if state.snapshot.has_price() {
            self.presenter.show_state(&state, RenderMode::Steady);
        }
        MenuOutcome::Continue
    }

    /// 保存内存中的状态；失败只记日志
    pub fn persist(&self) {
        if let Err(e) = self.state.persist(&self.store) {
            warn!("Error saving data file {}: {}", self.store.path().display(), e);
        }
    }
}
