mod config;
mod utils;
mod modules;

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, error, warn};
use tracing_subscriber::EnvFilter;
use dotenvy::dotenv;

use crate::config::TrackerProfile;
use crate::utils::http_client::HttpClientFactory;
use crate::utils::instance_lock::{InstanceLock, LockError};
use crate::modules::action::SnapshotStore;
use crate::modules::animation::Animator;
use crate::modules::display::{ConsoleDisplay, StatusDisplay};
use crate::modules::menu::{console, Menu, MenuController, MenuOutcome};
use crate::modules::updater::{LoopSettings, Presenter, StateHandle, TrackerState, UpdateLoop};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    // 日志走 stderr，stdout 留给状态栏
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let profile = TrackerProfile::load()?;

    // 1. 单实例锁 (拿不到就直接退出，不碰任何数据文件)
    let _lock = match InstanceLock::acquire(profile.lock_path()) {
        Ok(lock) => lock,
        Err(LockError::AlreadyRunning) => {
            println!("{}", LockError::AlreadyRunning);
            return Ok(());
        }
        Err(e) => {
            error!("Error acquiring lock: {}", e);
            return Ok(());
        }
    };
    info!("Starting btc_tray v{} ...", env!("CARGO_PKG_VERSION"));

    // 2. 读取上次保存的状态
    let store = SnapshotStore::new(profile.data_path());
    let state = StateHandle::new(TrackerState::restore(&store.load(), profile.default_sensitivity()));

    // 3. 状态栏 + 动画
    let display: Arc<dyn StatusDisplay> = Arc::new(ConsoleDisplay::new());
    let (animator, _animation_worker) =
        Animator::spawn(display.clone(), state.clone(), profile.animation_settings());
    let presenter = Presenter::new(display.clone(), animator.clone(), profile.screen_width);
    presenter.show_startup(&state.read());

    // 4. 价格轮询
    let client = HttpClientFactory::create()?;
    let updater = UpdateLoop::new(
        profile.feed.build(client),
        store.clone(),
        state.clone(),
        presenter.clone(),
        animator,
        LoopSettings::from_profile(&profile),
    );
    let updater_task = tokio::spawn(updater.run());

    // 5. 菜单
    let menu = Menu::new(env!("CARGO_PKG_VERSION"), profile.sensitivity_choices.clone());
    let (menu_tx, mut menu_rx) = mpsc::channel(8);
    // stdin 读线程不 join：退出时它可能还卡在 read 上
    console::spawn_reader(menu_tx, menu.clone(), state.clone())?;
    let controller = MenuController::new(menu, state.clone(), store, presenter);

    info!("✅ System initialized. Type 'h' + Enter for the menu.");

    loop {
        tokio::select! {
            Some(event) = menu_rx.recv() => {
                if controller.handle(event) == MenuOutcome::Quit {
                    info!("Quit requested");
                    break;
                }
            }
            res = tokio::signal::ctrl_c() => {
                if let Err(e) = res {
                    warn!("Failed to listen for Ctrl-C: {}", e);
                }
                info!("Interrupted");
                break;
            }
        }
    }

    updater_task.abort();
    controller.persist();
    println!();
    info!("👋 Bye");
    Ok(())
}
