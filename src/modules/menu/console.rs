use std::io::{self, BufRead, Write};
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::tray_menu::{Menu, MenuEvent, MenuItem};
use crate::modules::updater::StateHandle;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConsoleCommand {
    Menu(MenuEvent),
    Help,
}

/// 支持 `m`、`s <n>`、`q`、`h` 及其全称。`Err` 里是给用户看的提示
pub fn parse_command(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let mut parts = line.split_whitespace();
    let Some(cmd) = parts.next() else {
        return Ok(None);
    };

    let command = match cmd.to_ascii_lowercase().as_str() {
        "q" | "quit" | "exit" => ConsoleCommand::Menu(MenuEvent::Quit),
        "m" | "millions" => ConsoleCommand::Menu(MenuEvent::ToggleAbbreviated),
        "h" | "help" | "?" => ConsoleCommand::Help,
        "s" | "sensitivity" => {
            let raw = parts.next().ok_or_else(|| "usage: s <percent>".to_string())?;
            let value: f64 = raw
                .trim_end_matches('%')
                .parse()
                .map_err(|_| format!("not a number: {}", raw))?;
            ConsoleCommand::Menu(MenuEvent::SetSensitivity(value))
        }
        other => return Err(format!("unknown command: {} (h for help)", other)),
    };
    Ok(Some(command))
}

pub fn render_help(items: &[MenuItem]) -> String {
    let mut out = String::new();
    for item in items {
        render_item(&mut out, item, 0);
    }
    out.push_str("commands: m = toggle millions, s <n> = sensitivity, q = quit, h = help\n");
    out
}

fn render_item(out: &mut String, item: &MenuItem, depth: usize) {
    let mark = if item.checked { "[x]" } else if item.event.is_some() { "[ ]" } else { "   " };
    let dim = if item.enabled { "" } else { " (disabled)" };
    out.push_str(&format!("{}{} {}{}\n", "  ".repeat(depth), mark, item.label, dim));
    for child in &item.children {
        render_item(out, child, depth + 1);
    }
}

/// 在独立线程上读 stdin。阻塞读不占用 tokio 的 blocking pool，
/// 退出时 runtime 不必等一个永远不来的输入行
pub fn spawn_reader(tx: mpsc::Sender<MenuEvent>, menu: Menu, state: StateHandle) -> io::Result<JoinHandle<()>> {
    thread::Builder::new().name("console-menu".to_string()).spawn(move || {
        let stdin = io::stdin();
        pump_commands(stdin.lock(), &tx, &menu, &state, &mut io::stdout());
    })
}

/// 逐行解析并转发菜单事件；遇到 Quit、EOF 或接收端关闭即返回
fn pump_commands<R: BufRead, W: Write>(
    input: R,
    tx: &mpsc::Sender<MenuEvent>,
    menu: &Menu,
    state: &StateHandle,
    out: &mut W,
) {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("Error reading stdin: {}", e);
                return;
            }
        };

        match parse_command(&line) {
            Ok(Some(ConsoleCommand::Menu(event))) => {
                if tx.blocking_send(event).is_err() || matches!(event, MenuEvent::Quit) {
                    return;
                }
            }
            Ok(Some(ConsoleCommand::Help)) => {
                let _ = writeln!(out, "\n{}", render_help(&menu.items(&state.read().prefs)));
            }
            Ok(None) => {}
            Err(msg) => {
                let _ = writeln!(out, "\n{}", msg);
            }
        }
    }
    debug!("stdin closed, console menu disabled");
}
