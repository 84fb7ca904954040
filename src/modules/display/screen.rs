use std::io::{self, Write};
use std::sync::Mutex;
use tracing::debug;

/// 状态栏标题和 tooltip 的输出端 (二进制里用的是终端实现)
pub trait StatusDisplay: Send + Sync {
    fn set_title(&self, title: &str);
    fn set_tooltip(&self, tooltip: &str);
}

/// 在 stdout 上原地重写一行
pub struct ConsoleDisplay {
    last_title: Mutex<String>,
}

impl ConsoleDisplay {
    pub fn new() -> Self {
        Self { last_title: Mutex::new(String::new()) }
    }
}

impl Default for ConsoleDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusDisplay for ConsoleDisplay {
    fn set_title(&self, title: &str) {
        let mut last = self.last_title.lock().unwrap_or_else(|e| e.into_inner());
        if *last == title {
            return;
        }
        *last = title.to_string();

        let mut out = io::stdout().lock();
        // \r + 清行，状态始终占一行
        let _ = write!(out, "\r\x1b[2K{}", title);
        let _ = out.flush();
    }

    fn set_tooltip(&self, tooltip: &str) {
        debug!("tooltip: {}", tooltip);
    }
}
