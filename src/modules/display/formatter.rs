//! 状态栏文本格式化
//!
//! 全部是纯函数：同样的输入永远得到同样的字符串

use crate::modules::updater::state::{DisplayPreferences, PriceSnapshot};

pub const DEFAULT_SENSITIVITY: f64 = 0.5;
pub const CURRENCY_SYMBOL: &str = "₿";
pub const UP_GLYPH: &str = "🚀";
pub const DOWN_GLYPH: &str = "🧂";
pub const ERROR_TITLE: &str = "TECHNICAL DIFFICULTIES :)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    pub fn classify(change_percent: f64) -> Self {
        if change_percent > 0.0 {
            Trend::Up
        } else if change_percent < 0.0 {
            Trend::Down
        } else {
            Trend::Flat
        }
    }

    pub fn indicator(self) -> &'static str {
        match self {
            Trend::Up => "🟢",
            Trend::Down => "🔴",
            Trend::Flat => "⚪",
        }
    }
}

/// 渲染模式。启动后的第一个读数先显示完整价格，之后才按用户偏好显示
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Initial,
    Steady,
}

/// 灵敏度 <= 0 或 NaN 时退回默认值 (下面要做除数)
pub fn effective_sensitivity(sensitivity: f64) -> f64 {
    if sensitivity.is_finite() && sensitivity > 0.0 {
        sensitivity
    } else {
        DEFAULT_SENSITIVITY
    }
}

pub fn glyph_count(change_percent: f64, sensitivity: f64) -> usize {
    let magnitude = change_percent.abs();
    if !magnitude.is_finite() {
        return 0;
    }
    (magnitude / effective_sensitivity(sensitivity)).floor() as usize
}

pub fn decoration(change_percent: f64, sensitivity: f64) -> String {
    let glyph = if change_percent >= 0.0 { UP_GLYPH } else { DOWN_GLYPH };
    glyph.repeat(glyph_count(change_percent, sensitivity))
}

/// 整数部分每三位插一个 `,`
pub fn group_thousands(s: &str) -> String {
    let (sign, unsigned) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }

    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

pub fn format_price(price: f64, abbreviated: bool) -> String {
    if abbreviated {
        format!("{:.3}M", price / 1_000_000.0)
    } else {
        group_thousands(&format!("{:.2}", price))
    }
}

pub fn format_price_line(price: f64, change_percent: f64, sensitivity: f64, abbreviated: bool) -> String {
    // -0.0 会打印成 "-0.00%"
    let change = if change_percent == 0.0 { 0.0 } else { change_percent };
    let mut line = format!(
        "{} {} ${} ({:+.2}%)",
        CURRENCY_SYMBOL,
        Trend::classify(change).indicator(),
        format_price(price, abbreviated),
        change
    );
    let glyphs = decoration(change, sensitivity);
    if !glyphs.is_empty() {
        line.push(' ');
        line.push_str(&glyphs);
    }
    line
}

/// 当前状态的标题；还没有价格时只有货币符号
pub fn render_snapshot(snapshot: &PriceSnapshot, prefs: &DisplayPreferences, mode: RenderMode) -> String {
    if !snapshot.has_price() {
        return CURRENCY_SYMBOL.to_string();
    }
    let abbreviated = mode == RenderMode::Steady && prefs.abbreviated;
    format_price_line(snapshot.price, snapshot.change_percent, prefs.sensitivity_factor, abbreviated)
}

/// 补空格或截断，结果正好 `width` 个字符
pub fn fit_width(text: &str, width: usize) -> String {
    let mut out: String = text.chars().take(width).collect();
    let len = out.chars().count();
    out.extend(std::iter::repeat(' ').take(width - len));
    out
}

/// 补齐到至少 `width` 个字符，不截断
pub fn pad_width(text: &str, width: usize) -> String {
    format!("{:<width$}", text, width = width)
}
