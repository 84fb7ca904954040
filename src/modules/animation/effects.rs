use rand::Rng;

use crate::modules::display::formatter::fit_width;

pub const BULL_GLYPH: char = '🐂';

/// 跑马灯：文字重复铺满 `width`，每帧左移一个字符，转满 `rotations` 圈
pub fn scroll_frames(text: &str, width: usize, rotations: usize) -> Vec<String> {
    let unit: Vec<char> = text.chars().collect();
    if unit.is_empty() || width == 0 {
        return Vec::new();
    }

    let mut ring = unit.clone();
    while ring.len() < width {
        ring.push(' ');
        ring.extend(unit.iter());
    }
    ring.push(' ');

    let mut frames = Vec::with_capacity(ring.len() * rotations);
    for _ in 0..rotations {
        for i in 0..ring.len() {
            let rotated: String = ring[i..].iter().chain(ring[..i].iter()).collect();
            frames.push(fit_width(&rotated, width));
        }
    }
    frames
}

/// 每帧随机抹掉一个还没抹掉的字符，最后一帧全是空格
pub fn dissolve_frames<R: Rng + ?Sized>(text: &str, width: usize, rng: &mut R) -> Vec<String> {
    let mut shown: Vec<char> = text.chars().collect();
    let mut remaining: Vec<usize> = (0..shown.len()).collect();
    let mut frames = Vec::with_capacity(remaining.len());

    while !remaining.is_empty() {
        let pick = rng.gen_range(0..remaining.len());
        let pos = remaining.swap_remove(pick);
        shown[pos] = ' ';
        let line: String = shown.iter().collect();
        frames.push(fit_width(&line, width));
    }
    frames
}

/// 一头公牛从左跑到右，到边回绕
pub fn bull_run_frames(width: usize, frame_count: usize) -> Vec<String> {
    if width == 0 {
        return Vec::new();
    }
    (0..frame_count)
        .map(|i| {
            let pos = i % width;
            let mut line = " ".repeat(pos);
            line.push(BULL_GLYPH);
            line.push_str(&" ".repeat(width - pos - 1));
            line
        })
        .collect()
}
