use crate::modules::display::formatter::effective_sensitivity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// 判断新读数是否值得播放动画
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriggerPolicy {
    /// `|change| >= threshold`
    Fixed(f64),
    /// `|change| >= 灵敏度` (菜单里的选择)
    Sensitivity,
    /// `|change - 上一次 change| >= threshold`
    ConsecutiveDelta(f64),
}

impl TriggerPolicy {
    pub fn evaluate(&self, previous_change: f64, change: f64, sensitivity: f64) -> Option<Direction> {
        match *self {
            TriggerPolicy::Fixed(threshold) => crossing(change, threshold),
            TriggerPolicy::Sensitivity => crossing(change, sensitivity),
            TriggerPolicy::ConsecutiveDelta(threshold) => crossing(change - previous_change, threshold),
        }
    }
}

fn crossing(value: f64, threshold: f64) -> Option<Direction> {
    if !value.is_finite() {
        return None;
    }
    let threshold = effective_sensitivity(threshold);
    if value >= threshold {
        Some(Direction::Up)
    } else if value <= -threshold {
        Some(Direction::Down)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensitivity_policy_follows_user_factor() {
        let p = TriggerPolicy::Sensitivity;
        assert_eq!(p.evaluate(0.0, 6.0, 2.5), Some(Direction::Up));
        assert_eq!(p.evaluate(0.0, 2.0, 2.5), None);
        assert_eq!(p.evaluate(0.0, -2.5, 2.5), Some(Direction::Down));
        assert_eq!(p.evaluate(0.0, 0.6, 0.5), Some(Direction::Up));
    }

    #[test]
    fn fixed_policy_ignores_user_factor() {
        let p = TriggerPolicy::Fixed(5.0);
        assert_eq!(p.evaluate(0.0, 4.99, 0.5), None);
        assert_eq!(p.evaluate(0.0, 5.0, 0.5), Some(Direction::Up));
        assert_eq!(p.evaluate(0.0, -5.0, 0.5), Some(Direction::Down));
    }

    #[test]
    fn consecutive_delta_compares_readings() {
        let p = TriggerPolicy::ConsecutiveDelta(0.5);
        assert_eq!(p.evaluate(6.0, 6.2, 2.5), None);
        assert_eq!(p.evaluate(6.0, 6.5, 2.5), Some(Direction::Up));
        assert_eq!(p.evaluate(-1.0, -1.75, 2.5), Some(Direction::Down));
    }

    #[test]
    fn zero_threshold_does_not_fire_on_flat_market() {
        assert_eq!(TriggerPolicy::Sensitivity.evaluate(0.0, 0.0, 0.0), None);
        assert_eq!(TriggerPolicy::Fixed(0.0).evaluate(0.0, f64::NAN, 0.5), None);
    }
}
