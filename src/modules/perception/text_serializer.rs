use std::fmt;
use super::structs::Quote;
use crate::modules::display::formatter::group_thousands;

/// 日志格式，如 `$50,000.00 (+2.00%)`
impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "${} ({:+.2}%)",
            group_thousands(&format!("{:.2}", self.price)),
            self.change_percent
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_log_line() {
        assert_eq!(Quote::new(50000.0, 2.0).to_string(), "$50,000.00 (+2.00%)");
        assert_eq!(Quote::new(999.999, -1.5).to_string(), "$1,000.00 (-1.50%)");
    }
}
