use serde::Deserialize;

/// 一次报价
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    pub price: f64,
    pub change_percent: f64,
}

impl Quote {
    pub fn new(price: f64, change_percent: f64) -> Self {
        Self { price, change_percent }
    }
}

/// Binance `/api/v3/ticker/24hr` (数字以字符串返回)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinanceTicker {
    pub last_price: String,
    pub price_change_percent: String,
}

#[derive(Debug, Deserialize)]
pub struct CoinGeckoResponse {
    pub bitcoin: CoinGeckoBitcoin,
}

#[derive(Debug, Deserialize)]
pub struct CoinGeckoBitcoin {
    pub usd: f64,
    pub usd_24h_change: f64,
}
