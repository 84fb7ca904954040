use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::structs::{BinanceTicker, CoinGeckoResponse, Quote};

const BINANCE_TICKER_URL: &str = "https://api.binance.com/api/v3/ticker/24hr?symbol=BTCUSDT";
const COINGECKO_PRICE_URL: &str =
    "https://api.coingecko.com/api/v3/simple/price?ids=bitcoin&vs_currencies=usd&include_24hr_change=true";

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error: status code {0}")]
    Status(u16),

    #[error("decode error: {0}")]
    Decode(String),
}

/// BTC 报价源
#[async_trait]
pub trait PriceFeed: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch_quote(&self) -> Result<Quote, FetchError>;
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    Binance,
    CoinGecko,
}

impl FeedKind {
    pub fn build(self, client: Client) -> Box<dyn PriceFeed> {
        match self {
            FeedKind::Binance => Box::new(BinanceFeed::new(client)),
            FeedKind::CoinGecko => Box::new(CoinGeckoFeed::new(client)),
        }
    }
}

/// GET `url`，非 2xx 一律视为失败，成功返回 body 文本
async fn get_body(client: &Client, url: &str) -> Result<String, FetchError> {
    let resp = client.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }
    Ok(resp.text().await?)
}

pub fn parse_binance(body: &str) -> Result<Quote, FetchError> {
    let ticker: BinanceTicker =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(format!("JSON decode error: {}", e)))?;

    let price = parse_decimal("price", &ticker.last_price)?;
    let change_percent = parse_decimal("change percent", &ticker.price_change_percent)?;
    Ok(Quote::new(price, change_percent))
}

pub fn parse_coingecko(body: &str) -> Result<Quote, FetchError> {
    let data: CoinGeckoResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(format!("JSON decode error: {}", e)))?;
    Ok(Quote::new(data.bitcoin.usd, data.bitcoin.usd_24h_change))
}

fn parse_decimal(field: &str, raw: &str) -> Result<f64, FetchError> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        Ok(_) => Err(FetchError::Decode(format!("{} is not finite: {}", field, raw))),
        Err(e) => Err(FetchError::Decode(format!("{} parse error: {}", field, e))),
    }
}

pub struct BinanceFeed {
    client: Client,
    url: String,
}

impl BinanceFeed {
    pub fn new(client: Client) -> Self {
        Self { client, url: BINANCE_TICKER_URL.to_string() }
    }
}

#[async_trait]
impl PriceFeed for BinanceFeed {
    fn name(&self) -> &str {
        "binance"
    }

    async fn fetch_quote(&self) -> Result<Quote, FetchError> {
        let body = get_body(&self.client, &self.url).await?;
        let quote = parse_binance(&body)?;
        debug!("binance quote: {:?}", quote);
        Ok(quote)
    }
}

pub struct CoinGeckoFeed {
    client: Client,
    url: String,
}

impl CoinGeckoFeed {
    pub fn new(client: Client) -> Self {
        Self { client, url: COINGECKO_PRICE_URL.to_string() }
    }
}

#[async_trait]
impl PriceFeed for CoinGeckoFeed {
    fn name(&self) -> &str {
        "coingecko"
    }

    async fn fetch_quote(&self) -> Result<Quote, FetchError> {
        let body = get_body(&self.client, &self.url).await?;
        let quote = parse_coingecko(&body)?;
        debug!("coingecko quote: {:?}", quote);
        Ok(quote)
    }
}
