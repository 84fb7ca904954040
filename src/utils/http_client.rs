use reqwest::Client;
use std::time::Duration;
use anyhow::Result;
use tracing::info;

pub struct HttpClientFactory;

impl HttpClientFactory {
    /// 创建报价用的通用 HTTP Client
    /// 只限制建连时间；响应慢只会推迟下一次读数
    pub fn create() -> Result<Client> {
        let builder = Client::builder()
            .user_agent(concat!("btc_tray/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Some(Duration::from_secs(30)));

        info!("🌐 [Http Client] Ready");

        let client = builder.build()?;
        Ok(client)
    }
}
