use crate::order::RetryPolicy;
use bytestring::ByteString;
use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
use eyre::{Result, WrapErr, bail, ensure};
use serde::Deserialize;
use std::{fmt, path::PathBuf, time::Duration};

pub const API_KEY_VAR: &str = "BINANCE_TESTNET_API_KEY";
pub const API_SECRET_VAR: &str = "BINANCE_TESTNET_API_SECRET";

const CONFIG_FILE: &str = "config/futures-bot";
const ENV_PREFIX: &str = "BOT";

/// 运行参数
///
/// 依次读取默认值、`config/futures-bot.{toml,yaml,json}`（可选）和 `BOT_` 前缀的环境变量，
/// 后者覆盖前者。
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub base_url: String,
    /// 毫秒
    pub recv_window: u64,
    pub timeout_secs: u64,
    pub log_file: PathBuf,
    pub log_level: String,
    pub quote_asset: String,
    pub network_retry: RetryPolicy,
}

impl Settings {
    /// 先加载 `.env`，其中的 `BOT_` 变量和凭证都会生效
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_layers()
    }

    fn from_layers() -> Result<Self> {
        Self::from_builder(
            defaults()?
                .add_source(File::with_name(CONFIG_FILE).required(false))
                .add_source(Environment::with_prefix(ENV_PREFIX)),
        )
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let settings: Settings = builder
            .build()
            .wrap_err("failed to load settings")?
            .try_deserialize()
            .wrap_err("invalid settings")?;

        let quote_asset = settings.quote_asset.trim();
        ensure!(
            !quote_asset.is_empty() && quote_asset.chars().all(|c| c.is_ascii_alphanumeric()),
            "invalid settings: quote_asset '{}' must be non-empty letters or digits",
            settings.quote_asset
        );

        Ok(settings)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>> {
    Ok(Config::builder()
        .set_default("base_url", crate::client::binance::TESTNET_URL)?
        .set_default("recv_window", crate::client::binance::DEFAULT_RECV_WINDOW)?
        .set_default("timeout_secs", crate::client::binance::DEFAULT_TIMEOUT.as_secs())?
        .set_default("log_file", "logs/trading_bot.log")?
        .set_default("log_level", "debug")?
        .set_default("quote_asset", crate::order::validate::DEFAULT_QUOTE_ASSET)?
        .set_default("network_retry", "manual")?)
}

/// API 凭证，构造时即保证非空
#[derive(Clone)]
pub struct Credentials {
    api_key: ByteString,
    api_secret: ByteString,
}

impl Credentials {
    pub fn new(api_key: impl Into<ByteString>, api_secret: impl Into<ByteString>) -> Result<Self> {
        let api_key = api_key.into();
        let api_secret = api_secret.into();

        if api_key.trim().is_empty() {
            bail!("API key is empty");
        }
        if api_secret.trim().is_empty() {
            bail!("API secret is empty");
        }

        Ok(Self {
            api_key,
            api_secret,
        })
    }

    /// 从环境变量读取，`.env` 已由 [`Settings::load`] 加载
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_VAR).unwrap_or_default();
        let api_secret = std::env::var(API_SECRET_VAR).unwrap_or_default();

        Self::new(api_key, api_secret)
            .wrap_err_with(|| format!("set {API_KEY_VAR} and {API_SECRET_VAR} in .env or the environment"))
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn api_secret(&self) -> &str {
        &self.api_secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"***")
            .finish()
    }
}
