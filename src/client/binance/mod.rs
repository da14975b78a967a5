pub mod model;

use crate::{
    Timestamp,
    client::{Balance, FuturesApi},
    config::Credentials,
    error::ClientError,
    logging::source,
    order::{OrderRequest, OrderResult},
};
use chrono::Utc;
use const_format::concatcp;
use eyre::{Result, WrapErr, eyre};
use hmac::{Hmac, Mac};
use http::Method;
use itertools::Itertools;
use model::*;
use reqwest::{
    Client,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use sha2::Sha256;
use std::time::Duration;
use url::{Url, form_urlencoded};
use uuid::Uuid;

pub const TESTNET_URL: &str = "https://testnet.binancefuture.com";
pub const DEFAULT_RECV_WINDOW: u64 = 5000;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const FAPI_V1: &str = "/fapi/v1";
const ORDER: &str = concatcp!(FAPI_V1, "/order");
const OPEN_ORDERS: &str = concatcp!(FAPI_V1, "/openOrders");
const TICKER_PRICE: &str = concatcp!(FAPI_V1, "/ticker/price");
const TIME: &str = concatcp!(FAPI_V1, "/time");
const ACCOUNT: &str = "/fapi/v2/account";

const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-mbx-apikey");

type HmacSha256 = Hmac<Sha256>;

/// Binance U 本位合约 REST 客户端
///
/// 需要签名的请求在查询字符串末尾追加 `recvWindow`、`timestamp`，
/// 再用 secret 对整个查询字符串做 HMAC-SHA256，十六进制结果作为 `signature`。
pub struct BinanceClient {
    base_url: Url,
    client: Client,
    /// 已用 secret 初始化好的 HMAC，每次签名时克隆
    mac: HmacSha256,
    recv_window: u64,
    itoa_buffer: itoa::Buffer,
}

#[bon::bon]
impl BinanceClient {
    #[builder]
    pub fn new(
        credentials: Credentials,
        #[builder(default = TESTNET_URL)] base_url: &str,
        #[builder(default = DEFAULT_RECV_WINDOW)] recv_window: u64,
        #[builder(default = DEFAULT_TIMEOUT)] timeout: Duration,
    ) -> Result<Self> {
        let mut api_key = HeaderValue::from_str(credentials.api_key())
            .wrap_err("API key is not a valid header value")?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, api_key);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .wrap_err("failed to build HTTP client")?;

        let mac = HmacSha256::new_from_slice(credentials.api_secret().as_bytes())
            .map_err(|e| eyre!("invalid API secret: {e}"))?;

        Ok(BinanceClient {
            base_url: base_url
                .parse::<Url>()
                .wrap_err_with(|| format!("invalid base url '{base_url}'"))?,
            client,
            mac,
            recv_window,
            itoa_buffer: itoa::Buffer::new(),
        })
    }

    fn signed_query(&mut self, params: &[(&str, String)]) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
        query.append_pair("recvWindow", self.itoa_buffer.format(self.recv_window));
        query.append_pair(
            "timestamp",
            self.itoa_buffer.format(Utc::now().timestamp_millis()),
        );
        let mut query = query.finish();

        let signature = sign(&self.mac, &query);
        query.push_str("&signature=");
        query.push_str(&signature);
        query
    }

    async fn send<T: DeserializeOwned>(
        &mut self,
        method: Method,
        path: &str,
        params: Vec<(&'static str, String)>,
        signed: bool,
    ) -> Result<T, ClientError> {
        let query = if signed {
            self.signed_query(&params)
        } else {
            form_urlencoded::Serializer::new(String::new())
                .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
                .finish()
        };

        let mut url = self.base_url.clone();
        url.set_path(path);
        if !query.is_empty() {
            url.set_query(Some(&query));
        }

        log::debug!(target: source::CLIENT, "request: {method} {path} {}", mask_signature(&query));

        let resp = self.client.request(method, url).send().await?;
        let status = resp.status();
        let body = resp.bytes().await?.to_vec();

        log::debug!(
            target: source::CLIENT,
            "response: {status} {}",
            String::from_utf8_lossy(&body)
        );

        Ok(decode(status, body)?)
    }
}

impl FuturesApi for BinanceClient {
    async fn place_order(&mut self, order: &OrderRequest) -> Result<OrderResult, ClientError> {
        let client_order_id = format!("fb-{}", Uuid::new_v4().simple());
        let params = order_params(order, &client_order_id);

        self.send::<BinanceOrder>(Method::POST, ORDER, params, true)
            .await
            .map(Into::into)
    }

    async fn open_orders(&mut self, symbol: Option<&str>) -> Result<Vec<OrderResult>, ClientError> {
        let params = symbol
            .map(|s| vec![("symbol", s.to_owned())])
            .unwrap_or_default();

        let orders = self
            .send::<Vec<BinanceOrder>>(Method::GET, OPEN_ORDERS, params, true)
            .await?;

        Ok(orders.into_iter().map(Into::into).collect())
    }

    async fn balance(&mut self) -> Result<Balance, ClientError> {
        self.send::<AccountInfo>(Method::GET, ACCOUNT, Vec::new(), true)
            .await
            .map(Into::into)
    }

    async fn price(&mut self, symbol: &str) -> Result<Decimal, ClientError> {
        let params = vec![("symbol", symbol.to_owned())];

        self.send::<TickerPrice>(Method::GET, TICKER_PRICE, params, false)
            .await
            .map(|t| t.price)
    }

    async fn cancel_order(&mut self, symbol: &str, order_id: i64) -> Result<OrderResult, ClientError> {
        let params = vec![
            ("symbol", symbol.to_owned()),
            ("orderId", order_id.to_string()),
        ];

        self.send::<BinanceOrder>(Method::DELETE, ORDER, params, true)
            .await
            .map(Into::into)
    }

    async fn server_time(&mut self) -> Result<Timestamp, ClientError> {
        self.send::<ServerTime>(Method::GET, TIME, Vec::new(), false)
            .await
            .map(|t| t.server_time)
    }
}

/// HMAC-SHA256 签名，返回小写十六进制
fn sign(mac: &HmacSha256, payload: &str) -> String {
    let mut mac = mac.clone();
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// 日志里不输出签名
fn mask_signature(query: &str) -> String {
    query
        .split('&')
        .map(|kv| {
            if kv.starts_with("signature=") {
                "signature=***"
            } else {
                kv
            }
        })
        .join("&")
}
