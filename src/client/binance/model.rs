use crate::{
    Symbol, Timestamp,
    client::Balance,
    error::ApiError,
    order::{OrderRequest, OrderResult, OrderStatus, OrderType, Side, TimeInForce},
};
use http::StatusCode;
use rust_decimal::Decimal;
use serde::{Deserialize, de::DeserializeOwned};
use serde_with::{DisplayFromStr, serde_as};

/// 错误响应体，例如 `{"code":-4016,"msg":"Limit price can't be higher than 86856.21."}`
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub code: i64,
    pub msg: String,
}

impl From<ErrorBody> for ApiError {
    fn from(value: ErrorBody) -> Self {
        ApiError::new(value.code, value.msg)
    }
}

/// `/fapi/v1/order` 与 `/fapi/v1/openOrders` 返回的订单
#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinanceOrder {
    pub order_id: i64,
    pub client_order_id: Option<String>,
    pub symbol: Symbol,
    pub side: Side,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub status: OrderStatus,
    #[serde_as(as = "DisplayFromStr")]
    pub orig_qty: Decimal,
    #[serde_as(as = "DisplayFromStr")]
    pub executed_qty: Decimal,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub price: Option<Decimal>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub avg_price: Option<Decimal>,
    pub time_in_force: Option<TimeInForce>,
    #[serde(default)]
    pub reduce_only: bool,
    #[serde(default)]
    pub update_time: Timestamp,
}

impl From<BinanceOrder> for OrderResult {
    fn from(value: BinanceOrder) -> Self {
        // 交易所用 "0" 表示没有价格
        let non_zero = |d: Option<Decimal>| d.filter(|d| !d.is_zero()).map(|d| d.normalize());

        let time_in_force = match value.order_type {
            OrderType::Market => None,
            _ => value.time_in_force,
        };

        OrderResult {
            order_id: value.order_id,
            client_order_id: value.client_order_id,
            symbol: value.symbol,
            side: value.side,
            order_type: value.order_type,
            status: value.status,
            requested_quantity: value.orig_qty.normalize(),
            executed_quantity: value.executed_qty.normalize(),
            price: non_zero(value.price),
            average_price: non_zero(value.avg_price),
            time_in_force,
            reduce_only: value.reduce_only,
            update_time: value.update_time,
        }
    }
}

/// `/fapi/v2/account`，只取需要的字段
#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    #[serde_as(as = "DisplayFromStr")]
    pub total_wallet_balance: Decimal,
    #[serde_as(as = "DisplayFromStr")]
    pub available_balance: Decimal,
    #[serde_as(as = "DisplayFromStr")]
    pub total_unrealized_profit: Decimal,
}

impl From<AccountInfo> for Balance {
    fn from(value: AccountInfo) -> Self {
        Balance {
            total_wallet_balance: value.total_wallet_balance,
            available_balance: value.available_balance,
            total_unrealized_profit: value.total_unrealized_profit,
        }
    }
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub struct TickerPrice {
    pub symbol: Symbol,
    #[serde_as(as = "DisplayFromStr")]
    pub price: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerTime {
    pub server_time: Timestamp,
}

/// 下单参数，顺序与交易所文档一致
pub(super) fn order_params(
    order: &OrderRequest,
    client_order_id: &str,
) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("symbol", order.symbol().to_owned()),
        ("side", order.side().to_string()),
        ("type", order.order_type().to_string()),
        ("quantity", order.quantity().normalize().to_string()),
    ];

    if let Some(price) = order.price() {
        params.push(("price", price.normalize().to_string()));
    }
    if let Some(tif) = order.time_in_force() {
        params.push(("timeInForce", tif.to_string()));
    }
    if order.reduce_only() {
        params.push(("reduceOnly", "true".to_owned()));
    }

    params.push(("newClientOrderId", client_order_id.to_owned()));
    // 市价单需要 RESULT 才会返回成交均价
    params.push(("newOrderRespType", "RESULT".to_owned()));

    params
}

const MAX_ERROR_BODY: usize = 200;

/// 把 HTTP 状态码和响应体解析成数据或 [`ApiError`]
///
/// - 非 2xx：优先解析 `{code, msg}`，否则用 -1000 包装状态码和响应体；
/// - 2xx：解析失败时再尝试 `{code, msg}`，仍失败则视为格式错误。
pub fn decode<T: DeserializeOwned>(status: StatusCode, body: Vec<u8>) -> Result<T, ApiError> {
    let mut scratch = body.clone();

    if !status.is_success() {
        return Err(match simd_json::serde::from_slice::<ErrorBody>(&mut scratch) {
            Ok(err) => err.into(),
            Err(_) => {
                let text: String = String::from_utf8_lossy(&body)
                    .trim()
                    .chars()
                    .take(MAX_ERROR_BODY)
                    .collect();
                ApiError::unknown(format!("HTTP {status}: {text}"))
            }
        });
    }

    match simd_json::serde::from_slice::<T>(&mut scratch) {
        Ok(data) => Ok(data),
        Err(decode_err) => {
            let mut body = body;
            match simd_json::serde::from_slice::<ErrorBody>(&mut body) {
                Ok(err) => Err(err.into()),
                Err(_) => Err(ApiError::unknown(format!(
                    "malformed response: {decode_err}"
                ))),
            }
        }
    }
}
