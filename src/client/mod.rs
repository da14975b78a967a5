use crate::{Timestamp, error::ClientError, order::{OrderRequest, OrderResult}};
use rust_decimal::Decimal;

pub mod binance;

pub use binance::BinanceClient;

/// 合约账户概况
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Balance {
    pub total_wallet_balance: Decimal,
    pub available_balance: Decimal,
    pub total_unrealized_profit: Decimal,
}

/// 交易所合约 REST 接口
///
/// 每个方法只发出一次 HTTP 请求，不做任何重试。
pub trait FuturesApi {
    fn place_order(
        &mut self,
        order: &OrderRequest,
    ) -> impl Future<Output = Result<OrderResult, ClientError>> + Send;

    /// `symbol` 为 `None` 时返回所有交易对的挂单
    fn open_orders(
        &mut self,
        symbol: Option<&str>,
    ) -> impl Future<Output = Result<Vec<OrderResult>, ClientError>> + Send;

    fn balance(&mut self) -> impl Future<Output = Result<Balance, ClientError>> + Send;

    /// 最新成交价
    fn price(&mut self, symbol: &str) -> impl Future<Output = Result<Decimal, ClientError>> + Send;

    fn cancel_order(
        &mut self,
        symbol: &str,
        order_id: i64,
    ) -> impl Future<Output = Result<OrderResult, ClientError>> + Send;

    /// 服务器时间，可用来检测连通性
    fn server_time(&mut self) -> impl Future<Output = Result<Timestamp, ClientError>> + Send;
}
