use crate::{Symbol, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{AsRefStr, Display, EnumString};

pub mod submit;
pub mod validate;

pub use submit::{OrderSubmitter, RetryPolicy};
pub use validate::OrderValidator;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Side {
    Buy,
    Sell,
}

/// 订单类型
///
/// 下单只支持 `Market` 和 `Limit`，其余变体只在查询挂单时出现。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum OrderType {
    Market,
    Limit,
    Stop,
    StopMarket,
    TakeProfit,
    TakeProfitMarket,
    TrailingStopMarket,
    #[serde(other)]
    Unknown,
}

impl OrderType {
    /// 能否通过本工具下单
    pub fn is_supported(self) -> bool {
        matches!(self, OrderType::Market | OrderType::Limit)
    }
}

/// 有效方式，限价单默认 GTC
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum TimeInForce {
    /// Good Till Cancel
    #[default]
    Gtc,
    /// Immediate or Cancel
    Ioc,
    /// Fill or Kill
    Fok,
    /// Good Till Crossing (Post Only)
    Gtx,
    /// Good Till Date
    Gtd,
    /// 止盈止损单使用，不能用于下单
    GteGtc,
    #[serde(other)]
    Unknown,
}

impl TimeInForce {
    /// 能否用于限价单
    pub fn is_supported(self) -> bool {
        !matches!(self, TimeInForce::GteGtc | TimeInForce::Unknown)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    New,
    PartiallyFilled,
    Filled,
    Canceled,
    Rejected,
    Expired,
    ExpiredInMatch,
    #[serde(other)]
    Unknown,
}

/// 用户输入的原始订单参数，尚未校验
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOrderInput {
    pub symbol: String,
    pub side: String,
    pub order_type: String,
    pub quantity: String,
    pub price: Option<String>,
    /// 只对限价单生效，缺省为 GTC
    pub time_in_force: Option<String>,
    pub reduce_only: bool,
}

/// 通过校验的下单请求
///
/// 只能由 [`OrderValidator`] 构造，保证：
/// - 限价单一定带价格和有效方式，市价单一定不带；
/// - `quantity` 与 `price` 都大于 0；
/// - `symbol` 为大写并以计价资产结尾。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    symbol: Symbol,
    side: Side,
    order_type: OrderType,
    quantity: Decimal,
    price: Option<Decimal>,
    time_in_force: Option<TimeInForce>,
    reduce_only: bool,
}

impl OrderRequest {
    pub(crate) fn market(symbol: impl Into<Symbol>, side: Side, quantity: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type: OrderType::Market,
            quantity,
            price: None,
            time_in_force: None,
            reduce_only: false,
        }
    }

    pub(crate) fn limit(
        symbol: impl Into<Symbol>,
        side: Side,
        quantity: Decimal,
        price: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type: OrderType::Limit,
            quantity,
            price: Some(price),
            time_in_force: Some(TimeInForce::default()),
            reduce_only: false,
        }
    }

    /// 覆盖限价单的有效方式，对市价单无效
    pub fn with_time_in_force(mut self, time_in_force: TimeInForce) -> Self {
        if self.order_type == OrderType::Limit {
            self.time_in_force = Some(time_in_force);
        }
        self
    }

    pub fn with_reduce_only(mut self, reduce_only: bool) -> Self {
        self.reduce_only = reduce_only;
        self
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn price(&self) -> Option<Decimal> {
        self.price
    }

    pub fn time_in_force(&self) -> Option<TimeInForce> {
        self.time_in_force
    }

    pub fn reduce_only(&self) -> bool {
        self.reduce_only
    }
}

impl fmt::Display for OrderRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.side,
            self.order_type,
            self.quantity.normalize(),
            self.symbol
        )?;
        if let Some(price) = self.price {
            write!(f, " @ {}", price.normalize())?;
        }
        if let Some(tif) = self.time_in_force {
            write!(f, " {tif}")?;
        }
        if self.reduce_only {
            f.write_str(" reduce-only")?;
        }
        Ok(())
    }
}

/// 一次成功下单（或查询）得到的订单快照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderResult {
    pub order_id: i64,
    pub client_order_id: Option<String>,
    pub symbol: Symbol,
    pub side: Side,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub requested_quantity: Decimal,
    pub executed_quantity: Decimal,
    /// 限价，市价单为 `None`
    pub price: Option<Decimal>,
    /// 成交均价，尚未成交时为 `None`
    pub average_price: Option<Decimal>,
    pub time_in_force: Option<TimeInForce>,
    pub reduce_only: bool,
    pub update_time: Timestamp,
}

const RULE: &str = "==================================================";

impl fmt::Display for OrderResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{RULE}")?;
        writeln!(f, "Order ID:     {}", self.order_id)?;
        writeln!(f, "Symbol:       {}", self.symbol)?;
        writeln!(f, "Side:         {}", self.side)?;
        writeln!(f, "Type:         {}", self.order_type)?;
        writeln!(f, "Status:       {}", self.status)?;
        writeln!(f, "Quantity:     {}", self.requested_quantity.normalize())?;
        writeln!(f, "Executed:     {}", self.executed_quantity.normalize())?;
        if let Some(price) = self.price {
            writeln!(f, "Price:        {}", price.normalize())?;
        }
        if let Some(avg) = self.average_price {
            writeln!(f, "Avg Price:    {}", avg.normalize())?;
        }
        if let Some(tif) = self.time_in_force {
            writeln!(f, "TimeInForce:  {tif}")?;
        }
        write!(f, "{RULE}")
    }
}
