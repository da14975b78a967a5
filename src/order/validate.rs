use super::{OrderRequest, OrderType, RawOrderInput, Side, TimeInForce};
use crate::{
    Symbol,
    error::{Field, ValidationError},
};
use rust_decimal::Decimal;
use std::str::FromStr;

pub const DEFAULT_QUOTE_ASSET: &str = "USDT";

/// 下单参数校验器
///
/// 所有检查都是纯函数，任何一项失败都会立即返回，不会触发网络请求。
#[derive(Debug, Clone)]
pub struct OrderValidator {
    quote_asset: String,
}

impl Default for OrderValidator {
    fn default() -> Self {
        Self::new(DEFAULT_QUOTE_ASSET)
    }
}

impl OrderValidator {
    /// `quote_asset` 由 [`crate::config::Settings`] 保证非空
    pub fn new(quote_asset: impl AsRef<str>) -> Self {
        Self {
            quote_asset: quote_asset.as_ref().trim().to_ascii_uppercase(),
        }
    }

    pub fn quote_asset(&self) -> &str {
        &self.quote_asset
    }

    /// 按 symbol、side、type、quantity、price 的顺序校验
    ///
    /// 市价单会忽略 price 和 time-in-force，不做任何解析。
    pub fn validate(&self, input: &RawOrderInput) -> Result<OrderRequest, ValidationError> {
        let symbol = self.symbol(&input.symbol)?;
        let side = side(&input.side)?;
        let order_type = order_type(&input.order_type)?;
        let quantity = quantity(&input.quantity)?;

        let order = if order_type == OrderType::Limit {
            let price = limit_price(input.price.as_deref())?;
            let mut order = OrderRequest::limit(symbol, side, quantity, price);
            if let Some(raw) = input.time_in_force.as_deref() {
                order = order.with_time_in_force(time_in_force(raw)?);
            }
            order
        } else {
            OrderRequest::market(symbol, side, quantity)
        };

        Ok(order.with_reduce_only(input.reduce_only))
    }

    pub fn symbol(&self, raw: &str) -> Result<Symbol, ValidationError> {
        let symbol = raw.trim().to_ascii_uppercase();

        if symbol.is_empty() {
            return Err(ValidationError::new(Field::Symbol, "symbol is required"));
        }
        if !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ValidationError::new(
                Field::Symbol,
                format!("'{symbol}' must contain only letters and digits"),
            ));
        }
        if !symbol.ends_with(&self.quote_asset) || symbol.len() == self.quote_asset.len() {
            return Err(ValidationError::new(
                Field::Symbol,
                format!("'{symbol}' must end with {}", self.quote_asset),
            ));
        }

        Ok(symbol)
    }
}

pub fn side(raw: &str) -> Result<Side, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::new(Field::Side, "side is required"));
    }
    Side::from_str(raw)
        .map_err(|_| ValidationError::new(Field::Side, format!("'{raw}' must be BUY or SELL")))
}

pub fn order_type(raw: &str) -> Result<OrderType, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::new(Field::OrderType, "order type is required"));
    }
    OrderType::from_str(raw)
        .ok()
        .filter(|ty| ty.is_supported())
        .ok_or_else(|| {
            ValidationError::new(Field::OrderType, format!("'{raw}' must be MARKET or LIMIT"))
        })
}

pub fn time_in_force(raw: &str) -> Result<TimeInForce, ValidationError> {
    let raw = raw.trim();
    TimeInForce::from_str(raw)
        .ok()
        .filter(|tif| tif.is_supported())
        .ok_or_else(|| {
            ValidationError::new(
                Field::TimeInForce,
                format!("'{raw}' must be one of GTC, IOC, FOK, GTX, GTD"),
            )
        })
}

pub fn quantity(raw: &str) -> Result<Decimal, ValidationError> {
    positive_decimal(Field::Quantity, raw)
}

/// 限价单的价格必须存在且大于 0
pub fn limit_price(raw: Option<&str>) -> Result<Decimal, ValidationError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => positive_decimal(Field::Price, raw),
        None => Err(ValidationError::new(
            Field::Price,
            "price is required for LIMIT orders",
        )),
    }
}

fn positive_decimal(field: Field, raw: &str) -> Result<Decimal, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::new(field, format!("{field} is required")));
    }

    let value = Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| {
            // 语法合法但超出 Decimal 的精度或范围
            if raw.parse::<f64>().is_ok_and(f64::is_finite) {
                ValidationError::new(field, format!("'{raw}' is out of range"))
            } else {
                ValidationError::new(field, format!("'{raw}' is not a number"))
            }
        })?;

    if value <= Decimal::ZERO {
        return Err(ValidationError::new(field, "must be greater than 0"));
    }

    Ok(value.normalize())
}

#[cfg(test)]
mod test {
    use super::*;

    fn input(symbol: &str, side: &str, ty: &str, qty: &str, price: Option<&str>) -> RawOrderInput {
        RawOrderInput {
            symbol: symbol.into(),
            side: side.into(),
            order_type: ty.into(),
            quantity: qty.into(),
            price: price.map(Into::into),
            ..Default::default()
        }
    }

    #[test]
    fn accepts_market_order() {
        let req = OrderValidator::default()
            .validate(&input(" btcusdt ", "buy", "market", "0.001", None))
            .unwrap();

        assert_eq!(req.symbol(), "BTCUSDT");
        assert_eq!(req.side(), Side::Buy);
        assert_eq!(req.order_type(), OrderType::Market);
        assert_eq!(req.quantity(), Decimal::new(1, 3));
        assert_eq!(req.price(), None);
    }

    #[test]
    fn accepts_limit_order_with_gtc() {
        let req = OrderValidator::default()
            .validate(&input("BTCUSDT", "SELL", "LIMIT", "0.001", Some("110000")))
            .unwrap();

        assert_eq!(req.price(), Some(Decimal::new(110000, 0)));
        assert_eq!(req.time_in_force(), Some(TimeInForce::Gtc));
    }

    #[test]
    fn rejects_symbols_without_quote_suffix() {
        let validator = OrderValidator::default();
        for symbol in ["BTCBUSD", "ETH", "USDT", "", "   ", "BTC-USDT", "BTCUSD"] {
            let err = validator
                .validate(&input(symbol, "BUY", "MARKET", "1", None))
                .unwrap_err();
            assert_eq!(err.field, Field::Symbol, "symbol {symbol:?}");
        }
    }

    #[test]
    fn quote_asset_is_configurable() {
        let validator = OrderValidator::new("busd");
        assert_eq!(validator.symbol("ethbusd").unwrap(), "ETHBUSD");
        assert!(validator.symbol("ETHUSDT").is_err());
    }

    #[test]
    fn rejects_non_positive_quantity() {
        let validator = OrderValidator::default();
        for qty in ["0", "-1", "-0.001", "0.000", "abc", ""] {
            for (ty, price) in [("MARKET", None), ("LIMIT", Some("100"))] {
                let err = validator
                    .validate(&input("BTCUSDT", "BUY", ty, qty, price))
                    .unwrap_err();
                assert_eq!(err.field, Field::Quantity, "quantity {qty:?}");
            }
        }
    }

    #[test]
    fn limit_requires_positive_price() {
        let validator = OrderValidator::default();
        for price in [None, Some(""), Some("0"), Some("-5"), Some("cheap")] {
            let err = validator
                .validate(&input("BTCUSDT", "BUY", "LIMIT", "1", price))
                .unwrap_err();
            assert_eq!(err.field, Field::Price, "price {price:?}");
        }
    }

    #[test]
    fn market_ignores_any_price() {
        let validator = OrderValidator::default();
        for price in [None, Some("0"), Some("-5"), Some("cheap"), Some("100")] {
            let req = validator
                .validate(&input("BTCUSDT", "SELL", "MARKET", "1", price))
                .unwrap();
            assert_eq!(req.price(), None);
        }
    }

    #[test]
    fn rejects_unknown_side_and_type() {
        let validator = OrderValidator::default();
        let err = validator
            .validate(&input("BTCUSDT", "HOLD", "MARKET", "1", None))
            .unwrap_err();
        assert_eq!(err.field, Field::Side);

        for ty in ["STOP", "STOP_MARKET", "take_profit_market", "UNKNOWN"] {
            let err = validator
                .validate(&input("BTCUSDT", "BUY", ty, "1", Some("100")))
                .unwrap_err();
            assert_eq!(err.field, Field::OrderType, "type {ty:?}");
        }
    }

    #[test]
    fn validation_is_idempotent() {
        let validator = OrderValidator::default();
        let raw = input("ethusdt", "Sell", "Limit", "1.50", Some("3000.00"));
        assert_eq!(validator.validate(&raw), validator.validate(&raw));
    }

    #[test]
    fn limit_time_in_force_override() {
        let validator = OrderValidator::default();
        let mut raw = input("BTCUSDT", "BUY", "LIMIT", "1", Some("100"));
        raw.time_in_force = Some("ioc".into());
        raw.reduce_only = true;

        let req = validator.validate(&raw).unwrap();
        assert_eq!(req.time_in_force(), Some(TimeInForce::Ioc));
        assert!(req.reduce_only());

        for tif in ["forever", "GTE_GTC", "unknown"] {
            raw.time_in_force = Some(tif.into());
            assert_eq!(validator.validate(&raw).unwrap_err().field, Field::TimeInForce);
        }

        raw.order_type = "MARKET".into();
        assert_eq!(validator.validate(&raw).unwrap().time_in_force(), None);
    }

    #[test]
    fn accepts_scientific_notation() {
        assert_eq!(quantity("1e-3").unwrap(), Decimal::new(1, 3));
    }

    #[test]
    fn unrepresentable_numbers_are_out_of_range() {
        for raw in ["1e-100", "1e30"] {
            let err = quantity(raw).unwrap_err();
            assert_eq!(err.field, Field::Quantity);
            assert!(err.reason.ends_with("is out of range"), "{raw}: {}", err.reason);
        }

        for raw in ["abc", "1e", "inf", "NaN"] {
            let err = quantity(raw).unwrap_err();
            assert!(err.reason.ends_with("is not a number"), "{raw}: {}", err.reason);
        }
    }
}
