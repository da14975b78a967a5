use strum::{AsRefStr, Display};
use thiserror::Error;

/// 交易所未给出错误码时使用的兜底错误码（即 Binance 的 `UNKNOWN`）
pub const UNKNOWN_ERROR_CODE: i64 = -1000;

const RETRY_HINT: &str = "check your connection and retry manually";

/// 校验失败的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Field {
    Symbol,
    Side,
    #[strum(serialize = "type")]
    OrderType,
    Quantity,
    Price,
    #[strum(serialize = "time-in-force")]
    TimeInForce,
}

/// 本地输入错误，永远不会发出网络请求
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: Field,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: Field, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// 交易所拒绝了请求
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("API error {code}: {message}")]
pub struct ApiError {
    pub code: i64,
    pub message: String,
}

impl ApiError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(UNKNOWN_ERROR_CODE, message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum NetworkErrorKind {
    Timeout,
    Connect,
    Other,
}

/// 传输层错误：超时、DNS 解析失败、连接被拒绝或重置
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("network error ({kind}): {message}")]
pub struct NetworkError {
    pub kind: NetworkErrorKind,
    pub message: String,
}

impl NetworkError {
    pub fn new(kind: NetworkErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            NetworkErrorKind::Timeout
        } else if err.is_connect() {
            NetworkErrorKind::Connect
        } else {
            NetworkErrorKind::Other
        };

        // reqwest 的 Display 只有最外层信息，拼上 source 链才能看出是 DNS 还是拒绝连接
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }

        NetworkError::new(kind, message)
    }
}

/// `FuturesApi` 的错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Network(#[from] NetworkError),
}

impl ClientError {
    /// 只有网络错误才建议手动重试
    pub fn retry_hint(&self) -> Option<&'static str> {
        match self {
            ClientError::Network(_) => Some(RETRY_HINT),
            ClientError::Api(_) => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Network(err.into())
    }
}

/// 一次下单的失败结果，三者互斥
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Network(#[from] NetworkError),
}

impl From<ClientError> for SubmitError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Api(e) => SubmitError::Api(e),
            ClientError::Network(e) => SubmitError::Network(e),
        }
    }
}

impl SubmitError {
    pub fn retry_hint(&self) -> Option<&'static str> {
        match self {
            SubmitError::Network(_) => Some(RETRY_HINT),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn field_names_match_cli_flags() {
        assert_eq!(Field::OrderType.to_string(), "type");
        assert_eq!(Field::Quantity.as_ref(), "quantity");
    }

    #[test]
    fn validation_error_names_the_field() {
        let err = ValidationError::new(Field::Price, "must be greater than 0");
        assert_eq!(err.to_string(), "invalid price: must be greater than 0");
    }

    #[test]
    fn client_error_splits_into_submit_error() {
        let api: SubmitError = ClientError::from(ApiError::new(-4016, "too high")).into();
        assert_eq!(api, SubmitError::Api(ApiError::new(-4016, "too high")));
        assert!(api.retry_hint().is_none());

        let net: SubmitError =
            ClientError::from(NetworkError::new(NetworkErrorKind::Timeout, "timed out")).into();
        assert!(matches!(net, SubmitError::Network(ref e) if e.kind == NetworkErrorKind::Timeout));
        assert!(net.retry_hint().is_some());
        assert_eq!(net.to_string(), "network error (TIMEOUT): timed out");
    }

    #[test]
    fn query_and_order_failures_share_the_hint() {
        let timeout = NetworkError::new(NetworkErrorKind::Timeout, "timed out");
        let client = ClientError::from(timeout.clone());

        assert_eq!(client.retry_hint(), SubmitError::from(timeout).retry_hint());
        assert_eq!(ClientError::from(ApiError::unknown("x")).retry_hint(), None);
    }
}
