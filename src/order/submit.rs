use super::{OrderResult, OrderValidator, RawOrderInput};
use crate::{
    client::FuturesApi,
    error::{ClientError, SubmitError},
    logging::{LogSink, source},
};
use serde::Deserialize;

/// 网络错误时是否自动重试
///
/// 超时的请求可能已经被交易所受理，自动重试有重复下单的风险，所以默认交给用户决定。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetryPolicy {
    #[default]
    Manual,
    /// 网络错误后重新走一遍完整流程（新的时间戳、签名和 clientOrderId）
    Once,
}

impl RetryPolicy {
    fn attempts(self) -> usize {
        match self {
            RetryPolicy::Manual => 1,
            RetryPolicy::Once => 2,
        }
    }
}

/// 下单流程：校验 → 记录请求 → 调用交易所 → 记录结果
///
/// 每次提交只产生一个结果，要么 [`OrderResult`]，要么 [`SubmitError`]。
pub struct OrderSubmitter<A, L> {
    api: A,
    log: L,
    validator: OrderValidator,
    retry: RetryPolicy,
}

impl<A: FuturesApi, L: LogSink> OrderSubmitter<A, L> {
    pub fn new(api: A, log: L) -> Self {
        Self {
            api,
            log,
            validator: OrderValidator::default(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_validator(mut self, validator: OrderValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn api_mut(&mut self) -> &mut A {
        &mut self.api
    }

    pub async fn submit(&mut self, input: &RawOrderInput) -> Result<OrderResult, SubmitError> {
        let order = match self.validator.validate(input) {
            Ok(order) => order,
            Err(err) => {
                self.log
                    .error(source::ORDERS, format!("validation failed: {err}"));
                return Err(err.into());
            }
        };

        let attempts = self.retry.attempts();
        let mut attempt = 1;
        loop {
            self.log
                .debug(source::ORDERS, format!("order request: {order}"));

            let err = match self.api.place_order(&order).await {
                Ok(result) => {
                    self.log.info(
                        source::ORDERS,
                        format!(
                            "order placed: id={} status={} executed={}",
                            result.order_id,
                            result.status,
                            result.executed_quantity
                        ),
                    );
                    return Ok(result);
                }
                Err(ClientError::Api(err)) => {
                    self.log.error(
                        source::ORDERS,
                        format!("order rejected: code={} msg={}", err.code, err.message),
                    );
                    return Err(err.into());
                }
                Err(ClientError::Network(err)) => err,
            };

            if attempt < attempts {
                self.log.error(
                    source::ORDERS,
                    format!("order not sent: {err}; retrying ({attempt}/{attempts})"),
                );
                attempt += 1;
                continue;
            }

            let err = SubmitError::Network(err);
            self.log.error(
                source::ORDERS,
                format!(
                    "order not sent: {err}; {}",
                    err.retry_hint().unwrap_or_default()
                ),
            );
            return Err(err);
        }
    }
}
