pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod order;

pub type Symbol = String;
/// Unix 时间戳的毫秒数
pub type Timestamp = i64;
