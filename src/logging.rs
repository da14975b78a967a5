use chrono::{DateTime, Local};
use eyre::{Result, WrapErr};
use log::{Level, LevelFilter};
use log4rs::{
    Handle,
    append::{
        console::{ConsoleAppender, Target},
        file::FileAppender,
    },
    config::{Appender, Config as LogConfig, Logger, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
};
use std::path::Path;

/// 文件日志格式：时间 | 级别 | 来源 | 消息
pub const FILE_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} | {l} | {t} | {m}{n}";
const CONSOLE_PATTERN: &str = "{l}: {m}{n}";
/// 第三方库（reqwest 等）只记录 WARN 及以上
const THIRD_PARTY_LEVEL: LevelFilter = LevelFilter::Warn;

/// 日志来源，对应 log4rs 的 target
pub mod source {
    pub const ORDERS: &str = "orders";
    pub const CLIENT: &str = "client";
    pub const CLI: &str = "cli";

    pub const ALL: [&str; 3] = [ORDERS, CLIENT, CLI];
}

/// 一条日志记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub timestamp: DateTime<Local>,
    pub level: Level,
    pub source: &'static str,
    pub message: String,
}

impl LogRecord {
    pub fn new(level: Level, source: &'static str, message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            level,
            source,
            message: message.into(),
        }
    }
}

/// 日志输出端
///
/// 下单流程只依赖这个 trait，测试时可以换成内存实现。
pub trait LogSink {
    fn write(&self, record: LogRecord);

    fn debug(&self, source: &'static str, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.write(LogRecord::new(Level::Debug, source, message));
    }

    fn info(&self, source: &'static str, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.write(LogRecord::new(Level::Info, source, message));
    }

    fn error(&self, source: &'static str, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.write(LogRecord::new(Level::Error, source, message));
    }
}

impl<T: LogSink + ?Sized> LogSink for &T {
    fn write(&self, record: LogRecord) {
        (**self).write(record);
    }
}

/// 转发到全局 `log` 门面，由 [`init`] 安装的 log4rs 负责落盘
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFacade;

impl LogSink for LogFacade {
    fn write(&self, record: LogRecord) {
        log::log!(target: record.source, record.level, "{}", record.message);
    }
}

/// 初始化进程级日志，每个进程只调用一次
///
/// 文件追加写入 `path`，同时把 INFO 及以上输出到 stderr。
/// 文件打不开时退回到只输出 stderr，原因放在返回值的第二项里，不影响下单。
pub fn init(path: &Path, level: LevelFilter) -> Result<(Handle, Option<eyre::Report>)> {
    let (config, fallback) = config(path, level)?;
    let handle = log4rs::init_config(config).wrap_err("failed to install logger")?;
    Ok((handle, fallback))
}

fn config(path: &Path, level: LevelFilter) -> Result<(LogConfig, Option<eyre::Report>)> {
    match file_config(path, level) {
        Ok(config) => Ok((config, None)),
        Err(err) => Ok((console_config(level)?, Some(err))),
    }
}

/// 退出前刷新缓冲
pub fn flush() {
    log::logger().flush();
}

pub fn parse_level(level: &str) -> LevelFilter {
    level.trim().parse().unwrap_or(LevelFilter::Debug)
}

fn console_appender() -> Appender {
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(CONSOLE_PATTERN)))
        .build();

    Appender::builder()
        .filter(Box::new(ThresholdFilter::new(LevelFilter::Info)))
        .build("stderr", Box::new(stderr))
}

/// 本程序的各个来源按 `level` 记录，根 logger 只放行第三方的警告
fn loggers(level: LevelFilter) -> impl Iterator<Item = Logger> {
    source::ALL
        .into_iter()
        .map(move |target| Logger::builder().build(target, level))
}

fn console_config(level: LevelFilter) -> Result<LogConfig> {
    LogConfig::builder()
        .appender(console_appender())
        .loggers(loggers(level))
        .build(Root::builder().appender("stderr").build(THIRD_PARTY_LEVEL))
        .wrap_err("invalid console logging config")
}

fn file_config(path: &Path, level: LevelFilter) -> Result<LogConfig> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .wrap_err_with(|| format!("cannot create log directory {}", dir.display()))?;
    }

    let file = FileAppender::builder()
        .append(true)
        .encoder(Box::new(PatternEncoder::new(FILE_PATTERN)))
        .build(path)
        .wrap_err_with(|| format!("cannot open log file {}", path.display()))?;

    LogConfig::builder()
        .appender(Appender::builder().build("file", Box::new(file)))
        .appender(console_appender())
        .loggers(loggers(level))
        .build(
            Root::builder()
                .appender("file")
                .appender("stderr")
                .build(THIRD_PARTY_LEVEL),
        )
        .wrap_err("invalid file logging config")
}
