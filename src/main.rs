use chrono::DateTime;
use clap::{Parser, Subcommand};
use eyre::Result;
use futures_bot::{
    client::{BinanceClient, FuturesApi},
    config::{Credentials, Settings},
    error::ClientError,
    logging::{self, LogFacade, source},
    order::{OrderResult, OrderSubmitter, OrderValidator, RawOrderInput},
};
use std::process::ExitCode;

/// Binance 合约测试网下单工具
///
/// 示例：
///   futures-bot --symbol BTCUSDT --side BUY --type MARKET --quantity 0.001
///   futures-bot -s BTCUSDT --side SELL -t LIMIT -q 0.001 -p 110000
#[derive(Parser)]
#[command(
    name = "futures-bot",
    version,
    subcommand_negates_reqs = true,
    args_conflicts_with_subcommands = true
)]
struct Cli {
    /// Trading pair, e.g. BTCUSDT
    #[arg(short, long, required = true)]
    symbol: Option<String>,

    /// BUY or SELL
    #[arg(long, required = true)]
    side: Option<String>,

    /// MARKET or LIMIT
    #[arg(short = 't', long = "type", required = true)]
    order_type: Option<String>,

    /// Order quantity
    #[arg(short, long, required = true, allow_hyphen_values = true)]
    quantity: Option<String>,

    /// Limit price, required for LIMIT orders
    #[arg(short, long, allow_hyphen_values = true)]
    price: Option<String>,

    /// GTC (default), IOC, FOK or GTX; LIMIT orders only
    #[arg(long)]
    time_in_force: Option<String>,

    /// Only reduce an existing position
    #[arg(long)]
    reduce_only: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List open orders
    OpenOrders {
        #[arg(short, long)]
        symbol: Option<String>,
    },
    /// Show the futures account balance
    Balance,
    /// Show the latest price of a symbol
    Price {
        #[arg(short, long)]
        symbol: String,
    },
    /// Cancel an open order
    Cancel {
        #[arg(short, long)]
        symbol: String,
        #[arg(long)]
        order_id: i64,
    },
    /// Check connectivity and print the server time
    Ping,
}

impl Cli {
    fn order_input(&mut self) -> RawOrderInput {
        RawOrderInput {
            symbol: self.symbol.take().unwrap_or_default(),
            side: self.side.take().unwrap_or_default(),
            order_type: self.order_type.take().unwrap_or_default(),
            quantity: self.quantity.take().unwrap_or_default(),
            price: self.price.take(),
            time_in_force: self.time_in_force.take(),
            reduce_only: self.reduce_only,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            log::error!(target: source::CLI, "{err:#}");
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        }
    };

    logging::flush();
    code
}

async fn run(mut cli: Cli) -> Result<ExitCode> {
    let settings = Settings::load()?;

    let (_handle, fallback) = logging::init(
        &settings.log_file,
        logging::parse_level(&settings.log_level),
    )?;
    if let Some(err) = fallback {
        log::warn!(target: source::CLI, "file logging disabled: {err:#}");
    }
    log::debug!(target: source::CLI, "settings: {settings:?}");

    let credentials = Credentials::from_env()?;
    let mut client = BinanceClient::builder()
        .credentials(credentials)
        .base_url(&settings.base_url)
        .recv_window(settings.recv_window)
        .timeout(settings.timeout())
        .build()?;

    let Some(command) = cli.command.take() else {
        return place_order(cli.order_input(), client, &settings).await;
    };

    let outcome = match command {
        Command::OpenOrders { symbol } => {
            let symbol = symbol.map(|s| s.trim().to_ascii_uppercase());
            client.open_orders(symbol.as_deref()).await.map(|orders| {
                print_open_orders(&orders);
            })
        }
        Command::Balance => client.balance().await.map(|b| {
            println!("Total Balance:    {}", b.total_wallet_balance.round_dp(2));
            println!("Available:        {}", b.available_balance.round_dp(2));
            println!("Unrealized PnL:   {}", b.total_unrealized_profit.round_dp(2));
        }),
        Command::Price { symbol } => {
            let symbol = symbol.trim().to_ascii_uppercase();
            client
                .price(&symbol)
                .await
                .map(|price| println!("{symbol}  {}", price.normalize()))
        }
        Command::Cancel { symbol, order_id } => {
            let symbol = symbol.trim().to_ascii_uppercase();
            client.cancel_order(&symbol, order_id).await.map(|order| {
                log::info!(target: source::CLI, "order {order_id} cancelled");
                println!("{order}");
            })
        }
        Command::Ping => client.server_time().await.map(|ts| {
            match DateTime::from_timestamp_millis(ts) {
                Some(time) => println!("Connected, server time {time}"),
                None => println!("Connected, server time {ts}"),
            }
        }),
    };

    Ok(report(outcome))
}

async fn place_order(
    input: RawOrderInput,
    client: BinanceClient,
    settings: &Settings,
) -> Result<ExitCode> {
    log::info!(
        target: source::CLI,
        "order params: symbol={} side={} type={} qty={} price={}",
        input.symbol,
        input.side,
        input.order_type,
        input.quantity,
        input.price.as_deref().unwrap_or("-")
    );

    let mut submitter = OrderSubmitter::new(client, LogFacade)
        .with_validator(OrderValidator::new(&settings.quote_asset))
        .with_retry(settings.network_retry);

    match submitter.submit(&input).await {
        Ok(result) => {
            println!("{result}");
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            println!("Order failed: {err}");
            if let Some(hint) = err.retry_hint() {
                println!("Hint: {hint}");
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

/// 查询类命令的失败同样记一条 ERROR
fn report(outcome: Result<(), ClientError>) -> ExitCode {
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!(target: source::CLI, "request failed: {err}");
            println!("Request failed: {err}");
            if let Some(hint) = err.retry_hint() {
                println!("Hint: {hint}");
            }
            ExitCode::FAILURE
        }
    }
}

fn print_open_orders(orders: &[OrderResult]) {
    if orders.is_empty() {
        println!("No open orders.");
        return;
    }

    println!("Found {} open order(s):", orders.len());
    for order in orders {
        println!(
            "{:>12}  {:<12} {:<4} {:<6} price={:<12} qty={:<10} {}",
            order.order_id,
            order.symbol,
            order.side.as_ref(),
            order.order_type.as_ref(),
            order.price.map(|p| p.to_string()).unwrap_or_else(|| "-".into()),
            order.requested_quantity,
            order.status
        );
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn order_flags_are_required_without_subcommand() {
        assert!(Cli::try_parse_from(["futures-bot", "--symbol", "BTCUSDT"]).is_err());

        let mut cli = Cli::try_parse_from([
            "futures-bot", "-s", "btcusdt", "--side", "buy", "-t", "market", "-q", "0.001",
        ])
        .unwrap();
        assert!(cli.command.is_none());

        let input = cli.order_input();
        assert_eq!(input.symbol, "btcusdt");
        assert_eq!(input.quantity, "0.001");
        assert_eq!(input.price, None);
    }

    #[test]
    fn negative_quantity_reaches_the_validator() {
        let mut cli = Cli::try_parse_from([
            "futures-bot", "-s", "BTCUSDT", "--side", "SELL", "-t", "LIMIT", "-q", "-1", "-p",
            "100",
        ])
        .unwrap();
        assert_eq!(cli.order_input().quantity, "-1");
    }

    #[test]
    fn subcommands_skip_order_flags() {
        let cli = Cli::try_parse_from(["futures-bot", "open-orders"]).unwrap();
        assert!(matches!(cli.command, Some(Command::OpenOrders { symbol: None })));

        let cli =
            Cli::try_parse_from(["futures-bot", "cancel", "-s", "BTCUSDT", "--order-id", "7"])
                .unwrap();
        assert!(matches!(cli.command, Some(Command::Cancel { order_id: 7, .. })));
    }
}
