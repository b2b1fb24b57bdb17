use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "mbo")]
#[command(about = "Morning breakout session engine CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database commands
    Db {
        #[command(subcommand)]
        cmd: DbCmd,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> overlay -> ...)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Backtest commands
    Backtest {
        #[command(subcommand)]
        cmd: BacktestCmd,
    },
}

#[derive(Subcommand)]
enum DbCmd {
    Status,
    Migrate,
}

#[derive(Subcommand)]
enum BacktestCmd {
    /// Replay a CSV bar fixture through one session and print the result.
    Run {
        /// Session date, YYYY-MM-DD
        #[arg(long)]
        date: String,

        /// Symbol, e.g. SPY
        #[arg(long)]
        symbol: String,

        /// Layered config YAML paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        /// CSV of timestamp,open,high,low,close,volume (UTC ms, integer cents)
        #[arg(long = "bars")]
        bars_csv: String,

        /// sqlite:// URL to persist the session to; omit to skip persistence
        #[arg(long = "db")]
        db_url: Option<String>,

        /// Overwrite a prior session for the same (date, symbol)
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Db { cmd } => match cmd {
            DbCmd::Status => commands::db::status().await?,
            DbCmd::Migrate => commands::db::migrate().await?,
        },

        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = mbo_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Backtest { cmd } => match cmd {
            BacktestCmd::Run {
                date,
                symbol,
                config_paths,
                bars_csv,
                db_url,
                force,
            } => {
                commands::backtest::run(date, symbol, config_paths, bars_csv, db_url, force).await?;
            }
        },
    }

    Ok(())
}
