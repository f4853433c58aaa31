use std::fmt;

use revise_core::Clock;
use services::AppServices;
use storage::adapter::RetryPolicy;
use storage::config::ServiceAccount;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Check,
    Stats,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "check" => Some(Self::Check),
            "stats" => Some(Self::Stats),
            _ => None,
        }
    }
}

struct Args {
    credentials_file: Option<String>,
    app_id: String,
    content_dir: String,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- check [--credentials <path>] [--app-id <id>] [--content-dir <dir>]");
    eprintln!("  cargo run -p app -- stats [--credentials <path>] [--app-id <id>] [--content-dir <dir>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --app-id revise-prod");
    eprintln!("  --content-dir data");
    eprintln!();
    eprintln!("Environment:");
    eprintln!(
        "  {}, {}, REVISE_APP_ID, RUST_LOG",
        storage::config::CREDENTIALS_ENV,
        storage::config::CREDENTIALS_FILE_ENV
    );
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut credentials_file = None;
        let mut app_id = std::env::var("REVISE_APP_ID").unwrap_or_else(|_| "revise-prod".into());
        let mut content_dir = "data".to_string();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--credentials" => {
                    credentials_file = Some(require_value(args, "--credentials")?);
                }
                "--app-id" => {
                    app_id = require_value(args, "--app-id")?;
                }
                "--content-dir" => {
                    content_dir = require_value(args, "--content-dir")?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            credentials_file,
            app_id,
            content_dir,
        })
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None => Command::Check,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Check,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let args = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Credential loading is fatal here in the binary glue: nothing below can
    // work against the store without a valid bundle.
    let account = match &args.credentials_file {
        Some(path) => ServiceAccount::from_file(path)?,
        None => ServiceAccount::from_env()?,
    };

    // `check` is a one-shot probe; let it fail fast instead of backing off.
    let policy = match cmd {
        Command::Check => RetryPolicy::no_retry(),
        Command::Stats => RetryPolicy::default(),
    };
    let app = AppServices::new_http(
        &account,
        &args.content_dir,
        Clock::default_clock(),
        args.app_id.clone(),
        policy,
        None,
    )?;

    match cmd {
        Command::Check => {
            info!(project = %account.project_id, app_id = %args.app_id, "credential bundle loaded");
            let count = app.stats().user_count().await?;
            println!(
                "store reachable at {} ({} registered users)",
                account.endpoint, count
            );
            Ok(())
        }
        Command::Stats => {
            let count = app.stats().user_count().await?;
            println!("{count}");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
