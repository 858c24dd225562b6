use checklist::cli::commands::Cli;
use checklist::cli::handlers;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.debug, cli.dir.as_deref());

    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

/// `CK_LOG` wins, then `-d` flags, then `[log] filter` from config.toml.
fn setup_logging(verbosity: u8, dir: Option<&str>) {
    let directive = match std::env::var("CK_LOG") {
        Ok(filter) if !filter.trim().is_empty() => filter,
        _ => match verbosity {
            0 => handlers::discover_config(dir)
                .map(|c| c.log.filter)
                .unwrap_or_else(|| "warn".to_string()),
            1 => "info".to_string(),
            2 => "debug".to_string(),
            _ => "trace".to_string(),
        },
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directive))
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    tracing::debug!(verbosity, "logging initialized");
}
