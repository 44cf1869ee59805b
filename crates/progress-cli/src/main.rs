use std::io;
use std::path::PathBuf;

use clap::Parser;
use progress_cli::app::App;
use progress_cli::menu::Menu;

#[derive(Parser)]
#[command(
    name = "progress",
    about = "Record percent-complete samples for tracked items and publish them as web pages",
    version
)]
struct Cli {
    /// Config file (default: progress.yaml in this or a parent directory,
    /// then ~/.progress/config.yaml)
    #[arg(long, env = "PROGRESS_CONFIG")]
    config: Option<PathBuf>,

    /// Log publishing activity to stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let result = App::from_args(cli.config.as_deref()).and_then(|app| {
        let stdin = io::stdin();
        Menu::new(&app.tracker, stdin.lock(), io::stdout())
            .open_after_publish(app.open_after_publish)
            .run()
    });

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
