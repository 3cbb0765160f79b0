//! kmanga-dl CLI
//!
//! Resolves a browser, launches it, optionally logs in, and captures the
//! requested chapter. Always ends with an "end" marker, success or not.

use anyhow::Context;
use clap::Parser;
use kmanga_dl::browser::{intercept, BrowserController, WaitOptions};
use kmanga_dl::capture::CaptureSession;
use kmanga_dl::config::{CliOverlay, Config};
use kmanga_dl::resolver::{self, SnapshotFetcher, SystemProbe};
use std::path::PathBuf;

/// Download manga chapters from comic.k-manga.jp
#[derive(Parser, Debug)]
#[command(name = "kmanga-dl")]
#[command(version)]
#[command(about = "Download manga chapters from comic.k-manga.jp")]
struct Args {
    /// Path to the config file (default: config.json)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Account mail
    #[arg(long)]
    mail: Option<String>,

    /// Account password
    #[arg(long)]
    password: Option<String>,

    /// Output directory (default: manga)
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,

    /// Chapter viewer URL to download
    #[arg(long)]
    url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let exit = match run(args).await {
        Ok(()) => 0,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "run failed");
            1
        }
    };
    tracing::info!("end");
    std::process::exit(exit);
}

async fn run(args: Args) -> anyhow::Result<()> {
    let overlay = CliOverlay {
        mail: args.mail,
        password: args.password,
        out: args.out,
        url: args.url,
    };
    let config = Config::load(args.config.as_deref(), &overlay).context("loading configuration")?;
    let url = config
        .url
        .clone()
        .context("no chapter URL given (use --url or the config file)")?;

    let fetcher = SnapshotFetcher::new(&config.local_data_dir);
    let resolved = resolver::resolve(
        config.executable_path.as_deref(),
        &config.channel,
        &SystemProbe,
        &fetcher,
    )
    .await
    .with_context(|| {
        format!(
            "no usable browser for channels {:?}; install Chrome or add \"chromium\" to the channel list",
            config.channel
        )
    })?;

    let controller = BrowserController::launch(&resolved, &config).await?;
    let page = controller.new_page().await?;
    intercept::block_heavy_resources(&page).await?;

    let wait = WaitOptions::from_timeout_ms(config.wait_timeout_ms);
    if let Some((mail, password)) =
        kmanga_dl::login::credentials(config.mail.as_deref(), config.password.as_deref())?
    {
        kmanga_dl::login::login(&page, mail, password, &wait).await?;
    }

    let session = CaptureSession::new(page, config);
    session.capture_chapter(&url).await?;

    controller.close().await?;
    Ok(())
}
