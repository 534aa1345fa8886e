use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::eyre;

use toastq::config::{self, ConfigResult};
use toastq::script::{parse_script, run_script};
use toastq::toast::render::render_snapshot;
use toastq::{ToastError, Toaster, ToasterConfig};

/// Play a toast script and print every snapshot the queue broadcasts
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Script file to run (reads stdin when omitted)
    script: Option<PathBuf>,

    /// Maximum number of active toasts
    #[arg(long)]
    limit: Option<usize>,

    /// Delay before a dismissed toast is removed, in milliseconds
    #[arg(long)]
    remove_delay_ms: Option<u64>,

    /// Print snapshots as JSON lines
    #[arg(long)]
    json: bool,

    /// Config file to use instead of ~/.config/toastq/config.toml
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Install color-eyre panic hook for better error messages
    color_eyre::install()?;

    // Logs go to stderr; stdout carries snapshots only
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    let ConfigResult { config, .. } = match &args.config {
        Some(path) => config::load_config_from_path(path),
        None => config::load_config(),
    };

    let mut toast_config = config.toast;
    if let Some(limit) = args.limit {
        if limit == 0 {
            return Err(ToastError::InvalidConfig("--limit must be at least 1".to_string()).into());
        }
        toast_config.limit = limit;
    }
    if let Some(delay) = args.remove_delay_ms {
        toast_config.remove_delay_ms = delay;
    }

    let source = match &args.script {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| eyre!("Failed to read {}: {}", path.display(), e))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let commands = parse_script(&source)?;

    let toaster = Toaster::new(ToasterConfig::from(&toast_config))?;
    let (subscription, mut snapshots) = toaster.subscribe_channel();

    let json = args.json;
    let printer = tokio::spawn(async move {
        while let Some(snapshot) = snapshots.recv().await {
            if json {
                println!("{}", serde_json::to_string(&snapshot)?);
            } else {
                println!("{}", render_snapshot(&snapshot));
            }
        }
        Ok::<_, serde_json::Error>(())
    });

    run_script(&toaster, &commands).await;

    subscription.unsubscribe();
    toaster.shutdown();
    printer.await??;

    Ok(())
}
