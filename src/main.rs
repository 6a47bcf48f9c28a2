// src/main.rs

use mirrorwatch::{cli, config, logging, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("mirrorwatch error: {err:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();

    // The log file lives in the state directory named by the config, so the
    // config is loaded under a temporary stderr-only subscriber.
    let cfg = {
        let early = tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_max_level(tracing::Level::WARN)
            .finish();
        tracing::subscriber::with_default(early, || config::load_and_validate(&args.config))?
    };

    let log_file = (!args.dry_run).then(|| cfg.log_path());
    let _guard = logging::init_logging(args.log_level, log_file.as_deref())?;

    run(args, cfg).await
}
