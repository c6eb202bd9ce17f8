use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use sharepush_core::{push_all, AppConfig, GraphSubmitter, RecordSource, Result};
use sharepush_ingest::DataDirSource;
use sharepush_transport::{DryRunSubmitter, ShareClient};

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::from_default_env().add_directive(
        "sharepush=info"
            .parse()
            .expect("static directive is valid"),
    );
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::from_env();
    match run(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "sharepush failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &AppConfig) -> Result<()> {
    // Credentials are checked once, before any records are formatted.
    let submitter: Box<dyn GraphSubmitter> = if config.dry_run {
        Box::new(DryRunSubmitter::stdout())
    } else {
        config.require_token()?;
        Box::new(ShareClient::new(config)?)
    };

    let source = DataDirSource::new(&config.data_dir);
    tracing::info!(source = source.name(), submitter = submitter.name(), "Starting sharepush");
    let store = source.load()?;

    let summary = push_all(&store, submitter.as_ref()).await?;
    tracing::info!(
        works = summary.works_submitted,
        records = summary.records_submitted,
        "sharepush finished"
    );
    Ok(())
}
