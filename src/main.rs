use anyhow::{anyhow, Result};
use std::env;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use deathwatch::announcer::{Announcer, LogAnnouncer, TwitterAnnouncer};
use deathwatch::http::{build_client, build_stream_client};
use deathwatch::source::stream::IDLE_TIMEOUT;
use deathwatch::pipeline::{run_bulk, run_stream, BulkPipeline, Herald, StreamPipeline};
use deathwatch::{
    status, Config, DetectionMode, RecentChangeStream, SparqlSource, StatusBoard, TemplatePicker,
    WikidataResolver,
};

const USAGE: &str = "usage: deathwatch [bulk|stream]";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("deathwatch=info".parse()?),
        )
        .init();

    let mut config = Config::from_env()?;

    // Optional positional argument picks the mode, overriding DEATHWATCH_MODE
    let args: Vec<String> = env::args().skip(1).collect();
    match args.as_slice() {
        [] => {}
        [mode] => match DetectionMode::parse(mode) {
            Some(mode) => config.mode = mode,
            None => {
                eprintln!("{}", USAGE);
                std::process::exit(1);
            }
        },
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(1);
        }
    }

    tracing::info!(
        version = deathwatch::VERSION,
        mode = config.mode.as_str(),
        dry_run = config.dry_run,
        "Starting deathwatch"
    );

    let client = build_client(config.http_timeout)?;

    let announcer: Arc<dyn Announcer> = if config.dry_run {
        Arc::new(LogAnnouncer)
    } else {
        let credentials = config
            .credentials
            .clone()
            .ok_or_else(|| anyhow!("Posting credentials are required outside dry run"))?;
        Arc::new(TwitterAnnouncer::new(client.clone(), credentials, config.http_timeout))
    };

    let picker = match config.template_seed {
        Some(seed) => TemplatePicker::seeded(seed),
        None => TemplatePicker::from_entropy(),
    };

    let resolver = Arc::new(WikidataResolver::new(
        client.clone(),
        config.language.clone(),
        config.http_timeout,
    ));
    let herald = Herald::new(resolver, announcer, picker);

    let board = StatusBoard::new(config.mode);
    let server_board = board.clone();
    let port = config.port;
    tokio::spawn(async move {
        if let Err(e) = status::serve(port, server_board).await {
            tracing::error!(error = %e, "Status endpoint failed");
        }
    });

    match config.mode {
        DetectionMode::Bulk => {
            let source = SparqlSource::new(client, config.language.clone(), config.http_timeout);
            let pipeline = BulkPipeline::new(source, herald, board, config.announce_first_cycle);
            run_bulk(pipeline, config.poll_interval).await;
        }
        DetectionMode::Stream => {
            let stream_client = build_stream_client(config.http_timeout)?;
            let stream = RecentChangeStream::new(stream_client, IDLE_TIMEOUT);
            run_stream(stream, StreamPipeline::new(herald, board)).await;
        }
    }

    Ok(())
}
