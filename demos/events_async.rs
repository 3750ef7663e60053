use clap::Parser as ClapParser;
use native_event_bridge::{Config, Error, EventDecoder};
use std::{fs, path::PathBuf};
use tokio::fs::File;
use tokio_stream::StreamExt;
use tokio_util::codec::FramedRead;
use tracing::{error, info, level_filters::LevelFilter};

/// Bridge events async reader example
#[derive(Debug, clap::Parser)]
struct Opts {
    /// The bridge configuration yaml file
    pub config: PathBuf,

    /// Newline-delimited JSON event payloads
    pub events: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let opts = Opts::parse();

    let cfg_str = fs::read_to_string(&opts.config).unwrap();

    let cfg = Config::from_yaml(&cfg_str)?;

    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::from(cfg.log_level))
        .init();
    info!(dsn = %cfg.dsn, environment = ?cfg.options.environment, "Loaded configuration");

    let stream = File::open(&opts.events).await?;

    let mut reader = FramedRead::new(stream, EventDecoder::default());

    while let Some(value) = reader.next().await {
        let event = match value {
            Ok(e) => e,
            Err(e) => {
                error!("{e}");
                break;
            }
        };
        println!("{event:#?}");
    }

    Ok(())
}
