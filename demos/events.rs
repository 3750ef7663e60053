use clap::Parser as ClapParser;
use native_event_bridge::{
    BeforeSend, Bridge, Config, NativeIntegration, NativeSdk, NormalizedEvent, RawValue, SdkError,
    SdkInit,
};
use std::{
    fs,
    io::{self, BufRead},
    path::PathBuf,
    sync::Mutex,
};
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{prelude::*, reload};

/// Bridge events reader example
#[derive(Debug, clap::Parser)]
struct Opts {
    /// The bridge configuration yaml file
    pub config: PathBuf,

    /// Newline-delimited JSON event payloads
    pub events: PathBuf,
}

/// Stands in for the native SDK, printing what it would capture
#[derive(Debug, Default)]
struct PrintSdk {
    before_send: Mutex<Option<BeforeSend>>,
}

impl NativeSdk for PrintSdk {
    fn default_integrations(&self) -> Vec<NativeIntegration> {
        vec![
            NativeIntegration::UncaughtExceptionHandler,
            NativeIntegration::Anr,
            NativeIntegration::Ndk,
        ]
    }

    fn init(&self, init: SdkInit) -> Result<(), SdkError> {
        info!(options = ?init.options, "SDK init");
        *self.before_send.lock().map_err(|e| SdkError(e.to_string()))? = Some(init.before_send);
        Ok(())
    }

    fn capture_event(&self, event: NormalizedEvent) -> Result<(), SdkError> {
        let hook = *self.before_send.lock().map_err(|e| SdkError(e.to_string()))?;
        let event = match hook {
            Some(before_send) => before_send(event),
            None => Some(event),
        };
        let Some(event) = event else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(&event).map_err(|e| SdkError(e.to_string()))?;
        println!("{json}");
        Ok(())
    }

    fn set_release(&self, release: Option<String>) {
        info!(?release, "SDK release");
    }

    fn set_dist(&self, dist: Option<String>) {
        info!(?dist, "SDK dist");
    }
}

fn main() {
    let opts = Opts::parse();

    let cfg_str = fs::read_to_string(&opts.config).unwrap();

    let cfg = Config::from_yaml(&cfg_str).unwrap();

    let (filter, handle) = reload::Layer::new(LevelFilter::from(cfg.log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let bridge = Bridge::new(PrintSdk::default(), None).with_reload_handle(handle);
    bridge.set_log_level(cfg.log_level.into());
    bridge.start_with_options(&cfg.dsn, cfg.options).unwrap();

    let events = io::BufReader::new(fs::File::open(&opts.events).unwrap());

    for line in events.lines() {
        let line = line.unwrap();
        if line.trim().is_empty() {
            continue;
        }
        let raw: RawValue = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                error!("{e}");
                break;
            }
        };
        if let Err(e) = bridge.send_event(&raw) {
            error!("{e}");
        }
    }
}
