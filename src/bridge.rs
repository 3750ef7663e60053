use crate::{
    config::{DiagnosticLevel, NativeIntegration, SdkOptions},
    error::Error,
    normalizer::EventNormalizer,
    types::NormalizedEvent,
    value::{RawValue, ValueKind},
};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    sync::atomic::{AtomicI32, Ordering},
};
use tracing::{debug, info, level_filters::LevelFilter, warn};
use tracing_subscriber::reload;

/// Extra key carrying a release override from the application.
pub const EXTRA_RELEASE_KEY: &str = "__sentry_release";

/// Extra key carrying a dist override from the application.
pub const EXTRA_DIST_KEY: &str = "__sentry_dist";

/// Hook the SDK runs on every event before delivery; `None` drops the event.
pub type BeforeSend = fn(NormalizedEvent) -> Option<NormalizedEvent>;

#[derive(Clone, Eq, PartialEq, Hash, Debug, thiserror::Error)]
#[error("{0}")]
pub struct SdkError(pub String);

/// Everything the native SDK needs to start.
#[derive(Clone, Debug)]
pub struct SdkInit {
    pub dsn: String,
    pub options: SdkOptions,
    /// Integrations left after filtering the SDK's defaults.
    pub integrations: Vec<NativeIntegration>,
    pub before_send: BeforeSend,
}

/// The external crash-reporting SDK.
///
/// Capture, batching, delivery and persistence all happen behind this trait.
pub trait NativeSdk: Send + Sync {
    /// Integrations the SDK installs when nothing is filtered.
    fn default_integrations(&self) -> Vec<NativeIntegration>;

    fn init(&self, init: SdkInit) -> Result<(), SdkError>;

    fn capture_event(&self, event: NormalizedEvent) -> Result<(), SdkError>;

    fn set_release(&self, release: Option<String>);

    fn set_dist(&self, dist: Option<String>);
}

/// Package information provided by the host environment.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub struct PackageInfo {
    pub package_name: String,
    pub version_name: String,
    pub version_code: u64,
}

/// Application release metadata, as reported to the application.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize)]
pub struct AppRelease {
    pub id: String,
    pub version: String,
    pub build: String,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConstants {
    pub native_client_available: bool,
    pub native_transport: bool,
}

/// Drops events whose first exception is a `JavascriptException`.
///
/// The runtime rethrows JavaScript errors natively after the application has
/// already reported them, so these would otherwise arrive twice.
pub fn discard_javascript_exception(event: NormalizedEvent) -> Option<NormalizedEvent> {
    match event.exception_type() {
        Some(t) if t.contains("JavascriptException") => {
            debug!(exception_type = t, "Discarding duplicate JavaScript exception");
            None
        }
        _ => Some(event),
    }
}

/// Applies a new maximum level to the subscriber collecting the bridge's diagnostics.
pub type LogFilter = Box<dyn Fn(LevelFilter) + Send + Sync>;

/// The application-facing side of the native SDK.
pub struct Bridge<S> {
    sdk: S,
    normalizer: EventNormalizer,
    package_info: Option<PackageInfo>,
    log_level: AtomicI32,
    log_filter: Option<LogFilter>,
}

impl<S: fmt::Debug> fmt::Debug for Bridge<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("sdk", &self.sdk)
            .field("package_info", &self.package_info)
            .field("log_level", &self.log_level)
            .field("log_filter", &self.log_filter.is_some())
            .finish_non_exhaustive()
    }
}

impl<S: NativeSdk> Bridge<S> {
    pub fn new(sdk: S, package_info: Option<PackageInfo>) -> Self {
        Self {
            sdk,
            normalizer: EventNormalizer::new(),
            package_info,
            log_level: AtomicI32::new(DiagnosticLevel::Off.into()),
            log_filter: None,
        }
    }

    /// Routes [`set_log_level`](Self::set_log_level) to the given filter hook.
    pub fn with_log_filter(mut self, filter: LogFilter) -> Self {
        self.log_filter = Some(filter);
        self
    }

    /// Routes [`set_log_level`](Self::set_log_level) to a reloadable `LevelFilter` layer.
    pub fn with_reload_handle<R: 'static>(self, handle: reload::Handle<LevelFilter, R>) -> Self {
        self.with_log_filter(Box::new(move |level| {
            if let Err(e) = handle.reload(level) {
                warn!(error = %e, "Failed to apply diagnostic level");
            }
        }))
    }

    pub fn sdk(&self) -> &S {
        &self.sdk
    }

    pub fn constants(&self) -> BridgeConstants {
        BridgeConstants {
            native_client_available: true,
            native_transport: true,
        }
    }

    /// Starts the SDK from the options map sent by the application.
    pub fn start(&self, dsn: &str, options: &RawValue) -> Result<bool, Error> {
        let options = SdkOptions::from_raw(options)?;
        self.start_with_options(dsn, options)
    }

    pub fn start_with_options(&self, dsn: &str, options: SdkOptions) -> Result<bool, Error> {
        let integrations = options.retain_integrations(self.sdk.default_integrations());
        info!(
            "Native integrations '{}'",
            integrations.iter().map(ToString::to_string).join(", ")
        );

        self.sdk.init(SdkInit {
            dsn: dsn.to_owned(),
            options,
            integrations,
            before_send: discard_javascript_exception,
        })?;

        info!(dsn, "Started native SDK");
        Ok(true)
    }

    /// Normalizes an event payload and hands it to the SDK.
    pub fn send_event(&self, event: &RawValue) -> Result<bool, Error> {
        let event = self.normalizer.normalize(event);
        self.sdk.capture_event(event)?;
        Ok(true)
    }

    /// Picks up release and dist overrides from an updated extra map.
    pub fn extra_updated(&self, extra: &RawValue) {
        if let Some(release) = extra.get(EXTRA_RELEASE_KEY) {
            let release = release.as_str().map(str::to_owned);
            debug!(?release, "Release updated from extra");
            self.sdk.set_release(release);
        }
        if let Some(dist) = extra.get(EXTRA_DIST_KEY) {
            let dist = dist.as_str().map(str::to_owned);
            debug!(?dist, "Dist updated from extra");
            self.sdk.set_dist(dist);
        }
    }

    /// Sets the verbosity of the bridge's diagnostics.
    ///
    /// 1 is errors only, 2 adds info, 3 is everything, any other value turns them off.
    pub fn set_log_level(&self, level: i32) -> DiagnosticLevel {
        let level = DiagnosticLevel::from(level);
        self.log_level.store(level.into(), Ordering::Relaxed);
        if let Some(apply) = &self.log_filter {
            apply(LevelFilter::from(level));
        }
        level
    }

    pub fn log_level(&self) -> DiagnosticLevel {
        DiagnosticLevel::from(self.log_level.load(Ordering::Relaxed))
    }

    pub fn fetch_release(&self) -> Result<AppRelease, Error> {
        let pkg = self
            .package_info
            .as_ref()
            .ok_or(Error::PackageInfoUnavailable)?;
        Ok(AppRelease {
            id: pkg.package_name.clone(),
            version: pkg.version_name.clone(),
            build: pkg.version_code.to_string(),
        })
    }

    /// Length in bytes of a string payload once UTF-8 encoded.
    pub fn string_bytes_length(&self, payload: &RawValue) -> Result<usize, Error> {
        payload
            .as_str()
            .map(str::len)
            .ok_or_else(|| Error::unexpected_payload(ValueKind::String, payload.kind()))
    }

    /// Deliberately crashes, for checking the native crash handling setup.
    pub fn crash(&self) -> ! {
        panic!("TEST - Native Client Crash (only works in release mode)");
    }
}
