use crate::{error::Error, value::RawValue};
use derive_more::Display;
use num_enum::{FromPrimitive, IntoPrimitive};
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;
use tracing::level_filters::LevelFilter;

/// Options the application passes when starting the native SDK.
///
/// These are forwarded as-is; only the integration list is derived from them.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SdkOptions {
    /// Turns on the native SDK's own debug output.
    #[serde(default)]
    pub debug: bool,
    /// Environment the application runs in.
    #[serde(default)]
    pub environment: Option<String>,
    /// Release identifier.
    #[serde(default)]
    pub release: Option<String>,
    /// Distribution (build variant) of the release.
    #[serde(default, deserialize_with = "de_opt_string_or_number")]
    pub dist: Option<String>,
    /// When false, the native crash, ANR and NDK integrations are not installed.
    #[serde(default = "default_true")]
    pub enable_native_crash_handling: bool,
}

impl Default for SdkOptions {
    fn default() -> Self {
        Self {
            debug: false,
            environment: None,
            release: None,
            dist: None,
            enable_native_crash_handling: true,
        }
    }
}

impl SdkOptions {
    /// Decodes the options map sent by the application.
    pub fn from_raw(raw: &RawValue) -> Result<Self, Error> {
        if raw.is_null() {
            return Ok(Self::default());
        }
        let json = serde_json::to_value(raw)?;
        Ok(serde_json::from_value(json)?)
    }

    /// Filters the SDK's default integrations according to these options.
    pub fn retain_integrations(&self, integrations: Vec<NativeIntegration>) -> Vec<NativeIntegration> {
        if self.enable_native_crash_handling {
            integrations
        } else {
            integrations
                .into_iter()
                .filter(|i| !i.handles_native_crashes())
                .collect()
        }
    }
}

/// An SDK component hooking a crash or error source.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
pub enum NativeIntegration {
    #[display("UncaughtExceptionHandlerIntegration")]
    UncaughtExceptionHandler,
    #[display("AnrIntegration")]
    Anr,
    #[display("NdkIntegration")]
    Ndk,
    #[display("{_0}")]
    Other(String),
}

impl NativeIntegration {
    /// True for the integrations that capture crashes natively.
    pub fn handles_native_crashes(&self) -> bool {
        matches!(self, Self::UncaughtExceptionHandler | Self::Anr | Self::Ndk)
    }
}

impl FromStr for NativeIntegration {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "UncaughtExceptionHandlerIntegration" => Self::UncaughtExceptionHandler,
            "AnrIntegration" => Self::Anr,
            "NdkIntegration" => Self::Ndk,
            other => Self::Other(other.to_owned()),
        })
    }
}

/// Verbosity of the bridge's own diagnostics, as set by the application.
#[derive(
    Copy,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Debug,
    Default,
    Display,
    IntoPrimitive,
    FromPrimitive,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[repr(i32)]
pub enum DiagnosticLevel {
    #[default]
    #[display("off")]
    Off = 0,
    #[display("error")]
    Error = 1,
    #[display("info")]
    Info = 2,
    #[display("all")]
    All = 3,
}

impl From<DiagnosticLevel> for LevelFilter {
    fn from(value: DiagnosticLevel) -> Self {
        match value {
            DiagnosticLevel::Off => LevelFilter::OFF,
            DiagnosticLevel::Error => LevelFilter::ERROR,
            DiagnosticLevel::Info => LevelFilter::INFO,
            DiagnosticLevel::All => LevelFilter::TRACE,
        }
    }
}

/// The bridge configuration object.
///
/// This can be constructed from a yaml file, e.g.
///
/// ```yaml
/// dsn: https://key@errors.example.com/42
/// log_level: info
/// options:
///   environment: staging
///   enableNativeCrashHandling: false
/// ```
#[derive(Clone, Eq, PartialEq, Hash, Debug, Deserialize)]
pub struct Config {
    /// Where the native SDK reports to.
    pub dsn: String,
    /// Bridge diagnostics verbosity.
    #[serde(default)]
    pub log_level: DiagnosticLevel,
    /// Options forwarded to the native SDK.
    #[serde(default)]
    pub options: SdkOptions,
}

impl Config {
    pub fn from_yaml(s: &str) -> Result<Self, Error> {
        Ok(serde_yaml::from_str(s)?)
    }
}

const fn default_true() -> bool {
    true
}

/// Accepts a string or a number (as its decimal text).
fn de_opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Unsigned(u64),
        Signed(i64),
    }

    Ok(
        Option::<StringOrNumber>::deserialize(deserializer)?.map(|v| match v {
            StringOrNumber::String(s) => s,
            StringOrNumber::Unsigned(n) => n.to_string(),
            StringOrNumber::Signed(n) => n.to_string(),
        }),
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn options_from_js_map() {
        let raw: RawValue = json!({
            "debug": true,
            "environment": "staging",
            "release": "app@1.2.3",
            "dist": 42,
            "enableNativeCrashHandling": false,
            "unknownOption": "ignored",
        })
        .into();
        let opts = SdkOptions::from_raw(&raw).unwrap();
        assert_eq!(
            opts,
            SdkOptions {
                debug: true,
                environment: Some("staging".to_owned()),
                release: Some("app@1.2.3".to_owned()),
                dist: Some("42".to_owned()),
                enable_native_crash_handling: false,
            }
        );
    }

    #[test]
    fn options_defaults() {
        let opts = SdkOptions::from_raw(&json!({}).into()).unwrap();
        assert_eq!(opts, SdkOptions::default());
        assert!(opts.enable_native_crash_handling);
        assert_eq!(SdkOptions::from_raw(&RawValue::Null).unwrap(), opts);
    }

    #[test]
    fn options_with_wrong_types_are_rejected() {
        let raw: RawValue = json!({"debug": "yes"}).into();
        assert!(matches!(SdkOptions::from_raw(&raw), Err(Error::Json(_))));
    }

    #[test]
    fn crash_integrations_filtered_when_disabled() {
        let all = vec![
            NativeIntegration::UncaughtExceptionHandler,
            NativeIntegration::Anr,
            "ShutdownHookIntegration".parse().unwrap(),
            NativeIntegration::Ndk,
        ];
        let enabled = SdkOptions::default();
        assert_eq!(enabled.retain_integrations(all.clone()), all);

        let disabled = SdkOptions {
            enable_native_crash_handling: false,
            ..Default::default()
        };
        assert_eq!(
            disabled.retain_integrations(all),
            vec![NativeIntegration::Other("ShutdownHookIntegration".to_owned())]
        );
    }

    #[test]
    fn diagnostic_levels() {
        assert_eq!(DiagnosticLevel::from(1), DiagnosticLevel::Error);
        assert_eq!(DiagnosticLevel::from(2), DiagnosticLevel::Info);
        assert_eq!(DiagnosticLevel::from(3), DiagnosticLevel::All);
        assert_eq!(DiagnosticLevel::from(0), DiagnosticLevel::Off);
        assert_eq!(DiagnosticLevel::from(17), DiagnosticLevel::Off);
        assert_eq!(LevelFilter::from(DiagnosticLevel::All), LevelFilter::TRACE);
        assert_eq!(i32::from(DiagnosticLevel::Info), 2);
    }

    #[test]
    fn config_from_yaml() {
        let cfg = Config::from_yaml(
            r#"
dsn: https://key@errors.example.com/42
log_level: info
options:
  environment: staging
  dist: "7"
  enableNativeCrashHandling: false
"#,
        )
        .unwrap();
        assert_eq!(cfg.dsn, "https://key@errors.example.com/42");
        assert_eq!(cfg.log_level, DiagnosticLevel::Info);
        assert_eq!(cfg.options.environment.as_deref(), Some("staging"));
        assert_eq!(cfg.options.dist.as_deref(), Some("7"));
        assert!(!cfg.options.enable_native_crash_handling);
        assert!(!cfg.options.debug);
    }
}
