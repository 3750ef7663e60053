use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

pub use breadcrumb::Breadcrumb;
pub use event::{NormalizedEvent, SdkInfo};
pub use exception::{ExceptionRecord, Frame};
pub use user::User;

pub mod breadcrumb;
pub mod event;
pub mod exception;
pub mod user;

/// Tag value used when a tag cannot be coerced to a string.
pub const INVALID_TAG: &str = "INVALID_TAG";

#[derive(Clone, Eq, PartialEq, Hash, Debug, thiserror::Error)]
#[error("Unrecognized {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// Event severity.
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
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[display("debug")]
    Debug,
    #[display("info")]
    Info,
    #[display("warning")]
    Warning,
    #[default]
    #[display("error")]
    Error,
    #[display("fatal")]
    Fatal,
}

impl FromStr for Level {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "debug" => Self::Debug,
            "info" => Self::Info,
            "warning" => Self::Warning,
            "error" => Self::Error,
            "fatal" => Self::Fatal,
            _ => return Err(UnknownVariant::new("event level", s)),
        })
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreadcrumbType {
    #[display("default")]
    Default,
    #[display("http")]
    Http,
    #[display("navigation")]
    Navigation,
    #[display("user")]
    User,
}

impl FromStr for BreadcrumbType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "default" => Self::Default,
            "http" => Self::Http,
            "navigation" => Self::Navigation,
            "user" => Self::User,
            _ => return Err(UnknownVariant::new("breadcrumb type", s)),
        })
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreadcrumbLevel {
    #[display("debug")]
    Debug,
    #[display("info")]
    Info,
    #[display("warning")]
    Warning,
    #[display("error")]
    Error,
    #[display("critical")]
    Critical,
}

impl FromStr for BreadcrumbLevel {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "debug" => Self::Debug,
            "info" => Self::Info,
            "warning" => Self::Warning,
            "error" => Self::Error,
            "critical" => Self::Critical,
            _ => return Err(UnknownVariant::new("breadcrumb level", s)),
        })
    }
}

/// A 16-byte event identifier, rendered in canonical 8-4-4-4-12 form.
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Serialize, Deserialize,
)]
#[display("{}", _0.hyphenated())]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Byte offsets of the separators in the hyphenated form.
    const HYPHENS: [usize; 4] = [8, 13, 18, 23];

    /// Parses 32 hex digits, with or without the separators already in place.
    ///
    /// Returns `None` for anything else.
    pub fn parse(s: &str) -> Option<Self> {
        let digits = match s.len() {
            32 => s.to_owned(),
            36 if Self::HYPHENS.iter().all(|&i| s.as_bytes()[i] == b'-') => {
                s.chars().filter(|c| *c != '-').collect()
            }
            _ => return None,
        };
        if digits.len() != 32 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        u128::from_str_radix(&digits, 16)
            .ok()
            .map(|v| Self(Uuid::from_u128(v)))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for EventId {
    fn from(v: Uuid) -> Self {
        Self(v)
    }
}
