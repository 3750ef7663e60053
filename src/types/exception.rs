use internment::Intern;
use serde::{Serialize, Serializer};

/// The exception an event reports.
///
/// Only the first entry of the incoming `exception.values` list is kept.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default, Serialize)]
pub struct ExceptionRecord {
    #[serde(rename = "type")]
    pub typ: Option<String>,
    /// When the incoming exception has no value, this holds its type instead.
    /// That shape marks an unhandled promise rejection.
    pub value: Option<String>,
    #[serde(rename = "stacktrace", serialize_with = "serialize_stacktrace")]
    pub frames: Vec<Frame>,
}

/// A single stack frame, in the order received.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default, Serialize)]
pub struct Frame {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<Intern<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abs_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lineno: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colno: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_app: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

#[derive(Serialize)]
struct Stacktrace<'a> {
    frames: &'a [Frame],
}

fn serialize_stacktrace<S: Serializer>(frames: &[Frame], s: S) -> Result<S::Ok, S::Error> {
    Stacktrace { frames }.serialize(s)
}
