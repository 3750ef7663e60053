use crate::{
    types::{Breadcrumb, EventId, ExceptionRecord, Level, User},
    value::RawValue,
};
use internment::Intern;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// The validated event handed to the native SDK.
///
/// Serializes with the same keys the incoming payload uses, so the serialized
/// form can be fed back through the normalizer.
#[derive(Clone, Eq, PartialEq, Debug, Default, Serialize)]
pub struct NormalizedEvent {
    #[serde(rename = "event_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<EventId>,
    pub level: Level,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logger: Option<Intern<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    pub breadcrumbs: Vec<Breadcrumb>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    pub extra: BTreeMap<String, RawValue>,
    pub tags: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<Vec<String>>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_exception"
    )]
    pub exception: Option<ExceptionRecord>,
    /// `None` is forwarded as an explicit null, clearing any value the SDK already holds
    pub environment: Option<String>,
    /// `None` is forwarded as an explicit null, clearing any value the SDK already holds
    pub release: Option<String>,
    /// `None` is forwarded as an explicit null, clearing any value the SDK already holds
    pub dist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sdk: Option<SdkInfo>,
}

impl NormalizedEvent {
    /// Type of the reported exception, if any.
    pub fn exception_type(&self) -> Option<&str> {
        self.exception.as_ref().and_then(|e| e.typ.as_deref())
    }
}

/// Client SDK description carried by the event.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default, Serialize)]
pub struct SdkInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub integrations: Vec<String>,
}

#[derive(Serialize)]
struct ExceptionValues<'a> {
    values: &'a [ExceptionRecord],
}

fn serialize_exception<S: Serializer>(
    exception: &Option<ExceptionRecord>,
    s: S,
) -> Result<S::Ok, S::Error> {
    match exception {
        Some(e) => ExceptionValues {
            values: std::slice::from_ref(e),
        }
        .serialize(s),
        None => s.serialize_none(),
    }
}
