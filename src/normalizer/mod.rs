use self::fields::FieldError;
use crate::{
    error::Error,
    types::{Breadcrumb, EventId, ExceptionRecord, Frame, NormalizedEvent, SdkInfo, User},
    value::RawValue,
};
use derive_more::Display;
use std::{collections::BTreeMap, fmt};
use tracing::{debug, warn};

pub(crate) mod fields;

/// What happens to a field whose raw value could not be used.
///
/// Either way the field ends up at its default and the event is still built.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display)]
pub enum Degrade {
    /// The field is left absent, reported as a warning
    #[display("drop")]
    Drop,
    /// The field keeps its default value, reported at debug level
    #[display("default")]
    Default,
}

type Apply = fn(&RawValue, &mut NormalizedEvent) -> Result<(), FieldError>;

/// One row of the normalization table.
#[derive(Copy, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub on_error: Degrade,
    apply: Apply,
}

impl FieldSpec {
    const fn new(name: &'static str, on_error: Degrade, apply: Apply) -> Self {
        Self {
            name,
            on_error,
            apply,
        }
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("on_error", &self.on_error)
            .finish_non_exhaustive()
    }
}

/// Every field the normalizer understands, applied in order.
///
/// Absent and null fields are skipped; they leave the event's default in place,
/// which for `environment`, `release` and `dist` is an explicit null.
pub const FIELDS: &[FieldSpec] = &[
    FieldSpec::new("event_id", Degrade::Drop, |v, e| {
        e.id = Some(fields::event_id(v)?);
        Ok(())
    }),
    FieldSpec::new("level", Degrade::Default, |v, e| {
        e.level = fields::level(v)?;
        Ok(())
    }),
    FieldSpec::new("message", Degrade::Drop, |v, e| {
        e.message = fields::message(v);
        Ok(())
    }),
    FieldSpec::new("logger", Degrade::Drop, |v, e| {
        e.logger = Some(fields::interned(v)?);
        Ok(())
    }),
    FieldSpec::new("platform", Degrade::Drop, |v, e| {
        e.platform = Some(fields::string(v)?);
        Ok(())
    }),
    FieldSpec::new("breadcrumbs", Degrade::Default, |v, e| {
        e.breadcrumbs = fields::breadcrumbs(v)?;
        Ok(())
    }),
    FieldSpec::new("user", Degrade::Drop, |v, e| {
        e.user = Some(fields::user(v)?);
        Ok(())
    }),
    FieldSpec::new("extra", Degrade::Default, |v, e| {
        e.extra = fields::extra(v)?;
        Ok(())
    }),
    FieldSpec::new("fingerprint", Degrade::Drop, |v, e| {
        e.fingerprint = Some(fields::fingerprint(v)?);
        Ok(())
    }),
    FieldSpec::new("tags", Degrade::Default, |v, e| {
        e.tags = fields::tags(v)?;
        Ok(())
    }),
    FieldSpec::new("exception", Degrade::Drop, |v, e| {
        e.exception = Some(fields::exception(v)?);
        Ok(())
    }),
    FieldSpec::new("environment", Degrade::Drop, |v, e| {
        e.environment = Some(fields::string(v)?);
        Ok(())
    }),
    FieldSpec::new("release", Degrade::Drop, |v, e| {
        e.release = Some(fields::string(v)?);
        Ok(())
    }),
    FieldSpec::new("dist", Degrade::Drop, |v, e| {
        e.dist = Some(fields::string(v)?);
        Ok(())
    }),
    FieldSpec::new("sdk", Degrade::Drop, |v, e| {
        e.sdk = Some(fields::sdk(v)?);
        Ok(())
    }),
];

/// Converts untyped event payloads into [`NormalizedEvent`]s.
///
/// Normalization is total: malformed optional fields are dropped, defaulted or
/// substituted, never reported as errors. The normalizer holds no state and
/// can be shared freely across threads.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct EventNormalizer {}

impl EventNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn normalize(&self, raw: &RawValue) -> NormalizedEvent {
        let mut event = NormalizedEvent::default();

        let Some(obj) = raw.as_object() else {
            warn!(kind = %raw.kind(), "Event payload is not an object, using an empty event");
            return event;
        };

        for field in FIELDS {
            let Some(value) = obj.get(field.name).filter(|v| !v.is_null()) else {
                if field.name == "event_id" {
                    debug!("Event has no event_id");
                }
                continue;
            };
            if let Err(e) = (field.apply)(value, &mut event) {
                report(field.name, field.on_error, &e);
            }
        }

        debug!(
            event_id = ?event.id,
            level = %event.level,
            breadcrumbs = event.breadcrumbs.len(),
            has_exception = event.exception.is_some(),
            "Normalized event"
        );

        event
    }

    /// Decodes a JSON document and normalizes it.
    ///
    /// Only a syntactically invalid document is an error.
    pub fn normalize_json(&self, json: &str) -> Result<NormalizedEvent, Error> {
        let raw: RawValue = serde_json::from_str(json)?;
        Ok(self.normalize(&raw))
    }

    /// Normalizes one line of newline-delimited JSON, skipping blank lines.
    pub fn parse_line(&self, line: &str) -> Result<Option<NormalizedEvent>, Error> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        self.normalize_json(line).map(Some)
    }
}

fn report(field: &'static str, policy: Degrade, error: &FieldError) {
    match policy {
        Degrade::Drop => warn!(field, %policy, %error, "Discarded malformed field"),
        Degrade::Default => debug!(field, %policy, %error, "Using default for malformed field"),
    }
}

fn degrade<T>(field: &'static str, policy: Degrade, result: Result<T, FieldError>) -> Option<T> {
    result.map_err(|e| report(field, policy, &e)).ok()
}

/// Parses an event identifier, `None` if it is not 32 hex digits.
pub fn parse_event_id(raw: &RawValue) -> Option<EventId> {
    degrade("event_id", Degrade::Drop, fields::event_id(raw))
}

/// Parses a breadcrumb list, keeping input order.
pub fn parse_breadcrumbs(raw: &RawValue) -> Vec<Breadcrumb> {
    degrade("breadcrumbs", Degrade::Default, fields::breadcrumbs(raw)).unwrap_or_default()
}

/// Parses tags, coercing values to strings and nulls to [`INVALID_TAG`](crate::INVALID_TAG).
pub fn parse_tags(raw: &RawValue) -> BTreeMap<String, String> {
    degrade("tags", Degrade::Default, fields::tags(raw)).unwrap_or_default()
}

pub fn parse_extra(raw: &RawValue) -> BTreeMap<String, RawValue> {
    degrade("extra", Degrade::Default, fields::extra(raw)).unwrap_or_default()
}

/// Parses the first exception of an `exception.values` list.
///
/// An exception without a `stacktrace.frames` list yields `None`.
pub fn parse_exception(raw: &RawValue) -> Option<ExceptionRecord> {
    degrade("exception", Degrade::Drop, fields::exception(raw))
}

pub fn parse_message(raw: &RawValue) -> Option<String> {
    fields::message(raw)
}

/// Parses a user object. The id is taken from `id`, then `userID`, then `userId`.
pub fn parse_user(raw: &RawValue) -> Option<User> {
    degrade("user", Degrade::Drop, fields::user(raw))
}

pub fn parse_fingerprint(raw: &RawValue) -> Option<Vec<String>> {
    degrade("fingerprint", Degrade::Drop, fields::fingerprint(raw))
}

pub fn parse_sdk(raw: &RawValue) -> Option<SdkInfo> {
    degrade("sdk", Degrade::Drop, fields::sdk(raw))
}

/// Converts a React Native error stack (`methodName`, `file`, `lineNumber`,
/// `column` entries) into event frames, outermost call first.
pub fn parse_react_native_frames(raw: &RawValue) -> Vec<Frame> {
    degrade("stack", Degrade::Default, fields::react_native_frames(raw)).unwrap_or_default()
}

/// Folds the original React Native error into a normalized event.
///
/// `componentStack` and `jsEngine` are copied into `extra`. On Hermes the
/// exception's frames are replaced by the converted `stack`. The event
/// platform becomes `node`.
pub fn apply_react_native_error(event: &mut NormalizedEvent, error: &RawValue) {
    for key in ["componentStack", "jsEngine"] {
        if let Some(v) = error.get(key).filter(|v| !v.is_null()) {
            event.extra.insert(key.to_owned(), v.clone());
        }
    }

    let hermes = error.get("jsEngine").and_then(RawValue::as_str) == Some("hermes");
    if hermes {
        match (event.exception.as_mut(), error.get("stack")) {
            (Some(exception), Some(stack)) => exception.frames = parse_react_native_frames(stack),
            _ => debug!("No exception frames to replace"),
        }
    }

    event.platform = Some("node".to_owned());
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::Level;
    use serde_json::json;

    #[test]
    fn field_names_are_unique() {
        let mut names: Vec<_> = FIELDS.iter().map(|f| f.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), FIELDS.len());
    }

    #[test]
    fn non_object_payload_yields_default_event() {
        let n = EventNormalizer::new();
        let event = n.normalize(&RawValue::from("nope"));
        assert_eq!(event, NormalizedEvent::default());
        assert_eq!(event.level, Level::Error);
    }

    #[test]
    fn null_fields_are_absent() {
        let n = EventNormalizer::new();
        let event = n.normalize(&json!({"level": null, "user": null, "release": null}).into());
        assert_eq!(event, NormalizedEvent::default());
    }

    #[test]
    fn react_native_error_on_hermes() {
        let n = EventNormalizer::new();
        let mut event = n.normalize(
            &json!({
                "platform": "javascript",
                "extra": {"screen": "Home"},
                "exception": {"values": [{"type": "Error", "value": "boom", "stacktrace": {"frames": [
                    {"function": "minified"}
                ]}}]},
            })
            .into(),
        );
        apply_react_native_error(
            &mut event,
            &json!({
                "componentStack": "in Home",
                "jsEngine": "hermes",
                "stack": [
                    {"methodName": "throwing", "file": "app.bundle", "lineNumber": 10, "column": 2},
                    {"methodName": "caller", "file": "/node_modules/lib.js", "lineNumber": 5, "column": 1},
                ],
            })
            .into(),
        );

        assert_eq!(event.platform.as_deref(), Some("node"));
        assert_eq!(event.extra["screen"], RawValue::from("Home"));
        assert_eq!(event.extra["componentStack"], RawValue::from("in Home"));
        assert_eq!(event.extra["jsEngine"], RawValue::from("hermes"));

        let frames = &event.exception.as_ref().unwrap().frames;
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].function.as_deref(), Some("caller"));
        assert_eq!(frames[0].in_app, Some(false));
        assert_eq!(frames[0].lineno, None);
        assert_eq!(frames[1].function.as_deref(), Some("throwing"));
        assert_eq!(frames[1].in_app, Some(true));
        assert_eq!(frames[1].lineno, Some(10));
    }

    #[test]
    fn react_native_error_on_other_engines_keeps_frames() {
        let mut event = EventNormalizer::new().normalize(
            &json!({
                "exception": {"values": [{"type": "Error", "stacktrace": {"frames": [
                    {"function": "kept"}
                ]}}]},
            })
            .into(),
        );
        apply_react_native_error(
            &mut event,
            &json!({"jsEngine": "jsc", "stack": [{"methodName": "ignored"}]}).into(),
        );
        let frames = &event.exception.as_ref().unwrap().frames;
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].function.as_deref(), Some("kept"));
        assert_eq!(event.extra["jsEngine"], RawValue::from("jsc"));
        assert!(!event.extra.contains_key("componentStack"));
        assert_eq!(event.platform.as_deref(), Some("node"));

        // Without an exception there is nothing to replace
        let mut event = NormalizedEvent::default();
        apply_react_native_error(
            &mut event,
            &json!({"jsEngine": "hermes", "stack": [{"methodName": "f"}]}).into(),
        );
        assert_eq!(event.exception, None);
        assert_eq!(event.platform.as_deref(), Some("node"));
    }

    #[test]
    fn parse_line_skips_blank_lines() {
        let n = EventNormalizer::new();
        assert_eq!(n.parse_line("   \r").unwrap(), None);
        assert!(n.parse_line("{").is_err());
        let event = n.parse_line(r#"{"level":"info"}"#).unwrap().unwrap();
        assert_eq!(event.level, Level::Info);
    }
}
