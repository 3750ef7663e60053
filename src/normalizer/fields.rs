//! Per-field parsers.
//!
//! Each parser either produces the typed value for its field or a
//! [`FieldError`] describing why the raw value was unusable. Degrading a
//! failed field is the caller's business; nothing here aborts an event.

use crate::{
    types::{
        Breadcrumb, EventId, ExceptionRecord, Frame, Level, SdkInfo, UnknownVariant, User,
        INVALID_TAG,
    },
    value::{RawObject, RawValue, ValueKind},
};
use fxhash::FxHashSet;
use internment::Intern;
use ordered_float::OrderedFloat;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Keys the user id may arrive under, in priority order
const USER_ID_KEYS: [&str; 3] = ["id", "userID", "userId"];

/// Reason a raw field could not be used.
#[derive(Clone, Eq, PartialEq, Debug, thiserror::Error)]
pub(crate) enum FieldError {
    #[error("expected {expected}, found {found}")]
    UnexpectedType {
        expected: ValueKind,
        found: ValueKind,
    },

    #[error("'{0}' is not a 32 hex digit identifier")]
    InvalidEventId(String),

    #[error(transparent)]
    UnknownVariant(#[from] UnknownVariant),

    #[error("exception has no values")]
    NoExceptionValues,

    #[error("exception has no stacktrace")]
    NoStacktrace,

    #[error("stacktrace has no frames list")]
    NoFrames,
}

impl FieldError {
    fn unexpected(expected: ValueKind, found: &RawValue) -> Self {
        FieldError::UnexpectedType {
            expected,
            found: found.kind(),
        }
    }
}

fn object(v: &RawValue) -> Result<&RawObject, FieldError> {
    v.as_object()
        .ok_or_else(|| FieldError::unexpected(ValueKind::Object, v))
}

fn array(v: &RawValue) -> Result<&[RawValue], FieldError> {
    v.as_array()
        .ok_or_else(|| FieldError::unexpected(ValueKind::Array, v))
}

pub(crate) fn string(v: &RawValue) -> Result<String, FieldError> {
    v.as_str()
        .map(str::to_owned)
        .ok_or_else(|| FieldError::unexpected(ValueKind::String, v))
}

pub(crate) fn interned(v: &RawValue) -> Result<Intern<String>, FieldError> {
    string(v).map(Intern::new)
}

/// Present, non-null member of an object
fn member<'a>(obj: &'a RawObject, key: &str) -> Option<&'a RawValue> {
    obj.get(key).filter(|v| !v.is_null())
}

/// String member, dropped with a diagnostic when it has the wrong shape
fn optional_string(obj: &RawObject, key: &str, ctx: &'static str) -> Option<String> {
    let v = member(obj, key)?;
    match string(v) {
        Ok(s) => Some(s),
        Err(e) => {
            warn!(field = key, context = ctx, error = %e, "Discarded malformed member");
            None
        }
    }
}

/// Scalars become their textual form, everything else is rejected
fn scalar_text(v: &RawValue) -> Option<String> {
    match v {
        RawValue::String(_) | RawValue::Number(_) | RawValue::Bool(_) => Some(v.to_text()),
        RawValue::Null | RawValue::Array(_) | RawValue::Object(_) => None,
    }
}

pub(crate) fn event_id(v: &RawValue) -> Result<EventId, FieldError> {
    let s = v
        .as_str()
        .ok_or_else(|| FieldError::unexpected(ValueKind::String, v))?;
    EventId::parse(s).ok_or_else(|| FieldError::InvalidEventId(s.to_owned()))
}

pub(crate) fn level(v: &RawValue) -> Result<Level, FieldError> {
    let s = v
        .as_str()
        .ok_or_else(|| FieldError::unexpected(ValueKind::String, v))?;
    Ok(s.parse()?)
}

/// Strings pass through, anything structured falls back to its textual form.
pub(crate) fn message(v: &RawValue) -> Option<String> {
    match v {
        RawValue::Null => None,
        RawValue::String(s) => Some(s.clone()),
        other => {
            debug!(kind = %other.kind(), "Using textual form of non-string message");
            Some(other.to_text())
        }
    }
}

pub(crate) fn breadcrumbs(v: &RawValue) -> Result<Vec<Breadcrumb>, FieldError> {
    let entries = array(v)?;
    let mut crumbs = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.iter().enumerate() {
        match object(entry) {
            Ok(obj) => crumbs.push(breadcrumb(obj)),
            Err(e) => warn!(index = idx, error = %e, "Discarded breadcrumb"),
        }
    }
    Ok(crumbs)
}

pub(crate) fn breadcrumb(obj: &RawObject) -> Breadcrumb {
    let category = member(obj, "category").and_then(|v| match interned(v) {
        Ok(c) => Some(c),
        Err(e) => {
            warn!(error = %e, "Discarded breadcrumb.category");
            None
        }
    });

    // Unrecognized type and level values are not copied over
    let typ = member(obj, "type")
        .and_then(RawValue::as_str)
        .and_then(|s| s.parse().ok());
    let level = member(obj, "level")
        .and_then(RawValue::as_str)
        .and_then(|s| s.parse().ok());

    let data = member(obj, "data").and_then(|v| match breadcrumb_data(v) {
        Ok(d) => Some(d),
        Err(e) => {
            warn!(error = %e, "Discarded breadcrumb.data since it was not an object");
            None
        }
    });

    let message = member(obj, "message")
        .map(RawValue::to_text)
        .unwrap_or_default();

    let timestamp = member(obj, "timestamp")
        .and_then(RawValue::as_number)
        .map(|n| OrderedFloat(n.as_f64()));

    Breadcrumb {
        category,
        typ,
        level,
        data,
        message,
        timestamp,
    }
}

pub(crate) fn breadcrumb_data(v: &RawValue) -> Result<BTreeMap<String, String>, FieldError> {
    let mut data: BTreeMap<String, String> = object(v)?
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.clone(), v.to_text()))
        .collect();

    // The upstream number -> string coercion renders integral status codes as floats
    if let Some(status_code) = data.get_mut("status_code") {
        if let Some(stripped) = status_code.strip_suffix(".0") {
            *status_code = stripped.to_owned();
        }
    }

    Ok(data)
}

pub(crate) fn user(v: &RawValue) -> Result<User, FieldError> {
    let obj = object(v)?;

    let id = USER_ID_KEYS
        .iter()
        .find_map(|k| member(obj, k).and_then(scalar_text));

    let mut data = BTreeMap::new();
    for key in ["extra", "data"] {
        if let Some(v) = member(obj, key) {
            match object(v) {
                Ok(o) => data.extend(o.iter().map(|(k, v)| (k.clone(), v.clone()))),
                Err(e) => warn!(field = key, error = %e, "Discarded user data"),
            }
        }
    }

    Ok(User {
        id,
        username: optional_string(obj, "username", "user"),
        email: optional_string(obj, "email", "user"),
        ip_address: optional_string(obj, "ip_address", "user"),
        data,
    })
}

pub(crate) fn extra(v: &RawValue) -> Result<BTreeMap<String, RawValue>, FieldError> {
    Ok(object(v)?.clone())
}

pub(crate) fn tags(v: &RawValue) -> Result<BTreeMap<String, String>, FieldError> {
    Ok(object(v)?
        .iter()
        .map(|(k, v)| {
            let tag = if v.is_null() {
                INVALID_TAG.to_owned()
            } else {
                v.to_text()
            };
            (k.clone(), tag)
        })
        .collect())
}

pub(crate) fn fingerprint(v: &RawValue) -> Result<Vec<String>, FieldError> {
    let entries = array(v)?;
    Ok(entries
        .iter()
        .filter_map(|e| {
            let s = scalar_text(e);
            if s.is_none() {
                debug!(kind = %e.kind(), "Dropped fingerprint entry");
            }
            s
        })
        .collect())
}

pub(crate) fn exception(v: &RawValue) -> Result<ExceptionRecord, FieldError> {
    let values = member(object(v)?, "values").ok_or(FieldError::NoExceptionValues)?;
    let first = array(values)?
        .first()
        .ok_or(FieldError::NoExceptionValues)?;
    let first = object(first)?;

    // Frames are required; a stacktrace without them yields no record at all
    let stacktrace = object(member(first, "stacktrace").ok_or(FieldError::NoStacktrace)?)?;
    let frames = array(member(stacktrace, "frames").ok_or(FieldError::NoFrames)?)?;

    let typ = optional_string(first, "type", "exception");
    let value = match member(first, "value") {
        Some(v) => Some(v.to_text()),
        // No value marks an unhandled promise rejection, upstream reports type/type
        None => typ.clone(),
    };

    let frames = frames
        .iter()
        .enumerate()
        .filter_map(|(idx, f)| match object(f) {
            Ok(obj) => Some(frame(obj)),
            Err(e) => {
                warn!(index = idx, error = %e, "Discarded stack frame");
                None
            }
        })
        .collect();

    Ok(ExceptionRecord { typ, value, frames })
}

pub(crate) fn frame(obj: &RawObject) -> Frame {
    Frame {
        function: optional_string(obj, "function", "frame"),
        module: optional_string(obj, "module", "frame"),
        filename: optional_string(obj, "filename", "frame").map(Intern::new),
        abs_path: optional_string(obj, "abs_path", "frame"),
        lineno: member(obj, "lineno")
            .and_then(RawValue::as_number)
            .and_then(|n| n.as_u32()),
        colno: member(obj, "colno")
            .and_then(RawValue::as_number)
            .and_then(|n| n.as_u32()),
        in_app: member(obj, "in_app").and_then(RawValue::as_bool),
        platform: optional_string(obj, "platform", "frame"),
    }
}

/// Converts a frame from the React Native error stack into an event frame.
///
/// A frame is in-app only with a non-zero line and column and a file outside
/// `node_modules` and native code. Line numbers are kept for in-app frames only.
pub(crate) fn react_native_frame(obj: &RawObject) -> Frame {
    let number = |key: &str| {
        member(obj, key)
            .and_then(RawValue::as_number)
            .and_then(|n| n.as_u32())
    };
    let lineno = number("lineNumber");
    let colno = number("column");
    let filename = optional_string(obj, "file", "react native frame");

    let in_app = lineno.is_some_and(|l| l != 0)
        && colno.is_some_and(|c| c != 0)
        && filename
            .as_deref()
            .is_some_and(|f| !f.contains("node_modules") && !f.contains("native code"));

    Frame {
        function: optional_string(obj, "methodName", "react native frame"),
        module: None,
        filename: filename.map(Intern::new),
        abs_path: None,
        lineno: lineno.filter(|_| in_app),
        colno,
        in_app: Some(in_app),
        platform: Some(if in_app { "javascript" } else { "node" }.to_owned()),
    }
}

/// React Native stacks list the innermost call first, events want it last.
pub(crate) fn react_native_frames(v: &RawValue) -> Result<Vec<Frame>, FieldError> {
    let mut frames: Vec<Frame> = array(v)?
        .iter()
        .enumerate()
        .filter_map(|(idx, f)| match object(f) {
            Ok(obj) => Some(react_native_frame(obj)),
            Err(e) => {
                warn!(index = idx, error = %e, "Discarded react native stack frame");
                None
            }
        })
        .collect();
    frames.reverse();
    Ok(frames)
}

pub(crate) fn sdk(v: &RawValue) -> Result<SdkInfo, FieldError> {
    let obj = object(v)?;
    let mut seen = FxHashSet::default();
    let integrations = match member(obj, "integrations") {
        Some(v) => array(v)?
            .iter()
            .filter_map(RawValue::as_str)
            .filter(|name| seen.insert(*name))
            .map(str::to_owned)
            .collect(),
        None => Vec::new(),
    };
    Ok(SdkInfo {
        name: optional_string(obj, "name", "sdk"),
        version: optional_string(obj, "version", "sdk"),
        integrations,
    })
}
