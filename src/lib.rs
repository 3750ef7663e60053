#![doc = include_str!("../README.md")]

pub use crate::bridge::{
    discard_javascript_exception, AppRelease, BeforeSend, Bridge, BridgeConstants, LogFilter,
    NativeSdk, PackageInfo, SdkError, SdkInit,
};
pub use crate::codec::EventDecoder;
pub use crate::config::*;
pub use crate::error::Error;
pub use crate::normalizer::{
    apply_react_native_error, parse_breadcrumbs, parse_event_id, parse_exception, parse_extra,
    parse_fingerprint, parse_message, parse_react_native_frames, parse_sdk, parse_tags, parse_user,
    EventNormalizer,
};
pub use crate::transport::NativeTransport;
pub use crate::types::*;
pub use crate::value::{Number, RawObject, RawValue, ValueKind};

pub mod bridge;
pub mod codec;
pub mod config;
pub mod error;
pub mod normalizer;
pub mod transport;
pub mod types;
pub mod value;
