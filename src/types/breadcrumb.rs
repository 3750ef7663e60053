use crate::types::{BreadcrumbLevel, BreadcrumbType};
use internment::Intern;
use ordered_float::OrderedFloat;
use serde::Serialize;
use std::collections::BTreeMap;

/// A trail entry recorded before an event.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default, Serialize)]
pub struct Breadcrumb {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Intern<String>>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub typ: Option<BreadcrumbType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<BreadcrumbLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<BTreeMap<String, String>>,
    pub message: String,
    /// Seconds since the UNIX epoch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<OrderedFloat<f64>>,
}
