//! DTO <-> form conversion contract and the form-friendly value types

use crate::extension::SpecFields;
use crate::resource::{Metadata, Resource, ResourceKind, ResourceRef};
use crate::Error;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Conversion between the wire shape of a resource and its editable form
///
/// `from_dto` is total: every optional wire field maps to a concrete default.
/// `to_dto` only emits metadata and spec, and omits fields whose enabling flag
/// on the form is off.
pub trait ResourceForm: Sized + Clone + Serialize + DeserializeOwned + Send + Sync {
    type Spec: SpecFields + Serialize + DeserializeOwned + Default + Clone + Send + Sync;

    const KIND: ResourceKind;

    fn from_dto(dto: &Resource<Self::Spec>) -> Self;

    fn to_dto(&self) -> Resource<Self::Spec>;

    /// Seed for create mode
    fn default_form() -> Self;

    fn metadata(&self) -> &Metadata;

    fn metadata_mut(&mut self) -> &mut Metadata;

    /// Field-level checks run before submission
    fn validate(&self) -> Vec<FieldError> {
        validate_metadata(Self::KIND, self.metadata())
    }

    /// Applies dependent-field rules to a form edited as a whole against the
    /// form it was loaded as
    fn reconcile(&mut self, _previous: &Self) {}
}

/// A client-side validation failure bound to a form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Kubernetes object names: lower-case alphanumerics and `-`, at most 63 chars
pub fn validate_metadata(kind: ResourceKind, metadata: &Metadata) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if let Some(message) = check_dns_label(&metadata.name) {
        errors.push(FieldError::new("metadata.name", message));
    }
    if kind.is_namespaced() {
        match metadata.namespace.as_deref() {
            Some(ns) => {
                if let Some(message) = check_dns_label(ns) {
                    errors.push(FieldError::new("metadata.namespace", message));
                }
            }
            None => errors.push(FieldError::new("metadata.namespace", "namespace is required")),
        }
    }
    errors
}

fn check_dns_label(value: &str) -> Option<&'static str> {
    if value.is_empty() {
        return Some("is required");
    }
    if value.len() > 63 {
        return Some("must be at most 63 characters");
    }
    let valid_chars = value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !valid_chars || value.starts_with('-') || value.ends_with('-') {
        return Some("must consist of lower case alphanumeric characters or '-'");
    }
    None
}

/// Synthetic identity for list-editable rows
pub fn new_row_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// One editable row of a string map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    #[serde(default = "new_row_id")]
    pub id: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: new_row_id(),
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn from_map(map: &BTreeMap<String, String>) -> Vec<Self> {
        map.iter().map(|(k, v)| Self::new(k, v)).collect()
    }

    /// Rows with an empty key are dropped; a repeated key keeps its last value
    pub fn to_map(rows: &[Self]) -> BTreeMap<String, String> {
        rows.iter()
            .filter(|row| !row.key.trim().is_empty())
            .map(|row| (row.key.trim().to_string(), row.value.clone()))
            .collect()
    }
}

/// Inclusive integer range
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinMax {
    #[serde(default)]
    pub min: u32,
    #[serde(default)]
    pub max: u32,
}

impl MinMax {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn is_ordered(&self) -> bool {
        self.min <= self.max
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    Ms,
    #[default]
    S,
    M,
    H,
}

impl DurationUnit {
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Ms => "ms",
            Self::S => "s",
            Self::M => "m",
            Self::H => "h",
        }
    }

    fn millis(self) -> u64 {
        match self {
            Self::Ms => 1,
            Self::S => 1_000,
            Self::M => 60_000,
            Self::H => 3_600_000,
        }
    }
}

/// A duration split into number and unit, e.g. `"120s"` -> `120` + `s`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationValue {
    #[serde(default)]
    pub value: u64,
    #[serde(default)]
    pub unit: DurationUnit,
}

impl DurationValue {
    pub fn new(value: u64, unit: DurationUnit) -> Self {
        Self { value, unit }
    }

    /// Saturates at `u64::MAX`
    pub fn as_millis(&self) -> u64 {
        self.value.saturating_mul(self.unit.millis())
    }

    /// Form-side conversion; a malformed wire value falls back to zero seconds
    pub fn from_wire(raw: &str) -> Self {
        if raw.is_empty() {
            return Self::default();
        }
        raw.parse().unwrap_or_else(|e| {
            tracing::warn!("{}, using 0s", e);
            Self::default()
        })
    }
}

impl fmt::Display for DurationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

/// Accepts single (`"90s"`) and compound (`"1m30s"`) Go-style durations.
/// Compound values are expressed in their smallest unit.
impl FromStr for DurationValue {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidDuration(s.to_string());
        let mut rest = s.trim();
        if rest.is_empty() {
            return Err(invalid());
        }

        let mut parts: Vec<(u64, DurationUnit)> = Vec::new();
        while !rest.is_empty() {
            let digits = rest.find(|c: char| !c.is_ascii_digit()).ok_or_else(invalid)?;
            if digits == 0 {
                return Err(invalid());
            }
            let value: u64 = rest[..digits].parse().map_err(|_| invalid())?;
            rest = &rest[digits..];

            let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
            let unit = match &rest[..unit_len] {
                "ms" => DurationUnit::Ms,
                "s" => DurationUnit::S,
                "m" => DurationUnit::M,
                "h" => DurationUnit::H,
                _ => return Err(invalid()),
            };
            rest = &rest[unit_len..];
            parts.push((value, unit));
        }

        if let [(value, unit)] = parts.as_slice() {
            return Ok(Self::new(*value, *unit));
        }

        let smallest = parts
            .iter()
            .map(|(_, unit)| *unit)
            .min_by_key(|unit| unit.millis())
            .unwrap_or_default();
        let total_ms = parts.iter().try_fold(0u64, |total, (value, unit)| {
            value
                .checked_mul(unit.millis())
                .and_then(|ms| total.checked_add(ms))
                .ok_or_else(invalid)
        })?;
        Ok(Self::new(total_ms / smallest.millis(), smallest))
    }
}

pub(crate) fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

pub(crate) fn ref_to_form(reference: &Option<ResourceRef>) -> ResourceRef {
    reference.clone().unwrap_or_default()
}

/// References are emitted only once a name has been chosen
pub(crate) fn ref_to_dto(reference: &ResourceRef) -> Option<ResourceRef> {
    reference.is_set().then(|| reference.clone())
}

pub(crate) fn require_ref(field: &str, reference: &ResourceRef, errors: &mut Vec<FieldError>) {
    if !reference.is_set() {
        errors.push(FieldError::new(field, "is required"));
    }
}
