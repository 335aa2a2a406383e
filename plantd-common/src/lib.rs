//! Common types and utilities shared between the PlantD studio library and CLI
//!
//! Every managed resource has a wire shape (`Resource<XxxSpec>`, mirroring the
//! backend JSON) and a form shape (`XxxForm`, fully defaulted for editing).
//! The [`ResourceForm`] trait converts between the two.

pub mod convert;
pub mod dashboard;
pub mod extension;
pub mod kinds;
pub mod resource;
pub mod schema_form;
pub mod util;

pub use convert::{DurationUnit, DurationValue, FieldError, KeyValue, MinMax, ResourceForm};
pub use extension::{Extensions, SpecFields};
pub use resource::{AnyResource, Metadata, Resource, ResourceKind, ResourceList, ResourceRef};

/// Errors raised while parsing or converting resources
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unknown resource kind: {0}")]
    UnknownKind(String),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Invalid resource: {0}")]
    InvalidResource(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
