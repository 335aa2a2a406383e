use crate::convert::{FieldError, ResourceForm};
use crate::extension::{Extensions, SpecFields};
use crate::resource::{Metadata, Resource, ResourceKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficModelSpec {
    /// JSON document kept as text by the backend
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub traffic_model: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SpecFields for TrafficModelSpec {
    const FIELDS: &'static [&'static str] = &["trafficModel"];

    fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    fn extra_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.extra
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficModelForm {
    pub metadata: Metadata,
    pub traffic_model: String,
    #[serde(skip_serializing_if = "Extensions::is_empty")]
    pub extensions: Extensions,
}

impl ResourceForm for TrafficModelForm {
    type Spec = TrafficModelSpec;

    const KIND: ResourceKind = ResourceKind::TrafficModel;

    fn from_dto(dto: &Resource<TrafficModelSpec>) -> Self {
        Self {
            metadata: dto.metadata.clone(),
            traffic_model: dto.spec.traffic_model.clone(),
            extensions: Extensions::capture(dto),
        }
    }

    fn to_dto(&self) -> Resource<TrafficModelSpec> {
        let spec = TrafficModelSpec {
            traffic_model: self.traffic_model.clone(),
            extra: Map::new(),
        };
        self.extensions.assemble(&self.metadata, spec)
    }

    fn default_form() -> Self {
        Self {
            metadata: Metadata::namespaced("default", ""),
            traffic_model: "{}".to_string(),
            extensions: Extensions::default(),
        }
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    fn validate(&self) -> Vec<FieldError> {
        let mut errors = crate::convert::validate_metadata(Self::KIND, &self.metadata);
        if let Err(e) = serde_json::from_str::<Value>(&self.traffic_model) {
            errors.push(FieldError::new("trafficModel", format!("invalid JSON: {}", e)));
        }
        errors
    }
}
