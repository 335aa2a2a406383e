use crate::convert::{ref_to_dto, ref_to_form, require_ref, FieldError, ResourceForm};
use crate::extension::{Extensions, SpecFields};
use crate::resource::{Metadata, Resource, ResourceKind, ResourceRef};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const MODEL_TYPES: [&str; 3] = ["simple", "quickscaling", "autoscaling"];

/// Twins of this type are trained per schema and need a dataset
pub const SCHEMA_AWARE: &str = "schemaaware";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigitalTwinSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub model_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub digital_twin_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_ref: Option<ResourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_set_ref: Option<ResourceRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub experiments: Vec<ResourceRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SpecFields for DigitalTwinSpec {
    const FIELDS: &'static [&'static str] = &[
        "modelType",
        "digitalTwinType",
        "pipelineRef",
        "dataSetRef",
        "experiments",
    ];

    fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    fn extra_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.extra
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigitalTwinForm {
    pub metadata: Metadata,
    pub model_type: String,
    pub digital_twin_type: String,
    pub pipeline_ref: ResourceRef,
    pub data_set_ref: ResourceRef,
    pub experiments: Vec<ResourceRef>,
    #[serde(skip_serializing_if = "Extensions::is_empty")]
    pub extensions: Extensions,
}

impl DigitalTwinForm {
    pub fn is_schema_aware(&self) -> bool {
        self.digital_twin_type == SCHEMA_AWARE
    }
}

impl ResourceForm for DigitalTwinForm {
    type Spec = DigitalTwinSpec;

    const KIND: ResourceKind = ResourceKind::DigitalTwin;

    fn from_dto(dto: &Resource<DigitalTwinSpec>) -> Self {
        let spec = &dto.spec;
        Self {
            metadata: dto.metadata.clone(),
            model_type: spec.model_type.clone(),
            digital_twin_type: spec.digital_twin_type.clone(),
            pipeline_ref: ref_to_form(&spec.pipeline_ref),
            data_set_ref: ref_to_form(&spec.data_set_ref),
            experiments: spec.experiments.clone(),
            extensions: Extensions::capture(dto),
        }
    }

    fn to_dto(&self) -> Resource<DigitalTwinSpec> {
        let spec = DigitalTwinSpec {
            model_type: self.model_type.clone(),
            digital_twin_type: self.digital_twin_type.clone(),
            pipeline_ref: ref_to_dto(&self.pipeline_ref),
            data_set_ref: if self.is_schema_aware() {
                ref_to_dto(&self.data_set_ref)
            } else {
                None
            },
            experiments: self.experiments.iter().filter(|r| r.is_set()).cloned().collect(),
            extra: Map::new(),
        };
        self.extensions.assemble(&self.metadata, spec)
    }

    fn default_form() -> Self {
        Self {
            metadata: Metadata::namespaced("default", ""),
            model_type: MODEL_TYPES[0].to_string(),
            digital_twin_type: "regular".to_string(),
            ..Default::default()
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
        if !MODEL_TYPES.contains(&self.model_type.as_str()) {
            errors.push(FieldError::new(
                "modelType",
                format!("must be one of {}", MODEL_TYPES.join(", ")),
            ));
        }
        if self.is_schema_aware() {
            require_ref("dataSetRef", &self.data_set_ref, &mut errors);
        }
        errors
    }
}
