use crate::convert::{new_row_id, ref_to_dto, ref_to_form, require_ref, FieldError, ResourceForm};
use crate::extension::{Extensions, SpecFields};
use crate::resource::{Metadata, Resource, ResourceKind, ResourceRef};
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_ref: Option<ResourceRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub endpoint_specs: Vec<EndpointSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SpecFields for ExperimentSpec {
    const FIELDS: &'static [&'static str] = &["pipelineRef", "endpointSpecs", "scheduledTime"];

    fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    fn extra_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.extra
    }
}

/// Binds one pipeline endpoint to the data and load it receives
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointSpec {
    #[serde(default)]
    pub endpoint_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_spec: Option<DataSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_pattern_ref: Option<ResourceRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_set_ref: Option<ResourceRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentEndpointForm {
    #[serde(default = "new_row_id")]
    pub id: String,
    pub endpoint_name: String,
    pub data_set_ref: ResourceRef,
    pub load_pattern_ref: ResourceRef,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentForm {
    pub metadata: Metadata,
    pub pipeline_ref: ResourceRef,
    pub endpoints: Vec<ExperimentEndpointForm>,
    pub has_scheduled_time: bool,
    pub scheduled_time: String,
    #[serde(skip_serializing_if = "Extensions::is_empty")]
    pub extensions: Extensions,
}

impl ResourceForm for ExperimentForm {
    type Spec = ExperimentSpec;

    const KIND: ResourceKind = ResourceKind::Experiment;

    fn from_dto(dto: &Resource<ExperimentSpec>) -> Self {
        let spec = &dto.spec;
        let scheduled_time = spec.scheduled_time.clone().unwrap_or_default();
        Self {
            metadata: dto.metadata.clone(),
            pipeline_ref: ref_to_form(&spec.pipeline_ref),
            endpoints: spec
                .endpoint_specs
                .iter()
                .map(|e| ExperimentEndpointForm {
                    id: new_row_id(),
                    endpoint_name: e.endpoint_name.clone(),
                    data_set_ref: ref_to_form(
                        &e.data_spec.as_ref().and_then(|d| d.data_set_ref.clone()),
                    ),
                    load_pattern_ref: ref_to_form(&e.load_pattern_ref),
                })
                .collect(),
            has_scheduled_time: !scheduled_time.is_empty(),
            scheduled_time,
            extensions: Extensions::capture(dto),
        }
    }

    fn to_dto(&self) -> Resource<ExperimentSpec> {
        let spec = ExperimentSpec {
            pipeline_ref: ref_to_dto(&self.pipeline_ref),
            endpoint_specs: self
                .endpoints
                .iter()
                .map(|e| EndpointSpec {
                    endpoint_name: e.endpoint_name.clone(),
                    data_spec: ref_to_dto(&e.data_set_ref).map(|r| DataSpec {
                        data_set_ref: Some(r),
                    }),
                    load_pattern_ref: ref_to_dto(&e.load_pattern_ref),
                })
                .collect(),
            scheduled_time: self
                .has_scheduled_time
                .then(|| self.scheduled_time.clone()),
            extra: Map::new(),
        };
        self.extensions.assemble(&self.metadata, spec)
    }

    fn default_form() -> Self {
        Self {
            metadata: Metadata::namespaced("default", ""),
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
        require_ref("pipelineRef", &self.pipeline_ref, &mut errors);
        if self.endpoints.is_empty() {
            errors.push(FieldError::new("endpoints", "at least one endpoint is required"));
        }
        for (i, endpoint) in self.endpoints.iter().enumerate() {
            if endpoint.endpoint_name.is_empty() {
                errors.push(FieldError::new(format!("endpoints[{}].endpointName", i), "is required"));
            }
            require_ref(
                &format!("endpoints[{}].loadPatternRef", i),
                &endpoint.load_pattern_ref,
                &mut errors,
            );
        }
        if self.has_scheduled_time && DateTime::parse_from_rfc3339(&self.scheduled_time).is_err() {
            errors.push(FieldError::new("scheduledTime", "must be an RFC 3339 timestamp"));
        }
        errors
    }
}
