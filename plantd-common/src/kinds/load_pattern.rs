use crate::convert::{new_row_id, DurationUnit, DurationValue, FieldError, ResourceForm};
use crate::extension::{Extensions, SpecFields};
use crate::resource::{Metadata, Resource, ResourceKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadPatternSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stages: Vec<StageSpec>,
    #[serde(rename = "preAllocatedVUs", default, skip_serializing_if = "Option::is_none")]
    pub pre_allocated_vus: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_rate: Option<u32>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub time_unit: String,
    #[serde(rename = "maxVUs", default, skip_serializing_if = "Option::is_none")]
    pub max_vus: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SpecFields for LoadPatternSpec {
    const FIELDS: &'static [&'static str] =
        &["stages", "preAllocatedVUs", "startRate", "timeUnit", "maxVUs"];

    fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    fn extra_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.extra
    }
}

/// Ramp to `target` requests per time unit over `duration`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageSpec {
    #[serde(default)]
    pub target: u32,
    #[serde(default)]
    pub duration: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageForm {
    #[serde(default = "new_row_id")]
    pub id: String,
    pub target: u32,
    pub duration: DurationValue,
}

impl StageForm {
    pub fn new(target: u32, duration: DurationValue) -> Self {
        Self {
            id: new_row_id(),
            target,
            duration,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadPatternForm {
    pub metadata: Metadata,
    pub stages: Vec<StageForm>,
    pub pre_allocated_vus: u32,
    pub start_rate: u32,
    pub time_unit: DurationValue,
    pub max_vus: u32,
    #[serde(skip_serializing_if = "Extensions::is_empty")]
    pub extensions: Extensions,
}

impl LoadPatternForm {
    /// Sum of all stage durations
    pub fn total_duration_ms(&self) -> u64 {
        self.stages.iter().map(|s| s.duration.as_millis()).sum()
    }
}

impl ResourceForm for LoadPatternForm {
    type Spec = LoadPatternSpec;

    const KIND: ResourceKind = ResourceKind::LoadPattern;

    fn from_dto(dto: &Resource<LoadPatternSpec>) -> Self {
        let spec = &dto.spec;
        Self {
            metadata: dto.metadata.clone(),
            stages: spec
                .stages
                .iter()
                .map(|s| StageForm::new(s.target, DurationValue::from_wire(&s.duration)))
                .collect(),
            pre_allocated_vus: spec.pre_allocated_vus.unwrap_or(0),
            start_rate: spec.start_rate.unwrap_or(0),
            time_unit: DurationValue::from_wire(&spec.time_unit),
            max_vus: spec.max_vus.unwrap_or(0),
            extensions: Extensions::capture(dto),
        }
    }

    fn to_dto(&self) -> Resource<LoadPatternSpec> {
        let spec = LoadPatternSpec {
            stages: self
                .stages
                .iter()
                .map(|s| StageSpec {
                    target: s.target,
                    duration: s.duration.to_string(),
                })
                .collect(),
            pre_allocated_vus: Some(self.pre_allocated_vus),
            start_rate: Some(self.start_rate),
            time_unit: self.time_unit.to_string(),
            max_vus: Some(self.max_vus),
            extra: Map::new(),
        };
        self.extensions.assemble(&self.metadata, spec)
    }

    fn default_form() -> Self {
        Self {
            metadata: Metadata::namespaced("default", ""),
            stages: vec![StageForm::new(1, DurationValue::new(60, DurationUnit::S))],
            pre_allocated_vus: 10,
            start_rate: 1,
            time_unit: DurationValue::new(1, DurationUnit::S),
            max_vus: 100,
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
        if self.stages.is_empty() {
            errors.push(FieldError::new("stages", "at least one stage is required"));
        }
        for (i, stage) in self.stages.iter().enumerate() {
            if stage.duration.value == 0 {
                errors.push(FieldError::new(format!("stages[{}].duration", i), "must be positive"));
            }
        }
        if self.max_vus < self.pre_allocated_vus {
            errors.push(FieldError::new("maxVUs", "must be at least preAllocatedVUs"));
        }
        errors
    }
}
