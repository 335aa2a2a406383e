use crate::convert::{new_row_id, ref_to_dto, ref_to_form, require_ref, FieldError, MinMax, ResourceForm};
use crate::extension::{Extensions, SpecFields};
use crate::resource::{Metadata, Resource, ResourceKind, ResourceRef};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_ref: Option<ResourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_set_config: Option<DataSetConfigSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<TaskSpec>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SpecFields for ScenarioSpec {
    const FIELDS: &'static [&'static str] = &["pipelineRef", "dataSetConfig", "tasks"];

    fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    fn extra_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.extra
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSetConfigSpec {
    #[serde(default)]
    pub compress_ratio: f64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub compressed_file_format: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file_format: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub size: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sending_devices: BTreeMap<String, u32>,
    #[serde(default)]
    pub push_frequency_per_month: MinMax,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub months_relevant: Vec<u32>,
}

/// Number of devices of one kind sending for a task
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceCount {
    #[serde(default = "new_row_id")]
    pub id: String,
    pub device: String,
    pub count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskForm {
    #[serde(default = "new_row_id")]
    pub id: String,
    pub name: String,
    pub size: String,
    pub sending_devices: Vec<DeviceCount>,
    pub push_frequency_per_month: MinMax,
    pub months_relevant: Vec<u32>,
}

impl TaskForm {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_row_id(),
            name: name.into(),
            push_frequency_per_month: MinMax::new(1, 1),
            months_relevant: (1..=12).collect(),
            ..Default::default()
        }
    }

    fn from_spec(spec: &TaskSpec) -> Self {
        Self {
            id: new_row_id(),
            name: spec.name.clone(),
            size: spec.size.clone(),
            sending_devices: spec
                .sending_devices
                .iter()
                .map(|(device, count)| DeviceCount {
                    id: new_row_id(),
                    device: device.clone(),
                    count: *count,
                })
                .collect(),
            push_frequency_per_month: spec.push_frequency_per_month,
            months_relevant: spec.months_relevant.clone(),
        }
    }

    fn to_spec(&self) -> TaskSpec {
        TaskSpec {
            name: self.name.clone(),
            size: self.size.clone(),
            sending_devices: self
                .sending_devices
                .iter()
                .filter(|d| !d.device.trim().is_empty())
                .map(|d| (d.device.trim().to_string(), d.count))
                .collect(),
            push_frequency_per_month: self.push_frequency_per_month,
            months_relevant: self.months_relevant.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioForm {
    pub metadata: Metadata,
    pub pipeline_ref: ResourceRef,
    pub compress_ratio: f64,
    pub compressed_file_format: String,
    pub file_format: String,
    pub tasks: Vec<TaskForm>,
    #[serde(skip_serializing_if = "Extensions::is_empty")]
    pub extensions: Extensions,
}

impl ResourceForm for ScenarioForm {
    type Spec = ScenarioSpec;

    const KIND: ResourceKind = ResourceKind::Scenario;

    fn from_dto(dto: &Resource<ScenarioSpec>) -> Self {
        let spec = &dto.spec;
        let config = spec.data_set_config.clone().unwrap_or_default();
        Self {
            metadata: dto.metadata.clone(),
            pipeline_ref: ref_to_form(&spec.pipeline_ref),
            compress_ratio: config.compress_ratio,
            compressed_file_format: config.compressed_file_format,
            file_format: config.file_format,
            tasks: spec.tasks.iter().map(TaskForm::from_spec).collect(),
            extensions: Extensions::capture(dto),
        }
    }

    fn to_dto(&self) -> Resource<ScenarioSpec> {
        let spec = ScenarioSpec {
            pipeline_ref: ref_to_dto(&self.pipeline_ref),
            data_set_config: Some(DataSetConfigSpec {
                compress_ratio: self.compress_ratio,
                compressed_file_format: self.compressed_file_format.clone(),
                file_format: self.file_format.clone(),
            }),
            tasks: self.tasks.iter().map(TaskForm::to_spec).collect(),
            extra: Map::new(),
        };
        self.extensions.assemble(&self.metadata, spec)
    }

    fn default_form() -> Self {
        Self {
            metadata: Metadata::namespaced("default", ""),
            compress_ratio: 1.0,
            file_format: "csv".to_string(),
            tasks: vec![TaskForm::new("")],
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
        if self.compress_ratio <= 0.0 {
            errors.push(FieldError::new("dataSetConfig.compressRatio", "must be positive"));
        }
        for (i, task) in self.tasks.iter().enumerate() {
            if task.name.is_empty() {
                errors.push(FieldError::new(format!("tasks[{}].name", i), "is required"));
            }
            if !task.push_frequency_per_month.is_ordered() {
                errors.push(FieldError::new(
                    format!("tasks[{}].pushFrequencyPerMonth", i),
                    "min must not exceed max",
                ));
            }
            if task.months_relevant.iter().any(|m| !(1..=12).contains(m)) {
                errors.push(FieldError::new(
                    format!("tasks[{}].monthsRelevant", i),
                    "months must be between 1 and 12",
                ));
            }
        }
        errors
    }
}
