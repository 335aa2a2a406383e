use crate::convert::{ref_to_dto, ref_to_form, require_ref, FieldError, ResourceForm};
use crate::extension::{Extensions, SpecFields};
use crate::resource::{Metadata, Resource, ResourceKind, ResourceRef};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digital_twin_ref: Option<ResourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic_model_ref: Option<ResourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_ref: Option<ResourceRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SpecFields for SimulationSpec {
    const FIELDS: &'static [&'static str] = &["digitalTwinRef", "trafficModelRef", "scenarioRef"];

    fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    fn extra_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.extra
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationForm {
    pub metadata: Metadata,
    pub digital_twin_ref: ResourceRef,
    pub traffic_model_ref: ResourceRef,
    pub scenario_ref: ResourceRef,
    #[serde(skip_serializing_if = "Extensions::is_empty")]
    pub extensions: Extensions,
}

impl ResourceForm for SimulationForm {
    type Spec = SimulationSpec;

    const KIND: ResourceKind = ResourceKind::Simulation;

    fn from_dto(dto: &Resource<SimulationSpec>) -> Self {
        Self {
            metadata: dto.metadata.clone(),
            digital_twin_ref: ref_to_form(&dto.spec.digital_twin_ref),
            traffic_model_ref: ref_to_form(&dto.spec.traffic_model_ref),
            scenario_ref: ref_to_form(&dto.spec.scenario_ref),
            extensions: Extensions::capture(dto),
        }
    }

    fn to_dto(&self) -> Resource<SimulationSpec> {
        let spec = SimulationSpec {
            digital_twin_ref: ref_to_dto(&self.digital_twin_ref),
            traffic_model_ref: ref_to_dto(&self.traffic_model_ref),
            scenario_ref: ref_to_dto(&self.scenario_ref),
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
        require_ref("digitalTwinRef", &self.digital_twin_ref, &mut errors);
        require_ref("trafficModelRef", &self.traffic_model_ref, &mut errors);
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_simulation_round_trip() {
        let dto: Resource<SimulationSpec> = serde_json::from_value(json!({
            "metadata": {"namespace": "default", "name": "sim"},
            "spec": {
                "digitalTwinRef": {"namespace": "default", "name": "twin"},
                "trafficModelRef": {"namespace": "default", "name": "tm"}
            }
        }))
        .unwrap();
        let form = SimulationForm::from_dto(&dto);
        assert!(!form.scenario_ref.is_set());
        assert_eq!(form.to_dto(), dto);
    }

    #[test]
    fn test_simulation_requires_twin_and_traffic_model() {
        let mut form = SimulationForm::default_form();
        form.metadata.name = "sim".into();
        let fields: Vec<_> = form.validate().into_iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["digitalTwinRef", "trafficModelRef"]);
    }
}
