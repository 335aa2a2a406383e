//! Per-kind spec DTOs and their editable forms

pub mod cost_exporter;
pub mod dataset;
pub mod digital_twin;
pub mod experiment;
pub mod load_pattern;
pub mod namespace;
pub mod pipeline;
pub mod scenario;
pub mod schema;
pub mod simulation;
pub mod traffic_model;

pub use cost_exporter::{CostExporterForm, CostExporterSpec};
pub use dataset::{DataSetForm, DataSetSchemaForm, DataSetSchemaSpec, DataSetSpec};
pub use digital_twin::{DigitalTwinForm, DigitalTwinSpec};
pub use experiment::{DataSpec, EndpointSpec, ExperimentEndpointForm, ExperimentForm, ExperimentSpec};
pub use load_pattern::{LoadPatternForm, LoadPatternSpec, StageForm, StageSpec};
pub use namespace::{NamespaceForm, NamespaceSpec};
pub use pipeline::{
    HttpForm, HttpSpec, MetricsEndpointSpec, PipelineEndpointForm, PipelineEndpointSpec,
    PipelineForm, PipelineSpec,
};
pub use scenario::{DataSetConfigSpec, DeviceCount, ScenarioForm, ScenarioSpec, TaskForm, TaskSpec};
pub use schema::{ColumnForm, ColumnSpec, FormulaSpec, SchemaForm, SchemaSpec};
pub use simulation::{SimulationForm, SimulationSpec};
pub use traffic_model::{TrafficModelForm, TrafficModelSpec};

use crate::convert::{FieldError, ResourceForm};
use crate::resource::{AnyResource, ResourceKind};
use crate::Result;

/// Runs `$body` with `$form` bound to the form type of a runtime kind
#[macro_export]
macro_rules! with_form_type {
    ($kind:expr, $form:ident => $body:expr) => {{
        use $crate::kinds::*;
        use $crate::resource::ResourceKind;
        match $kind {
            ResourceKind::Namespace => { type $form = NamespaceForm; $body }
            ResourceKind::Schema => { type $form = SchemaForm; $body }
            ResourceKind::DataSet => { type $form = DataSetForm; $body }
            ResourceKind::LoadPattern => { type $form = LoadPatternForm; $body }
            ResourceKind::Pipeline => { type $form = PipelineForm; $body }
            ResourceKind::Experiment => { type $form = ExperimentForm; $body }
            ResourceKind::DigitalTwin => { type $form = DigitalTwinForm; $body }
            ResourceKind::TrafficModel => { type $form = TrafficModelForm; $body }
            ResourceKind::Simulation => { type $form = SimulationForm; $body }
            ResourceKind::Scenario => { type $form = ScenarioForm; $body }
            ResourceKind::CostExporter => { type $form = CostExporterForm; $body }
        }
    }};
}

fn normalize_as<F: ResourceForm>(resource: AnyResource) -> Result<(AnyResource, Vec<FieldError>)> {
    let form = F::from_dto(&resource.into_typed::<F::Spec>()?);
    let errors = form.validate();
    let value = serde_json::to_value(form.to_dto())?;
    Ok((serde_json::from_value(value)?, errors))
}

/// Passes an untyped resource through its kind's form, as the editor would on submit
///
/// Returns the resource that would be sent together with any validation errors.
pub fn normalize(kind: ResourceKind, resource: AnyResource) -> Result<(AnyResource, Vec<FieldError>)> {
    with_form_type!(kind, F => normalize_as::<F>(resource))
}
