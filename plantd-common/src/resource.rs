//! Resource identity and the wire envelope shared by every kind

use crate::util::concat_in_path;
use crate::Error;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Managed resource kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    Namespace,
    Schema,
    DataSet,
    LoadPattern,
    Pipeline,
    Experiment,
    DigitalTwin,
    TrafficModel,
    Simulation,
    Scenario,
    CostExporter,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 11] = [
        ResourceKind::Namespace,
        ResourceKind::Schema,
        ResourceKind::DataSet,
        ResourceKind::LoadPattern,
        ResourceKind::Pipeline,
        ResourceKind::Experiment,
        ResourceKind::DigitalTwin,
        ResourceKind::TrafficModel,
        ResourceKind::Simulation,
        ResourceKind::Scenario,
        ResourceKind::CostExporter,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Namespace => "Namespace",
            Self::Schema => "Schema",
            Self::DataSet => "DataSet",
            Self::LoadPattern => "LoadPattern",
            Self::Pipeline => "Pipeline",
            Self::Experiment => "Experiment",
            Self::DigitalTwin => "DigitalTwin",
            Self::TrafficModel => "TrafficModel",
            Self::Simulation => "Simulation",
            Self::Scenario => "Scenario",
            Self::CostExporter => "CostExporter",
        }
    }

    /// Path segment used by the REST backend
    pub fn plural(self) -> &'static str {
        match self {
            Self::Namespace => "namespaces",
            Self::Schema => "schemas",
            Self::DataSet => "datasets",
            Self::LoadPattern => "loadpatterns",
            Self::Pipeline => "pipelines",
            Self::Experiment => "experiments",
            Self::DigitalTwin => "digitaltwins",
            Self::TrafficModel => "trafficmodels",
            Self::Simulation => "simulations",
            Self::Scenario => "scenarios",
            Self::CostExporter => "costexporters",
        }
    }

    /// Namespace is the only cluster-scoped kind
    pub fn is_namespaced(self) -> bool {
        !matches!(self, Self::Namespace)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| {
                let singular = kind.name().to_lowercase();
                wanted == singular || wanted == kind.plural()
            })
            .ok_or_else(|| Error::UnknownKind(s.to_string()))
    }
}

/// Identity tuple of a resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default)]
    pub name: String,
}

impl Metadata {
    pub fn namespaced(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            name: name.into(),
        }
    }

    pub fn cluster(name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            name: name.into(),
        }
    }

    /// Row identity: `namespace/name`, or just `name` for cluster-scoped resources
    pub fn key(&self) -> String {
        concat_in_path(&[self.namespace.as_deref(), Some(self.name.as_str())])
    }
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Parses `namespace/name` or a bare `name`
impl FromStr for Metadata {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((ns, name)) if !ns.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self::namespaced(ns, name))
            }
            None if !s.is_empty() => Ok(Self::cluster(s)),
            _ => Err(Error::InvalidResource(format!("invalid resource identity '{}'", s))),
        }
    }
}

/// Reference to another resource from inside a spec
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub name: String,
}

impl ResourceRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn is_set(&self) -> bool {
        !self.name.is_empty()
    }
}

impl From<&Metadata> for ResourceRef {
    fn from(metadata: &Metadata) -> Self {
        Self {
            namespace: metadata.namespace.clone().unwrap_or_default(),
            name: metadata.name.clone(),
        }
    }
}

/// Wire envelope: metadata, spec, read-only status and any unmodeled top-level field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource<S, T = Value> {
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub spec: S,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<T>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A resource whose spec has not been given a concrete type
pub type AnyResource = Resource<Value>;

impl<S> Resource<S> {
    pub fn new(metadata: Metadata, spec: S) -> Self {
        Self {
            metadata,
            spec,
            status: None,
            extra: Map::new(),
        }
    }
}

impl<S: Serialize> Resource<S> {
    /// Erase the spec type, e.g. before handing the resource to the transport
    pub fn into_any(self) -> Result<AnyResource, Error> {
        Ok(serde_json::from_value(serde_json::to_value(self)?)?)
    }
}

impl AnyResource {
    /// Reinterpret the raw spec as a typed one
    pub fn into_typed<S: DeserializeOwned + Default>(self) -> Result<Resource<S>, Error> {
        let mut value = serde_json::to_value(self)?;
        if let Some(spec) = value.get_mut("spec") {
            if spec.is_null() {
                *spec = Value::Object(Map::new());
            }
        }
        Ok(serde_json::from_value(value)?)
    }

    /// First well-known state field reported by the backend
    pub fn status_summary(&self) -> String {
        const STATE_FIELDS: [&str; 5] = [
            "jobStatus",
            "pipelineState",
            "experimentState",
            "simulationState",
            "phase",
        ];

        let Some(status) = self.status.as_ref().and_then(Value::as_object) else {
            return String::new();
        };
        STATE_FIELDS
            .iter()
            .find_map(|field| status.get(*field).and_then(Value::as_str))
            .unwrap_or_default()
            .to_string()
    }
}

/// List response: `{ items: [...] }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceList<R> {
    #[serde(default = "Vec::new")]
    pub items: Vec<R>,
}
