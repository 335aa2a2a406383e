use crate::convert::{new_row_id, non_empty, FieldError, KeyValue, ResourceForm};
use crate::extension::{Extensions, SpecFields};
use crate::resource::{Metadata, Resource, ResourceKind, ResourceRef};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pipeline_endpoints: Vec<PipelineEndpointSpec>,
    #[serde(rename = "healthCheckURLs", default, skip_serializing_if = "Vec::is_empty")]
    pub health_check_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_cost_calculation: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_provider: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_cluster: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics_endpoint: Option<MetricsEndpointSpec>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SpecFields for PipelineSpec {
    const FIELDS: &'static [&'static str] = &[
        "pipelineEndpoints",
        "healthCheckURLs",
        "enableCostCalculation",
        "cloudProvider",
        "tags",
        "inCluster",
        "metricsEndpoint",
    ];

    fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    fn extra_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.extra
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineEndpointSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpSpec {
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub method: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsEndpointSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_ref: Option<ResourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpForm {
    pub url: String,
    pub method: String,
    pub headers: Vec<KeyValue>,
}

impl HttpForm {
    fn from_spec(spec: &HttpSpec) -> Self {
        Self {
            url: spec.url.clone(),
            method: spec.method.clone(),
            headers: KeyValue::from_map(&spec.headers),
        }
    }

    fn to_spec(&self) -> HttpSpec {
        HttpSpec {
            url: self.url.clone(),
            method: self.method.clone(),
            headers: KeyValue::to_map(&self.headers),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineEndpointForm {
    #[serde(default = "new_row_id")]
    pub id: String,
    pub name: String,
    pub http: HttpForm,
}

/// Metrics are scraped either from an in-cluster service or from a plain URL
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineForm {
    pub metadata: Metadata,
    pub endpoints: Vec<PipelineEndpointForm>,
    pub health_check_urls: Vec<String>,
    pub enable_cost_calculation: bool,
    pub cloud_provider: String,
    pub tags: Vec<KeyValue>,
    pub in_cluster: bool,
    pub metrics_service: ResourceRef,
    pub metrics_port: String,
    pub metrics_path: String,
    pub metrics_http: HttpForm,
    #[serde(skip_serializing_if = "Extensions::is_empty")]
    pub extensions: Extensions,
}

impl PipelineForm {
    fn metrics_endpoint(&self) -> Option<MetricsEndpointSpec> {
        if self.in_cluster {
            if !self.metrics_service.is_set() {
                return None;
            }
            Some(MetricsEndpointSpec {
                http: None,
                service_ref: Some(self.metrics_service.clone()),
                port: non_empty(&self.metrics_port),
                path: self.metrics_path.clone(),
            })
        } else {
            if self.metrics_http.url.is_empty() {
                return None;
            }
            Some(MetricsEndpointSpec {
                http: Some(self.metrics_http.to_spec()),
                service_ref: None,
                port: None,
                path: String::new(),
            })
        }
    }
}

impl ResourceForm for PipelineForm {
    type Spec = PipelineSpec;

    const KIND: ResourceKind = ResourceKind::Pipeline;

    fn from_dto(dto: &Resource<PipelineSpec>) -> Self {
        let spec = &dto.spec;
        let metrics = spec.metrics_endpoint.clone().unwrap_or_default();
        let enable_cost_calculation = spec.enable_cost_calculation.unwrap_or(false);
        Self {
            metadata: dto.metadata.clone(),
            endpoints: spec
                .pipeline_endpoints
                .iter()
                .map(|e| PipelineEndpointForm {
                    id: new_row_id(),
                    name: e.name.clone(),
                    http: e.http.as_ref().map(HttpForm::from_spec).unwrap_or_default(),
                })
                .collect(),
            health_check_urls: spec.health_check_urls.clone(),
            enable_cost_calculation,
            cloud_provider: spec.cloud_provider.clone().unwrap_or_default(),
            tags: KeyValue::from_map(&spec.tags),
            in_cluster: spec.in_cluster.unwrap_or(metrics.service_ref.is_some()),
            metrics_service: metrics.service_ref.clone().unwrap_or_default(),
            metrics_port: metrics.port.clone().unwrap_or_default(),
            metrics_path: metrics.path.clone(),
            metrics_http: metrics.http.as_ref().map(HttpForm::from_spec).unwrap_or_default(),
            extensions: Extensions::capture(dto),
        }
    }

    fn to_dto(&self) -> Resource<PipelineSpec> {
        let spec = PipelineSpec {
            pipeline_endpoints: self
                .endpoints
                .iter()
                .map(|e| PipelineEndpointSpec {
                    name: e.name.clone(),
                    http: Some(e.http.to_spec()),
                })
                .collect(),
            health_check_urls: self
                .health_check_urls
                .iter()
                .filter(|u| !u.is_empty())
                .cloned()
                .collect(),
            enable_cost_calculation: Some(self.enable_cost_calculation),
            cloud_provider: if self.enable_cost_calculation {
                non_empty(&self.cloud_provider)
            } else {
                None
            },
            tags: KeyValue::to_map(&self.tags),
            in_cluster: Some(self.in_cluster),
            metrics_endpoint: self.metrics_endpoint(),
            extra: Map::new(),
        };
        self.extensions.assemble(&self.metadata, spec)
    }

    fn default_form() -> Self {
        Self {
            metadata: Metadata::namespaced("default", ""),
            endpoints: vec![PipelineEndpointForm {
                id: new_row_id(),
                name: String::new(),
                http: HttpForm {
                    url: String::new(),
                    method: "POST".to_string(),
                    headers: Vec::new(),
                },
            }],
            in_cluster: true,
            metrics_path: "/metrics".to_string(),
            metrics_http: HttpForm {
                method: "GET".to_string(),
                ..Default::default()
            },
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
        if self.endpoints.is_empty() {
            errors.push(FieldError::new("endpoints", "at least one endpoint is required"));
        }
        for (i, endpoint) in self.endpoints.iter().enumerate() {
            if endpoint.name.is_empty() {
                errors.push(FieldError::new(format!("endpoints[{}].name", i), "is required"));
            }
            if endpoint.http.url.is_empty() {
                errors.push(FieldError::new(format!("endpoints[{}].http.url", i), "is required"));
            }
        }
        if self.in_cluster {
            crate::convert::require_ref("metricsService", &self.metrics_service, &mut errors);
        } else if self.metrics_http.url.is_empty() {
            errors.push(FieldError::new("metricsHttp.url", "is required"));
        }
        if self.enable_cost_calculation && self.cloud_provider.is_empty() {
            errors.push(FieldError::new("cloudProvider", "is required"));
        }
        errors
    }
}
