use crate::convert::{FieldError, ResourceForm};
use crate::extension::{Extensions, SpecFields};
use crate::resource::{Metadata, Resource, ResourceKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const CLOUD_PROVIDERS: [&str; 3] = ["aws", "azure", "gcp"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostExporterSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub s3_bucket: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cloud_service_provider: String,
    /// Provider credentials and options, stored as text
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub config: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SpecFields for CostExporterSpec {
    const FIELDS: &'static [&'static str] = &["s3Bucket", "cloudServiceProvider", "config"];

    fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    fn extra_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.extra
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostExporterForm {
    pub metadata: Metadata,
    pub s3_bucket: String,
    pub cloud_service_provider: String,
    pub config: String,
    #[serde(skip_serializing_if = "Extensions::is_empty")]
    pub extensions: Extensions,
}

impl ResourceForm for CostExporterForm {
    type Spec = CostExporterSpec;

    const KIND: ResourceKind = ResourceKind::CostExporter;

    fn from_dto(dto: &Resource<CostExporterSpec>) -> Self {
        Self {
            metadata: dto.metadata.clone(),
            s3_bucket: dto.spec.s3_bucket.clone(),
            cloud_service_provider: dto.spec.cloud_service_provider.clone(),
            config: dto.spec.config.clone(),
            extensions: Extensions::capture(dto),
        }
    }

    fn to_dto(&self) -> Resource<CostExporterSpec> {
        let spec = CostExporterSpec {
            s3_bucket: self.s3_bucket.clone(),
            cloud_service_provider: self.cloud_service_provider.clone(),
            config: self.config.clone(),
            extra: Map::new(),
        };
        self.extensions.assemble(&self.metadata, spec)
    }

    fn default_form() -> Self {
        Self {
            metadata: Metadata::namespaced("default", ""),
            cloud_service_provider: CLOUD_PROVIDERS[0].to_string(),
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
        if self.s3_bucket.is_empty() {
            errors.push(FieldError::new("s3Bucket", "is required"));
        }
        if !CLOUD_PROVIDERS.contains(&self.cloud_service_provider.as_str()) {
            errors.push(FieldError::new(
                "cloudServiceProvider",
                format!("must be one of {}", CLOUD_PROVIDERS.join(", ")),
            ));
        }
        errors
    }
}
