use crate::convert::{new_row_id, non_empty, FieldError, MinMax, ResourceForm};
use crate::extension::{Extensions, SpecFields};
use crate::resource::{Metadata, Resource, ResourceKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSetSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file_format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compressed_file_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compress_per_schema: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_files: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel_jobs: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schemas: Vec<DataSetSchemaSpec>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SpecFields for DataSetSpec {
    const FIELDS: &'static [&'static str] = &[
        "fileFormat",
        "compressedFileFormat",
        "compressPerSchema",
        "numberOfFiles",
        "parallelJobs",
        "schemas",
    ];

    fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    fn extra_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.extra
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSetSchemaSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_records: Option<MinMax>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_files_per_compressed_file: Option<MinMax>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSetSchemaForm {
    #[serde(default = "new_row_id")]
    pub id: String,
    pub name: String,
    pub num_records: MinMax,
    pub num_files_per_compressed_file: MinMax,
}

impl DataSetSchemaForm {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_row_id(),
            name: name.into(),
            num_records: MinMax::new(1, 1),
            num_files_per_compressed_file: MinMax::new(1, 1),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSetForm {
    pub metadata: Metadata,
    pub file_format: String,
    pub use_compression: bool,
    pub compressed_file_format: String,
    pub compress_per_schema: bool,
    pub number_of_files: u32,
    pub parallel_jobs: u32,
    pub schemas: Vec<DataSetSchemaForm>,
    #[serde(skip_serializing_if = "Extensions::is_empty")]
    pub extensions: Extensions,
}

impl ResourceForm for DataSetForm {
    type Spec = DataSetSpec;

    const KIND: ResourceKind = ResourceKind::DataSet;

    fn from_dto(dto: &Resource<DataSetSpec>) -> Self {
        let spec = &dto.spec;
        let compressed_file_format = spec.compressed_file_format.clone().unwrap_or_default();
        Self {
            metadata: dto.metadata.clone(),
            file_format: spec.file_format.clone(),
            use_compression: !compressed_file_format.is_empty(),
            compressed_file_format,
            compress_per_schema: spec.compress_per_schema.unwrap_or(false),
            number_of_files: spec.number_of_files.unwrap_or(0),
            parallel_jobs: spec.parallel_jobs.unwrap_or(0),
            schemas: spec
                .schemas
                .iter()
                .map(|s| DataSetSchemaForm {
                    id: new_row_id(),
                    name: s.name.clone(),
                    num_records: s.num_records.unwrap_or_default(),
                    num_files_per_compressed_file: s
                        .num_files_per_compressed_file
                        .unwrap_or_default(),
                })
                .collect(),
            extensions: Extensions::capture(dto),
        }
    }

    fn to_dto(&self) -> Resource<DataSetSpec> {
        let compress = self.use_compression;
        let spec = DataSetSpec {
            file_format: self.file_format.clone(),
            compressed_file_format: if compress {
                non_empty(&self.compressed_file_format)
            } else {
                None
            },
            compress_per_schema: compress.then_some(self.compress_per_schema),
            number_of_files: Some(self.number_of_files),
            parallel_jobs: Some(self.parallel_jobs),
            schemas: self
                .schemas
                .iter()
                .map(|s| DataSetSchemaSpec {
                    name: s.name.clone(),
                    num_records: Some(s.num_records),
                    num_files_per_compressed_file: compress
                        .then_some(s.num_files_per_compressed_file),
                })
                .collect(),
            extra: Map::new(),
        };
        self.extensions.assemble(&self.metadata, spec)
    }

    fn default_form() -> Self {
        Self {
            metadata: Metadata::namespaced("default", ""),
            file_format: "csv".to_string(),
            use_compression: false,
            compressed_file_format: String::new(),
            compress_per_schema: false,
            number_of_files: 1,
            parallel_jobs: 1,
            schemas: Vec::new(),
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
        if self.file_format.is_empty() {
            errors.push(FieldError::new("fileFormat", "is required"));
        }
        if self.use_compression && self.compressed_file_format.is_empty() {
            errors.push(FieldError::new("compressedFileFormat", "is required"));
        }
        if self.number_of_files == 0 {
            errors.push(FieldError::new("numberOfFiles", "must be at least 1"));
        }
        for (i, schema) in self.schemas.iter().enumerate() {
            if schema.name.is_empty() {
                errors.push(FieldError::new(format!("schemas[{}].name", i), "is required"));
            }
            if !schema.num_records.is_ordered() {
                errors.push(FieldError::new(
                    format!("schemas[{}].numRecords", i),
                    "min must not exceed max",
                ));
            }
            if self.use_compression && !schema.num_files_per_compressed_file.is_ordered() {
                errors.push(FieldError::new(
                    format!("schemas[{}].numFilesPerCompressedFile", i),
                    "min must not exceed max",
                ));
            }
        }
        errors
    }
}
