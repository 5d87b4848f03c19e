//! Declared input alignments.
use std::path::{Path, PathBuf};

use crate::{
    config::{keys, PipelineConfig},
    error::{Result, SampleRole, WorkflowError},
};

pub const BAM_METATYPE: &str = "application/bam";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSample {
    role: SampleRole,
    path: PathBuf,
    content_type: &'static str,
}

impl InputSample {
    fn bam(role: SampleRole, path: &Path) -> Self {
        Self {
            role,
            path: path.to_path_buf(),
            content_type: BAM_METATYPE,
        }
    }

    pub fn role(&self) -> SampleRole {
        self.role
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content_type(&self) -> &str {
        self.content_type
    }
}

/// The declared samples. A missing normal is a valid state and selects the
/// single-sample graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inputs {
    tumor: InputSample,
    normal: Option<InputSample>,
}

impl Inputs {
    pub fn tumor(&self) -> &InputSample {
        &self.tumor
    }

    pub fn normal(&self) -> Option<&InputSample> {
        self.normal.as_ref()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InputSample> {
        std::iter::once(&self.tumor).chain(self.normal.iter())
    }
}

/// Declare the tumor input, and the normal input if one was configured.
///
/// Nothing is checked on disk here, provisioning owns that.
pub fn declare_inputs(config: &PipelineConfig) -> Result<Inputs> {
    let tumor = config
        .tumor_bam
        .as_deref()
        .ok_or_else(|| WorkflowError::MissingRequiredInput {
            role: SampleRole::Tumor,
            key: keys::TUMOR_BAM.to_string(),
        })?;
    let inputs = Inputs {
        tumor: InputSample::bam(SampleRole::Tumor, tumor),
        normal: config
            .normal_bam
            .as_deref()
            .map(|p| InputSample::bam(SampleRole::Normal, p)),
    };
    for sample in inputs.iter() {
        log::debug!("Declared {} input {}", sample.role(), sample.path().display());
    }
    Ok(inputs)
}
