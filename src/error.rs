use std::fmt;

use thiserror::Error;

/// Role a declared input plays in the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleRole {
    Tumor,
    Normal,
}

impl SampleRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleRole::Tumor => "tumor",
            SampleRole::Normal => "normal",
        }
    }
}

impl fmt::Display for SampleRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorkflowError {
    #[error("Missing required configuration key `{0}`")]
    MissingConfiguration(String),
    #[error("Invalid value {value:?} for configuration key `{key}`")]
    InvalidConfigurationValue { key: String, value: String },
    #[error("Missing required {role} input, set `{key}`")]
    MissingRequiredInput { role: SampleRole, key: String },
    #[error("Cannot add job `{job}`: {reason}")]
    GraphConstruction { job: String, reason: String },
}

impl WorkflowError {
    pub(crate) fn invalid<K, V>(key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        WorkflowError::InvalidConfigurationValue {
            key: key.into(),
            value: value.into(),
        }
    }

    pub(crate) fn graph<J, R>(job: J, reason: R) -> Self
    where
        J: Into<String>,
        R: Into<String>,
    {
        WorkflowError::GraphConstruction {
            job: job.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = WorkflowError> = std::result::Result<T, E>;
