//! Output artifacts declared for provisioning.
use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::Serialize;

/// Content type tag handed to the provisioning collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MetaType {
    #[serde(rename = "text/plain")]
    Text,
    #[serde(rename = "application/tar-gzip")]
    TarGz,
    #[serde(rename = "text/vcf")]
    Vcf,
    #[serde(rename = "text/varscan-copynumber")]
    CopyNumber,
}

impl MetaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetaType::Text => "text/plain",
            MetaType::TarGz => "application/tar-gzip",
            MetaType::Vcf => "text/vcf",
            MetaType::CopyNumber => "text/varscan-copynumber",
        }
    }

    /// Call files are VCF when VarScan runs with `--output-vcf 1`.
    pub fn calls(vcf: bool) -> Self {
        if vcf {
            MetaType::Vcf
        } else {
            MetaType::Text
        }
    }
}

impl fmt::Display for MetaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text/plain" => Ok(MetaType::Text),
            "application/tar-gzip" => Ok(MetaType::TarGz),
            "text/vcf" => Ok(MetaType::Vcf),
            "text/varscan-copynumber" => Ok(MetaType::CopyNumber),
            _ => Err(format!("Unknown metatype: {s}")),
        }
    }
}

/// Human-readable key/value pair attached to a provisioned file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation {
    pub key: String,
    pub value: String,
}

impl Annotation {
    pub fn new<K, V>(key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A file a job produces that should be staged out of the working area.
///
/// `source` is where the job writes it, `destination` is where provisioning
/// copies it to. Bindings are descriptive only, nothing here touches disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputBinding {
    source: PathBuf,
    destination: PathBuf,
    meta_type: MetaType,
    annotation: Annotation,
    manual: bool,
}

impl OutputBinding {
    pub fn new<P, Q>(
        source: P,
        out_dir: Q,
        meta_type: MetaType,
        annotation: Annotation,
        manual: bool,
    ) -> Self
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let source = source.as_ref().to_path_buf();
        let destination = match source.file_name() {
            Some(name) => out_dir.as_ref().join(name),
            None => out_dir.as_ref().to_path_buf(),
        };
        Self {
            source,
            destination,
            meta_type,
            annotation,
            manual,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn meta_type(&self) -> MetaType {
        self.meta_type
    }

    pub fn annotation(&self) -> &Annotation {
        &self.annotation
    }

    /// Whether the output is only provisioned on explicit request.
    pub fn is_manual(&self) -> bool {
        self.manual
    }
}

/// Creates bindings that share the output directory and visibility flag.
#[derive(Debug, Clone)]
pub struct OutputBinder {
    out_dir: PathBuf,
    manual: bool,
}

impl OutputBinder {
    pub fn new<P: AsRef<Path>>(out_dir: P, manual: bool) -> Self {
        Self {
            out_dir: out_dir.as_ref().to_path_buf(),
            manual,
        }
    }

    pub fn bind<P: AsRef<Path>>(
        &self,
        source: P,
        meta_type: MetaType,
        annotation: Annotation,
    ) -> OutputBinding {
        OutputBinding::new(source, &self.out_dir, meta_type, annotation, self.manual)
    }
}

pub mod annotations {
    use super::Annotation;

    pub fn snps() -> Annotation {
        Annotation::new("SNPs from VarScan2", "Varscan_SNPS")
    }

    pub fn indels() -> Annotation {
        Annotation::new("Indels from VarScan2", "Varscan_Indels")
    }

    pub fn germline() -> Annotation {
        Annotation::new("Germline calls from VarScan2", "Varscan_Germline")
    }

    pub fn copy_number() -> Annotation {
        Annotation::new("CNA from VarScan2", "Varscan_CNA")
    }

    pub fn copy_calls() -> Annotation {
        Annotation::new("CNV calls from VarScan2", "Varscan_copy_number_calls")
    }
}
