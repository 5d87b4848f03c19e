//! Typed workflow parameters resolved from a key/value property source.
//!
//! Keys follow the names used in a SeqWare `workflow.ini`. Required keys
//! fail resolution when absent or empty, optional keys fall back to the
//! defaults in [`defaults`].
use std::{
    fmt,
    fs::File,
    io::{BufRead, BufReader, Read},
    path::{Path, PathBuf},
    str::FromStr,
};

use fnv::FnvHashMap;

use crate::error::{Result, WorkflowError};

pub mod keys {
    pub const TUMOR_BAM: &str = "input_files_tumor";
    pub const NORMAL_BAM: &str = "input_files_normal";
    pub const OUTPUT_PREFIX: &str = "external_name";
    pub const TMP_DIR: &str = "tmp_dir";
    pub const SAMTOOLS: &str = "samtools";
    pub const JAVA: &str = "java";
    pub const VARSCAN: &str = "varscan";
    pub const JAVA_MEM: &str = "java_mem";
    pub const REF_FASTA: &str = "ref_fasta";
    pub const INTERVAL_BED: &str = "interval_bed";
    pub const VARSCAN_MEM: &str = "varscan_mem";
    pub const MIN_VAR_FREQ: &str = "minimum_variant_freq";
    pub const MIN_COVERAGE_TUMOR: &str = "min_coverage_tumor";
    pub const MIN_COVERAGE_NORMAL: &str = "min_coverage_normal";
    pub const MIN_COVERAGE: &str = "min_coverage";
    pub const MIN_BASE_QUAL: &str = "min_base_qual";
    pub const MIN_MAP_QUAL: &str = "min_map_qual";
    pub const MANUAL_OUTPUT: &str = "manual_output";
    pub const OUTPUT_VCF: &str = "output_vcf";
    pub const QUEUE: &str = "queue";
    pub const WORKFLOW_MODE: &str = "workflow_mode";
}

pub mod defaults {
    pub const TMP_DIR: &str = "tmp";
    pub const JAVA_MEM: &str = "-Xmx8g";
    pub const MIN_COVERAGE_NORMAL: u32 = 8;
    pub const MIN_COVERAGE: u32 = 20;
    pub const MIN_BASE_QUAL: u32 = 20;
    pub const MIN_MAP_QUAL: u32 = 20;
    pub const QUEUE: &str = "";
}

/// Anything that can answer "what is the value of this key".
pub trait ConfigSource {
    fn get(&self, key: &str) -> Option<&str>;

    /// Value of a required key, empty values count as missing.
    fn required(&self, key: &str) -> Result<&str> {
        match self.get(key) {
            Some(v) if !v.trim().is_empty() => Ok(v.trim()),
            _ => Err(WorkflowError::MissingConfiguration(key.to_string())),
        }
    }

    fn optional<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).map(str::trim).unwrap_or(default)
    }

    /// Like [`ConfigSource::optional`] but treats empty values as absent.
    fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|v| !v.is_empty())
    }
}

/// Flat `key=value` property set, as found in a SeqWare ini file.
#[derive(Debug, Default, Clone)]
pub struct Properties(FnvHashMap<String, String>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_path<P>(path: P) -> std::io::Result<Self>
    where
        P: AsRef<Path>,
    {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Parse `key=value` lines. Blank lines and lines starting with `#` are
    /// skipped, later definitions override earlier ones.
    pub fn from_reader<R: Read>(reader: R) -> std::io::Result<Self> {
        let mut props = Properties::new();
        for line in BufReader::new(reader).lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match line.split_once('=') {
                Some((key, value)) => props.set(key.trim(), value.trim()),
                None => log::warn!("Ignoring property line without '=': {line}"),
            }
        }
        Ok(props)
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl ConfigSource for Properties {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

impl<K, V> FromIterator<(K, V)> for Properties
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut props = Properties::new();
        for (k, v) in iter {
            props.set(k, v);
        }
        props
    }
}

/// Which of the two historical graph layouts to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkflowMode {
    /// Per-sample pileups, paired or single-sample depending on the normal.
    #[default]
    Standard,
    /// One combined pileup over normal and tumor, fanning out from a single
    /// somatic call.
    Legacy,
}

impl FromStr for WorkflowMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(WorkflowMode::Standard),
            "legacy" => Ok(WorkflowMode::Legacy),
            _ => Err(format!("Invalid workflow mode: {s}")),
        }
    }
}

impl fmt::Display for WorkflowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowMode::Standard => write!(f, "standard"),
            WorkflowMode::Legacy => write!(f, "legacy"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds {
    pub min_var_freq: f64,
    pub min_coverage_tumor: u32,
    pub min_coverage_normal: u32,
    pub min_coverage: u32,
    pub min_base_qual: u32,
    pub min_map_qual: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tools {
    pub samtools: PathBuf,
    pub java: PathBuf,
    pub varscan: PathBuf,
    pub java_mem: String,
}

/// Resolved, read-only workflow parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub tumor_bam: Option<PathBuf>,
    pub normal_bam: Option<PathBuf>,
    pub output_prefix: String,
    pub tmp_dir: PathBuf,
    pub tools: Tools,
    pub ref_fasta: PathBuf,
    pub interval_bed: Option<PathBuf>,
    pub thresholds: Thresholds,
    pub varscan_mem_gb: u32,
    pub queue: String,
    pub manual_output: bool,
    pub output_vcf: bool,
    pub mode: WorkflowMode,
}

impl PipelineConfig {
    /// Memory handed to every job, in megabytes.
    ///
    /// `resolve_config` rejects sizes that do not fit in megabytes.
    pub fn memory_mb(&self) -> u32 {
        self.varscan_mem_gb.saturating_mul(1024)
    }

    /// Directory final artifacts are provisioned into.
    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(format!("{}_output", self.output_prefix))
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse::<T>()
        .map_err(|_| WorkflowError::invalid(key, value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(WorkflowError::invalid(key, value)),
    }
}

fn required_parsed<C, T>(source: &C, key: &str) -> Result<T>
where
    C: ConfigSource + ?Sized,
    T: FromStr,
{
    parse_value(key, source.required(key)?)
}

fn optional_parsed<C, T>(source: &C, key: &str, default: T) -> Result<T>
where
    C: ConfigSource + ?Sized,
    T: FromStr,
{
    match source.non_empty(key) {
        Some(v) => parse_value(key, v),
        None => Ok(default),
    }
}

/// Resolve every workflow parameter from `source`.
///
/// Required keys are checked in a fixed order so the reported key is always
/// the first one missing.
pub fn resolve_config<C>(source: &C) -> Result<PipelineConfig>
where
    C: ConfigSource + ?Sized,
{
    use keys::*;

    let output_prefix = source.required(OUTPUT_PREFIX)?.to_string();
    let samtools = PathBuf::from(source.required(SAMTOOLS)?);
    let java = PathBuf::from(source.required(JAVA)?);
    let varscan = PathBuf::from(source.required(VARSCAN)?);
    let ref_fasta = PathBuf::from(source.required(REF_FASTA)?);
    let varscan_mem_gb: u32 = required_parsed(source, VARSCAN_MEM)?;
    if varscan_mem_gb.checked_mul(1024).is_none() {
        return Err(WorkflowError::invalid(VARSCAN_MEM, source.required(VARSCAN_MEM)?));
    }
    let min_var_freq: f64 = required_parsed(source, MIN_VAR_FREQ)?;
    if !(0.0..=1.0).contains(&min_var_freq) {
        return Err(WorkflowError::invalid(MIN_VAR_FREQ, source.required(MIN_VAR_FREQ)?));
    }
    let min_coverage_tumor: u32 = required_parsed(source, MIN_COVERAGE_TUMOR)?;
    let manual_output = parse_bool(MANUAL_OUTPUT, source.required(MANUAL_OUTPUT)?)?;

    let thresholds = Thresholds {
        min_var_freq,
        min_coverage_tumor,
        min_coverage_normal: optional_parsed(
            source,
            MIN_COVERAGE_NORMAL,
            defaults::MIN_COVERAGE_NORMAL,
        )?,
        min_coverage: optional_parsed(source, MIN_COVERAGE, defaults::MIN_COVERAGE)?,
        min_base_qual: optional_parsed(source, MIN_BASE_QUAL, defaults::MIN_BASE_QUAL)?,
        min_map_qual: optional_parsed(source, MIN_MAP_QUAL, defaults::MIN_MAP_QUAL)?,
    };

    let output_vcf = match source.non_empty(OUTPUT_VCF) {
        Some(v) => parse_bool(OUTPUT_VCF, v)?,
        None => false,
    };
    let mode = match source.non_empty(WORKFLOW_MODE) {
        Some(v) => v
            .parse::<WorkflowMode>()
            .map_err(|_| WorkflowError::invalid(WORKFLOW_MODE, v))?,
        None => WorkflowMode::default(),
    };

    let config = PipelineConfig {
        tumor_bam: source.non_empty(TUMOR_BAM).map(PathBuf::from),
        normal_bam: source.non_empty(NORMAL_BAM).map(PathBuf::from),
        output_prefix,
        tmp_dir: PathBuf::from(source.non_empty(TMP_DIR).unwrap_or(defaults::TMP_DIR)),
        tools: Tools {
            samtools,
            java,
            varscan,
            java_mem: source.optional(JAVA_MEM, defaults::JAVA_MEM).to_string(),
        },
        ref_fasta,
        interval_bed: source.non_empty(INTERVAL_BED).map(PathBuf::from),
        thresholds,
        varscan_mem_gb,
        queue: source.optional(QUEUE, defaults::QUEUE).to_string(),
        manual_output,
        output_vcf,
        mode,
    };
    log::debug!("Resolved configuration: {config:?}");
    Ok(config)
}
