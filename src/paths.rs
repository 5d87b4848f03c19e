//! Every filename a workflow reads or writes, derived once from the output
//! prefix and the working directory.
use std::path::{Path, PathBuf};

use crate::{config::PipelineConfig, error::SampleRole};

pub const MPILEUP: &str = ".mpileup";
pub const SOMATIC: &str = ".varscanSomatic";
pub const GERMLINE: &str = ".varscanGermline";
pub const COPY_NUMBER: &str = ".VarScan.CopyNumber";
pub const COPY_CALLER: &str = ".VarScan.CopyCaller";

/// Extensions VarScan adds to a somatic output basename.
pub const SNP_EXT: &str = ".snp";
pub const INDEL_EXT: &str = ".indel";
pub const COPY_NUMBER_EXT: &str = ".copynumber";
pub const VCF_EXT: &str = ".vcf";
/// Suffix `processSomatic` gives its high-confidence somatic calls.
pub const HIGH_CONFIDENCE_EXT: &str = ".Somatic.hc";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkPaths {
    tmp_dir: PathBuf,
    prefix: String,
    out_dir: PathBuf,
    vcf: bool,
}

impl WorkPaths {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            tmp_dir: config.tmp_dir.clone(),
            prefix: config.output_prefix.clone(),
            out_dir: config.output_dir(),
            vcf: config.output_vcf,
        }
    }

    fn tmp(&self, suffix: &str) -> PathBuf {
        self.tmp_dir.join(format!("{}{suffix}", self.prefix))
    }

    fn call_file(&self, base: &str, ext: &str) -> PathBuf {
        if self.vcf {
            self.tmp(&format!("{base}{ext}{VCF_EXT}"))
        } else {
            self.tmp(&format!("{base}{ext}"))
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn pileup(&self, role: SampleRole) -> PathBuf {
        self.tmp(&format!(".{role}{MPILEUP}"))
    }

    /// Pileup over normal and tumor together, legacy layout only.
    pub fn combined_pileup(&self) -> PathBuf {
        self.tmp(MPILEUP)
    }

    /// Basename passed to `varscan somatic`, which appends `.snp`/`.indel`.
    pub fn somatic_base(&self) -> PathBuf {
        self.tmp(SOMATIC)
    }

    pub fn somatic_snp(&self) -> PathBuf {
        self.call_file(SOMATIC, SNP_EXT)
    }

    pub fn somatic_indel(&self) -> PathBuf {
        self.call_file(SOMATIC, INDEL_EXT)
    }

    pub fn germline(&self) -> PathBuf {
        self.call_file(GERMLINE, "")
    }

    /// File `processSomatic` writes its high-confidence calls to. A `.vcf`
    /// input keeps its extension last: `x.vcf` becomes `x.Somatic.hc.vcf`.
    pub fn high_confidence(&self, calls: &Path) -> PathBuf {
        let is_vcf = calls.extension().map_or(false, |ext| ext == &VCF_EXT[1..]);
        let base = if is_vcf {
            calls.with_extension("")
        } else {
            calls.to_path_buf()
        };
        let mut name = base.into_os_string();
        name.push(HIGH_CONFIDENCE_EXT);
        if is_vcf {
            name.push(VCF_EXT);
        }
        PathBuf::from(name)
    }

    /// Basename passed to `varscan copynumber`, which appends `.copynumber`.
    pub fn copy_number_base(&self) -> PathBuf {
        self.tmp(COPY_NUMBER)
    }

    pub fn copy_number(&self) -> PathBuf {
        self.tmp(&format!("{COPY_NUMBER}{COPY_NUMBER_EXT}"))
    }

    pub fn copy_calls(&self) -> PathBuf {
        self.tmp(COPY_CALLER)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::{keys, resolve_config, test::base_properties};

    #[test]
    fn test_suffixes() {
        let config = resolve_config(&base_properties()).unwrap();
        let paths = WorkPaths::new(&config);
        assert_eq!(paths.out_dir(), Path::new("PCSI_0001_output"));
        assert_eq!(
            paths.pileup(SampleRole::Normal),
            Path::new("tmp/PCSI_0001.normal.mpileup")
        );
        assert_eq!(paths.combined_pileup(), Path::new("tmp/PCSI_0001.mpileup"));
        assert_eq!(
            paths.somatic_snp(),
            Path::new("tmp/PCSI_0001.varscanSomatic.snp")
        );
        assert_eq!(
            paths.high_confidence(&paths.somatic_indel()),
            Path::new("tmp/PCSI_0001.varscanSomatic.indel.Somatic.hc")
        );
        assert_eq!(
            paths.copy_number(),
            Path::new("tmp/PCSI_0001.VarScan.CopyNumber.copynumber")
        );
        assert_eq!(paths.copy_calls(), Path::new("tmp/PCSI_0001.VarScan.CopyCaller"));
        assert_eq!(paths.germline(), Path::new("tmp/PCSI_0001.varscanGermline"));
    }

    #[test]
    fn test_vcf_suffixes() {
        let mut props = base_properties();
        props.set(keys::OUTPUT_VCF, "true");
        let paths = WorkPaths::new(&resolve_config(&props).unwrap());
        assert_eq!(
            paths.somatic_snp(),
            Path::new("tmp/PCSI_0001.varscanSomatic.snp.vcf")
        );
        assert_eq!(
            paths.germline(),
            Path::new("tmp/PCSI_0001.varscanGermline.vcf")
        );
        assert_eq!(paths.somatic_base(), Path::new("tmp/PCSI_0001.varscanSomatic"));
        assert_eq!(
            paths.high_confidence(&paths.somatic_snp()),
            Path::new("tmp/PCSI_0001.varscanSomatic.snp.Somatic.hc.vcf")
        );
    }
}
