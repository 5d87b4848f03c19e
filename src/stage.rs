//! Builds one [`StageJob`] per samtools/VarScan invocation.
//!
//! Argument order follows each tool's command line grammar exactly since the
//! execution engine hands the list to a shell as is.
use std::{ffi::OsStr, path::Path};

use crate::{
    config::PipelineConfig,
    error::SampleRole,
    graph::{Resources, StageJob},
    inputs::InputSample,
    paths::WorkPaths,
};

/// `samtools mpileup -q` floor, drops only unmapped/ambiguous reads.
pub const PILEUP_MIN_MAPQ: u32 = 1;
/// `samtools mpileup -d`, high enough to never cap tumor depth.
pub const PILEUP_MAX_DEPTH: u32 = 1_000_000;

pub mod names {
    pub const MPILEUP: &str = "mpileup";
    pub const MPILEUP_TUMOR: &str = "mpileup_tumor";
    pub const MPILEUP_NORMAL: &str = "mpileup_normal";
    pub const SOMATIC: &str = "varscan_somatic";
    pub const SOMATIC_LEGACY: &str = "somatic_pileup";
    pub const GERMLINE: &str = "varscan_germline";
    pub const SNPS: &str = "varscan_snps";
    pub const INDELS: &str = "varscan_indels";
    pub const COPY_NUMBER: &str = "varscan_cna";
    pub const COPY_CALLER: &str = "varscan_cna_call";
}

/// Ordered argument list, built the way a `std::process::Command` would be.
#[derive(Debug, Default)]
struct CommandLine(Vec<String>);

impl CommandLine {
    fn new<S: AsRef<OsStr>>(program: S) -> Self {
        let mut cmd = CommandLine::default();
        cmd.arg(program);
        cmd
    }

    fn arg<S: AsRef<OsStr>>(&mut self, arg: S) -> &mut Self {
        self.0.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self.arg(arg);
        }
        self
    }

    /// `flag value`, value rendered with `Display`.
    fn opt<T: ToString>(&mut self, flag: &str, value: T) -> &mut Self {
        self.arg(flag).arg(value.to_string())
    }

    fn stdout<P: AsRef<Path>>(&mut self, path: P) -> &mut Self {
        self.arg(">").arg(path.as_ref())
    }

    fn finish(&mut self) -> Vec<String> {
        std::mem::take(&mut self.0)
    }
}

pub struct StageFactory<'a> {
    config: &'a PipelineConfig,
    paths: &'a WorkPaths,
}

impl<'a> StageFactory<'a> {
    pub fn new(config: &'a PipelineConfig, paths: &'a WorkPaths) -> Self {
        Self { config, paths }
    }

    /// Same memory and queue for every stage.
    fn resources(&self) -> Resources {
        Resources {
            memory_mb: self.config.memory_mb(),
            queue: self.config.queue.clone(),
        }
    }

    fn job(&self, name: &str, mut cmd: CommandLine) -> StageJob {
        StageJob::new(name, cmd.finish(), self.resources())
    }

    fn samtools_mpileup<'b, I>(&self, bams: I, output: &Path) -> CommandLine
    where
        I: IntoIterator<Item = &'b Path>,
    {
        let mut cmd = CommandLine::new(&self.config.tools.samtools);
        cmd.arg("mpileup")
            .opt("-q", PILEUP_MIN_MAPQ)
            .arg("-f")
            .arg(&self.config.ref_fasta);
        if let Some(bed) = &self.config.interval_bed {
            cmd.arg("-l").arg(bed);
        }
        cmd.arg("-B").opt("-d", PILEUP_MAX_DEPTH).args(bams).stdout(output);
        cmd
    }

    fn varscan(&self, subcommand: &str) -> CommandLine {
        let tools = &self.config.tools;
        let mut cmd = CommandLine::new(&tools.java);
        if !tools.java_mem.is_empty() {
            cmd.arg(&tools.java_mem);
        }
        cmd.arg("-jar")
            .arg(&tools.varscan)
            .arg(subcommand);
        cmd
    }

    fn output_vcf(&self, cmd: &mut CommandLine) {
        if self.config.output_vcf {
            cmd.opt("--output-vcf", 1);
        }
    }

    /// Pileup of a single sample.
    pub fn pileup(&self, sample: &InputSample) -> StageJob {
        let name = match sample.role() {
            SampleRole::Tumor => names::MPILEUP_TUMOR,
            SampleRole::Normal => names::MPILEUP_NORMAL,
        };
        let output = self.paths.pileup(sample.role());
        self.job(name, self.samtools_mpileup([sample.path()], &output))
    }

    /// One pileup with the normal columns first, then the tumor.
    pub fn combined_pileup(&self, normal: &InputSample, tumor: &InputSample) -> StageJob {
        let output = self.paths.combined_pileup();
        self.job(
            names::MPILEUP,
            self.samtools_mpileup([normal.path(), tumor.path()], &output),
        )
    }

    fn somatic_thresholds(&self, cmd: &mut CommandLine) {
        let t = &self.config.thresholds;
        cmd.opt("--min-coverage-normal", t.min_coverage_normal)
            .opt("--min-coverage-tumor", t.min_coverage_tumor)
            .opt("--min-var-freq", t.min_var_freq);
        self.output_vcf(cmd);
    }

    /// `varscan somatic` over separate normal and tumor pileups.
    pub fn somatic(&self) -> StageJob {
        let mut cmd = self.varscan("somatic");
        cmd.arg(self.paths.pileup(SampleRole::Normal))
            .arg(self.paths.pileup(SampleRole::Tumor))
            .arg(self.paths.somatic_base());
        self.somatic_thresholds(&mut cmd);
        self.job(names::SOMATIC, cmd)
    }

    /// `varscan somatic` reading the combined pileup.
    pub fn legacy_somatic(&self) -> StageJob {
        let mut cmd = self.varscan("somatic");
        cmd.arg(self.paths.combined_pileup())
            .arg(self.paths.somatic_base())
            .opt("--mpileup", 1);
        self.somatic_thresholds(&mut cmd);
        self.job(names::SOMATIC_LEGACY, cmd)
    }

    /// Consensus calling on the tumor pileup alone.
    pub fn germline(&self) -> StageJob {
        let t = &self.config.thresholds;
        let mut cmd = self.varscan("mpileup2cns");
        cmd.arg(self.paths.pileup(SampleRole::Tumor))
            .opt("--min-coverage", t.min_coverage)
            .opt("--min-var-freq", t.min_var_freq)
            .opt("--variants", 1);
        self.output_vcf(&mut cmd);
        cmd.stdout(self.paths.germline());
        self.job(names::GERMLINE, cmd)
    }

    /// `processSomatic` on one somatic call file.
    pub fn process_somatic(&self, name: &str, calls: &Path) -> StageJob {
        let mut cmd = self.varscan("processSomatic");
        cmd.arg(calls);
        self.job(name, cmd)
    }

    fn copy_number_thresholds(&self, cmd: &mut CommandLine) {
        let t = &self.config.thresholds;
        cmd.opt("--min-base-qual", t.min_base_qual)
            .opt("--min-map-qual", t.min_map_qual)
            .opt("--min-coverage", t.min_coverage);
    }

    pub fn copy_number(&self) -> StageJob {
        let mut cmd = self.varscan("copynumber");
        cmd.arg(self.paths.pileup(SampleRole::Normal))
            .arg(self.paths.pileup(SampleRole::Tumor))
            .arg(self.paths.copy_number_base());
        self.copy_number_thresholds(&mut cmd);
        self.job(names::COPY_NUMBER, cmd)
    }

    pub fn legacy_copy_number(&self) -> StageJob {
        let mut cmd = self.varscan("copynumber");
        cmd.arg(self.paths.combined_pileup())
            .arg(self.paths.copy_number_base())
            .opt("--mpileup", 1);
        self.copy_number_thresholds(&mut cmd);
        self.job(names::COPY_NUMBER, cmd)
    }

    /// Smooth raw copy-number ratios into calls. The legacy layout keeps the
    /// trailing `--mpileup 1` it always passed.
    pub fn copy_caller(&self, legacy: bool) -> StageJob {
        let mut cmd = self.varscan("copyCaller");
        cmd.arg(self.paths.copy_number())
            .opt("--output-file", self.paths.copy_calls().display());
        if legacy {
            cmd.opt("--mpileup", 1);
        }
        self.job(names::COPY_CALLER, cmd)
    }
}
