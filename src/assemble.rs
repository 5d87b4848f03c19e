//! Chooses the graph layout and wires stage jobs into it.
use std::fmt;

use crate::{
    config::{keys, PipelineConfig, WorkflowMode},
    error::{Result, SampleRole, WorkflowError},
    graph::{PipelineGraph, StageJob},
    inputs::{InputSample, Inputs},
    paths::WorkPaths,
    provision::{annotations, MetaType, OutputBinder},
    stage::{names, StageFactory},
};

/// The one branching decision of the workflow, made once from the mode and
/// the declared inputs.
#[derive(Debug, Clone, Copy)]
pub enum Topology<'a> {
    /// Separate tumor and normal pileups feeding somatic calling and
    /// copy-number estimation.
    Paired {
        tumor: &'a InputSample,
        normal: &'a InputSample,
    },
    /// No matched normal: germline calling only. Copy-number needs a normal
    /// and is skipped.
    SingleSample { tumor: &'a InputSample },
    /// One pileup over both samples, a single somatic call fanning out to
    /// SNP, indel and copy-number processing.
    LegacyCombined {
        tumor: &'a InputSample,
        normal: &'a InputSample,
    },
}

impl<'a> Topology<'a> {
    pub fn select(mode: WorkflowMode, inputs: &'a Inputs) -> Result<Self> {
        let tumor = inputs.tumor();
        match (mode, inputs.normal()) {
            (WorkflowMode::Standard, Some(normal)) => Ok(Topology::Paired { tumor, normal }),
            (WorkflowMode::Standard, None) => Ok(Topology::SingleSample { tumor }),
            (WorkflowMode::Legacy, Some(normal)) => {
                Ok(Topology::LegacyCombined { tumor, normal })
            }
            (WorkflowMode::Legacy, None) => Err(WorkflowError::MissingRequiredInput {
                role: SampleRole::Normal,
                key: keys::NORMAL_BAM.to_string(),
            }),
        }
    }
}

impl fmt::Display for Topology<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topology::Paired { .. } => write!(f, "paired"),
            Topology::SingleSample { .. } => write!(f, "single-sample"),
            Topology::LegacyCombined { .. } => write!(f, "legacy combined"),
        }
    }
}

struct Assembler<'a> {
    factory: StageFactory<'a>,
    paths: &'a WorkPaths,
    binder: OutputBinder,
    vcf: bool,
    graph: PipelineGraph,
}

impl<'a> Assembler<'a> {
    fn paired(mut self, tumor: &InputSample, normal: &InputSample) -> Result<PipelineGraph> {
        let tumor_pileup = self.graph.add(self.factory.pileup(tumor), &[])?;
        let normal_pileup = self.graph.add(self.factory.pileup(normal), &[])?;
        let pileups = [tumor_pileup, normal_pileup];

        let calls = MetaType::calls(self.vcf);
        let somatic = self
            .factory
            .somatic()
            .with_output(self.binder.bind(self.paths.somatic_snp(), calls, annotations::snps()))
            .with_output(self.binder.bind(
                self.paths.somatic_indel(),
                calls,
                annotations::indels(),
            ));
        self.graph.add(somatic, &pileups)?;

        let copy_number = self.copy_number_job(false);
        let copy_number = self.graph.add(copy_number, &pileups)?;
        let copy_caller = self.copy_caller_job(false);
        self.graph.add(copy_caller, &[copy_number])?;
        Ok(self.graph)
    }

    fn single_sample(mut self, tumor: &InputSample) -> Result<PipelineGraph> {
        let tumor_pileup = self.graph.add(self.factory.pileup(tumor), &[])?;
        let germline = self.factory.germline().with_output(self.binder.bind(
            self.paths.germline(),
            MetaType::calls(self.vcf),
            annotations::germline(),
        ));
        self.graph.add(germline, &[tumor_pileup])?;
        Ok(self.graph)
    }

    fn legacy(mut self, tumor: &InputSample, normal: &InputSample) -> Result<PipelineGraph> {
        let pileup = self
            .graph
            .add(self.factory.combined_pileup(normal, tumor), &[])?;
        let somatic = self.graph.add(self.factory.legacy_somatic(), &[pileup])?;

        let indel_calls = self.paths.somatic_indel();
        let indels = self
            .factory
            .process_somatic(names::INDELS, &indel_calls)
            .with_output(self.binder.bind(
                self.paths.high_confidence(&indel_calls),
                MetaType::calls(self.vcf),
                annotations::indels(),
            ));
        self.graph.add(indels, &[somatic])?;

        let snp_calls = self.paths.somatic_snp();
        let snps = self
            .factory
            .process_somatic(names::SNPS, &snp_calls)
            .with_output(self.binder.bind(
                self.paths.high_confidence(&snp_calls),
                MetaType::calls(self.vcf),
                annotations::snps(),
            ));
        self.graph.add(snps, &[somatic])?;

        let copy_number = self.copy_number_job(true);
        let copy_number = self.graph.add(copy_number, &[somatic])?;
        let copy_caller = self.copy_caller_job(true);
        self.graph.add(copy_caller, &[copy_number])?;
        Ok(self.graph)
    }

    fn copy_number_job(&self, legacy: bool) -> StageJob {
        let job = if legacy {
            self.factory.legacy_copy_number()
        } else {
            self.factory.copy_number()
        };
        job.with_output(self.binder.bind(
            self.paths.copy_number(),
            MetaType::CopyNumber,
            annotations::copy_number(),
        ))
    }

    fn copy_caller_job(&self, legacy: bool) -> StageJob {
        self.factory.copy_caller(legacy).with_output(self.binder.bind(
            self.paths.copy_calls(),
            MetaType::CopyNumber,
            annotations::copy_calls(),
        ))
    }
}

/// Build the complete job graph for `config` and the declared `inputs`.
///
/// Nothing is returned unless every job was added, there is no partial graph.
pub fn assemble_graph(config: &PipelineConfig, inputs: &Inputs) -> Result<PipelineGraph> {
    let topology = Topology::select(config.mode, inputs)?;
    log::info!("Building {topology} VarScan2 workflow for {}", config.output_prefix);

    let paths = WorkPaths::new(config);
    let assembler = Assembler {
        factory: StageFactory::new(config, &paths),
        paths: &paths,
        binder: OutputBinder::new(paths.out_dir(), config.manual_output),
        vcf: config.output_vcf,
        graph: PipelineGraph::new(),
    };
    let graph = match topology {
        Topology::Paired { tumor, normal } => assembler.paired(tumor, normal)?,
        Topology::SingleSample { tumor } => assembler.single_sample(tumor)?,
        Topology::LegacyCombined { tumor, normal } => assembler.legacy(tumor, normal)?,
    };
    log::info!("Workflow has {} jobs", graph.len());
    Ok(graph)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        config::{resolve_config, test::base_properties},
        inputs::declare_inputs,
    };

    fn build(props: &crate::config::Properties) -> Result<PipelineGraph> {
        let config = resolve_config(props)?;
        let inputs = declare_inputs(&config)?;
        assemble_graph(&config, &inputs)
    }

    fn names(graph: &PipelineGraph) -> Vec<&str> {
        graph.iter().map(|(_, job)| job.name()).collect()
    }

    #[test]
    fn test_topology_select() {
        let config = resolve_config(&base_properties()).unwrap();
        let inputs = declare_inputs(&config).unwrap();
        assert!(matches!(
            Topology::select(WorkflowMode::Standard, &inputs),
            Ok(Topology::SingleSample { .. })
        ));
        let err = Topology::select(WorkflowMode::Legacy, &inputs).unwrap_err();
        assert_eq!(
            err,
            WorkflowError::MissingRequiredInput {
                role: SampleRole::Normal,
                key: "input_files_normal".into()
            }
        );
    }

    #[test]
    fn test_paired_layout() {
        let mut props = base_properties();
        props.set(keys::NORMAL_BAM, "/data/normal.bam");
        let graph = build(&props).unwrap();
        assert_eq!(
            names(&graph),
            vec![
                "mpileup_tumor",
                "mpileup_normal",
                "varscan_somatic",
                "varscan_cna",
                "varscan_cna_call"
            ]
        );
        let tumor = graph.find("mpileup_tumor").unwrap();
        let normal = graph.find("mpileup_normal").unwrap();
        let cna = graph.find("varscan_cna").unwrap();
        assert_eq!(graph.job("varscan_somatic").unwrap().parents(), &[tumor, normal]);
        assert_eq!(graph.parents(cna), &[tumor, normal]);
        assert_eq!(graph.job("varscan_cna_call").unwrap().parents(), &[cna]);
        assert_eq!(graph.roots(), vec![tumor, normal]);
    }

    #[test]
    fn test_single_sample_layout() {
        let graph = build(&base_properties()).unwrap();
        assert_eq!(names(&graph), vec!["mpileup_tumor", "varscan_germline"]);
        let germline = graph.job("varscan_germline").unwrap();
        assert_eq!(germline.parents(), &[graph.find("mpileup_tumor").unwrap()]);
        assert_eq!(germline.outputs().len(), 1);
        assert_eq!(germline.outputs()[0].meta_type(), MetaType::Text);
    }

    #[test]
    fn test_legacy_layout() {
        let mut props = base_properties();
        props.set(keys::NORMAL_BAM, "/data/normal.bam");
        props.set(keys::WORKFLOW_MODE, "legacy");
        let graph = build(&props).unwrap();
        assert_eq!(graph.len(), 6);
        let somatic = graph.find("somatic_pileup").unwrap();
        let mut children: Vec<_> = graph
            .children(somatic)
            .into_iter()
            .map(|id| graph.get(id).name())
            .collect();
        children.sort();
        assert_eq!(children, vec!["varscan_cna", "varscan_indels", "varscan_snps"]);
        let call = graph.job("varscan_cna_call").unwrap();
        assert_eq!(call.parents(), &[graph.find("varscan_cna").unwrap()]);
        assert_eq!(graph.roots(), vec![graph.find("mpileup").unwrap()]);
    }

    #[test]
    fn test_outputs_are_bound_to_producers() {
        let mut props = base_properties();
        props.set(keys::NORMAL_BAM, "/data/normal.bam");
        props.set(keys::MANUAL_OUTPUT, "true");
        props.set(keys::OUTPUT_VCF, "true");
        let graph = build(&props).unwrap();

        let somatic = graph.job("varscan_somatic").unwrap();
        let dests: Vec<_> = somatic
            .outputs()
            .iter()
            .map(|o| o.destination().display().to_string())
            .collect();
        assert_eq!(
            dests,
            vec![
                "PCSI_0001_output/PCSI_0001.varscanSomatic.snp.vcf",
                "PCSI_0001_output/PCSI_0001.varscanSomatic.indel.vcf"
            ]
        );
        assert!(somatic.outputs().iter().all(|o| o.is_manual()));
        assert!(somatic.outputs().iter().all(|o| o.meta_type() == MetaType::Vcf));

        for name in ["varscan_cna", "varscan_cna_call"] {
            let job = graph.job(name).unwrap();
            assert_eq!(job.outputs().len(), 1);
            assert_eq!(job.outputs()[0].meta_type(), MetaType::CopyNumber);
        }
        assert!(graph.job("mpileup_tumor").unwrap().outputs().is_empty());
    }
}
