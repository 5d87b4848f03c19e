use std::error::Error;

use libvarscan2::{
    build_workflow,
    config::keys,
    engine::submit,
    manifest::ManifestProvisioner,
    provision::MetaType,
    script::ScriptEngine,
    PipelineGraph, Properties, WorkflowError,
};
use pretty_assertions::assert_eq;

fn properties() -> Properties {
    [
        (keys::TUMOR_BAM, "/seqware/inputs/PCSI_0024_Pa_P.bam"),
        (keys::NORMAL_BAM, "/seqware/inputs/PCSI_0024_Ly_R.bam"),
        (keys::OUTPUT_PREFIX, "PCSI_0024"),
        (keys::TMP_DIR, "tmp"),
        (keys::SAMTOOLS, "/oicr/samtools/0.1.19/samtools"),
        (keys::JAVA, "/oicr/java/1.8.0_91/bin/java"),
        (keys::VARSCAN, "/oicr/varscan/2.4.2/VarScan.jar"),
        (keys::REF_FASTA, "/oicr/data/hg19_random.fa"),
        (keys::INTERVAL_BED, "/oicr/data/exome.bed"),
        (keys::VARSCAN_MEM, "8"),
        (keys::MIN_VAR_FREQ, "0.1"),
        (keys::MIN_COVERAGE_TUMOR, "6"),
        (keys::MANUAL_OUTPUT, "false"),
    ]
    .into_iter()
    .collect()
}

fn parent_names<'a>(graph: &'a PipelineGraph, name: &str) -> Vec<&'a str> {
    graph
        .job(name)
        .unwrap()
        .parents()
        .iter()
        .map(|&p| graph.get(p).name())
        .collect()
}

#[test_log::test]
fn paired_tumor_and_normal() -> Result<(), Box<dyn Error>> {
    let (_, graph) = build_workflow(&properties())?;

    let names: Vec<_> = graph.iter().map(|(_, job)| job.name()).collect();
    assert_eq!(
        names,
        vec![
            "mpileup_tumor",
            "mpileup_normal",
            "varscan_somatic",
            "varscan_cna",
            "varscan_cna_call"
        ]
    );
    assert_eq!(
        parent_names(&graph, "varscan_somatic"),
        vec!["mpileup_tumor", "mpileup_normal"]
    );
    assert_eq!(
        parent_names(&graph, "varscan_cna"),
        vec!["mpileup_tumor", "mpileup_normal"]
    );
    assert_eq!(parent_names(&graph, "varscan_cna_call"), vec!["varscan_cna"]);
    assert!(parent_names(&graph, "mpileup_normal").is_empty());
    assert!(graph.iter().all(|(_, job)| job.resources().memory_mb == 8192));
    Ok(())
}

#[test_log::test]
fn tumor_only() -> Result<(), Box<dyn Error>> {
    let mut props = properties();
    props.remove(keys::NORMAL_BAM);
    let (_, graph) = build_workflow(&props)?;

    assert_eq!(graph.len(), 2);
    assert_eq!(parent_names(&graph, "varscan_germline"), vec!["mpileup_tumor"]);
    assert!(graph.job("varscan_cna").is_none());
    assert!(graph.job("varscan_cna_call").is_none());
    Ok(())
}

#[test]
fn missing_reference_fails_before_any_job() {
    let mut props = properties();
    props.remove(keys::REF_FASTA);
    let err = build_workflow(&props).unwrap_err();
    assert_eq!(err, WorkflowError::MissingConfiguration("ref_fasta".to_string()));
    assert!(err.to_string().contains("ref_fasta"));
}

#[test]
fn missing_tumor_input() {
    let mut props = properties();
    props.set(keys::TUMOR_BAM, "");
    let err = build_workflow(&props).unwrap_err();
    assert!(
        matches!(err, WorkflowError::MissingRequiredInput { ref key, .. } if key == "input_files_tumor")
    );
}

#[test]
fn legacy_combined_fan_out() -> Result<(), Box<dyn Error>> {
    let mut props = properties();
    props.set(keys::WORKFLOW_MODE, "legacy");
    let (_, graph) = build_workflow(&props)?;

    assert_eq!(graph.len(), 6);
    for child in ["varscan_indels", "varscan_snps", "varscan_cna"] {
        assert_eq!(parent_names(&graph, child), vec!["somatic_pileup"]);
    }
    assert_eq!(parent_names(&graph, "somatic_pileup"), vec!["mpileup"]);
    assert_eq!(parent_names(&graph, "varscan_cna_call"), vec!["varscan_cna"]);

    let pileup = graph.job("mpileup").unwrap();
    assert_eq!(
        pileup.command_line(),
        "/oicr/samtools/0.1.19/samtools mpileup -q 1 -f /oicr/data/hg19_random.fa \
         -l /oicr/data/exome.bed -B -d 1000000 /seqware/inputs/PCSI_0024_Ly_R.bam \
         /seqware/inputs/PCSI_0024_Pa_P.bam > tmp/PCSI_0024.mpileup"
    );

    let snps = graph.job("varscan_snps").unwrap();
    assert_eq!(
        snps.outputs()[0].destination().to_str(),
        Some("PCSI_0024_output/PCSI_0024.varscanSomatic.snp.Somatic.hc")
    );
    Ok(())
}

#[test]
fn script_and_manifest_from_graph() -> Result<(), Box<dyn Error>> {
    let (config, graph) = build_workflow(&properties())?;
    let mut engine = ScriptEngine::new("test");
    let mut manifest = ManifestProvisioner::new();
    submit(&graph, &mut engine, &mut manifest);

    let script = engine.render();
    let tumor = script.find("# [1/5] mpileup_tumor").unwrap();
    let somatic = script.find("# [3/5] varscan_somatic").unwrap();
    let call = script.find("# [5/5] varscan_cna_call").unwrap();
    assert!(tumor < somatic && somatic < call);
    assert!(script.contains("# parents: mpileup_tumor, mpileup_normal"));

    let jobs: Vec<_> = manifest.rows().iter().map(|r| r.job()).collect();
    assert_eq!(
        jobs,
        vec!["varscan_somatic", "varscan_somatic", "varscan_cna", "varscan_cna_call"]
    );
    let out_dir = config.output_dir();
    assert!(manifest
        .rows()
        .iter()
        .all(|r| r.destination().starts_with(out_dir.to_str().unwrap())));
    Ok(())
}

#[test]
fn vcf_mode_changes_call_outputs_only() -> Result<(), Box<dyn Error>> {
    let mut props = properties();
    props.set(keys::OUTPUT_VCF, "true");
    let (_, graph) = build_workflow(&props)?;

    let somatic = graph.job("varscan_somatic").unwrap();
    assert!(somatic.args().ends_with(&["--output-vcf".to_string(), "1".to_string()]));
    assert!(somatic.outputs().iter().all(|o| o.meta_type() == MetaType::Vcf));
    let cna = graph.job("varscan_cna").unwrap();
    assert_eq!(cna.outputs()[0].meta_type(), MetaType::CopyNumber);
    Ok(())
}

#[test]
fn legacy_vcf_provisions_high_confidence_vcf() -> Result<(), Box<dyn Error>> {
    let mut props = properties();
    props.set(keys::WORKFLOW_MODE, "legacy");
    props.set(keys::OUTPUT_VCF, "true");
    let (_, graph) = build_workflow(&props)?;

    let snps = graph.job("varscan_snps").unwrap();
    assert!(snps
        .args()
        .contains(&"tmp/PCSI_0024.varscanSomatic.snp.vcf".to_string()));
    assert_eq!(
        snps.outputs()[0].destination().to_str(),
        Some("PCSI_0024_output/PCSI_0024.varscanSomatic.snp.Somatic.hc.vcf")
    );
    assert_eq!(snps.outputs()[0].meta_type(), MetaType::Vcf);

    let indels = graph.job("varscan_indels").unwrap();
    assert_eq!(
        indels.outputs()[0].destination().to_str(),
        Some("PCSI_0024_output/PCSI_0024.varscanSomatic.indel.Somatic.hc.vcf")
    );
    assert_eq!(indels.outputs()[0].meta_type(), MetaType::Vcf);
    Ok(())
}

#[test]
fn oversized_memory_is_rejected() {
    let mut props = properties();
    props.set(keys::VARSCAN_MEM, "4194304");
    let err = build_workflow(&props).unwrap_err();
    assert_eq!(
        err,
        WorkflowError::InvalidConfigurationValue {
            key: "varscan_mem".to_string(),
            value: "4194304".to_string(),
        }
    );
}
