use std::{fs, io::Write, path::PathBuf};

use clap::Parser;
use eyre::{Context, Result};
use libvarscan2::{
    engine::submit, manifest::ManifestProvisioner, script::ScriptEngine, utils, PipelineConfig,
    PipelineGraph,
};
use log::LevelFilter;

use super::WorkflowArgs;

#[derive(Debug, Parser)]
pub struct BuildCmd {
    #[clap(flatten)]
    pub workflow: WorkflowArgs,

    /// Directory for workflow.sh, provision.tsv, graph.json and log.txt. The
    /// script is printed to stdout if not given.
    #[clap(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Remove the output directory first if it exists. Without this a
    /// non-empty output directory is an error.
    #[clap(long, default_value_t = false)]
    pub overwrite: bool,
}

fn script_for(config: &PipelineConfig, graph: &PipelineGraph) -> (ScriptEngine, ManifestProvisioner) {
    let mut engine = ScriptEngine::new(format!(
        "VarScan2 workflow for {}, {} jobs",
        config.output_prefix,
        graph.len()
    ));
    engine.setup(format!("mkdir -p {}", config.tmp_dir.display()));
    let mut manifest = ManifestProvisioner::new();
    submit(graph, &mut engine, &mut manifest);
    (engine, manifest)
}

impl BuildCmd {
    /// Whether logs go to `<output_dir>/log.txt` instead of stderr.
    pub fn writes_log_file(&self) -> bool {
        self.output_dir.is_some()
    }

    pub fn run(self, log_level: LevelFilter) -> Result<()> {
        let Some(output_dir) = self.output_dir else {
            let (config, graph) = self.workflow.build()?;
            let (engine, _) = script_for(&config, &graph);
            let mut out = utils::stdout_or_file::<PathBuf>(None)?;
            out.write_all(engine.render().as_bytes())?;
            return Ok(());
        };

        let (config, graph) = self.workflow.build()?;

        if output_dir.exists() {
            if self.overwrite {
                fs::remove_dir_all(&output_dir)?;
            } else if fs::read_dir(&output_dir)?.next().is_some() {
                eyre::bail!(
                    "Output directory {} is not empty, pass --overwrite to replace it",
                    output_dir.display()
                );
            }
        }
        fs::create_dir_all(&output_dir)
            .wrap_err_with(|| format!("Failed to create {}", output_dir.display()))?;
        let log_file = output_dir.join("log.txt");
        simple_logging::log_to_file(log_file, log_level)?;
        log::info!("{:?}", self.workflow);
        log::info!("{} jobs for {}", graph.len(), config.output_prefix);

        let (engine, manifest) = script_for(&config, &graph);
        engine.write(output_dir.join("workflow.sh"))?;
        manifest.write(output_dir.join("provision.tsv"))?;

        let json = utils::stdout_or_file(Some(&output_dir.join("graph.json")))?;
        serde_json::to_writer_pretty(json, &graph)?;
        log::info!("Wrote graph.json");
        Ok(())
    }
}
