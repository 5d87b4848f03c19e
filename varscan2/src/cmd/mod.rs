pub mod build;
pub mod plan;

use clap::Args;
use eyre::{Context, Result};
use libvarscan2::{utils, PipelineConfig, PipelineGraph, Properties};

use crate::file::{parse_override, ValidPathBuf};

/// Where workflow properties come from, shared by every subcommand.
#[derive(Debug, Args)]
pub struct WorkflowArgs {
    /// SeqWare style workflow.ini with one key=value per line
    #[clap(short, long)]
    pub ini: ValidPathBuf,

    /// Override or add a property, can be given multiple times. An empty
    /// value for input_files_normal runs the single-sample workflow.
    #[clap(short = 's', long = "set", value_name = "KEY=VALUE", value_parser = parse_override)]
    pub overrides: Vec<(String, String)>,

    /// Look up samtools and java in $PATH when given as bare names or not
    /// given at all
    #[clap(long, default_value_t = false)]
    pub which: bool,
}

impl WorkflowArgs {
    pub fn properties(&self) -> Result<Properties> {
        let mut props = Properties::from_path(&self.ini)
            .wrap_err_with(|| format!("Failed to read {}", self.ini.0.display()))?;
        for (key, value) in &self.overrides {
            log::debug!("Override {key}={value}");
            props.set(key.as_str(), value.as_str());
        }
        if self.which {
            utils::resolve_tools(&mut props)?;
        }
        Ok(props)
    }

    pub fn build(&self) -> Result<(PipelineConfig, PipelineGraph)> {
        let props = self.properties()?;
        let built = libvarscan2::build_workflow(&props)
            .wrap_err_with(|| format!("Could not build workflow from {}", self.ini.0.display()))?;
        Ok(built)
    }
}
