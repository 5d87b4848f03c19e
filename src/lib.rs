//! Builds the job graph of the VarScan2 somatic/germline workflow.
//!
//! The workflow is resolved in three steps: [`resolve_config`] reads typed
//! parameters from a property source, [`declare_inputs`] declares the tumor
//! and optional normal alignments, and [`assemble_graph`] produces the
//! [`PipelineGraph`]. [`engine::submit`] then hands the graph to an
//! execution engine and provisioner.
pub mod assemble;
pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod inputs;
pub mod manifest;
pub mod paths;
pub mod provision;
pub mod script;
pub mod stage;
pub mod utils;

pub use assemble::{assemble_graph, Topology};
pub use config::{resolve_config, ConfigSource, PipelineConfig, Properties, WorkflowMode};
pub use error::{SampleRole, WorkflowError};
pub use graph::{JobId, PipelineGraph, StageJob};
pub use inputs::{declare_inputs, InputSample, Inputs};

/// Run all three construction steps against one property source.
pub fn build_workflow<C>(source: &C) -> error::Result<(PipelineConfig, PipelineGraph)>
where
    C: ConfigSource + ?Sized,
{
    let config = resolve_config(source)?;
    let inputs = declare_inputs(&config)?;
    let graph = assemble_graph(&config, &inputs)?;
    Ok((config, graph))
}
