use std::io::{self, Write};

use clap::Parser;
use eyre::Result;

use super::WorkflowArgs;

#[derive(Debug, Parser)]
pub struct PlanCmd {
    #[clap(flatten)]
    pub workflow: WorkflowArgs,

    /// Also print the command line of every job
    #[clap(short, long, default_value_t = false)]
    pub commands: bool,
}

impl PlanCmd {
    pub fn run(self) -> Result<()> {
        let (config, graph) = self.workflow.build()?;
        let order = graph
            .topological_order()
            .ok_or_else(|| eyre::eyre!("Workflow graph contains a cycle"))?;

        let mut out = io::stdout().lock();
        writeln!(out, "{} ({} jobs, mode {})", config.output_prefix, graph.len(), config.mode)?;
        for id in order {
            let job = graph.get(id);
            let parents: Vec<&str> = job
                .parents()
                .iter()
                .map(|&p| graph.get(p).name())
                .collect();
            let parents = if parents.is_empty() {
                "-".to_string()
            } else {
                parents.join(",")
            };
            let resources = job.resources();
            writeln!(
                out,
                "{}\t{}\tparents={}\tmemory={}M\tqueue={}\toutputs={}",
                id.index() + 1,
                job.name(),
                parents,
                resources.memory_mb,
                resources.queue,
                job.outputs().len()
            )?;
            if self.commands {
                writeln!(out, "\t{}", job.command_line())?;
            }
        }
        Ok(())
    }
}
