//! Execution engine that renders the workflow as a bash script.
//!
//! Jobs run one after another in submission order, which is a valid
//! topological order. Resource limits and parents are kept as comments so
//! the script stays readable next to the cluster submission.
use std::{fmt, fs, path::Path};

use eyre::{Context, Result};
use itertools::Itertools;

use crate::engine::ExecutionEngine;

#[derive(Debug)]
struct ScriptJob {
    name: String,
    command: String,
    parents: Vec<usize>,
    memory_mb: u32,
    queue: String,
}

#[derive(Debug, Default)]
pub struct ScriptEngine {
    title: String,
    setup: Vec<String>,
    jobs: Vec<ScriptJob>,
}

impl ScriptEngine {
    pub fn new<S: Into<String>>(title: S) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Line run before the first job, e.g. creating the working directory.
    pub fn setup<S: Into<String>>(&mut self, line: S) -> &mut Self {
        self.setup.push(line.into());
        self
    }

    pub fn render(&self) -> String {
        self.to_string()
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.render())
            .wrap_err_with(|| format!("Failed to write script {}", path.display()))?;
        log::info!("Wrote workflow script to {}", path.display());
        Ok(())
    }
}

impl fmt::Display for ScriptEngine {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(out, "#!/usr/bin/env bash")?;
        writeln!(out, "# {}", self.title)?;
        writeln!(out, "set -euo pipefail")?;
        for line in &self.setup {
            writeln!(out, "{line}")?;
        }

        let total = self.jobs.len();
        for (i, job) in self.jobs.iter().enumerate() {
            let parents = if job.parents.is_empty() {
                "none".to_string()
            } else {
                job.parents.iter().map(|&p| &self.jobs[p].name).join(", ")
            };
            let queue = if job.queue.is_empty() {
                "default"
            } else {
                job.queue.as_str()
            };
            writeln!(out)?;
            writeln!(out, "# [{}/{total}] {}", i + 1, job.name)?;
            writeln!(out, "# parents: {parents}")?;
            writeln!(out, "# memory: {}M queue: {queue}", job.memory_mb)?;
            writeln!(out, "echo \"Running {}\" >&2", job.name)?;
            writeln!(out, "{}", job.command)?;
        }
        Ok(())
    }
}

impl ExecutionEngine for ScriptEngine {
    type Handle = usize;

    fn create_job(&mut self, name: &str, args: &[String]) -> usize {
        self.jobs.push(ScriptJob {
            name: name.to_string(),
            command: args.join(" "),
            parents: Vec::new(),
            memory_mb: 0,
            queue: String::new(),
        });
        self.jobs.len() - 1
    }

    fn add_parent(&mut self, job: usize, parent: usize) {
        self.jobs[job].parents.push(parent);
    }

    fn set_resource_limits(&mut self, job: usize, memory_mb: u32, queue: &str) {
        let job = &mut self.jobs[job];
        job.memory_mb = memory_mb;
        job.queue = queue.to_string();
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_render() {
        let mut engine = ScriptEngine::new("demo workflow");
        engine.setup("mkdir -p tmp");
        let a = engine.create_job("a", &["echo".into(), "a".into()]);
        engine.set_resource_limits(a, 2048, "");
        let b = engine.create_job("b", &["cat".into(), ">".into(), "out".into()]);
        engine.add_parent(b, a);
        engine.set_resource_limits(b, 2048, "long");

        let expected = "#!/usr/bin/env bash\n\
                        # demo workflow\n\
                        set -euo pipefail\n\
                        mkdir -p tmp\n\
                        \n\
                        # [1/2] a\n\
                        # parents: none\n\
                        # memory: 2048M queue: default\n\
                        echo \"Running a\" >&2\n\
                        echo a\n\
                        \n\
                        # [2/2] b\n\
                        # parents: a\n\
                        # memory: 2048M queue: long\n\
                        echo \"Running b\" >&2\n\
                        cat > out\n";
        assert_eq!(engine.render(), expected);
        assert_eq!(format!("{engine}"), expected);
    }
}
