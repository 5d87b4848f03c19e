//! Job descriptions and the append-only dependency graph that holds them.
use std::{
    collections::VecDeque,
    fmt,
    sync::atomic::{AtomicU32, Ordering},
};

use fnv::FnvHashMap;
use itertools::Itertools;
use serde::{Serialize, Serializer};

use crate::{
    error::{Result, WorkflowError},
    provision::OutputBinding,
};

static NEXT_GRAPH: AtomicU32 = AtomicU32::new(0);

/// Index of a job inside a [`PipelineGraph`]. Only handed out by
/// [`PipelineGraph::add`], and tagged with the graph that created it so an
/// id from another graph is never mistaken for a local job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId {
    graph: u32,
    index: usize,
}

impl JobId {
    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index)
    }
}

impl Serialize for JobId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.index as u64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resources {
    pub memory_mb: u32,
    pub queue: String,
}

/// One external tool invocation.
///
/// Arguments are passed verbatim to a shell by the execution engine, so
/// order matters and redirections are ordinary trailing arguments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageJob {
    name: String,
    args: Vec<String>,
    resources: Resources,
    outputs: Vec<OutputBinding>,
    parents: Vec<JobId>,
}

impl StageJob {
    pub fn new<S>(name: S, args: Vec<String>, resources: Resources) -> Self
    where
        S: Into<String>,
    {
        Self {
            name: name.into(),
            args,
            resources,
            outputs: Vec::new(),
            parents: Vec::new(),
        }
    }

    pub fn with_output(mut self, output: OutputBinding) -> Self {
        self.outputs.push(output);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The arguments joined into the line a shell would run.
    pub fn command_line(&self) -> String {
        self.args.iter().join(" ")
    }

    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    pub fn outputs(&self) -> &[OutputBinding] {
        &self.outputs
    }

    pub fn parents(&self) -> &[JobId] {
        &self.parents
    }
}

/// All jobs of a workflow in creation order.
///
/// Parents must already be in the graph when a job is added, which makes
/// creation order a valid topological order and rules out cycles.
/// Clones keep the identity of the original, so ids stay valid in both.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineGraph {
    #[serde(skip)]
    tag: u32,
    jobs: Vec<StageJob>,
    #[serde(skip)]
    names: FnvHashMap<String, JobId>,
}

impl Default for PipelineGraph {
    fn default() -> Self {
        Self {
            tag: NEXT_GRAPH.fetch_add(1, Ordering::Relaxed),
            jobs: Vec::new(),
            names: FnvHashMap::default(),
        }
    }
}

impl PipelineGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn id(&self, index: usize) -> JobId {
        JobId {
            graph: self.tag,
            index,
        }
    }

    /// Add `job` with the given parents and return its id.
    ///
    /// Fails if a parent does not exist yet, belongs to another graph, or the
    /// name is already taken.
    pub fn add(&mut self, mut job: StageJob, parents: &[JobId]) -> Result<JobId> {
        if self.names.contains_key(job.name()) {
            return Err(WorkflowError::graph(job.name, "a job with this name already exists"));
        }
        for parent in parents {
            if parent.graph != self.tag {
                return Err(WorkflowError::graph(
                    job.name,
                    format!("parent {parent} belongs to another graph"),
                ));
            }
            if parent.index >= self.jobs.len() {
                return Err(WorkflowError::graph(
                    job.name,
                    format!("parent {parent} has not been created"),
                ));
            }
        }
        job.parents = parents.iter().copied().unique().collect();
        let id = self.id(self.jobs.len());
        log::debug!(
            "Adding job {id} {} with parents [{}]",
            job.name,
            job.parents
                .iter()
                .map(|p| self.jobs[p.index].name.as_str())
                .join(", ")
        );
        self.names.insert(job.name.clone(), id);
        self.jobs.push(job);
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn get(&self, id: JobId) -> &StageJob {
        &self.jobs[id.index]
    }

    pub fn find(&self, name: &str) -> Option<JobId> {
        self.names.get(name).copied()
    }

    pub fn job(&self, name: &str) -> Option<&StageJob> {
        self.find(name).map(|id| self.get(id))
    }

    pub fn ids(&self) -> impl Iterator<Item = JobId> + '_ {
        (0..self.jobs.len()).map(|i| self.id(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = (JobId, &StageJob)> {
        self.jobs.iter().enumerate().map(|(i, j)| (self.id(i), j))
    }

    pub fn parents(&self, id: JobId) -> &[JobId] {
        self.get(id).parents()
    }

    pub fn children(&self, id: JobId) -> Vec<JobId> {
        self.iter()
            .filter(|(_, job)| job.parents.contains(&id))
            .map(|(child, _)| child)
            .collect()
    }

    pub fn roots(&self) -> Vec<JobId> {
        self.iter()
            .filter(|(_, job)| job.parents.is_empty())
            .map(|(id, _)| id)
            .collect()
    }

    /// Kahn's algorithm over the parent edges. `None` means a cycle, which
    /// [`PipelineGraph::add`] should make impossible.
    pub fn topological_order(&self) -> Option<Vec<JobId>> {
        let mut in_degree: Vec<usize> = self.jobs.iter().map(|j| j.parents.len()).collect();
        let mut children: Vec<Vec<JobId>> = vec![Vec::new(); self.jobs.len()];
        for (id, job) in self.iter() {
            for parent in job.parents() {
                children[parent.index].push(id);
            }
        }

        let mut queue: VecDeque<JobId> = self.roots().into();
        let mut order = Vec::with_capacity(self.jobs.len());
        while let Some(id) = queue.pop_front() {
            order.push(id);
            for child in &children[id.index] {
                in_degree[child.index] -= 1;
                if in_degree[child.index] == 0 {
                    queue.push_back(*child);
                }
            }
        }
        (order.len() == self.jobs.len()).then_some(order)
    }

    /// Every job that can be reached by walking child edges from a root.
    pub fn reachable_from_roots(&self) -> Vec<JobId> {
        let mut seen = vec![false; self.jobs.len()];
        let mut stack = self.roots();
        while let Some(id) = stack.pop() {
            if seen[id.index] {
                continue;
            }
            seen[id.index] = true;
            stack.extend(self.children(id));
        }
        self.ids().filter(|id| seen[id.index]).collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn job(name: &str) -> StageJob {
        StageJob::new(
            name,
            vec!["echo".to_string(), name.to_string()],
            Resources {
                memory_mb: 1024,
                queue: String::new(),
            },
        )
    }

    #[test]
    fn test_add_and_query() {
        let mut graph = PipelineGraph::new();
        let a = graph.add(job("a"), &[]).unwrap();
        let b = graph.add(job("b"), &[]).unwrap();
        let c = graph.add(job("c"), &[a, b, a]).unwrap();
        let d = graph.add(job("d"), &[c]).unwrap();

        assert_eq!(graph.len(), 4);
        assert_eq!(graph.parents(c), &[a, b]);
        assert_eq!(graph.children(a), vec![c]);
        assert_eq!(graph.roots(), vec![a, b]);
        assert_eq!(graph.find("d"), Some(d));
        assert_eq!(graph.job("b").unwrap().command_line(), "echo b");
        assert_eq!(graph.topological_order(), Some(vec![a, b, c, d]));
        assert_eq!(graph.reachable_from_roots().len(), 4);
    }

    #[test]
    fn test_foreign_parent() {
        let mut graph = PipelineGraph::new();
        let a = graph.add(job("a"), &[]).unwrap();
        graph.add(job("b"), &[]).unwrap();
        let mut other = PipelineGraph::new();
        let x = other.add(job("x"), &[]).unwrap();
        assert_eq!(x.index(), a.index());

        let err = graph.add(job("c"), &[a, x]).unwrap_err();
        match err {
            WorkflowError::GraphConstruction { job, reason } => {
                assert_eq!(job, "c");
                assert!(reason.contains("another graph"), "{reason}");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_parent_not_created_yet() {
        let mut graph = PipelineGraph::new();
        graph.add(job("a"), &[]).unwrap();
        let ahead = graph.id(3);
        let err = graph.add(job("b"), &[ahead]).unwrap_err();
        assert!(matches!(err, WorkflowError::GraphConstruction { reason, .. } if reason.contains("#3")));
    }

    #[test]
    fn test_clone_keeps_ids() {
        let mut graph = PipelineGraph::new();
        let a = graph.add(job("a"), &[]).unwrap();
        let mut copy = graph.clone();
        let b = copy.add(job("b"), &[a]).unwrap();
        assert_eq!(copy.parents(b), &[a]);
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_duplicate_name() {
        let mut graph = PipelineGraph::new();
        graph.add(job("a"), &[]).unwrap();
        let err = graph.add(job("a"), &[]).unwrap_err();
        assert!(matches!(err, WorkflowError::GraphConstruction { job, .. } if job == "a"));
    }
}
