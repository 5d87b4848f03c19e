//! Hand-off of a finished graph to the execution and provisioning
//! collaborators.
use crate::{graph::PipelineGraph, provision::OutputBinding};

/// Whatever schedules and runs the jobs.
pub trait ExecutionEngine {
    type Handle: Copy;

    fn create_job(&mut self, name: &str, args: &[String]) -> Self::Handle;

    fn add_parent(&mut self, job: Self::Handle, parent: Self::Handle);

    fn set_resource_limits(&mut self, job: Self::Handle, memory_mb: u32, queue: &str);
}

/// Whatever stages declared outputs out of the working area.
pub trait Provisioner {
    type Handle: Copy;

    fn declare_output(&mut self, job: &str, binding: &OutputBinding) -> Self::Handle;

    fn annotate(&mut self, output: Self::Handle, key: &str, value: &str);
}

/// Create every job of `graph` on `engine` and declare its outputs on
/// `provisioner`.
///
/// Jobs go out in creation order, so a parent handle always exists before a
/// child refers to it. Returns the engine handles indexed like the graph.
pub fn submit<E, P>(graph: &PipelineGraph, engine: &mut E, provisioner: &mut P) -> Vec<E::Handle>
where
    E: ExecutionEngine,
    P: Provisioner,
{
    let mut handles: Vec<E::Handle> = Vec::with_capacity(graph.len());
    for (id, job) in graph.iter() {
        debug_assert_eq!(id.index(), handles.len());
        let handle = engine.create_job(job.name(), job.args());
        for parent in job.parents() {
            engine.add_parent(handle, handles[parent.index()]);
        }
        let resources = job.resources();
        engine.set_resource_limits(handle, resources.memory_mb, &resources.queue);

        for binding in job.outputs() {
            let output = provisioner.declare_output(job.name(), binding);
            let annotation = binding.annotation();
            provisioner.annotate(output, &annotation.key, &annotation.value);
        }
        handles.push(handle);
    }
    log::info!("Submitted {} jobs", handles.len());
    handles
}
