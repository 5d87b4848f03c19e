//! Provisioner that collects declared outputs into a tab-separated manifest.
use std::{fs::File, io::Write, path::Path};

use eyre::{Context, Result};
use serde::Serialize;

use crate::{
    engine::Provisioner,
    provision::{MetaType, OutputBinding},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManifestRow {
    job: String,
    source: String,
    destination: String,
    metatype: MetaType,
    manual: bool,
    annotations: String,
}

impl ManifestRow {
    pub fn job(&self) -> &str {
        &self.job
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }
}

#[derive(Debug, Default)]
pub struct ManifestProvisioner {
    rows: Vec<ManifestRow>,
}

impl ManifestProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[ManifestRow] {
        &self.rows
    }

    /// Write the manifest with a header line, one row per output.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(writer);
        for row in &self.rows {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .wrap_err_with(|| format!("Failed to create manifest {}", path.display()))?;
        self.write_to(file)?;
        log::info!("Wrote {} provisioned outputs to {}", self.rows.len(), path.display());
        Ok(())
    }
}

impl Provisioner for ManifestProvisioner {
    type Handle = usize;

    fn declare_output(&mut self, job: &str, binding: &OutputBinding) -> usize {
        self.rows.push(ManifestRow {
            job: job.to_string(),
            source: binding.source().display().to_string(),
            destination: binding.destination().display().to_string(),
            metatype: binding.meta_type(),
            manual: binding.is_manual(),
            annotations: String::new(),
        });
        self.rows.len() - 1
    }

    /// Annotations are stored as `key=value` pairs separated by `;`.
    fn annotate(&mut self, output: usize, key: &str, value: &str) {
        let row = &mut self.rows[output];
        if !row.annotations.is_empty() {
            row.annotations.push(';');
        }
        row.annotations.push_str(&format!("{key}={value}"));
    }
}
