use std::{
    fs::File,
    io::{stdout, Write},
    path::{Path, PathBuf},
};

use eyre::{Context, Result};
use which::which;

use crate::config::{keys, ConfigSource, Properties};

/// Allows for writing to File or Stdout depending on if a filename is given.
pub fn stdout_or_file<P>(filename: Option<&P>) -> Result<Box<dyn Write>>
where
    P: AsRef<Path>,
{
    if let Some(fp) = filename {
        let handle = File::create(fp)
            .wrap_err_with(|| format!("Failed to create {}", fp.as_ref().display()))?;
        Ok(Box::new(handle))
    } else {
        let handle = stdout().lock();
        Ok(Box::new(handle))
    }
}

/// Use the given path if there is one, otherwise look `name` up in `$PATH`.
pub fn find_binary(name: &str, binary_filepath: Option<&Path>) -> Result<PathBuf> {
    if let Some(p) = binary_filepath {
        Ok(p.to_path_buf())
    } else {
        which(name).wrap_err_with(|| format!("Error finding {name} in $PATH"))
    }
}

/// Tool values written as bare names (`samtools` rather than
/// `/usr/bin/samtools`) are replaced by their location in `$PATH`, missing
/// tools are looked up under their own name. The VarScan jar is a file, not
/// an executable, and is left alone.
pub fn resolve_tools(props: &mut Properties) -> Result<()> {
    for key in [keys::SAMTOOLS, keys::JAVA] {
        let given = props.non_empty(key).map(PathBuf::from);
        let bare = given.as_ref().map_or(true, |p| p.components().count() == 1);
        if !bare {
            continue;
        }
        let name = given
            .as_ref()
            .and_then(|p| p.to_str())
            .unwrap_or(key)
            .to_string();
        let found = find_binary(&name, None)?;
        log::info!("Using {} for {key}", found.display());
        props.set(key, found.display().to_string());
    }
    Ok(())
}
