use std::path::{Path, PathBuf};

use clap::{builder::PathBufValueParser, error::ErrorKind};

/// Path checked to exist while parsing arguments.
#[derive(Clone, Debug)]
pub struct ValidPathBuf(pub PathBuf);

impl AsRef<Path> for ValidPathBuf {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl clap::builder::ValueParserFactory for ValidPathBuf {
    type Parser = ValidPathBufParser;
    fn value_parser() -> Self::Parser {
        ValidPathBufParser
    }
}

#[derive(Clone)]
pub struct ValidPathBufParser;

impl clap::builder::TypedValueParser for ValidPathBufParser {
    type Value = ValidPathBuf;

    fn parse_ref(
        &self,
        cmd: &clap::Command,
        arg: Option<&clap::Arg>,
        value: &std::ffi::OsStr,
    ) -> Result<Self::Value, clap::Error> {
        let val = PathBufValueParser::new().parse_ref(cmd, arg, value)?;
        if !val.is_file() {
            let err = clap::Error::raw(
                ErrorKind::ValueValidation,
                format!("Workflow ini {value:?} does not exist or is not a file\n"),
            )
            .with_cmd(cmd);
            Err(err)
        } else {
            Ok(ValidPathBuf(val))
        }
    }
}

/// Parse a `key=value` override given on the command line.
pub fn parse_override(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("Expected key=value, got {s:?}")),
    }
}
