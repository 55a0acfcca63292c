//! Emitters
//!
//! Writers that turn a finished `CanonicalSchema` into text. Emitters only
//! see the ordered schema; naming, ordering and splitting are done before
//! they run.

pub mod proto;

pub use proto::ProtoEmitter;

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::OutputFormat;
use crate::error::Result;
use crate::ir::CanonicalSchema;

/// A target notation
pub trait Emitter {
    /// File extension without the dot
    fn extension(&self) -> &'static str;

    fn emit(&self, schema: &CanonicalSchema) -> Result<String>;
}

/// The IR's own JSON form: `{info, types: [[name, base, [opts], desc, [fields]]]}`
#[derive(Debug, Clone, Default)]
pub struct JadnEmitter {
    pub pretty: bool,
}

impl JadnEmitter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl Emitter for JadnEmitter {
    fn extension(&self) -> &'static str {
        "jadn"
    }

    fn emit(&self, schema: &CanonicalSchema) -> Result<String> {
        let mut text = if self.pretty {
            serde_json::to_string_pretty(schema)?
        } else {
            serde_json::to_string(schema)?
        };
        text.push('\n');
        Ok(text)
    }
}

/// Emitters for the configured formats, in order
pub fn emitters(formats: &[OutputFormat], pretty: bool, source: Option<&str>) -> Vec<Box<dyn Emitter>> {
    formats
        .iter()
        .map(|format| -> Box<dyn Emitter> {
            match format {
                OutputFormat::Jadn => Box::new(JadnEmitter::new(pretty)),
                OutputFormat::Proto => match source {
                    Some(source) => Box::new(ProtoEmitter::new().with_source(source)),
                    None => Box::new(ProtoEmitter::new()),
                },
            }
        })
        .collect()
}

/// Write `schema` as `dir/stem.ext` for every emitter. Returns the paths written.
pub fn write_outputs(
    schema: &CanonicalSchema,
    dir: &Path,
    stem: &str,
    emitters: &[Box<dyn Emitter>],
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(emitters.len());
    for emitter in emitters {
        let path = dir.join(format!("{}.{}", stem, emitter.extension()));
        fs::write(&path, emitter.emit(schema)?)?;
        tracing::debug!("Wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}
