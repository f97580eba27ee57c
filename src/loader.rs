// Filing directory loading for the CLI and callers that keep filings on disk
use crate::filing::FilingSources;
use crate::statement::FilingMeta;
use crate::{Error, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const LINKBASE_SUFFIXES: [&str; 3] = ["_pre.xml", "_cal.xml", "_lab.xml"];
const META_FILE: &str = "filing.json";

/// The documents of one filing read into memory.
///
/// A filing directory holds `*.xsd` schemas, `*_pre.xml`, `*_cal.xml` and
/// `*_lab.xml` linkbases, exactly one instance document (`*.xml` or
/// `*.xbrl`) and optionally a `filing.json` with [`FilingMeta`]. Other
/// files are ignored.
#[derive(Debug, Clone, Default)]
pub struct FilingFiles {
    pub root: PathBuf,
    pub instance: Vec<u8>,
    pub schemas: Vec<Vec<u8>>,
    pub linkbases: Vec<Vec<u8>>,
    pub meta: FilingMeta,
}

impl FilingFiles {
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect();
        paths.sort();

        let mut files = FilingFiles {
            root: dir.to_path_buf(),
            ..Self::default()
        };
        let mut instances = Vec::new();
        for path in paths {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_ascii_lowercase();
            if name == META_FILE {
                files.meta = serde_json::from_slice(&fs::read(&path)?)?;
            } else if name.ends_with(".xsd") {
                files.schemas.push(fs::read(&path)?);
            } else if LINKBASE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
                files.linkbases.push(fs::read(&path)?);
            } else if name.ends_with(".xml") || name.ends_with(".xbrl") {
                instances.push(path);
            }
        }

        match instances.as_slice() {
            [instance] => files.instance = fs::read(instance)?,
            [] => {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no instance document in {}", dir.display()),
                )))
            }
            [first, ..] => {
                return Err(Error::Config(format!(
                    "{} instance candidates in {} (first: {})",
                    instances.len(),
                    dir.display(),
                    first.display()
                )))
            }
        }

        tracing::debug!(
            dir = %dir.display(),
            schemas = files.schemas.len(),
            linkbases = files.linkbases.len(),
            "filing directory loaded"
        );
        Ok(files)
    }

    pub fn sources(&self) -> FilingSources<'_> {
        FilingSources {
            instance: &self.instance,
            schemas: self.schemas.iter().map(Vec::as_slice).collect(),
            linkbases: self.linkbases.iter().map(Vec::as_slice).collect(),
            elements: None,
            meta: self.meta.clone(),
        }
    }
}
