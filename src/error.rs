//! Error types shared by the generator pipeline.

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::codegen::EmissionLog;
use crate::options::FileKind;

/// Fatal errors raised while preparing or running a generation.
#[derive(Debug)]
pub enum GenError {
    /// Invalid or incomplete generator options.
    Config(String),
    /// The template root directory does not exist.
    ResourceRootMissing(PathBuf),
    /// No template file for the requested kind.
    TemplateMissing { kind: FileKind, path: PathBuf },
    /// Repository generation requested for a table without a primary key.
    MissingPrimaryKey { table: String },
    /// The template collaborator failed.
    Render { path: PathBuf, reason: String },
    /// File-system failure while touching an output file.
    Io { path: PathBuf, source: io::Error },
    /// Malformed table metadata snapshot.
    Metadata(String),
}

impl GenError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        GenError::Io {
            path: path.into(),
            source,
        }
    }
}

impl fmt::Display for GenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenError::Config(msg) => write!(f, "Configuration error: {}", msg),
            GenError::ResourceRootMissing(path) => {
                write!(f, "Resource directory [{}] not exists!", path.display())
            }
            GenError::TemplateMissing { kind, path } => {
                write!(f, "Template file [{}] for {} not found!", path.display(), kind)
            }
            GenError::MissingPrimaryKey { table } => {
                write!(f, "[{}] primary key does not exist!", table)
            }
            GenError::Render { path, reason } => {
                write!(f, "Failed to render [{}]: {}", path.display(), reason)
            }
            GenError::Io { path, source } => {
                write!(f, "I/O error on [{}]: {}", path.display(), source)
            }
            GenError::Metadata(msg) => write!(f, "Invalid table metadata: {}", msg),
        }
    }
}

impl std::error::Error for GenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GenError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// A generation run that aborted, together with the log written before the abort.
#[derive(Debug)]
pub struct RunError {
    pub error: GenError,
    pub log: EmissionLog,
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Errors raised by the type registry.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryError {
    /// Built-in mappings can only be shadowed or reset.
    CannotRemoveBuiltIn(String),
    /// Loading or saving the persisted mapping failed.
    Persist(String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::CannotRemoveBuiltIn(name) => {
                write!(f, "Cannot remove built-in type mapping: {}", name)
            }
            RegistryError::Persist(msg) => write!(f, "Type mapping store error: {}", msg),
        }
    }
}

impl std::error::Error for RegistryError {}
