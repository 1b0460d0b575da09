//! Host collaborators used to load `furipota` modules from source.

use std::path::{Path, PathBuf};

use crate::ast::Node;
use crate::errors::{Error, ErrorKind, Result};

/// Turns source text into syntax trees.
///
/// The runtime ships without a grammar; hosts that load `furipota`
/// modules from text provide one. Failures should be
/// [`ErrorKind::Syntax`] errors carrying the source position.
pub trait SourceParser {
    /// Parses a whole module.
    fn parse(&self, file_name: &str, source: &str) -> Result<Node>;

    /// Parses a single expression.
    fn parse_expression(&self, source: &str) -> Result<Node>;
}

/// Finds and reads module sources.
pub trait SourceLoader {
    /// Resolves an import `path` written in a module located in
    /// `directory`. The result is the module's cache key.
    fn resolve(&self, directory: &Path, path: &str) -> Result<PathBuf>;

    fn read(&self, path: &Path) -> Result<String>;
}

/// Loads modules from the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSystemLoader;

impl SourceLoader for FileSystemLoader {
    fn resolve(&self, directory: &Path, path: &str) -> Result<PathBuf> {
        directory.join(path).canonicalize().map_err(|error| {
            Error::new(ErrorKind::ModuleNotFound {
                path: path.to_string(),
                kind: "furipota".to_string(),
            })
            .with_host(error.to_string())
        })
    }

    fn read(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(|error| {
            Error::new(ErrorKind::Io {
                path: path.display().to_string(),
                reason: error.kind().to_string(),
            })
            .with_host(error.to_string())
        })
    }
}
