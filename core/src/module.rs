//! Modules: a top-level environment plus an ordered export table.
//!
//! Exports map a public alias to a binding name. The table is resolved
//! against the module environment each time it is read, so a binding may be
//! exported before it is defined.

use std::cell::RefCell;
use std::fmt;
use std::path::{Path, PathBuf};

use ecow::EcoString;

use crate::api::Engine;
use crate::environment::EnvId;
use crate::errors::Result;
use crate::values::Record;

pub struct Module {
    file_name: EcoString,
    directory: PathBuf,
    env: EnvId,
    exports: RefCell<Vec<(EcoString, EcoString)>>,
}

impl Module {
    pub fn new(file_name: impl Into<EcoString>, env: EnvId) -> Self {
        let file_name = file_name.into();
        let directory = Path::new(file_name.as_str())
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self {
            file_name,
            directory,
            env,
            exports: RefCell::new(Vec::new()),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// The directory relative imports are resolved against.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn env(&self) -> EnvId {
        self.env
    }

    /// Publishes the binding `name` under `alias`. Re-exporting an alias
    /// replaces the previous target.
    pub fn export(&self, alias: impl Into<EcoString>, name: impl Into<EcoString>) {
        let (alias, name) = (alias.into(), name.into());
        let mut exports = self.exports.borrow_mut();
        match exports.iter_mut().find(|(existing, _)| *existing == alias) {
            Some(entry) => entry.1 = name,
            None => exports.push((alias, name)),
        }
    }

    pub fn exported_names(&self) -> Vec<EcoString> {
        self.exports
            .borrow()
            .iter()
            .map(|(alias, _)| alias.clone())
            .collect()
    }

    /// Resolves every export to its current binding. Fails if an exported
    /// name has no binding yet.
    pub fn exported_bindings(&self, engine: &Engine) -> Result<Record> {
        let exports = self.exports.borrow().clone();
        exports
            .into_iter()
            .map(|(alias, name)| Ok((alias, engine.lookup(self.env, &name)?)))
            .collect()
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("file_name", &self.file_name)
            .field("exports", &self.exported_names())
            .finish()
    }
}
