//! Lexical environments.
//!
//! Environments form a tree of frames: each frame maps names to values and
//! points at its parent. Frames live in an [`Environments`] arena owned by
//! the engine and are addressed by [`EnvId`], which keeps closures and thunks
//! free of reference cycles through their defining scope.
//!
//! A name may be defined at most once per frame; inner frames shadow outer
//! ones. Frames are never removed, so an `EnvId` stays valid for the
//! lifetime of the engine.

use ecow::EcoString;
use hashbrown::HashMap;

use crate::errors::{Error, ErrorKind, Result};
use crate::values::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnvId(u32);

#[derive(Default)]
struct Frame {
    bindings: HashMap<EcoString, Value>,
    parent: Option<EnvId>,
}

#[derive(Default)]
pub struct Environments {
    frames: Vec<Frame>,
}

impl Environments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a frame with no parent.
    pub fn root(&mut self) -> EnvId {
        self.push(None)
    }

    /// Allocates an empty frame whose lookups fall back to `parent`.
    pub fn child(&mut self, parent: EnvId) -> EnvId {
        self.push(Some(parent))
    }

    fn push(&mut self, parent: Option<EnvId>) -> EnvId {
        let id = EnvId(self.frames.len() as u32);
        self.frames.push(Frame {
            bindings: HashMap::new(),
            parent,
        });
        id
    }

    fn frame(&self, env: EnvId) -> &Frame {
        &self.frames[env.0 as usize]
    }

    pub fn parent(&self, env: EnvId) -> Option<EnvId> {
        self.frame(env).parent
    }

    /// Binds `name` in `env` itself. Fails if `env` already binds it;
    /// bindings in parent frames are shadowed.
    pub fn define(&mut self, env: EnvId, name: impl Into<EcoString>, value: Value) -> Result<()> {
        let name = name.into();
        let frame = &mut self.frames[env.0 as usize];
        if frame.bindings.contains_key(&name) {
            return Err(Error::new(ErrorKind::DuplicateBinding { name }));
        }
        frame.bindings.insert(name, value);
        Ok(())
    }

    /// Defines every binding in order, stopping at the first duplicate.
    pub fn extend(
        &mut self,
        env: EnvId,
        bindings: impl IntoIterator<Item = (EcoString, Value)>,
    ) -> Result<()> {
        for (name, value) in bindings {
            self.define(env, name, value)?;
        }
        Ok(())
    }

    /// Looks `name` up in `env` and then in each ancestor.
    pub fn lookup(&self, env: EnvId, name: &str) -> Option<&Value> {
        let mut current = Some(env);
        while let Some(id) = current {
            let frame = self.frame(id);
            if let Some(value) = frame.bindings.get(name) {
                return Some(value);
            }
            current = frame.parent;
        }
        None
    }

    pub fn get(&self, env: EnvId, name: &str) -> Result<Value> {
        self.lookup(env, name).cloned().ok_or_else(|| {
            Error::new(ErrorKind::UnboundName {
                name: EcoString::from(name),
            })
        })
    }

    pub fn has_own(&self, env: EnvId, name: &str) -> bool {
        self.frame(env).bindings.contains_key(name)
    }

    /// Names bound directly in `env`, sorted.
    pub fn own_names(&self, env: EnvId) -> Vec<EcoString> {
        let mut names: Vec<EcoString> = self.frame(env).bindings.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
