//! Lexical environments.
//!
//! Frames live in an arena inside the [`Heap`], addressed by [`EnvId`], so
//! the collector can trace the closure ↔ environment cycles that user code
//! creates by design. A frame holds an optional parent and an
//! insertion-ordered symbol → value map; lookup walks the parent chain to
//! the innermost frame that binds the name.
//!
//! Every frame is a GC root from creation. The collector drops a frame from
//! the root table once nothing outside the table reaches it: not the pinned
//! top-level frame, not an in-progress call (guard stack), and not any
//! surviving closure's captured environment.

use indexmap::IndexMap;

use crate::{
    error::{EvalError, EvalResult},
    heap::Heap,
    intern::SymbolId,
    value::Value,
};

/// Index of a frame in the heap's environment arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnvId(u32);

impl EnvId {
    pub(crate) fn new(index: usize) -> Self {
        Self(u32::try_from(index).expect("environment arena overflow"))
    }

    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One node in the environment chain.
#[derive(Debug)]
pub(crate) struct EnvFrame {
    pub(crate) parent: Option<EnvId>,
    /// `IndexMap` keeps binding iteration deterministic, which keeps root
    /// marking and test output stable.
    pub(crate) bindings: IndexMap<SymbolId, Value>,
}

impl Heap {
    /// Creates a new frame with an optional parent and registers it as a
    /// collection root.
    pub fn env_create(&mut self, parent: Option<EnvId>) -> EnvId {
        let frame = EnvFrame {
            parent,
            bindings: IndexMap::new(),
        };
        if let Some(id) = self.free_envs.pop() {
            self.envs[id.index()] = Some(frame);
            id
        } else {
            let id = EnvId::new(self.envs.len());
            self.envs.push(Some(frame));
            id
        }
    }

    /// Creates a top-level frame that stays a root for the heap's lifetime.
    pub fn env_create_global(&mut self) -> EnvId {
        let id = self.env_create(None);
        self.pinned_envs.push(id);
        id
    }

    /// Installs or overwrites a binding in `env` itself.
    pub fn env_define(&mut self, env: EnvId, name: SymbolId, value: Value) {
        self.frame_mut(env).bindings.insert(name, value);
    }

    /// Resolves `name` in the innermost enclosing frame that binds it.
    ///
    /// Returns the value together with the defining frame, so `set!` can
    /// overwrite in the right place. Fails with a NameError when no frame in
    /// the chain binds the symbol.
    pub fn env_lookup(&self, env: EnvId, name: SymbolId) -> EvalResult<(Value, EnvId)> {
        let mut current = env;
        loop {
            let frame = self.frame(current);
            if let Some(&value) = frame.bindings.get(&name) {
                return Ok((value, current));
            }
            match frame.parent {
                Some(parent) => current = parent,
                None => return Err(EvalError::name(self.symbol_name(name))),
            }
        }
    }

    /// Overwrites an existing binding in its defining frame.
    ///
    /// Fails with a NameError when the name is unbound anywhere in the
    /// chain; `set!` never creates bindings.
    pub fn env_assign(&mut self, env: EnvId, name: SymbolId, value: Value) -> EvalResult<()> {
        let (_, defining) = self.env_lookup(env, name)?;
        self.frame_mut(defining).bindings.insert(name, value);
        Ok(())
    }

    /// Walks the parent chain up to the top-level frame.
    ///
    /// `load` evaluates file forms against the global frame of the calling
    /// session, whatever frame the call itself happened in.
    #[must_use]
    pub fn env_global_of(&self, env: EnvId) -> EnvId {
        let mut current = env;
        while let Some(parent) = self.frame(current).parent {
            current = parent;
        }
        current
    }

    /// True when the frame at `id` has not been pruned by the collector.
    #[must_use]
    pub fn env_is_live(&self, id: EnvId) -> bool {
        self.envs.get(id.index()).is_some_and(Option::is_some)
    }

    fn frame(&self, id: EnvId) -> &EnvFrame {
        self.envs
            .get(id.index())
            .expect("Heap: frame slot missing")
            .as_ref()
            .expect("Heap: frame already pruned")
    }

    fn frame_mut(&mut self, id: EnvId) -> &mut EnvFrame {
        self.envs
            .get_mut(id.index())
            .expect("Heap: frame slot missing")
            .as_mut()
            .expect("Heap: frame already pruned")
    }
}

#[cfg(test)]
mod tests {
    use crate::{heap::Heap, value::Value};

    #[test]
    fn lookup_walks_parent_chain() {
        let mut heap = Heap::new();
        let global = heap.env_create_global();
        let child = heap.env_create(Some(global));
        let x = heap.intern("x");
        heap.env_define(global, x, Value::Int(1));

        let (value, defining) = heap.env_lookup(child, x).unwrap();
        assert_eq!(value, Value::Int(1));
        assert_eq!(defining, global);
    }

    #[test]
    fn define_shadows_in_inner_frame() {
        let mut heap = Heap::new();
        let global = heap.env_create_global();
        let child = heap.env_create(Some(global));
        let x = heap.intern("x");
        heap.env_define(global, x, Value::Int(1));
        heap.env_define(child, x, Value::Int(2));

        assert_eq!(heap.env_lookup(child, x).unwrap().0, Value::Int(2));
        assert_eq!(heap.env_lookup(global, x).unwrap().0, Value::Int(1));
    }

    #[test]
    fn assign_overwrites_in_defining_frame() {
        let mut heap = Heap::new();
        let global = heap.env_create_global();
        let child = heap.env_create(Some(global));
        let x = heap.intern("x");
        heap.env_define(global, x, Value::Int(1));

        heap.env_assign(child, x, Value::Int(5)).unwrap();
        assert_eq!(heap.env_lookup(global, x).unwrap().0, Value::Int(5));

        let y = heap.intern("y");
        assert!(heap.env_assign(child, y, Value::Int(0)).is_err());
    }
}
