use std::collections::BTreeMap;

use smallvec::SmallVec;

use crate::{
    env::{EnvFrame, EnvId},
    error::EvalError,
    intern::{Interner, SymbolId},
    value::{Closure, ErrorValue, HeapData, Pair, Value, write_value},
};

/// Index of a slot in the heap's value arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeapId(u32);

impl HeapId {
    pub(crate) fn new(index: usize) -> Self {
        Self(u32::try_from(index).expect("heap arena overflow"))
    }

    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Tri-color state of an arena slot.
///
/// White: not yet visited in the current cycle (and swept if still white at
/// the end). Grey: discovered, children not yet scanned. Black: scanned.
/// Interned immediates play the role of a fourth, permanent color: they
/// never occupy a slot, so they can never be swept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Grey,
    Black,
}

/// Coarse interpreter mode used to gate collection safety.
///
/// During `Read` the parser holds cons cells that are not yet attached to
/// any root, so the allocator must not start a collection. The drivers flip
/// to `Eval` before evaluating each form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Read,
    Eval,
}

/// One entry in the temporary guard stack.
///
/// Guarded values are roots for as long as their entry is on the stack; this
/// is what keeps a freshly allocated intermediate alive across a later
/// allocation that triggers collection. Environment entries keep call frames
/// of in-progress closure invocations alive the same way.
#[derive(Debug, Clone, Copy)]
enum Root {
    Value(Value),
    Env(EnvId),
}

#[derive(Debug)]
struct Slot {
    data: HeapData,
    color: Color,
}

/// Collection threshold used by [`Heap::new`], in estimated live bytes.
///
/// Correctness only needs a few dozen live objects before collecting; this
/// default trades a little memory for throughput. Tests shrink it via
/// [`Heap::with_threshold`] to force collections on nearly every allocation.
pub const DEFAULT_GC_THRESHOLD: usize = 32 * 1024;

/// Snapshot of heap state at a point in time.
///
/// The `objects_by_type` map uses `BTreeMap` for deterministic iteration
/// order, making snapshots suitable for display and comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapStats {
    /// Number of live objects in the value arena.
    pub live_objects: usize,
    /// Number of free (recycled) slots available for reuse.
    pub free_slots: usize,
    /// Total value-arena capacity (live + free).
    pub total_slots: usize,
    /// Number of live environment frames.
    pub live_envs: usize,
    /// Estimated bytes held by live objects.
    pub live_bytes: usize,
    /// Breakdown of live objects by variant name.
    pub objects_by_type: BTreeMap<&'static str, usize>,
    /// Number of distinct interned symbols.
    pub symbols: usize,
}

/// The value heap: arena allocator, tracing collector, and interpreter-wide
/// bookkeeping (symbol interner, temporary guard stack, phase flag).
///
/// Values and environment frames live in slot arenas with free lists, so a
/// long-running loop that allocates and frees keeps its memory footprint
/// flat. The collector is a tri-color mark-and-sweep over both arenas,
/// triggered lazily from [`Heap::alloc`] when the live-byte estimate crosses
/// the threshold and the interpreter is not mid-parse.
///
/// The heap is the process-wide mutable state of the interpreter; it is
/// passed explicitly as `&mut Heap` rather than hidden behind a global.
#[derive(Debug)]
pub struct Heap {
    values: Vec<Option<Slot>>,
    /// IDs of freed value slots available for reuse.
    free_values: Vec<HeapId>,
    pub(crate) envs: Vec<Option<EnvFrame>>,
    pub(crate) free_envs: Vec<EnvId>,
    /// Frames that are roots for their whole lifetime (the top-level frame
    /// of a session or script run).
    pub(crate) pinned_envs: Vec<EnvId>,
    /// Temporary guard stack; released in reverse order of acquisition.
    guards: Vec<Root>,
    interner: Interner,
    phase: Phase,
    /// Estimated bytes held by live values; recomputed after every sweep.
    live_bytes: usize,
    threshold: usize,
    collections: u64,
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

impl Heap {
    #[must_use]
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_GC_THRESHOLD)
    }

    /// Creates a heap that collects once the live-byte estimate reaches
    /// `threshold`. A tiny threshold forces a collection attempt on nearly
    /// every allocation, which is how the collector is exercised in tests.
    #[must_use]
    pub fn with_threshold(threshold: usize) -> Self {
        Self {
            values: Vec::new(),
            free_values: Vec::new(),
            envs: Vec::new(),
            free_envs: Vec::new(),
            pinned_envs: Vec::new(),
            guards: Vec::new(),
            interner: Interner::new(),
            phase: Phase::Eval,
            live_bytes: 0,
            threshold,
            collections: 0,
        }
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    /// Interns a symbol name, returning its id.
    pub fn intern(&mut self, name: &str) -> SymbolId {
        self.interner.intern(name)
    }

    /// Returns the name behind an interned symbol id.
    #[must_use]
    pub fn symbol_name(&self, id: SymbolId) -> &str {
        self.interner.name(id)
    }

    /// Allocates a compound value, possibly collecting first.
    ///
    /// The caller must either store the returned reference into a rooted
    /// location (an environment binding or a field of a reachable value)
    /// before the next allocation, or guard it via [`Heap::guard`] inside a
    /// [`Heap::scoped`] region.
    ///
    /// Allocation does not fail; an out-of-memory condition aborts the
    /// process like any other Rust allocation failure.
    pub fn alloc(&mut self, data: HeapData) -> Value {
        // Collect before inserting so the newborn can never be swept by the
        // collection it triggered.
        self.maybe_collect();
        self.live_bytes += data.estimate_size();
        let slot = Slot {
            data,
            color: Color::White,
        };
        let id = if let Some(id) = self.free_values.pop() {
            self.values[id.index()] = Some(slot);
            id
        } else {
            let id = HeapId::new(self.values.len());
            self.values.push(Some(slot));
            id
        };
        Value::Ref(id)
    }

    pub fn alloc_pair(&mut self, car: Value, cdr: Value) -> Value {
        self.alloc(HeapData::Pair(Pair { car, cdr }))
    }

    pub fn alloc_str(&mut self, text: impl Into<Box<str>>) -> Value {
        self.alloc(HeapData::Str(text.into()))
    }

    pub fn alloc_closure(&mut self, closure: Closure) -> Value {
        self.alloc(HeapData::Closure(closure))
    }

    /// Materialises an unwound error as a first-class error value.
    pub fn alloc_error(&mut self, error: &EvalError) -> Value {
        self.alloc(HeapData::Error(ErrorValue {
            kind: error.kind(),
            message: error.message().into(),
        }))
    }

    /// Returns the payload stored at `id`.
    ///
    /// # Panics
    /// Panics if the slot is missing or already swept; holding a `HeapId`
    /// across a collection without rooting it is a bug in the caller.
    #[must_use]
    pub fn get(&self, id: HeapId) -> &HeapData {
        &self
            .values
            .get(id.index())
            .expect("Heap::get: slot missing")
            .as_ref()
            .expect("Heap::get: object already swept")
            .data
    }

    /// Mutable access to the payload stored at `id`.
    ///
    /// # Panics
    /// Panics under the same conditions as [`Heap::get`].
    pub fn get_mut(&mut self, id: HeapId) -> &mut HeapData {
        &mut self
            .values
            .get_mut(id.index())
            .expect("Heap::get_mut: slot missing")
            .as_mut()
            .expect("Heap::get_mut: object already swept")
            .data
    }

    /// Returns the pair behind `value`, or `None` when it is not a pair.
    #[must_use]
    pub fn as_pair(&self, value: Value) -> Option<Pair> {
        match value {
            Value::Ref(id) => match self.get(id) {
                HeapData::Pair(pair) => Some(*pair),
                _ => None,
            },
            _ => None,
        }
    }

    /// True when the slot at `id` is still live (not swept).
    #[must_use]
    pub fn is_live(&self, id: HeapId) -> bool {
        self.values.get(id.index()).is_some_and(Option::is_some)
    }

    /// Renders a value through the printing rules.
    #[must_use]
    pub fn render(&self, value: Value) -> String {
        let mut out = String::new();
        write_value(&mut out, self, value).expect("string formatting cannot fail");
        out
    }

    /// Pushes a value onto the temporary guard stack.
    ///
    /// Only meaningful inside a [`Heap::scoped`] region, which releases
    /// everything pushed within it on every exit path.
    pub fn guard(&mut self, value: Value) {
        self.guards.push(Root::Value(value));
    }

    /// Pushes an environment frame onto the temporary guard stack, keeping
    /// an in-progress call frame (and everything it binds) alive.
    pub fn guard_env(&mut self, env: EnvId) {
        self.guards.push(Root::Env(env));
    }

    /// Current guard-stack depth, exposed for tests.
    #[must_use]
    pub fn guard_depth(&self) -> usize {
        self.guards.len()
    }

    /// Runs `f` inside a temporary guard scope.
    ///
    /// Guards pushed by `f` are released when it returns, in reverse order
    /// of acquisition, on the normal path and on error unwinds alike. This
    /// is the only mechanism that keeps freshly allocated intermediates
    /// alive across subsequent allocations in the same expression.
    pub fn scoped<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let mark = self.guards.len();
        let result = f(self);
        self.guards.truncate(mark);
        result
    }

    /// Number of collections run so far.
    #[must_use]
    pub fn collections(&self) -> u64 {
        self.collections
    }

    fn maybe_collect(&mut self) {
        if self.phase == Phase::Eval && self.live_bytes >= self.threshold {
            self.collect();
        }
    }

    /// Runs a full tri-color mark-and-sweep cycle.
    ///
    /// Roots are every live environment frame, every entry on the temporary
    /// guard stack, and (implicitly) the interned immediates. After the
    /// sweep, environment frames unreachable from the pinned top-level
    /// frame, the guard stack, or any surviving closure are dropped from the
    /// root set; their bindings survive this cycle and fall out of the
    /// graph at the next one.
    ///
    /// Always safe to invoke, at any point outside the Read phase's
    /// allocator gate; callers forcing a collection in tests call it
    /// directly.
    pub fn collect(&mut self) {
        self.collections += 1;

        // 1. Reset every slot to white.
        for slot in self.values.iter_mut().flatten() {
            slot.color = Color::White;
        }

        // 2. Mark roots grey: the bindings of every live frame, and every
        // guarded value.
        let mut work: Vec<HeapId> = Vec::new();
        for frame in self.envs.iter().flatten() {
            for &bound in frame.bindings.values() {
                if let Value::Ref(id) = bound {
                    Self::mark_grey(&mut self.values, id, &mut work);
                }
            }
        }
        for root in &self.guards {
            if let Root::Value(Value::Ref(id)) = *root {
                Self::mark_grey(&mut self.values, id, &mut work);
            }
        }

        // 3. Drain the worklist: scan edges, blacken the scanned object.
        while let Some(id) = work.pop() {
            let mut children: SmallVec<[HeapId; 8]> = SmallVec::new();
            self.values[id.index()]
                .as_ref()
                .expect("Heap::collect: grey slot missing")
                .data
                .trace(&mut |child| children.push(child));
            for child in children {
                Self::mark_grey(&mut self.values, child, &mut work);
            }
            self.values[id.index()]
                .as_mut()
                .expect("Heap::collect: grey slot missing")
                .color = Color::Black;
        }

        // 4. Sweep whites, 5. recompute the byte estimate from survivors.
        let mut live_bytes = 0;
        for (index, entry) in self.values.iter_mut().enumerate() {
            match entry {
                Some(slot) if slot.color == Color::White => {
                    *entry = None;
                    self.free_values.push(HeapId::new(index));
                }
                Some(slot) => live_bytes += slot.data.estimate_size(),
                None => {}
            }
        }
        self.live_bytes = live_bytes;

        // 6. Drop environment roots nothing outside the root table reaches.
        self.prune_env_roots();
    }

    fn mark_grey(values: &mut [Option<Slot>], id: HeapId, work: &mut Vec<HeapId>) {
        let slot = values[id.index()]
            .as_mut()
            .expect("Heap::collect: root points at swept slot");
        if slot.color == Color::White {
            slot.color = Color::Grey;
            work.push(id);
        }
    }

    /// Frees environment frames that user code can no longer reach.
    ///
    /// A frame stays registered while it is reachable from a pinned frame,
    /// a guard-stack entry, a surviving closure's captured environment, or
    /// as a parent of any such frame. Everything else exists only in the
    /// root table itself and is released.
    fn prune_env_roots(&mut self) {
        let mut env_seen = vec![false; self.envs.len()];
        let mut value_seen = vec![false; self.values.len()];
        let mut env_work: Vec<EnvId> = Vec::new();
        let mut value_work: Vec<HeapId> = Vec::new();

        for &env in &self.pinned_envs {
            if !env_seen[env.index()] {
                env_seen[env.index()] = true;
                env_work.push(env);
            }
        }
        for root in &self.guards {
            match *root {
                Root::Value(Value::Ref(id)) => {
                    if !value_seen[id.index()] {
                        value_seen[id.index()] = true;
                        value_work.push(id);
                    }
                }
                Root::Value(_) => {}
                Root::Env(env) => {
                    if !env_seen[env.index()] {
                        env_seen[env.index()] = true;
                        env_work.push(env);
                    }
                }
            }
        }

        loop {
            if let Some(env) = env_work.pop() {
                let frame = self.envs[env.index()]
                    .as_ref()
                    .expect("Heap::collect: reachable frame missing");
                if let Some(parent) = frame.parent {
                    if !env_seen[parent.index()] {
                        env_seen[parent.index()] = true;
                        env_work.push(parent);
                    }
                }
                for &bound in frame.bindings.values() {
                    if let Value::Ref(id) = bound {
                        if !value_seen[id.index()] {
                            value_seen[id.index()] = true;
                            value_work.push(id);
                        }
                    }
                }
                continue;
            }
            let Some(id) = value_work.pop() else { break };
            // Swept slots cannot appear here: everything reachable from the
            // seeds was a root of the mark phase that just ran.
            let slot = self.values[id.index()]
                .as_ref()
                .expect("Heap::collect: reachable slot swept");
            slot.data.trace(&mut |child| {
                if !value_seen[child.index()] {
                    value_seen[child.index()] = true;
                    value_work.push(child);
                }
            });
            if let Some(env) = slot.data.captured_env() {
                if !env_seen[env.index()] {
                    env_seen[env.index()] = true;
                    env_work.push(env);
                }
            }
        }

        for (index, slot) in self.envs.iter_mut().enumerate() {
            if slot.is_some() && !env_seen[index] {
                *slot = None;
                self.free_envs.push(EnvId::new(index));
            }
        }
    }

    /// Takes a snapshot of heap state for monitoring and tests.
    #[must_use]
    pub fn stats(&self) -> HeapStats {
        let mut objects_by_type: BTreeMap<&'static str, usize> = BTreeMap::new();
        let mut live_objects = 0;
        for slot in self.values.iter().flatten() {
            live_objects += 1;
            *objects_by_type.entry(slot.data.variant_name()).or_insert(0) += 1;
        }
        HeapStats {
            live_objects,
            free_slots: self.free_values.len(),
            total_slots: self.values.len(),
            live_envs: self.envs.iter().flatten().count(),
            live_bytes: self.live_bytes,
            objects_by_type,
            symbols: self.interner.len(),
        }
    }
}
