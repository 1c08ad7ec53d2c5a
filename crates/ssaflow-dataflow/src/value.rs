use crate::values::Values;
use indexmap::{IndexMap, IndexSet};
use ssaflow_core::{Constant, InstId, InstKind, Instruction, Opcode, Program};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Keys of the per-wrapper runtime context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextKey {
    /// The value whose expansion produced this wrapper.
    Parent,
    Depth,
    /// Set when the wrapper was reached through a closure's side effect.
    SideEffect,
    /// On a function wrapper: the call that entered it.
    CallEntry,
    /// On a function wrapper: restricts return expansion to one position.
    ResultIndex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContextValue {
    Value(usize),
    Depth(i64),
    Index(usize),
}

#[derive(Debug)]
struct Slot {
    inst: InstId,
    runtime: IndexMap<ContextKey, ContextValue>,
    depends_on: IndexSet<usize>,
    effects_on: IndexSet<usize>,
}

impl Slot {
    fn new(inst: InstId) -> Self {
        Self {
            inst,
            runtime: IndexMap::new(),
            depends_on: IndexSet::new(),
            effects_on: IndexSet::new(),
        }
    }
}

/// Arena of wrappers created by traversals that started from one root value.
///
/// Every wrapper is a slot index into this arena, so edges and runtime context are plain
/// integers and a wrapper graph with cycles needs no reference counting between nodes.
struct FlowGraph {
    program: Arc<Program>,
    slots: RwLock<Vec<Slot>>,
}

impl FlowGraph {
    fn new(program: Arc<Program>) -> Arc<Self> {
        Arc::new(Self {
            program,
            slots: RwLock::new(Vec::new()),
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Slot>> {
        self.slots.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Slot>> {
        self.slots.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn alloc(&self, inst: InstId) -> usize {
        let mut slots = self.write();
        slots.push(Slot::new(inst));
        slots.len() - 1
    }
}

/// Analysis-time wrapper around one SSA instruction.
///
/// Cloning is cheap and yields the same wrapper. Traversals never reuse wrappers: each visit
/// creates a fresh one carrying its own parent, depth and edges, while the underlying
/// instruction is shared. Wrappers compare by [`Value::ptr_eq`], instructions by [`Value::id`].
#[derive(Clone)]
pub struct Value {
    graph: Arc<FlowGraph>,
    slot: usize,
    id: InstId,
}

impl Value {
    pub fn new(program: &Arc<Program>, id: InstId) -> ssaflow_core::Result<Self> {
        program.get(id)?;
        let graph = FlowGraph::new(Arc::clone(program));
        let slot = graph.alloc(id);
        Ok(Self { graph, slot, id })
    }

    /// Wraps every instruction named `name`, each in its own flow graph.
    pub fn by_name(program: &Arc<Program>, name: &str) -> Values {
        program
            .find_by_name(name)
            .into_iter()
            .filter_map(|id| Value::new(program, id).ok())
            .collect()
    }

    /// A fresh wrapper for `id` in the same flow graph.
    pub(crate) fn spawn(&self, id: InstId) -> Value {
        let slot = self.graph.alloc(id);
        Value {
            graph: Arc::clone(&self.graph),
            slot,
            id,
        }
    }

    fn at(&self, slot: usize) -> Option<Value> {
        let id = self.graph.read().get(slot)?.inst;
        Some(Value {
            graph: Arc::clone(&self.graph),
            slot,
            id,
        })
    }

    fn wrap_all(&self, ids: &[InstId]) -> Values {
        ids.iter().map(|id| self.spawn(*id)).collect()
    }

    pub fn id(&self) -> InstId {
        self.id
    }

    pub fn program(&self) -> &Arc<Program> {
        &self.graph.program
    }

    pub fn instruction(&self) -> Option<&Instruction> {
        self.graph.program.instruction(self.id)
    }

    pub fn kind(&self) -> Option<&InstKind> {
        self.instruction().map(|inst| &inst.kind)
    }

    pub fn opcode(&self) -> Option<Opcode> {
        self.instruction().map(Instruction::opcode)
    }

    pub fn name(&self) -> Option<&str> {
        self.instruction().and_then(|inst| inst.name.as_deref())
    }

    pub fn constant(&self) -> Option<&Constant> {
        self.instruction().and_then(Instruction::as_constant)
    }

    fn is(&self, opcode: Opcode) -> bool {
        self.opcode() == Some(opcode)
    }

    pub fn is_const(&self) -> bool {
        self.is(Opcode::ConstInst)
    }

    pub fn is_undefined(&self) -> bool {
        self.is(Opcode::Undefined)
    }

    pub fn is_parameter(&self) -> bool {
        self.is(Opcode::Parameter)
    }

    pub fn is_function(&self) -> bool {
        self.is(Opcode::Function)
    }

    pub fn is_call(&self) -> bool {
        self.is(Opcode::Call)
    }

    pub fn is_return(&self) -> bool {
        self.is(Opcode::Return)
    }

    pub fn is_phi(&self) -> bool {
        self.is(Opcode::Phi)
    }

    pub fn is_field(&self) -> bool {
        self.is(Opcode::Field)
    }

    pub fn is_member(&self) -> bool {
        self.instruction().map_or(false, Instruction::is_member)
    }

    pub fn has_operands(&self) -> bool {
        self.instruction().map_or(false, Instruction::has_operands)
    }

    /// Structural operands as fresh wrappers.
    pub fn operands(&self) -> Values {
        self.wrap_all(&self.graph.program.operands(self.id))
    }

    /// Consumers as fresh wrappers.
    pub fn users(&self) -> Values {
        self.wrap_all(self.graph.program.users(self.id))
    }

    /// The enclosing function, or the value itself for a function.
    pub fn function(&self) -> Option<Value> {
        self.graph.program.function_of(self.id).map(|f| self.spawn(f))
    }

    pub fn object(&self) -> Option<Value> {
        let member = self.instruction()?.member?;
        Some(self.spawn(member.object))
    }

    pub fn key(&self) -> Option<Value> {
        let member = self.instruction()?.member?;
        Some(self.spawn(member.key))
    }

    pub fn masks(&self) -> Values {
        match self.instruction() {
            Some(inst) => self.wrap_all(&inst.masks),
            None => Values::new(),
        }
    }

    pub fn parameters(&self) -> Values {
        match self.kind() {
            Some(InstKind::Function { params, .. }) => self.wrap_all(params),
            _ => Values::new(),
        }
    }

    pub fn free_values(&self) -> Values {
        match self.kind() {
            Some(InstKind::Function { free_values, .. }) => self.wrap_all(free_values),
            _ => Values::new(),
        }
    }

    pub fn returns(&self) -> Values {
        match self.kind() {
            Some(InstKind::Function { returns, .. }) => self.wrap_all(returns),
            _ => Values::new(),
        }
    }

    /// The callee of a call.
    pub fn method(&self) -> Option<Value> {
        match self.kind() {
            Some(InstKind::Call { method, .. }) => Some(self.spawn(*method)),
            _ => None,
        }
    }

    pub fn call_args(&self) -> Values {
        match self.kind() {
            Some(InstKind::Call { args, .. }) => self.wrap_all(args),
            _ => Values::new(),
        }
    }

    /// Same wrapper.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        Arc::ptr_eq(&self.graph, &other.graph) && self.slot == other.slot
    }

    /// Same underlying instruction of the same program.
    pub fn same_node(&self, other: &Value) -> bool {
        self.id == other.id && Arc::ptr_eq(&self.graph.program, &other.graph.program)
    }

    fn same_graph(&self, other: &Value) -> bool {
        if Arc::ptr_eq(&self.graph, &other.graph) {
            return true;
        }
        tracing::debug!(from = %self.id, to = %other.id, "ignoring link across flow graphs");
        false
    }

    fn context(&self, key: ContextKey) -> Option<ContextValue> {
        self.graph
            .read()
            .get(self.slot)
            .and_then(|slot| slot.runtime.get(&key).copied())
    }

    fn set_context(&self, key: ContextKey, value: ContextValue) {
        if let Some(slot) = self.graph.write().get_mut(self.slot) {
            slot.runtime.insert(key, value);
        }
    }

    fn context_value(&self, key: ContextKey) -> Option<Value> {
        match self.context(key)? {
            ContextValue::Value(slot) => self.at(slot),
            _ => None,
        }
    }

    fn set_context_value(&self, key: ContextKey, value: &Value) {
        if self.same_graph(value) {
            self.set_context(key, ContextValue::Value(value.slot));
        }
    }

    pub fn context_keys(&self) -> Vec<ContextKey> {
        self.graph
            .read()
            .get(self.slot)
            .map(|slot| slot.runtime.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn parent(&self) -> Option<Value> {
        self.context_value(ContextKey::Parent)
    }

    pub fn set_parent(&self, parent: &Value) {
        self.set_context_value(ContextKey::Parent, parent);
    }

    /// Signed visit depth: positive for top-def, negative for bottom-use, zero if unvisited.
    pub fn depth(&self) -> i64 {
        match self.context(ContextKey::Depth) {
            Some(ContextValue::Depth(depth)) => depth,
            _ => 0,
        }
    }

    pub fn set_depth(&self, depth: i64) {
        self.set_context(ContextKey::Depth, ContextValue::Depth(depth));
    }

    pub fn is_side_effect(&self) -> bool {
        self.context(ContextKey::SideEffect).is_some()
    }

    /// The side-effect node this wrapper was reached through.
    pub fn side_effect_source(&self) -> Option<Value> {
        self.context_value(ContextKey::SideEffect)
    }

    pub fn set_side_effect(&self, source: &Value) {
        self.set_context_value(ContextKey::SideEffect, source);
    }

    pub fn call_entry(&self) -> Option<Value> {
        self.context_value(ContextKey::CallEntry)
    }

    pub fn set_call_entry(&self, call: &Value) {
        self.set_context_value(ContextKey::CallEntry, call);
    }

    pub(crate) fn result_index(&self) -> Option<usize> {
        match self.context(ContextKey::ResultIndex) {
            Some(ContextValue::Index(index)) => Some(index),
            _ => None,
        }
    }

    pub(crate) fn set_result_index(&self, index: usize) {
        self.set_context(ContextKey::ResultIndex, ContextValue::Index(index));
    }

    /// Records `self -> other` as a dependency and the inverse effect edge. Repeated and
    /// self-referencing links are ignored.
    pub fn append_depend_on(&self, other: &Value) -> &Self {
        if self.same_node(other) || !self.same_graph(other) {
            return self;
        }
        let mut slots = self.graph.write();
        if let Some(slot) = slots.get_mut(self.slot) {
            slot.depends_on.insert(other.slot);
        }
        if let Some(slot) = slots.get_mut(other.slot) {
            slot.effects_on.insert(self.slot);
        }
        self
    }

    pub fn append_effect_on(&self, other: &Value) -> &Self {
        other.append_depend_on(self);
        self
    }

    fn linked(&self, select: impl Fn(&Slot) -> Vec<usize>) -> Values {
        let slots: Vec<usize> = self
            .graph
            .read()
            .get(self.slot)
            .map(select)
            .unwrap_or_default();
        slots.into_iter().filter_map(|slot| self.at(slot)).collect()
    }

    pub fn depend_on(&self) -> Values {
        self.linked(|slot| slot.depends_on.iter().copied().collect())
    }

    pub fn effect_on(&self) -> Values {
        self.linked(|slot| slot.effects_on.iter().copied().collect())
    }

    /// Instructions of everything this wrapper currently depends on.
    pub(crate) fn depend_on_ids(&self) -> Vec<InstId> {
        let slots = self.graph.read();
        match slots.get(self.slot) {
            Some(slot) => slot
                .depends_on
                .iter()
                .filter_map(|s| slots.get(*s).map(|dep| dep.inst))
                .collect(),
            None => Vec::new(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.graph.program.line_disasm(self.id))
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("id", &self.id)
            .field("inst", &self.to_string())
            .field("depth", &self.depth())
            .finish()
    }
}
