/*! Function-boundary bookkeeping for interprocedural traversal.
 *
 * Every time a traversal steps from a node in one function to a node in another, it pushes a
 * frame keyed by the (source, target) pair. Visited sets live in frames, so a value reached again
 * through a different call chain is re-examined, while re-entering the same boundary on the
 * current path is refused. That single rule terminates recursion of any shape.
 */

use crate::{context::AnalysisContext, value::Value};
use sha2::{Digest, Sha256};
use ssaflow_core::{InstId, InstKind};
use std::collections::HashSet;
use std::ops::{Deref, DerefMut};

#[derive(Debug)]
struct ProcessFrame {
    hash: String,
    visited_values: HashSet<InstId>,
    visited_members: HashSet<String>,
}

impl ProcessFrame {
    fn new(hash: String) -> Self {
        Self {
            hash,
            visited_values: HashSet::new(),
            visited_members: HashSet::new(),
        }
    }
}

#[derive(Debug)]
pub struct CrossProcessManager {
    frames: Vec<ProcessFrame>,
    node_stack: Vec<Value>,
    cause_stack: Vec<Value>,
}

impl Default for CrossProcessManager {
    fn default() -> Self {
        Self::new()
    }
}

impl CrossProcessManager {
    pub fn new() -> Self {
        Self {
            frames: vec![ProcessFrame::new(String::new())],
            node_stack: Vec::new(),
            cause_stack: Vec::new(),
        }
    }

    /// Number of frames including the root one.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn current_hash(&self) -> &str {
        self.frames.last().map(|f| f.hash.as_str()).unwrap_or_default()
    }

    /// The most recently visited node on the current path.
    pub fn last_visited(&self) -> Option<&Value> {
        self.node_stack.last()
    }

    pub fn path_len(&self) -> usize {
        self.node_stack.len()
    }

    /// Nodes that triggered each boundary crossing, outermost first.
    pub fn causes(&self) -> &[Value] {
        &self.cause_stack
    }

    /// True when both nodes belong to known functions and those differ.
    pub fn need_cross_process(from: &Value, to: &Value) -> bool {
        let program = from.program();
        match (program.function_of(from.id()), program.function_of(to.id())) {
            (Some(a), Some(b)) => a != b,
            _ => false,
        }
    }

    pub fn cross_process_hash(from: &Value, to: &Value) -> String {
        let mut hasher = Sha256::new();
        hasher.update(from.id().0.to_le_bytes());
        hasher.update(to.id().0.to_le_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn member_hash(object: InstId, key: InstId, member: InstId) -> String {
        let mut hasher = Sha256::new();
        for id in [object, key, member] {
            hasher.update(id.0.to_le_bytes());
        }
        format!("{:x}", hasher.finalize())
    }

    /// The innermost call on the current path that invoked `function`.
    pub fn cause_call(&self, function: InstId) -> Option<Value> {
        for cause in self.cause_stack.iter().rev() {
            match cause.kind() {
                Some(InstKind::Call { method, .. }) if *method == function => {
                    return Some(cause.clone())
                }
                Some(InstKind::Call { .. }) => {}
                Some(_) => {
                    tracing::trace!(cause = %cause, "non-call cause on call stack");
                }
                None => {
                    tracing::warn!(cause = ?cause.id(), "cause refers to unknown instruction");
                }
            }
        }
        None
    }

    fn frame_mut(&mut self) -> Option<&mut ProcessFrame> {
        self.frames.last_mut()
    }
}

pub(crate) enum Undo {
    Frame,
    Value(InstId),
    Member(String),
}

/// Restores cross-process state when the expansion that acquired it returns.
pub(crate) struct ProcessGuard<'a> {
    ctx: &'a mut AnalysisContext,
    undo: Option<Undo>,
}

impl Deref for ProcessGuard<'_> {
    type Target = AnalysisContext;

    fn deref(&self) -> &AnalysisContext {
        self.ctx
    }
}

impl DerefMut for ProcessGuard<'_> {
    fn deref_mut(&mut self) -> &mut AnalysisContext {
        self.ctx
    }
}

impl Drop for ProcessGuard<'_> {
    fn drop(&mut self) {
        let manager = &mut self.ctx.cross_process;
        match self.undo.take() {
            Some(Undo::Frame) => {
                if manager.frames.len() > 1 {
                    manager.frames.pop();
                }
                manager.cause_stack.pop();
            }
            Some(Undo::Value(id)) => {
                if let Some(frame) = manager.frame_mut() {
                    frame.visited_values.remove(&id);
                }
                manager.node_stack.pop();
            }
            Some(Undo::Member(hash)) => {
                if let Some(frame) = manager.frame_mut() {
                    frame.visited_members.remove(&hash);
                }
            }
            None => {}
        }
    }
}

impl AnalysisContext {
    fn guard(&mut self, undo: Option<Undo>) -> ProcessGuard<'_> {
        ProcessGuard { ctx: self, undo }
    }

    /// Enters `target`'s function if it differs from the last visited node's. `None` means
    /// this boundary is already open on the current path and `target` must be a leaf.
    pub(crate) fn try_cross_process(&mut self, target: &Value) -> Option<ProcessGuard<'_>> {
        let from = self
            .cross_process
            .last_visited()
            .filter(|from| CrossProcessManager::need_cross_process(from, target))
            .cloned();
        let Some(from) = from else {
            return Some(self.guard(None));
        };
        let hash = CrossProcessManager::cross_process_hash(&from, target);
        if self.cross_process.frames.iter().any(|f| f.hash == hash) {
            tracing::debug!(from = %from, to = %target, "boundary already open, stopping");
            return None;
        }
        tracing::trace!(from = %from, to = %target, "crossing function boundary");
        self.cross_process.frames.push(ProcessFrame::new(hash));
        self.cross_process.cause_stack.push(from);
        Some(self.guard(Some(Undo::Frame)))
    }

    /// Marks `value` visited in the current frame and pushes it on the path. `None` means it
    /// is already on the path in this frame.
    pub(crate) fn value_should(&mut self, value: &Value) -> Option<ProcessGuard<'_>> {
        let manager = &mut self.cross_process;
        let frame = manager.frames.last_mut()?;
        if !frame.visited_values.insert(value.id()) {
            return None;
        }
        manager.node_stack.push(value.clone());
        Some(self.guard(Some(Undo::Value(value.id()))))
    }

    /// Marks the member `object.key` read as `member` visited in the current frame.
    pub(crate) fn object_should(
        &mut self,
        object: InstId,
        key: InstId,
        member: InstId,
    ) -> Option<ProcessGuard<'_>> {
        let hash = CrossProcessManager::member_hash(object, key, member);
        let frame = self.cross_process.frame_mut()?;
        if !frame.visited_members.insert(hash.clone()) {
            return None;
        }
        Some(self.guard(Some(Undo::Member(hash))))
    }
}
