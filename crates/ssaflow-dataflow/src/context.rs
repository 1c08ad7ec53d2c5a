use crate::{
    cross_process::CrossProcessManager, error::FlowError, options::OperationConfig, value::Value,
};
use std::ops::{Deref, DerefMut};

/// Stack left free before a traversal step moves onto a fresh segment.
const STACK_RED_ZONE: usize = 256 * 1024;
/// Size of each heap-allocated stack segment.
const STACK_SEGMENT: usize = 4 * 1024 * 1024;

/// Runs one traversal step, growing the stack on the heap when the native one runs low.
///
/// Traversal depth is bounded by the recursion ceiling rather than by the thread's stack, so
/// every recursive step goes through here.
pub(crate) fn with_stack<R>(step: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, step)
}

/// Mutable state of one top-level traversal.
///
/// A context is created per `get_top_defs` / `get_bottom_uses` call and never shared, so it
/// needs no locking. Depth and visit bookkeeping is restored by guards on every return path.
pub struct AnalysisContext {
    config: OperationConfig,
    depth: i64,
    recursion_count: usize,
    have_reached_depth_limit: bool,
    pub(crate) cross_process: CrossProcessManager,
}

impl AnalysisContext {
    pub fn new(config: OperationConfig) -> Self {
        Self {
            config,
            depth: 0,
            recursion_count: 0,
            have_reached_depth_limit: false,
            cross_process: CrossProcessManager::new(),
        }
    }

    pub fn config(&self) -> &OperationConfig {
        &self.config
    }

    pub fn depth(&self) -> i64 {
        self.depth
    }

    pub fn recursion_count(&self) -> usize {
        self.recursion_count
    }

    /// Whether any branch of this traversal was cut by a depth bound.
    pub fn have_reached_depth_limit(&self) -> bool {
        self.have_reached_depth_limit
    }

    pub fn cross_process(&self) -> &CrossProcessManager {
        &self.cross_process
    }

    /// Moves one level in the direction of `step` until the guard drops.
    pub(crate) fn enter(&mut self, step: i64) -> DepthGuard<'_> {
        self.depth += step;
        DepthGuard { ctx: self, step }
    }

    /// Counts a visit and reports whether the traversal must stop at `value`.
    pub(crate) fn check(&mut self, value: &Value) -> bool {
        self.recursion_count += 1;
        let limit = self.config.traversal.recursion_limit;
        if self.recursion_count > limit {
            if self.recursion_count == limit + 1 {
                tracing::warn!(limit, value = %value, "recursion ceiling reached, truncating");
            }
            return true;
        }

        let exceeded = if self.depth > 0 {
            self.config.has_max_depth() && self.depth > self.config.max_depth
        } else {
            self.config.has_min_depth() && self.depth < self.config.min_depth
        };
        if exceeded {
            if !self.have_reached_depth_limit {
                tracing::debug!(depth = self.depth, value = %value, "depth limit reached");
            }
            self.have_reached_depth_limit = true;
        }
        exceeded
    }

    /// Runs the node hook; `false` means the branch ends at `value`.
    pub(crate) fn hook(&self, value: &Value) -> bool {
        let Some(hook) = &self.config.hook_every_node else {
            return true;
        };
        match hook(value) {
            Ok(()) => true,
            Err(FlowError::Abort) => {
                tracing::trace!(value = %value, "hook aborted branch");
                false
            }
            Err(err) => {
                tracing::warn!(error = %err, value = %value, "node hook failed");
                false
            }
        }
    }
}

pub(crate) struct DepthGuard<'a> {
    ctx: &'a mut AnalysisContext,
    step: i64,
}

impl Deref for DepthGuard<'_> {
    type Target = AnalysisContext;

    fn deref(&self) -> &AnalysisContext {
        self.ctx
    }
}

impl DerefMut for DepthGuard<'_> {
    fn deref_mut(&mut self) -> &mut AnalysisContext {
        self.ctx
    }
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.ctx.depth -= self.step;
    }
}
