use crate::{config::TraversalConfig, error::Result, value::Value};
use std::fmt;
use std::sync::Arc;

/// Invoked once per visited node, before expansion. Returning an error truncates the branch
/// at that node; [`crate::FlowError::Abort`] does so silently.
pub type NodeHook = Arc<dyn Fn(&Value) -> Result<()> + Send + Sync>;

/// A single knob passed to [`Value::get_top_defs`] or [`Value::get_bottom_uses`].
#[derive(Clone)]
pub enum OperationOption {
    MaxDepth(i64),
    MinDepth(i64),
    /// Bounds both directions: `n` levels up and `n` levels down.
    DepthLimit(i64),
    HookEveryNode(NodeHook),
    Config(TraversalConfig),
}

impl fmt::Debug for OperationOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationOption::MaxDepth(n) => f.debug_tuple("MaxDepth").field(n).finish(),
            OperationOption::MinDepth(n) => f.debug_tuple("MinDepth").field(n).finish(),
            OperationOption::DepthLimit(n) => f.debug_tuple("DepthLimit").field(n).finish(),
            OperationOption::HookEveryNode(_) => f.write_str("HookEveryNode(..)"),
            OperationOption::Config(c) => f.debug_tuple("Config").field(c).finish(),
        }
    }
}

pub fn with_max_depth(depth: i64) -> OperationOption {
    OperationOption::MaxDepth(depth)
}

pub fn with_min_depth(depth: i64) -> OperationOption {
    OperationOption::MinDepth(depth)
}

pub fn with_depth_limit(depth: i64) -> OperationOption {
    OperationOption::DepthLimit(depth)
}

pub fn with_hook_every_node<F>(hook: F) -> OperationOption
where
    F: Fn(&Value) -> Result<()> + Send + Sync + 'static,
{
    OperationOption::HookEveryNode(Arc::new(hook))
}

pub fn with_config(config: TraversalConfig) -> OperationOption {
    OperationOption::Config(config)
}

/// Resolved options for one traversal. `max_depth` bounds the positive (top-def) depth and is
/// unbounded when negative; `min_depth` bounds the negative (bottom-use) depth and is unbounded
/// unless negative.
#[derive(Clone)]
pub struct OperationConfig {
    pub max_depth: i64,
    pub min_depth: i64,
    pub hook_every_node: Option<NodeHook>,
    pub traversal: TraversalConfig,
}

impl Default for OperationConfig {
    fn default() -> Self {
        Self {
            max_depth: -1,
            min_depth: 0,
            hook_every_node: None,
            traversal: TraversalConfig::global().clone(),
        }
    }
}

impl fmt::Debug for OperationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationConfig")
            .field("max_depth", &self.max_depth)
            .field("min_depth", &self.min_depth)
            .field("hook_every_node", &self.hook_every_node.is_some())
            .field("traversal", &self.traversal)
            .finish()
    }
}

impl OperationConfig {
    /// Later options override earlier ones.
    pub fn from_options(options: &[OperationOption]) -> Self {
        let mut config = Self::default();
        for option in options {
            match option {
                OperationOption::MaxDepth(n) => config.max_depth = *n,
                OperationOption::MinDepth(n) => config.min_depth = *n,
                OperationOption::DepthLimit(n) => {
                    config.max_depth = *n;
                    config.min_depth = -n.abs();
                }
                OperationOption::HookEveryNode(hook) => {
                    config.hook_every_node = Some(Arc::clone(hook))
                }
                OperationOption::Config(traversal) => config.traversal = traversal.clone(),
            }
        }
        config
    }

    pub fn has_max_depth(&self) -> bool {
        self.max_depth >= 0
    }

    pub fn has_min_depth(&self) -> bool {
        self.min_depth < 0
    }
}
