/*! Interprocedural data-flow traversal over SSA programs.
 *
 * Two queries answer "where does this come from" and "where does this go":
 * [`Value::get_top_defs`] walks operands backwards to the origins of a value, and
 * [`Value::get_bottom_uses`] walks users forward to its sinks. Both cross function boundaries
 * through calls, parameters, returns, closure captures and side effects, and both terminate on
 * arbitrary recursion.
 *
 * A traversal owns an [`AnalysisContext`] that tracks depth, a global visit ceiling and a stack
 * of function frames managed by the [`CrossProcessManager`]. Visiting the same function boundary
 * twice on one path is refused, which is what bounds mutual recursion. Depth bounds and a
 * per-node hook are supplied as [`OperationOption`]s.
 *
 * ```ignore
 * let values = value.get_top_defs(&[with_max_depth(5)]);
 * for origin in &values {
 *     println!("{}", origin);
 * }
 * ```
 */

mod called_by;
pub mod config;
pub mod context;
pub mod cross_process;
pub mod error;
pub mod options;
pub mod value;
pub mod values;

mod bottom_use;
mod top_def;

pub use config::TraversalConfig;
pub use context::AnalysisContext;
pub use cross_process::CrossProcessManager;
pub use error::{FlowError, Result};
pub use options::{
    with_config, with_depth_limit, with_hook_every_node, with_max_depth, with_min_depth,
    NodeHook, OperationConfig, OperationOption,
};
pub use value::{ContextKey, Value};
pub use values::Values;
