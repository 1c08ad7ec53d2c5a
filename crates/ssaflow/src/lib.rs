/*! Unified interface for interprocedural SSA data-flow queries.
 *
 * Single import for building a program graph and asking where its values come from and where
 * they go. Re-exports the instruction graph from `ssaflow-core` and the traversal engine from
 * `ssaflow-dataflow`.
 */

pub use ssaflow_core as core;
pub use ssaflow_dataflow as dataflow;

pub use ssaflow_core::{
    builder::{FunctionBuilder, ProgramBuilder},
    instructions::{InstKind, Instruction, Opcode},
    program::Program,
    values::{Constant, InstId},
};

pub use ssaflow_dataflow::{
    with_config, with_depth_limit, with_hook_every_node, with_max_depth, with_min_depth,
    FlowError, OperationOption, TraversalConfig, Value, Values,
};
