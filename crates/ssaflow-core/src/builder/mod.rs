/*! Fluent API for constructing programs by hand.
 *
 * Front ends and tests both need to wire SSA graphs without tracking arena slots, parameter
 * positions or users. These builders assign ids, keep function signatures in sync with the
 * parameters and returns added to them, and defer validation to `finish`.
 */

pub mod function_builder;
pub mod program_builder;

pub use function_builder::FunctionBuilder;
pub use program_builder::ProgramBuilder;
