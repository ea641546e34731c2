// crates/aecp-validation/src/operators/mod.rs
// ============================================================================
// Module: Standard Operators
// Description: Re-exports the six standard validation operators.
// Purpose: Single import point for pipeline construction.
// Dependencies: crate::operators::{extract, normalize, compare, schema,
//              constraints, decide}
// ============================================================================

pub mod compare;
pub mod constraints;
pub mod decide;
pub mod extract;
pub mod normalize;
pub mod schema;

pub use compare::CompareOperator;
pub use constraints::NamedConstraint;
pub use constraints::VerifyConstraintsOperator;
pub use decide::DecideOperator;
pub use decide::DecideOutcome;
pub use decide::Decision;
pub use extract::ExtractOperator;
pub use normalize::NormalizeOperator;
pub use schema::VerifySchemaOperator;
