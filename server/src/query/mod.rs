//! Query interpretation for the document store.
//!
//! A query is a JSON object. Each entry `{field: condition}` constrains
//! one document field; `$or` / `$and` compose sub-queries. The evaluator
//! tests a single document against a query; the planner classifies a
//! query so a collection can answer it from a secondary index instead of
//! scanning.

mod evaluator;
mod like;
mod plan;

pub use evaluator::{evaluate_query, value_eq};
pub use like::like_match;
pub use plan::{BTreePlan, HashPlan, QueryPlan};
