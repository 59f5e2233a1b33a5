//! Query construction and execution: expressions, descriptors, the
//! execution engine, result shaping, and the backing-store contract.

pub mod executor;
pub mod query;
pub mod response;
pub mod store;
