//! Column Type System
//!
//! This crate provides the scalar type system shared by the statistics
//! crates, including:
//! - Data type definitions for the supported column types
//! - A tagged scalar value representation
//! - SQL-style comparison semantics (NULL-aware, type-strict)

mod data_type;
mod scalar_value;

pub use data_type::DataType;
pub use scalar_value::ScalarValue;
