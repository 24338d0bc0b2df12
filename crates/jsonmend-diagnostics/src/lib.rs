#![doc = include_str!("../README.md")]
#![allow(unused_assignments)] // thiserror/miette derive macros trigger false positives

pub mod fix;
pub mod validation;

pub use fix::{Fix, FixKind, Position, Severity};
pub use validation::{SyntaxDiagnostic, ValidationError, line_col_to_offset, offset_to_line_col};
