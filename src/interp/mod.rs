//! This module contains the tree-walking executor, the alternate
//! terminus of the pipeline. It runs the checked AST directly,
//! skipping the bytecode generator and VM, and must stay
//! observationally identical to them.

pub mod walk;

pub use walk::Interp;
