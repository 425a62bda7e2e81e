//! This module contains the bytecode executor:
//! the machine itself, its call frames, the builtin registry, and
//! runtime error reporting. The registry and operator semantics are
//! shared with the tree-walker in `interp`.

pub mod trace;
pub mod frame;
pub mod builtins;
pub mod vm;

pub use self::vm::Vm;
