//! # G
//! This crate contains the core of the G programming language:
//! the compiler, the VM, and the tree-walking interpreter.
//! If you're looking for the `g` command line tool, that lives in
//! the `glang-cli` crate next door.
//!
//! ## Embedding G in Rust
//! ```no_run
//! use glang::Source;
//!
//! fn main() {
//!     glang::run(Source::source("import io\nio.print(\"Hello from G!\")\n")).unwrap();
//! }
//! ```
//!
//! ## Overview of the pipeline
//! Source code moves through five stages, each owning its output:
//! scanning (`compiler::lex`), parsing (`compiler::parse`), semantic
//! analysis (`compiler::analyze`), bytecode generation
//! (`compiler::gen`), and execution (`vm::Vm`). The tree-walker
//! (`interp::Interp`) is an alternate final stage that runs the
//! checked AST directly; both executors behave identically.
//!
//! Static errors stop the pipeline before anything runs. Runtime
//! errors are printed, produce `none`, and the program continues.

use std::rc::Rc;

use thiserror::Error;

pub mod common;
pub mod compiler;
pub mod interp;
pub mod vm;

pub use crate::common::module::Module;
pub use crate::common::source::Source;
pub use crate::common::value::Value;
pub use crate::compiler::ast::Program;
pub use crate::compiler::syntax::Syntax;

/// A static error that stopped the pipeline. Runtime errors never
/// surface here; they print and the program continues.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{}", display_syntax(.0))]
    Syntax(Vec<Syntax>),
    #[error("{}", display_semantic(.0))]
    Semantic(Vec<String>),
}

fn display_syntax(errors: &[Syntax]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<String>>()
        .join("\n")
}

fn display_semantic(errors: &[String]) -> String {
    errors
        .iter()
        .map(|e| format!("Semantic Error: {}", e))
        .collect::<Vec<String>>()
        .join("\n")
}

/// Scans, parses, and checks a source, producing the AST both
/// executors accept.
pub fn check(source: Rc<Source>) -> Result<Program, Error> {
    let tokens = compiler::lex(source);
    let program = compiler::parse(tokens).map_err(Error::Syntax)?;
    compiler::analyze(&program).map_err(Error::Semantic)?;

    Ok(program)
}

/// Compiles a source all the way to a bytecode module.
pub fn compile(source: Rc<Source>) -> Result<Module, Error> {
    let program = check(source)?;
    Ok(compiler::gen(&program))
}

/// Compiles and runs a source on the VM.
pub fn run(source: Rc<Source>) -> Result<(), Error> {
    let module = compile(source)?;
    vm::Vm::new().run(&module);

    Ok(())
}

/// Checks and runs a source on the tree-walking interpreter.
pub fn walk(source: Rc<Source>) -> Result<(), Error> {
    let program = check(source)?;
    interp::Interp::new().run(&program);

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn syntax_errors_stop_the_pipeline() {
        let result = compile(Source::source("var\n"));
        match result {
            Err(Error::Syntax(errors)) => assert!(!errors.is_empty()),
            _ => panic!("expected a syntax error"),
        }
    }

    #[test]
    fn semantic_errors_stop_the_pipeline() {
        let result = compile(Source::source("x = 1\n"));
        match result {
            Err(Error::Semantic(errors)) => {
                assert!(errors[0].contains("Undeclared identifier"));
            },
            _ => panic!("expected a semantic error"),
        }
    }

    #[test]
    fn error_display_is_one_message_per_line() {
        let result = compile(Source::source("x = 1\ny = 2\n"));
        if let Err(error) = result {
            let shown = error.to_string();
            assert_eq!(shown.lines().count(), 2);
            assert!(shown.lines().all(|l| l.starts_with("Semantic Error: ")));
        } else {
            panic!("expected an error");
        }
    }

    #[test]
    fn well_formed_programs_compile() {
        let module = compile(Source::source(
            "import io\nfunc main(): int {\n io.print(\"ok\")\n return 0 \n}\n",
        ))
        .expect("should compile");

        assert!(!module.code.is_empty());
        assert!(module.labels.contains_key("main"));
    }
}
