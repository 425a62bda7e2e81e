use std::path::PathBuf;
use std::process;
use std::rc::Rc;

use anyhow::Context;
use structopt::StructOpt;

use glang::{compiler, Source};

pub mod cli;
pub mod status;

use crate::cli::G;
use crate::status::Status;

fn main() {
    process::exit(run(G::from_args()));
}

fn run(opts: G) -> i32 {
    let file = match &opts.file {
        Some(file) => file.clone(),
        // a bare `g` is a request for help, not a failure
        None => {
            let _ = G::clap().print_long_help();
            println!();
            return 0;
        },
    };

    let source = match read(&file) {
        Ok(source) => source,
        Err(error) => {
            Status::fatal().log(&format!("{:#}", error));
            return 1;
        },
    };

    match execute(&opts, source) {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("{}", error);
            1
        },
    }
}

fn read(file: &PathBuf) -> anyhow::Result<Rc<Source>> {
    Source::path(file).with_context(|| format!("could not read '{}'", file.display()))
}

fn execute(opts: &G, source: Rc<Source>) -> Result<(), glang::Error> {
    if opts.tokens {
        for token in compiler::lex(source) {
            println!("{:?}", token.item);
        }
        return Ok(());
    }

    if opts.ast {
        let program = glang::check(source)?;
        println!("{:#?}", program);
        return Ok(());
    }

    if opts.bytecode {
        let module = glang::compile(source)?;
        print!("{}", module);
        return Ok(());
    }

    if opts.walk {
        glang::walk(source)
    } else {
        glang::run(source)
    }
}
