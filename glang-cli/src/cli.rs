use std::path::PathBuf;

use structopt::StructOpt;

/// Arguments for the `g` binary.
/// The default action runs the file on the VM; the dump flags stop
/// the pipeline at the matching stage and print its output.
#[derive(StructOpt, Debug)]
#[structopt(name = "g", bin_name = "g", about)]
pub struct G {
    /// The G source file to run
    pub file: Option<PathBuf>,

    /// Run on the tree-walking interpreter instead of the VM
    #[structopt(long)]
    pub walk: bool,

    /// Print the token stream and exit
    #[structopt(long)]
    pub tokens: bool,

    /// Print the parsed AST and exit
    #[structopt(long)]
    pub ast: bool,

    /// Print the compiled bytecode and exit
    #[structopt(long)]
    pub bytecode: bool,
}
