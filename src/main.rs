use clap::Parser;
use tascan::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
