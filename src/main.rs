use clap::Parser;

use record_filter::cli::{self, Cli};

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    cli::init_logging();
    cli::run(args)
}
