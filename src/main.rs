use clap::Parser;
use crop_advisor::cli::{dispatch, Cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    dispatch(cli)
}
