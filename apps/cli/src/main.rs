//! curriculum-graph CLI: turn a positioned-token dump of a curriculum PDF
//! into a SKOS/ELM knowledge graph.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
