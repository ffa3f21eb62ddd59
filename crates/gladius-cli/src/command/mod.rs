use clap::{Parser, Subcommand};

use self::{fight::FightArg, history::HistoryArg, train::TrainArg};

mod fight;
mod history;
mod train;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Evolve a population of duelists with the genetic algorithm
    Train(#[clap(flatten)] TrainArg),
    /// Run a single battle between two exported genomes
    Fight(#[clap(flatten)] FightArg),
    /// Print the fitness history of a checkpoint as CSV
    History(#[clap(flatten)] HistoryArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Train(arg) => train::run(&arg)?,
        Mode::Fight(arg) => fight::run(&arg)?,
        Mode::History(arg) => history::run(&arg)?,
    }
    Ok(())
}
