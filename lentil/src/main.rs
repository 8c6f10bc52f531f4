mod common;
mod run_aggregate;
mod run_label;
mod run_pair_score;
mod run_score;

use crate::common::*;
use run_aggregate::*;
use run_label::*;
use run_pair_score::*;
use run_score::*;

#[derive(Parser, Debug)]
#[command(version, about, long_about, term_width = 80)]
struct Cli {
    #[command(subcommand)]
    commands: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reduce melted (tf, peak, gene, evidence) records into a wide
    /// edge x evidence feature matrix
    Aggregate(AggregateArgs),

    /// Label the edges of a feature matrix against reference networks
    Label(LabelArgs),

    /// Collapse edge scores into (tf, gene) pair scores
    PairScore(PairScoreArgs),

    /// Score the edges of a feature matrix with a fitted linear model
    Score(ScoreArgs),
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match &cli.commands {
        Commands::Aggregate(args) => {
            run_aggregate(args)?;
        }
        Commands::Label(args) => {
            run_label(args)?;
        }
        Commands::PairScore(args) => {
            run_pair_score(args)?;
        }
        Commands::Score(args) => {
            run_score(args)?;
        }
    }

    Ok(())
}
