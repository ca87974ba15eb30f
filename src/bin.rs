use clap::Parser;
use crossfill_core::backtracking_search::FillFailure;
use crossfill_core::grid_config::{parse_structure, render_grid, Crossword};
use crossfill_core::image_export::save_image;
use crossfill_core::solver::{find_fill, SolverConfig};
use crossfill_core::word_list::WordList;
use std::fmt::{Debug, Formatter};
use std::fs;
use std::time::Duration;

/// crossfill: Command-line crossword filling tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the structure file, with _ (or .) representing empty squares and # representing
    /// blocks
    structure: String,

    /// Path to a word list file, with one word per line
    words: String,

    /// Path to save an image of the filled grid to (PNG), in addition to printing it
    output: Option<String>,

    /// Give up after this many seconds [default: none]
    #[arg(long)]
    timeout: Option<f64>,

    /// Try words in word list order instead of least-constraining-value order
    #[arg(long)]
    no_lcv: bool,

    /// Skip arc consistency propagation after each tentative choice
    #[arg(long)]
    no_inference: bool,
}

struct Error(String);

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0) // Print error unquoted
    }
}

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    let raw_structure = fs::read_to_string(&args.structure)
        .map_err(|_| Error(format!("Couldn't read file '{}'", args.structure)))?;
    let structure = parse_structure(&raw_structure).map_err(|err| Error(err.to_string()))?;

    let max_side = structure.len().max(structure[0].len());
    let word_list = WordList::from_file(&args.words, Some(max_side))
        .map_err(|err| Error(err.to_string()))?;

    let crossword = Crossword::new(structure, word_list).map_err(|err| Error(err.to_string()))?;

    let config = SolverConfig {
        timeout: parse_timeout(args.timeout)?,
        order_values: !args.no_lcv,
        maintain_arc_consistency: !args.no_inference,
        ..SolverConfig::default()
    };

    let result = match find_fill(&crossword, &config) {
        Ok(result) => result,
        Err(FillFailure::HardFailure) => {
            println!("No solution.");
            return Ok(());
        }
        Err(failure) => return Err(Error(format!("Fill failed: {failure}"))),
    };

    println!("{}", render_grid(&crossword, &result.assignment));

    if let Some(output) = &args.output {
        save_image(&crossword, &result.assignment, output)
            .map_err(|err| Error(format!("Couldn't save '{output}': {err}")))?;
    }

    Ok(())
}

fn parse_timeout(seconds: Option<f64>) -> Result<Option<Duration>, Error> {
    seconds
        .map(|seconds| {
            Duration::try_from_secs_f64(seconds).map_err(|_| {
                Error("If given, timeout must be a non-negative number of seconds".into())
            })
        })
        .transpose()
}
