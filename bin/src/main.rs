use clap::Parser;
use lb_core::data;
use lb_core::oracle::Oracle;
use lb_core::replay::ReplayPolicy;
use lb_core::solvers::{solve, solve_best_first, SolverConfig, Trajectory};
use lb_core::structs::Game;
use letter_boxed_core as lb_core;
use rand::{rngs::StdRng, SeedableRng};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "letter-boxed")]
#[command(about = "Find short Letter Boxed solutions by annealed random walks")]
struct Cli {
    /// Word list, one word per line, or a `.json` array of objects keyed by word
    #[arg(short, long)]
    dictionary: PathBuf,
    /// Board letters, top side first then clockwise; sampled when omitted
    #[arg(short, long)]
    letters: Option<String>,
    /// Letters per side when sampling a board
    #[arg(short, long, default_value_t = 3)]
    side_size: usize,
    /// Trials per starting letter
    #[arg(short, long, default_value_t = SolverConfig::default().trials)]
    trials: usize,
    /// Words looked ahead per step
    #[arg(long, default_value_t = SolverConfig::default().depth)]
    depth: usize,
    #[arg(long, default_value_t = SolverConfig::default().initial_temperature)]
    temperature: f64,
    #[arg(long, default_value_t = SolverConfig::default().max_words)]
    max_words: usize,
    #[arg(long, default_value_t = SolverConfig::default().seed)]
    seed: u64,
    /// Rotate through the paths of a word instead of always starting over
    #[arg(long)]
    circular: bool,
    /// Deterministic best-first search instead of annealed random walks
    #[arg(long)]
    best_first: bool,
    /// Write the explored graph as nodes.csv and edges.csv into this directory
    #[arg(long)]
    graph_dir: Option<PathBuf>,
}

impl Cli {
    fn config(&self) -> SolverConfig {
        SolverConfig {
            trials: self.trials,
            depth: self.depth,
            initial_temperature: self.temperature,
            max_words: self.max_words,
            seed: self.seed,
            policy: if self.circular {
                ReplayPolicy::Circular
            } else {
                ReplayPolicy::Restart
            },
        }
    }
}

fn write_graph(oracle: &Oracle, dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(dir)?;
    let export = oracle.graph_export();

    let mut nodes = csv::Writer::from_path(dir.join("nodes.csv"))?;
    for node in &export.nodes {
        nodes.serialize(node)?;
    }
    nodes.flush()?;

    let mut edges = csv::Writer::from_path(dir.join("edges.csv"))?;
    for edge in &export.edges {
        edges.serialize(edge)?;
    }
    edges.flush()?;

    log::info!(
        "Wrote {} nodes and {} edges to {}",
        export.nodes.len(),
        export.edges.len(),
        dir.display()
    );
    Ok(())
}

fn best_first(oracle: &mut Oracle) -> Result<Trajectory, Box<dyn std::error::Error>> {
    let mut best: Option<Trajectory> = None;
    for start_index in 0..oracle.game().board().len() {
        let Some(trajectory) = solve_best_first(oracle, start_index) else {
            continue;
        };
        if best.as_ref().map(|b| trajectory.is_better_than(b)).unwrap_or(true) {
            best = Some(trajectory);
        }
    }
    Ok(best.ok_or("Best-first search found no solution")?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.config();
    let mut rng = StdRng::seed_from_u64(config.seed);

    let dictionary = match cli.dictionary.extension().and_then(|e| e.to_str()) {
        Some("json") => data::load_json(&cli.dictionary)?,
        _ => data::load_words(&cli.dictionary)?,
    };
    log::info!("{} words in dictionary", dictionary.len());

    let letters = match &cli.letters {
        Some(letters) => letters.chars().collect::<Vec<_>>(),
        None => data::sample_letters(cli.side_size, &mut rng),
    };
    let game = Game::new(letters)?;
    println!("{}", game.to_ascii());

    let mut oracle = Oracle::with_policy(game, &dictionary, config.policy);
    let result = if cli.best_first {
        best_first(&mut oracle)
    } else {
        solve(&mut oracle, &config, &mut rng).map_err(Into::into)
    };

    if let Some(dir) = &cli.graph_dir {
        write_graph(&oracle, dir)?;
    }

    let best = result?;
    for (word, (path, state)) in best.words.iter().zip(best.paths.iter().zip(&best.states)) {
        println!("{word:<15} {path:?}");
        println!("{}", state.to_ascii());
    }
    println!("{best}");

    Ok(())
}
