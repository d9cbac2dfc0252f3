use core::fmt;
use fxhash::{FxHashMap, FxHashSet};
use ndarray::Array1;
use rand::{
    distributions::{Distribution, WeightedIndex},
    Rng,
};
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use thiserror::Error;

use crate::{
    graph::NodeId,
    oracle::Oracle,
    replay::ReplayPolicy,
    structs::{Game, Path},
};

/// Exponent applied to route scores before normalising, so that better routes
/// dominate while worse ones keep some mass.
const SCORE_EXPONENT: i32 = 10;
const MAX_NOISE: f64 = 10.;

#[derive(Error, Debug)]
pub enum SolveError {
    #[error("No solution found within {trials} trials per starting letter")]
    NoSolution { trials: usize },
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    pub trials: usize,
    pub depth: usize,
    pub initial_temperature: f64,
    pub max_words: usize,
    pub seed: u64,
    pub policy: ReplayPolicy,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            trials: 1_000,
            depth: 1,
            initial_temperature: 1.,
            max_words: 32,
            seed: 69420,
            policy: ReplayPolicy::Restart,
        }
    }
}

impl SolverConfig {
    /// Linear annealing from the initial temperature towards zero.
    pub fn temperature(&self, trial: usize) -> f64 {
        if self.trials == 0 {
            return self.initial_temperature;
        }
        self.initial_temperature * (1. - trial as f64 / self.trials as f64)
    }
}

/// The outcome of one [`visit`]: the words chosen, their paths and the nodes
/// they lead to.
#[derive(Debug, Clone, PartialEq)]
pub struct Visit {
    pub words: Vec<String>,
    pub paths: Vec<Path>,
    pub nodes: Vec<NodeId>,
}

/// One attempted solution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    pub words: Vec<String>,
    pub paths: Vec<Path>,
    pub states: Vec<Game>,
}

impl Trajectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_words_states(&mut self, words: Vec<String>, paths: Vec<Path>, states: Vec<Game>) {
        self.words.extend(words);
        self.paths.extend(paths);
        self.states.extend(states);
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn is_fail(&self) -> bool {
        self.states.last().map(|s| !s.is_win()).unwrap_or(true)
    }

    /// Whether `self` should replace `best`: any success beats a failure, and
    /// among successes the shorter (or equally short) one wins.
    pub fn is_better_than(&self, best: &Trajectory) -> bool {
        match (self.is_fail(), best.is_fail()) {
            (false, true) => true,
            (false, false) => self.len() <= best.len(),
            _ => false,
        }
    }
}

impl fmt::Display for Trajectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.words.join(" -> "))?;
        match self.states.last() {
            Some(state) => write!(f, " [{state}]"),
            None => Ok(()),
        }
    }
}

/// Takes one stochastic step out of `node`.
///
/// Every route of `depth` hops is weighted by its score raised to the 10th
/// power, flattened by uniform noise scaled with `temperature`, and one route
/// is sampled. `None` at a winning node, at a dead end, or when no route
/// gains anything.
///
/// The first returned path comes from the node's own edge map; later hops use
/// the paths recorded along the sampled route.
pub fn visit<R: Rng>(
    oracle: &mut Oracle,
    node: NodeId,
    temperature: f64,
    depth: usize,
    rng: &mut R,
) -> Option<Visit> {
    if oracle.node(node).game().is_win() {
        return None;
    }

    oracle.find_edges(node, depth);
    let mut scores = oracle.compute_scores(node, depth);
    if scores.is_empty() {
        return None;
    }

    let mut p_scores = scores
        .iter()
        .map(|s| s.score.powi(SCORE_EXPONENT))
        .collect::<Array1<f64>>();
    let sum_scores = p_scores.sum();
    if sum_scores == 0. {
        return None;
    }
    p_scores /= sum_scores;

    let noise = Array1::from_shape_fn(p_scores.len(), |_| {
        (rng.gen::<f64>() * temperature).clamp(0., MAX_NOISE)
    });
    p_scores += &noise;
    let total = p_scores.sum();
    p_scores /= total;

    let chosen = WeightedIndex::new(p_scores.iter()).ok()?.sample(rng);
    let deep_score = scores.swap_remove(chosen);

    let root = oracle.node(node);
    let paths = deep_score
        .words
        .iter()
        .zip(&deep_score.paths)
        .enumerate()
        .map(|(hop, (word, path))| match root.edge(word) {
            Some(edge) if hop == 0 => edge.path.clone(),
            _ => path.clone(),
        })
        .collect();

    Some(Visit {
        words: deep_score.words,
        paths,
        nodes: deep_score.nodes,
    })
}

/// Walks from the empty state at `start_index` until [`visit`] gives up or
/// the word cap is hit.
pub fn run_trial<R: Rng>(
    oracle: &mut Oracle,
    start_index: usize,
    temperature: f64,
    config: &SolverConfig,
    rng: &mut R,
) -> Trajectory {
    let mut node = oracle.root(start_index);
    let mut trajectory = Trajectory::new();

    while trajectory.len() < config.max_words {
        let Some(Visit { words, paths, nodes }) =
            visit(oracle, node, temperature, config.depth, rng)
        else {
            break;
        };
        let Some(&last) = nodes.last() else {
            break;
        };
        let states = nodes
            .iter()
            .map(|&n| oracle.node(n).game().clone())
            .collect();
        trajectory.add_words_states(words, paths, states);
        node = last;
    }

    trajectory
}

/// Best trajectory starting at `start_index` over `config.trials` annealed
/// trials, successful or not.
pub fn solve_from<R: Rng>(
    oracle: &mut Oracle,
    start_index: usize,
    config: &SolverConfig,
    rng: &mut R,
) -> Option<Trajectory> {
    let mut best: Option<Trajectory> = None;
    for trial in 0..config.trials {
        let temperature = config.temperature(trial);
        let trajectory = run_trial(oracle, start_index, temperature, config, rng);
        let improved = best
            .as_ref()
            .map(|b| trajectory.is_better_than(b))
            .unwrap_or(true);
        if improved {
            log::debug!(
                "start {start_index}, trial {trial}, T = {temperature:.3}: {trajectory}"
            );
            best = Some(trajectory);
        }
    }
    best
}

/// Tries every starting position and keeps the shortest winning trajectory.
pub fn solve<R: Rng>(
    oracle: &mut Oracle,
    config: &SolverConfig,
    rng: &mut R,
) -> Result<Trajectory, SolveError> {
    let letters = oracle.game().board().flat_letters().to_vec();
    let mut best: Option<Trajectory> = None;

    for (start_index, letter) in letters.into_iter().enumerate() {
        log::debug!("Starting letter: {letter} at index {start_index}");
        let Some(trajectory) = solve_from(oracle, start_index, config, rng) else {
            continue;
        };
        let improved = best
            .as_ref()
            .map(|b| trajectory.is_better_than(b))
            .unwrap_or(true);
        if improved {
            best = Some(trajectory);
        }
    }

    log::debug!("{} graph nodes cached", oracle.node_count());
    match best {
        Some(best) if !best.is_fail() => {
            log::info!("Solved in {} words: {best}", best.len());
            Ok(best)
        }
        _ => Err(SolveError::NoSolution {
            trials: config.trials,
        }),
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Frontier {
    score: usize,
    order: Reverse<usize>,
    node: NodeId,
}

impl Ord for Frontier {
    // higher coverage first, then first pushed
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .cmp(&other.score)
            .then_with(|| self.order.cmp(&other.order))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Deterministic search from the empty state at `start_index`, always
/// expanding the reachable node with the most coverage. Only words that cover
/// something new are followed. Returns the first winning chain it reaches,
/// which is not necessarily the shortest.
pub fn solve_best_first(oracle: &mut Oracle, start_index: usize) -> Option<Trajectory> {
    let root = oracle.root(start_index);
    let mut pushed = 0;
    let mut queue = BinaryHeap::from([Frontier {
        score: oracle.node(root).game().score(),
        order: Reverse(pushed),
        node: root,
    }]);
    let mut visited = FxHashSet::default();
    let mut parents: FxHashMap<NodeId, (NodeId, String)> = FxHashMap::default();

    while let Some(Frontier { node, .. }) = queue.pop() {
        if !visited.insert(node) {
            continue;
        }
        if oracle.node(node).game().is_win() {
            return Some(backtrack(oracle, node, &parents));
        }

        oracle.find_edges(node, 1);
        let successors = oracle
            .node(node)
            .edges()
            .filter(|(_, edge)| edge.score > 0.)
            .map(|(word, edge)| (word.clone(), edge.target))
            .collect::<Vec<_>>();
        for (word, target) in successors {
            if visited.contains(&target) || parents.contains_key(&target) {
                continue;
            }
            parents.insert(target, (node, word));
            pushed += 1;
            queue.push(Frontier {
                score: oracle.node(target).game().score(),
                order: Reverse(pushed),
                node: target,
            });
        }
    }

    log::debug!("Best-first search from {start_index} found nothing");
    None
}

fn backtrack(
    oracle: &Oracle,
    end: NodeId,
    parents: &FxHashMap<NodeId, (NodeId, String)>,
) -> Trajectory {
    let mut steps = vec![];
    let mut node = end;
    while let Some((parent, word)) = parents.get(&node) {
        steps.push((*parent, word.clone(), node));
        node = *parent;
    }
    steps.reverse();

    let mut trajectory = Trajectory::new();
    for (parent, word, node) in steps {
        let path = oracle
            .node(parent)
            .edge(&word)
            .map(|edge| edge.path.clone())
            .unwrap_or_default();
        trajectory.add_words_states(
            vec![word],
            vec![path],
            vec![oracle.node(node).game().clone()],
        );
    }
    trajectory
}
