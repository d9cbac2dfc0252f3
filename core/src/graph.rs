use fxhash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

use crate::{
    oracle::Oracle,
    structs::{Coverage, Game, Path},
};

/// Index of a node in the oracle's arena.
#[derive(
    Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// What makes two nodes the same node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeKey {
    pub state: Coverage,
    pub last_index: usize,
}

impl NodeKey {
    pub fn new(state: Coverage, last_index: usize) -> Self {
        Self { state, last_index }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub score: f64,
    pub target: NodeId,
    pub path: Path,
}

/// A point in the search space: a coverage state reached by a word ending at
/// `last_index`. Outgoing edges are discovered on demand.
#[derive(Debug, Clone)]
pub struct GraphNode {
    game: Game,
    last_index: usize,
    edges: Option<BTreeMap<String, Edge>>,
}

impl GraphNode {
    pub fn new(game: Game, last_index: usize) -> Self {
        Self {
            game,
            last_index,
            edges: None,
        }
    }

    pub fn key(&self) -> NodeKey {
        NodeKey::new(self.game.state().clone(), self.last_index)
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn last_index(&self) -> usize {
        self.last_index
    }

    pub fn edges_found(&self) -> bool {
        self.edges.is_some()
    }

    /// Outgoing edges ordered by word; empty until discovered.
    pub fn edges(&self) -> impl Iterator<Item = (&String, &Edge)> {
        self.edges.iter().flatten()
    }

    pub fn edge(&self, word: &str) -> Option<&Edge> {
        self.edges.as_ref().and_then(|edges| edges.get(word))
    }

    pub fn edge_count(&self) -> usize {
        self.edges.as_ref().map(BTreeMap::len).unwrap_or(0)
    }
}

/// A multi-hop route out of a node: the words taken, the summed transition
/// score and the nodes and paths visited on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeepScore {
    pub words: Vec<String>,
    pub score: f64,
    pub nodes: Vec<NodeId>,
    pub paths: Vec<Path>,
}

impl DeepScore {
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    fn extended(&self, word: &str, edge: &Edge) -> Self {
        let mut next = self.clone();
        next.words.push(word.to_string());
        next.score += edge.score;
        next.nodes.push(edge.target);
        next.paths.push(edge.path.clone());
        next
    }
}

impl<'d> Oracle<'d> {
    /// Discovers edges out of `node` and, recursively, out of its successors
    /// up to `depth` hops. Each node computes its edges at most once.
    pub fn find_edges(&mut self, node: NodeId, depth: usize) {
        if depth == 0 {
            return;
        }

        if !self.node(node).edges_found() {
            let edges = self.compute_edges(node);
            log::trace!("found {} edges out of node {}", edges.len(), node.0);
            self.node_mut(node).edges = Some(edges);
        }

        let successors = self
            .node(node)
            .edges()
            .map(|(_, edge)| edge.target)
            .collect::<Vec<_>>();
        for successor in successors {
            self.find_edges(successor, depth - 1);
        }
    }

    fn compute_edges(&mut self, node: NodeId) -> BTreeMap<String, Edge> {
        let (game, last_index) = {
            let node = self.node(node);
            (node.game.clone(), node.last_index)
        };

        let mut edges = BTreeMap::new();
        let words = self.valid_words_from(last_index);
        for word in words.iter() {
            let Some((next_game, path)) = self.submit_word(&game, word, last_index) else {
                continue;
            };
            let Some(&tail) = path.last() else {
                continue;
            };
            let target = self.node_for(next_game, tail);
            let score = self.transition_score(node, target);
            edges.insert(word.clone(), Edge { score, target, path });
        }
        edges
    }

    /// Number of positions newly covered going from `from` to `to`.
    pub fn transition_score(&self, from: NodeId, to: NodeId) -> f64 {
        self.node(to).game.score() as f64 - self.node(from).game.score() as f64
    }

    /// Breadth-first sweep returning one record per route of exactly `depth`
    /// hops. A node is only reached along the first route that finds it;
    /// later routes into it are dropped, and the root counts as found.
    ///
    /// Only edges already discovered by [`Oracle::find_edges`] are followed.
    pub fn compute_scores(&self, root: NodeId, depth: usize) -> Vec<DeepScore> {
        let mut scores = vec![];

        let mut seen = FxHashSet::default();
        seen.insert(self.node(root).key());

        let mut queue = VecDeque::from([DeepScore::default()]);
        while let Some(deep_score) = queue.pop_front() {
            if deep_score.len() == depth {
                scores.push(deep_score);
                continue;
            }

            let visiting = deep_score.nodes.last().copied().unwrap_or(root);
            for (word, edge) in self.node(visiting).edges() {
                if !seen.insert(self.node(edge.target).key()) {
                    continue;
                }
                queue.push_back(deep_score.extended(word, edge));
            }
        }

        scores
    }

    /// Debug rendering of one node and its edges.
    pub fn node_to_ascii(&self, id: NodeId) -> String {
        let node = self.node(id);
        let board = node.game.board();
        let mut lines = vec![
            format!(
                "State: {}, Last Letter: {}",
                node.game.to_binary(),
                board.letter(node.last_index)
            ),
            "Edges".to_string(),
        ];
        for (word, edge) in node.edges() {
            lines.push(format!(
                "    {word:<15} -> {:<5} ({})",
                edge.score,
                self.node(edge.target).game.to_binary()
            ));
        }
        lines.push(String::new());
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::Dictionary;

    /*
         h    q    e    o
     t                     d
     c                     e
     g                     e
     f                     a
         n    h    a    o
    */
    const LETTERS: &str = "hqeodeeaoahnfgct";

    fn dictionary() -> Dictionary {
        Dictionary::new([
            "teen", "tee", "tea", "ten", "toe", "then", "neat", "nod", "node", "noted", "each",
            "echo", "end", "ode", "dean", "deed", "ache",
        ])
    }

    #[test]
    fn edges_are_found_lazily() {
        let dictionary = dictionary();
        let mut oracle = Oracle::from_letters(LETTERS.chars(), &dictionary).unwrap();
        let root = oracle.root(15);

        oracle.find_edges(root, 0);
        assert!(!oracle.node(root).edges_found());

        oracle.find_edges(root, 1);
        let root_node = oracle.node(root);
        assert!(root_node.edge_count() > 0);
        assert!(root_node.edge("teen").is_some());
        for (_, edge) in root_node.edges() {
            assert!(!oracle.node(edge.target).edges_found());
        }

        let count = oracle.node_count();
        oracle.find_edges(root, 1);
        assert_eq!(oracle.node_count(), count);

        oracle.find_edges(root, 2);
        for (_, edge) in oracle.node(root).edges() {
            assert!(oracle.node(edge.target).edges_found());
        }
    }

    #[test]
    fn edges_point_at_the_end_of_their_path() {
        let dictionary = dictionary();
        let mut oracle = Oracle::from_letters(LETTERS.chars(), &dictionary).unwrap();
        let root = oracle.root(15);
        oracle.find_edges(root, 2);

        for (word, edge) in oracle.node(root).edges() {
            let target = oracle.node(edge.target);
            assert_eq!(Some(&target.last_index()), edge.path.last());
            assert!(target.game().board().is_valid_path(word, &edge.path));
            assert_eq!(edge.score, oracle.transition_score(root, edge.target));
            assert_eq!(edge.score as usize, target.game().score());
        }
    }

    #[test]
    fn converging_words_share_a_node() {
        // one letter per side: "abcd" and "acbd" cover the same letters and
        // both end on 'd'
        let dictionary = Dictionary::new(["abcd", "acbd", "ab"]);
        let mut oracle = Oracle::from_letters("abcd".chars(), &dictionary).unwrap();
        let root = oracle.root(0);
        oracle.find_edges(root, 1);

        let abcd = oracle.node(root).edge("abcd").unwrap().target;
        let acbd = oracle.node(root).edge("acbd").unwrap().target;
        let ab = oracle.node(root).edge("ab").unwrap().target;
        assert_eq!(abcd, acbd);
        assert_ne!(abcd, ab);
        assert!(oracle.node(abcd).game().is_win());

        let key = oracle.node(abcd).key();
        assert_eq!(oracle.get_graph_node(&key.state, key.last_index), Some(abcd));

        // three words, two distinct successors
        assert_eq!(oracle.node(root).edge_count(), 3);
        assert_eq!(oracle.compute_scores(root, 1).len(), 2);
    }

    #[test]
    fn depth_one_scores_one_record_per_successor() {
        let dictionary = dictionary();
        let mut oracle = Oracle::from_letters(LETTERS.chars(), &dictionary).unwrap();
        let root = oracle.root(11);
        oracle.find_edges(root, 1);

        let scores = oracle.compute_scores(root, 1);
        let successors = oracle
            .node(root)
            .edges()
            .map(|(_, edge)| oracle.node(edge.target).key())
            .filter(|key| *key != oracle.node(root).key())
            .collect::<FxHashSet<_>>();

        assert!(!scores.is_empty());
        assert_eq!(scores.len(), successors.len());
        for score in &scores {
            assert_eq!(score.len(), 1);
            assert_eq!(score.nodes.len(), 1);
            assert_eq!(score.paths.len(), 1);
        }
    }

    #[test]
    fn deeper_scores_skip_seen_nodes() {
        let dictionary = dictionary();
        let mut oracle = Oracle::from_letters(LETTERS.chars(), &dictionary).unwrap();
        let root = oracle.root(15);
        oracle.find_edges(root, 2);

        let first_hop = oracle.compute_scores(root, 1);
        let scores = oracle.compute_scores(root, 2);
        let mut reached = FxHashSet::default();
        reached.insert(oracle.node(root).key());
        for score in &first_hop {
            reached.insert(oracle.node(score.nodes[0]).key());
        }

        for score in &scores {
            assert_eq!(score.len(), 2);
            let last = oracle.node(score.nodes[1]).key();
            assert!(!reached.contains(&last));
            let summed = oracle.transition_score(root, score.nodes[0])
                + oracle.transition_score(score.nodes[0], score.nodes[1]);
            assert_eq!(score.score, summed);
        }

        // every two-hop record ends at a distinct node
        let ends = scores
            .iter()
            .map(|s| oracle.node(s.nodes[1]).key())
            .collect::<FxHashSet<_>>();
        assert_eq!(ends.len(), scores.len());
    }

    #[test]
    fn palindromes_may_loop_back() {
        // "ede" walked twice from the same node comes back to the same state
        let dictionary = Dictionary::new(["ede", "eve"]);
        let mut oracle = Oracle::from_letters("edxy".chars(), &dictionary).unwrap();
        let root = oracle.root(0);
        oracle.find_edges(root, 1);
        let first = oracle.node(root).edge("ede").unwrap().target;
        oracle.find_edges(first, 1);
        let second = oracle.node(first).edge("ede").unwrap().target;

        assert_eq!(first, second);
        assert_eq!(oracle.node(first).edge("ede").unwrap().score, 0.);
        // the root is seeded as seen, a self loop yields no record
        assert!(oracle.compute_scores(first, 1).is_empty());
    }

    #[test]
    fn ascii_lists_edges() {
        let dictionary = dictionary();
        let mut oracle = Oracle::from_letters(LETTERS.chars(), &dictionary).unwrap();
        let root = oracle.root(15);
        oracle.find_edges(root, 1);
        let ascii = oracle.node_to_ascii(root);
        assert!(ascii.starts_with("State: 0000000000000000, Last Letter: t"));
        assert!(ascii.contains("teen"));
    }
}
