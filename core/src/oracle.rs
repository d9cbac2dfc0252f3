use fxhash::FxHashMap;
use serde::Serialize;
use std::rc::Rc;

use crate::{
    graph::{GraphNode, NodeId, NodeKey},
    paths::{enumerate_paths, WordPaths},
    replay::{ReplayPolicy, Replayable},
    structs::{BoardError, Coverage, Dictionary, Game, Path},
};

pub type PathReplay = Replayable<WordPaths>;

/// Per-puzzle cache answering "which words start here" and "what happens if
/// this word is submitted", and owning every graph node discovered while
/// solving. Nothing is ever evicted.
#[derive(Debug)]
pub struct Oracle<'d> {
    game: Game,
    dictionary: &'d Dictionary,
    policy: ReplayPolicy,
    word_mapping: FxHashMap<usize, Rc<Vec<String>>>,
    word_path_mapping: FxHashMap<(usize, String), Rc<PathReplay>>,
    nodes: Vec<GraphNode>,
    graph_nodes: FxHashMap<NodeKey, NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRecord {
    pub id: usize,
    #[serde(rename = "Label")]
    pub label: String,
    pub state: String,
    pub index: usize,
    pub score: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeRecord {
    #[serde(rename = "Source")]
    pub source: usize,
    #[serde(rename = "Target")]
    pub target: usize,
    #[serde(rename = "Label")]
    pub label: String,
    #[serde(rename = "Weight")]
    pub weight: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphExport {
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
}

impl<'d> Oracle<'d> {
    pub fn new(game: Game, dictionary: &'d Dictionary) -> Self {
        Self::with_policy(game, dictionary, ReplayPolicy::default())
    }

    pub fn with_policy(game: Game, dictionary: &'d Dictionary, policy: ReplayPolicy) -> Self {
        Self {
            game,
            dictionary,
            policy,
            word_mapping: FxHashMap::default(),
            word_path_mapping: FxHashMap::default(),
            nodes: Vec::new(),
            graph_nodes: FxHashMap::default(),
        }
    }

    pub fn from_letters<I, C>(letters: I, dictionary: &'d Dictionary) -> Result<Self, BoardError>
    where
        I: IntoIterator<Item = C>,
        C: Into<char>,
    {
        Ok(Self::new(Game::new(letters)?, dictionary))
    }

    /// The puzzle with nothing covered yet.
    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn dictionary(&self) -> &'d Dictionary {
        self.dictionary
    }

    pub fn policy(&self) -> ReplayPolicy {
        self.policy
    }

    /// Words whose first letter sits at `start_index` and whose remaining
    /// letters can be laid out on the board. Computed once per position.
    pub fn valid_words_from(&mut self, start_index: usize) -> Rc<Vec<String>> {
        if let Some(words) = self.word_mapping.get(&start_index) {
            return Rc::clone(words);
        }

        let words = Rc::new(self.build_valid_words(start_index));
        self.word_mapping.insert(start_index, Rc::clone(&words));
        words
    }

    fn build_valid_words(&mut self, start_index: usize) -> Vec<String> {
        let board = Rc::clone(self.game.board());
        let start_letter = board.letter(start_index);
        let dictionary = self.dictionary;

        let mut valid_words = vec![];
        for word in dictionary.words_starting_with(start_letter) {
            let mut chars = word.chars();
            let first_in_place = chars
                .next()
                .map(|first| board.positions(first).contains(&start_index))
                .unwrap_or(false);
            if !first_in_place {
                continue;
            }

            let valid_paths = Replayable::new(
                enumerate_paths(chars.as_str(), &board, vec![start_index]),
                self.policy,
            );
            if valid_paths.peek().is_none() {
                continue;
            }

            self.word_path_mapping
                .entry((start_index, word.clone()))
                .or_insert_with(|| Rc::new(valid_paths));
            valid_words.push(word.clone());
        }

        log::trace!(
            "{} valid words from '{}' at {start_index}",
            valid_words.len(),
            start_letter
        );
        valid_words
    }

    /// The cached paths of a word already returned by
    /// [`Oracle::valid_words_from`] for the same position.
    ///
    /// # Panics
    ///
    /// If `(start_index, word)` was never validated.
    pub fn valid_paths_by_word(&self, word: &str, start_index: usize) -> Rc<PathReplay> {
        match self.word_path_mapping.get(&(start_index, word.to_string())) {
            Some(paths) => Rc::clone(paths),
            None => panic!("\"{word}\" at {start_index} was never validated by this oracle"),
        }
    }

    pub fn cached_word_count(&self) -> usize {
        self.word_path_mapping.len()
    }

    /// Applies the first cached path of `word` that covers something new.
    ///
    /// When no path improves the state the last path seen is applied instead,
    /// so the transition is still reported. `None` only if the word has no
    /// path at all.
    ///
    /// # Panics
    ///
    /// If `(start_index, word)` was never validated.
    pub fn submit_word(&self, game: &Game, word: &str, start_index: usize) -> Option<(Game, Path)> {
        let paths = self.valid_paths_by_word(word, start_index);

        let mut best: Option<(Coverage, Path)> = None;
        for path in paths.iter() {
            let new_state = game.state().with_positions(&path);
            let improves = new_state.count() > game.score();
            best = Some((new_state, path));
            if improves {
                break;
            }
        }

        best.map(|(state, path)| (game.update_state(state), path))
    }

    pub fn get_graph_node(&self, state: &Coverage, last_index: usize) -> Option<NodeId> {
        self.graph_nodes
            .get(&NodeKey::new(state.clone(), last_index))
            .copied()
    }

    /// Stores a node and indexes it by its key. A second node with the same
    /// key replaces the first in the index; the first stays reachable from
    /// edges that already point at it.
    pub fn set_graph_node(&mut self, node: GraphNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.graph_nodes.insert(node.key(), id);
        self.nodes.push(node);
        id
    }

    /// The node for `(game.state, last_index)`, created on first use.
    pub fn node_for(&mut self, game: Game, last_index: usize) -> NodeId {
        match self.get_graph_node(game.state(), last_index) {
            Some(id) => id,
            None => self.set_graph_node(GraphNode::new(game, last_index)),
        }
    }

    /// The node with nothing covered, sitting at `start_index`.
    pub fn root(&mut self, start_index: usize) -> NodeId {
        self.node_for(self.game.clone(), start_index)
    }

    pub fn node(&self, id: NodeId) -> &GraphNode {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut GraphNode {
        &mut self.nodes[id.0]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Every cached node and its outgoing edges, in creation order.
    pub fn graph_export(&self) -> GraphExport {
        let mut ids = self.graph_nodes.values().copied().collect::<Vec<_>>();
        ids.sort_unstable();

        let mut export = GraphExport::default();
        for id in ids {
            let node = self.node(id);
            export.nodes.push(NodeRecord {
                id: id.0,
                label: node.game().to_binary(),
                state: node.game().state().to_string(),
                index: node.last_index(),
                score: node.game().score(),
            });
            export
                .edges
                .extend(node.edges().map(|(word, edge)| EdgeRecord {
                    source: id.0,
                    target: edge.target.0,
                    label: word.clone(),
                    weight: edge.score + 1.,
                }));
        }
        export
    }
}
