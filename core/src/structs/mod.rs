pub mod board;
pub mod coverage;
pub mod game;

use fxhash::FxHashMap;

pub use board::{Board, BoardError, Placement, Side};
pub use coverage::Coverage;
pub use game::Game;

/// Board positions realizing one word, one position per letter.
pub type Path = Vec<usize>;

/// The fixed vocabulary, reachable by first letter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary {
    words_by_letter: FxHashMap<char, Vec<String>>,
    len: usize,
}

impl Dictionary {
    /// Keeps purely alphabetic words, lowercased. Each first-letter bucket is
    /// sorted and free of duplicates.
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut words_by_letter: FxHashMap<char, Vec<String>> = FxHashMap::default();
        for word in words {
            let word = word.as_ref().trim();
            if word.is_empty() || !word.chars().all(|c| c.is_ascii_alphabetic()) {
                continue;
            }
            let word = word.to_ascii_lowercase();
            if let Some(first) = word.chars().next() {
                words_by_letter.entry(first).or_default().push(word);
            }
        }

        let mut len = 0;
        for bucket in words_by_letter.values_mut() {
            bucket.sort_unstable();
            bucket.dedup();
            len += bucket.len();
        }

        Self {
            words_by_letter,
            len,
        }
    }

    pub fn words_starting_with(&self, letter: char) -> &[String] {
        self.words_by_letter
            .get(&letter)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, word: &str) -> bool {
        word.chars()
            .next()
            .map(|c| {
                self.words_starting_with(c)
                    .binary_search_by(|w| w.as_str().cmp(word))
                    .is_ok()
            })
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
