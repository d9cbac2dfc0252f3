use fxhash::FxHashMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BoardError {
    #[error("A board needs at least one letter per side")]
    Empty,
    #[error("Expected a multiple of 4 letters. Found {found} letters")]
    UnevenSides { found: usize },
    #[error("Letter at position {position} is not alphabetic: '{letter}'")]
    NotAlphabetic { position: usize, letter: char },
}

/// One of the four edges of the square, in board order.
#[derive(
    Copy, Clone, Debug, Display, EnumIter, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    pub fn from_index(index: usize) -> Self {
        match index % 4 {
            0 => Side::Top,
            1 => Side::Right,
            2 => Side::Bottom,
            _ => Side::Left,
        }
    }
}

/// Where a single letter sits on the square.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Placement {
    pub position: usize,
    pub letter: char,
    pub side: Side,
    pub offset: usize,
}

/// The immutable part of a puzzle: letters at fixed positions and the
/// reverse index from letter to the positions holding it.
///
/// Positions `0..S` are the top side, `S..2S` the right side and so on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    flat_letters: Vec<char>,
    letters: FxHashMap<char, Vec<usize>>,
    side_size: usize,
}

impl Board {
    pub fn new<I, C>(letters: I) -> Result<Self, BoardError>
    where
        I: IntoIterator<Item = C>,
        C: Into<char>,
    {
        let flat_letters = letters
            .into_iter()
            .map(|c| c.into().to_ascii_lowercase())
            .collect::<Vec<_>>();

        if flat_letters.is_empty() {
            return Err(BoardError::Empty);
        }
        if flat_letters.len() % 4 != 0 {
            return Err(BoardError::UnevenSides {
                found: flat_letters.len(),
            });
        }
        if let Some((position, &letter)) = flat_letters
            .iter()
            .find_position(|c| !c.is_ascii_alphabetic())
        {
            return Err(BoardError::NotAlphabetic { position, letter });
        }

        // positions are pushed in increasing order, so every list stays sorted
        let mut letters: FxHashMap<char, Vec<usize>> = FxHashMap::default();
        for (i, &l) in flat_letters.iter().enumerate() {
            letters.entry(l).or_default().push(i);
        }

        Ok(Self {
            side_size: flat_letters.len() / 4,
            flat_letters,
            letters,
        })
    }

    pub fn side_size(&self) -> usize {
        self.side_size
    }

    pub fn len(&self) -> usize {
        self.flat_letters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flat_letters.is_empty()
    }

    pub fn flat_letters(&self) -> &[char] {
        &self.flat_letters
    }

    pub fn letter(&self, position: usize) -> char {
        self.flat_letters[position]
    }

    /// Positions holding `letter`, in increasing order. Empty if the letter is
    /// not on the board.
    pub fn positions(&self, letter: char) -> &[usize] {
        self.letters.get(&letter).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn side_of(&self, position: usize) -> Side {
        Side::from_index(position / self.side_size)
    }

    pub fn placement(&self, position: usize) -> Placement {
        Placement {
            position,
            letter: self.flat_letters[position],
            side: self.side_of(position),
            offset: position % self.side_size,
        }
    }

    pub fn placements(&self) -> impl Iterator<Item = Placement> + '_ {
        (0..self.len()).map(|i| self.placement(i))
    }

    /// Two positions may follow each other in a word iff they lie on
    /// different sides.
    pub fn connectable(&self, from: usize, to: usize) -> bool {
        from / self.side_size != to / self.side_size
    }

    /// Checks that `path` spells `word` and never stays on one side.
    pub fn is_valid_path(&self, word: &str, path: &[usize]) -> bool {
        path.len() == word.chars().count()
            && path
                .iter()
                .zip(word.chars())
                .all(|(&p, c)| p < self.len() && self.flat_letters[p] == c)
            && path
                .iter()
                .tuple_windows()
                .all(|(&a, &b)| self.connectable(a, b))
    }
}
