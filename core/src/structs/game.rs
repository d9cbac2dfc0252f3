#[cfg(feature = "terminal")]
use colored::Colorize;
use core::fmt;
use std::rc::Rc;

use super::{
    board::{Board, BoardError, Placement, Side},
    coverage::Coverage,
};

/// A puzzle board together with one coverage state.
///
/// The board is shared between every state of one puzzle; transitions return a
/// new `Game` and leave the old one untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    board: Rc<Board>,
    state: Coverage,
}

impl Game {
    pub fn new<I, C>(letters: I) -> Result<Self, BoardError>
    where
        I: IntoIterator<Item = C>,
        C: Into<char>,
    {
        Ok(Self::from_board(Rc::new(Board::new(letters)?)))
    }

    pub fn from_board(board: Rc<Board>) -> Self {
        Self {
            board,
            state: Coverage::empty(),
        }
    }

    pub fn board(&self) -> &Rc<Board> {
        &self.board
    }

    pub fn state(&self) -> &Coverage {
        &self.state
    }

    pub fn update_state(&self, state: Coverage) -> Self {
        Self {
            board: Rc::clone(&self.board),
            state,
        }
    }

    pub fn score(&self) -> usize {
        self.state.count()
    }

    pub fn is_win(&self) -> bool {
        self.score() == self.board.len()
    }

    pub fn to_binary(&self) -> String {
        self.state.to_binary(self.board.len())
    }

    pub fn placements(&self) -> impl Iterator<Item = (Placement, bool)> + '_ {
        self.board
            .placements()
            .map(|p| (p, self.state.contains(p.position)))
    }

    /// Draws the square with every covered letter marked by a `*` on its
    /// inner side.
    pub fn to_ascii(&self) -> String {
        let s = self.board.side_size();
        let dim = s + 4;
        let mut grid = vec![vec![String::new(); dim]; dim];

        for (placement, covered) in self.placements() {
            let Placement {
                letter,
                side,
                offset,
                ..
            } = placement;
            let mark = if covered { "*" } else { "" }.to_string();
            let reversed = s + 3 - (offset + 2);
            let ((lr, lc), (mr, mc)) = match side {
                Side::Top => ((0, offset + 2), (1, offset + 2)),
                Side::Right => ((offset + 2, dim - 1), (offset + 2, dim - 2)),
                Side::Bottom => ((dim - 1, reversed), (dim - 2, reversed)),
                Side::Left => ((reversed, 0), (reversed, 1)),
            };
            grid[lr][lc] = render_letter(letter, covered);
            grid[mr][mc] = mark;
        }

        let rows = grid
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| pad(cell, 5))
                    .collect::<String>()
                    .trim_end()
                    .to_string()
            })
            .collect::<Vec<_>>();

        format!("\n{}\n", rows.join("\n"))
    }
}

#[cfg(feature = "terminal")]
fn render_letter(letter: char, covered: bool) -> String {
    if covered {
        letter.to_string().green().to_string()
    } else {
        letter.to_string()
    }
}

#[cfg(not(feature = "terminal"))]
fn render_letter(letter: char, _covered: bool) -> String {
    letter.to_string()
}

// a coloured cell is a single letter wrapped in escape codes
fn pad(cell: &str, width: usize) -> String {
    let visible = if cell.contains('\u{1b}') {
        1
    } else {
        cell.chars().count()
    };
    format!("{cell}{}", " ".repeat(width.saturating_sub(visible)))
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_binary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn win_needs_every_position() {
        let game = Game::new("team".chars()).unwrap();
        assert_eq!(game.score(), 0);
        assert!(!game.is_win());

        let partial = game.update_state(Coverage::from_positions(&[0, 1, 2]));
        assert_eq!(partial.score(), 3);
        assert!(!partial.is_win());
        assert_eq!(partial.to_binary(), "0111");

        let full = partial.update_state(partial.state().with_positions(&[3]));
        assert!(full.is_win());
        // the old value is unchanged
        assert_eq!(partial.score(), 3);
        assert!(Rc::ptr_eq(full.board(), game.board()));
    }

    #[test]
    fn ascii_marks_covered_letters() {
        let game = Game::new("abcdefgh".chars()).unwrap();
        let game = game.update_state(Coverage::from_positions(&[0]));
        let ascii = game.to_ascii();
        let lines = ascii.trim_matches('\n').lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 6);
        assert!(lines[0].contains('a') && lines[0].contains('b'));
        assert!(lines[1].contains('*'));
        assert_eq!(ascii.matches('*').count(), 1);
    }
}
