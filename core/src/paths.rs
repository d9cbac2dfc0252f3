use std::rc::Rc;

use crate::structs::{Board, Path};

/// Lazily yields every path spelling a word on a board, depth first.
///
/// Candidate positions for each letter are tried in increasing order, so the
/// output order is fixed for a given board.
#[derive(Debug, Clone)]
pub struct WordPaths {
    board: Rc<Board>,
    remaining: Vec<char>,
    prefix_len: usize,
    stack: Vec<Path>,
}

/// Enumerates the ways to finish `prefix` with the letters of `remaining`,
/// never placing two consecutive letters on the same side.
///
/// An empty `remaining` yields `prefix` itself, unless `prefix` is empty too.
pub fn enumerate_paths(remaining: &str, board: &Rc<Board>, prefix: Path) -> WordPaths {
    let remaining = remaining.chars().collect::<Vec<_>>();
    let stack = if remaining.is_empty() && prefix.is_empty() {
        vec![]
    } else {
        vec![prefix.clone()]
    };

    WordPaths {
        board: Rc::clone(board),
        remaining,
        prefix_len: prefix.len(),
        stack,
    }
}

impl Iterator for WordPaths {
    type Item = Path;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(path) = self.stack.pop() {
            let spelled = path.len() - self.prefix_len;
            if spelled == self.remaining.len() {
                return Some(path);
            }

            let c = self.remaining[spelled];
            let last = path.last().copied();

            // reversed so the smallest position is popped first
            for &next in self.board.positions(c).iter().rev() {
                if let Some(last) = last {
                    if !self.board.connectable(last, next) {
                        continue;
                    }
                }
                let mut extended = path.clone();
                extended.push(next);
                self.stack.push(extended);
            }
        }

        None
    }
}
