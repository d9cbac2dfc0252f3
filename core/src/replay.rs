//! A cache in front of a lazy iterator, so that many callers can replay the
//! same sequence without running the source twice.

use core::fmt;
use std::cell::RefCell;

use serde::{Deserialize, Serialize};

/// How a fresh [`Replayable::iter`] starts and ends.
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReplayPolicy {
    /// Every iteration starts at the first element and stops after the last.
    #[default]
    Restart,
    /// Iteration resumes at the shared cursor and runs one full lap, wrapping
    /// to the first element once the source is exhausted. Stopping early
    /// leaves the cursor where the next iteration will pick up.
    Circular,
}

struct ReplayState<I: Iterator> {
    cache: Vec<I::Item>,
    source: Option<I>,
    cursor: usize,
}

impl<I: Iterator> ReplayState<I> {
    /// Pulls from the source until `index` is cached. False once the source is
    /// exhausted before reaching it.
    fn ensure(&mut self, index: usize) -> bool {
        while self.cache.len() <= index {
            match self.source.as_mut().and_then(Iterator::next) {
                Some(item) => self.cache.push(item),
                None => {
                    self.source = None;
                    return false;
                }
            }
        }
        true
    }

    fn exhausted_empty(&mut self) -> bool {
        !self.ensure(0)
    }

    // the cursor position, wrapped to the start if it ran off the end
    fn wrapped_cursor(&mut self) -> usize {
        if self.ensure(self.cursor) {
            self.cursor
        } else {
            0
        }
    }
}

/// A lazily filled cache over a single underlying sequence.
///
/// Not thread safe: the cursor is shared by every caller holding the same
/// instance, which is what lets repeated circular iteration rotate through
/// the elements.
pub struct Replayable<I: Iterator> {
    policy: ReplayPolicy,
    state: RefCell<ReplayState<I>>,
}

impl<I> Replayable<I>
where
    I: Iterator,
    I::Item: Clone,
{
    pub fn new(source: I, policy: ReplayPolicy) -> Self {
        Self {
            policy,
            state: RefCell::new(ReplayState {
                cache: Vec::new(),
                source: Some(source),
                cursor: 0,
            }),
        }
    }

    pub fn policy(&self) -> ReplayPolicy {
        self.policy
    }

    /// The element a fresh iteration would start with, plus an iterator that
    /// yields that element followed by the rest. `None` if the sequence is
    /// empty. Does not move the shared cursor.
    pub fn peek(&self) -> Option<(I::Item, ReplayIter<'_, I>)> {
        let start = {
            let mut state = self.state.borrow_mut();
            if state.exhausted_empty() {
                return None;
            }
            match self.policy {
                ReplayPolicy::Restart => 0,
                ReplayPolicy::Circular => state.wrapped_cursor(),
            }
        };
        let first = self.get(start)?;
        Some((first, self.iter_from(start)))
    }

    /// Iterates according to the policy. See [`ReplayPolicy`].
    pub fn iter(&self) -> ReplayIter<'_, I> {
        match self.policy {
            ReplayPolicy::Restart => self.iter_from(0),
            ReplayPolicy::Circular => ReplayIter {
                replay: self,
                mode: Mode::Lap { start: None },
            },
        }
    }

    /// Unbounded rotation through the elements, advancing the shared cursor.
    /// Ends only if the sequence is empty.
    pub fn cycle(&self) -> ReplayIter<'_, I> {
        ReplayIter {
            replay: self,
            mode: Mode::Cycle,
        }
    }

    /// Element at `index`, pulling from the source if needed.
    pub fn get(&self, index: usize) -> Option<I::Item> {
        let mut state = self.state.borrow_mut();
        if state.ensure(index) {
            Some(state.cache[index].clone())
        } else {
            None
        }
    }

    /// Number of elements pulled from the source so far.
    pub fn cached_len(&self) -> usize {
        self.state.borrow().cache.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.state.borrow().source.is_none()
    }

    fn iter_from(&self, index: usize) -> ReplayIter<'_, I> {
        ReplayIter {
            replay: self,
            mode: Mode::Linear { index },
        }
    }

    fn step_cursor(&self) -> Option<I::Item> {
        let mut state = self.state.borrow_mut();
        if state.exhausted_empty() {
            return None;
        }
        let pos = state.wrapped_cursor();
        state.cursor = pos + 1;
        Some(state.cache[pos].clone())
    }

    fn cursor(&self) -> Option<usize> {
        let mut state = self.state.borrow_mut();
        if state.exhausted_empty() {
            None
        } else {
            Some(state.wrapped_cursor())
        }
    }
}

impl<I> fmt::Debug for Replayable<I>
where
    I: Iterator,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Replayable")
            .field("policy", &self.policy)
            .field("cached", &state.cache.len())
            .field("cursor", &state.cursor)
            .field("exhausted", &state.source.is_none())
            .finish()
    }
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    Linear { index: usize },
    Lap { start: Option<usize> },
    Cycle,
}

pub struct ReplayIter<'a, I: Iterator> {
    replay: &'a Replayable<I>,
    mode: Mode,
}

impl<'a, I> Iterator for ReplayIter<'a, I>
where
    I: Iterator,
    I::Item: Clone,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.mode {
            Mode::Linear { index } => {
                let item = self.replay.get(*index)?;
                *index += 1;
                Some(item)
            }
            Mode::Lap { start } => {
                let pos = self.replay.cursor()?;
                if *start == Some(pos) {
                    return None;
                }
                if start.is_none() {
                    *start = Some(pos);
                }
                self.replay.step_cursor()
            }
            Mode::Cycle => self.replay.step_cursor(),
        }
    }
}
