//! Browser history abstraction
//!
//! The wasm front end implements [`HistoryBackend`] over `window.history`;
//! [`MemoryHistory`] models the same stack natively for tests and headless use.

use crate::error::NavigationError;
use crate::state::NavigationState;

/// How a navigation state is written to history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryWrite {
    Push,
    Replace,
}

pub trait HistoryBackend {
    fn push(&mut self, state: &NavigationState) -> Result<(), NavigationError>;
    fn replace(&mut self, state: &NavigationState) -> Result<(), NavigationError>;

    fn write(&mut self, mode: HistoryWrite, state: &NavigationState) -> Result<(), NavigationError> {
        match mode {
            HistoryWrite::Push => self.push(state),
            HistoryWrite::Replace => self.replace(state),
        }
    }
}

/// In-memory history stack with the browser's push/back/forward semantics.
///
/// Entries are stored as JSON so restoration goes through the same
/// serialization the browser sees. The initial entry carries no state.
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    entries: Vec<Option<String>>,
    cursor: usize,
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self {
            entries: vec![None],
            cursor: 0,
        }
    }
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    /// State of the current entry
    pub fn current(&self) -> Result<Option<NavigationState>, NavigationError> {
        self.state_at(self.cursor)
    }

    pub fn state_at(&self, index: usize) -> Result<Option<NavigationState>, NavigationError> {
        match self.entries.get(index) {
            Some(Some(raw)) => NavigationState::from_json(raw).map(Some),
            Some(None) => Ok(None),
            None => Err(NavigationError::History(format!("no history entry {}", index))),
        }
    }

    /// Move back one entry. `None` when already at the start.
    pub fn back(&mut self) -> Option<Result<Option<NavigationState>, NavigationError>> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(self.current())
    }

    pub fn forward(&mut self) -> Option<Result<Option<NavigationState>, NavigationError>> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        Some(self.current())
    }
}

impl HistoryBackend for MemoryHistory {
    fn push(&mut self, state: &NavigationState) -> Result<(), NavigationError> {
        let raw = state.to_json()?;
        self.entries.truncate(self.cursor + 1);
        self.entries.push(Some(raw));
        self.cursor += 1;
        Ok(())
    }

    fn replace(&mut self, state: &NavigationState) -> Result<(), NavigationError> {
        let raw = state.to_json()?;
        self.entries[self.cursor] = Some(raw);
        Ok(())
    }
}
