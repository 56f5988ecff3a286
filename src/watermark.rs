#![forbid(unsafe_code)]

//! Bounded memory of the most recently seen candidate IDs for a source.

use std::collections::VecDeque;

/// FIFO of remembered IDs whose capacity is chosen per fetch call.
///
/// Pushing past capacity evicts from the front, so the oldest remembered ID
/// is always the first to go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Watermark {
    ids: VecDeque<String>,
    capacity: usize,
}

impl Watermark {
    /// Loads previously persisted IDs. Nothing is evicted until the next push.
    pub fn from_ids<I>(ids: I, capacity: usize) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            ids: ids.into_iter().collect(),
            capacity,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|known| known == id)
    }

    pub fn push(&mut self, id: impl Into<String>) {
        self.ids.push_back(id.into());
        while self.ids.len() > self.capacity {
            self.ids.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.ids.into_iter().collect()
    }
}
