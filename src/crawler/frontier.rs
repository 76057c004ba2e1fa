//! URL frontier: the pending queue plus the visited set
//!
//! The frontier is owned by the single crawl loop and needs no locking. If
//! the crawl is ever spread across workers, `dequeue` and `mark_visited`
//! must become one atomic operation to keep the at-most-once guarantee.

use crate::storage::ProgressSnapshot;
use crate::url::SchemeFilter;
use std::collections::{HashMap, HashSet, VecDeque};

/// FIFO queue of pending URLs with a visited set for deduplication
#[derive(Debug, Clone, Default)]
pub struct Frontier {
    /// Pending URLs in dequeue order
    queue: VecDeque<String>,

    /// Membership index over `queue`, counting copies
    queued: HashMap<String, usize>,

    /// URLs that were fetched or abandoned
    visited: HashSet<String>,

    /// Exclusion predicate applied before enqueueing
    filter: SchemeFilter,
}

impl Frontier {
    /// Creates an empty frontier with the given exclusion predicate
    pub fn new(filter: SchemeFilter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    /// Creates a frontier whose queue holds the seeds
    pub fn from_seeds(seeds: &[String], filter: SchemeFilter) -> Self {
        let mut frontier = Self::new(filter);
        frontier.enqueue_all(seeds.iter().cloned());
        frontier
    }

    /// Creates a frontier from persisted progress
    pub fn from_snapshot(snapshot: ProgressSnapshot, filter: SchemeFilter) -> Self {
        let mut frontier = Self::new(filter);
        frontier.restore(snapshot);
        frontier
    }

    /// Appends every URL that is not excluded, visited, or already queued
    ///
    /// # Returns
    ///
    /// The number of URLs actually appended
    pub fn enqueue_all<I>(&mut self, urls: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let mut added = 0;

        for url in urls {
            if self.filter.is_excluded(&url) {
                tracing::trace!("Dropping excluded URL {}", url);
                continue;
            }
            if self.visited.contains(&url) || self.queued.contains_key(&url) {
                continue;
            }

            self.queued.insert(url.clone(), 1);
            self.queue.push_back(url);
            added += 1;
        }

        added
    }

    /// Pops the head of the queue
    pub fn dequeue(&mut self) -> Option<String> {
        let url = self.queue.pop_front()?;
        // A restored queue may hold the same URL twice
        if let Some(copies) = self.queued.get_mut(&url) {
            *copies -= 1;
            if *copies == 0 {
                self.queued.remove(&url);
            }
        }
        Some(url)
    }

    /// Puts a dequeued URL back at the head of the queue
    ///
    /// Used when a fetch is cut short, so the URL is the first one tried on
    /// resume. Dedup is not applied.
    pub fn requeue_front(&mut self, url: String) {
        *self.queued.entry(url.clone()).or_insert(0) += 1;
        self.queue.push_front(url);
    }

    /// Records a URL as visited
    ///
    /// # Returns
    ///
    /// `true` if the URL was not visited before
    pub fn mark_visited(&mut self, url: &str) -> bool {
        self.visited.insert(url.to_string())
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    /// Number of pending URLs
    pub fn size(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Pending URLs that are already in the visited set
    ///
    /// Only a restored queue can contain these; they are skipped at dequeue time.
    pub fn stale_pending(&self) -> usize {
        self.queue
            .iter()
            .filter(|url| self.visited.contains(*url))
            .count()
    }

    /// Copies the full state for persistence
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot::new(self.visited.clone(), self.queue.iter().cloned().collect())
    }

    /// Replaces the in-memory state with a snapshot
    ///
    /// The queue is taken verbatim, including order and any duplicates, so
    /// `restore(snapshot())` is the identity.
    pub fn restore(&mut self, snapshot: ProgressSnapshot) {
        self.visited = snapshot.visited;
        self.queue = snapshot.pending.into_iter().collect();
        self.queued.clear();
        for url in &self.queue {
            *self.queued.entry(url.clone()).or_insert(0) += 1;
        }
    }
}
