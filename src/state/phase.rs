/// Crawl engine phase definitions
///
/// The engine walks through these phases once per URL. Link following and
/// item handling are optional within an iteration; persistence and the
/// politeness sleep are not.
use std::fmt;

/// Represents the current phase of the crawl loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Engine constructed, no URL pulled yet
    Idle,

    /// A URL was dequeued and its page is being fetched
    Fetching,

    /// Routing rules are being matched against the URL
    RuleEvaluating,

    /// Links from the page are being extracted and enqueued
    LinkFollowing,

    /// Page handlers are producing items for the pipeline
    ItemHandling,

    /// The frontier snapshot is being written to the progress store
    Persisting,

    /// Waiting out the politeness delay
    Sleeping,

    // ===== Terminal Phases =====
    /// The frontier is empty; the crawl is complete
    Drained,

    /// A shutdown was requested; progress was flushed
    Interrupted,
}

impl CrawlPhase {
    /// Returns true if the crawl loop has stopped for good
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Drained | Self::Interrupted)
    }

    /// Returns true if a URL is currently being worked on
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            Self::Fetching
                | Self::RuleEvaluating
                | Self::LinkFollowing
                | Self::ItemHandling
                | Self::Persisting
        )
    }

    /// Checks whether the loop may move from this phase to `next`
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        use CrawlPhase::*;

        match (self, next) {
            (Idle, Fetching | Drained | Interrupted) => true,
            // A failed fetch goes straight to persistence, a cancelled one stops
            (Fetching, RuleEvaluating | Persisting | Interrupted) => true,
            (RuleEvaluating, LinkFollowing | ItemHandling | Persisting) => true,
            (LinkFollowing, ItemHandling | Persisting) => true,
            (ItemHandling, Persisting) => true,
            (Persisting, Sleeping) => true,
            (Sleeping, Fetching | Drained | Interrupted) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::RuleEvaluating => "rule_evaluating",
            Self::LinkFollowing => "link_following",
            Self::ItemHandling => "item_handling",
            Self::Persisting => "persisting",
            Self::Sleeping => "sleeping",
            Self::Drained => "drained",
            Self::Interrupted => "interrupted",
        }
    }

    /// Returns all phases
    pub fn all_phases() -> Vec<Self> {
        vec![
            Self::Idle,
            Self::Fetching,
            Self::RuleEvaluating,
            Self::LinkFollowing,
            Self::ItemHandling,
            Self::Persisting,
            Self::Sleeping,
            Self::Drained,
            Self::Interrupted,
        ]
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
