//! State module for tracking crawl progress
//!
//! - `CrawlPhase`: where the single crawl loop currently is within an iteration

mod phase;

pub use phase::CrawlPhase;
