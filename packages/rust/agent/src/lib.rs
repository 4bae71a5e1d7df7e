//! Research orchestration: the pipeline from validated query to cached
//! response envelope.
//!
//! This crate provides:
//! - [`agent`] — the [`ResearchAgent`] pipeline composing the search
//!   provider, rate limiter, cache, graph builder, and error ledger
//! - [`limiter`] — the bounded-concurrency gate for outbound searches
//! - [`cache`] — the keyed response cache
//! - [`graph`] — the keyword knowledge-graph builder

pub mod agent;
pub mod cache;
pub mod graph;
pub mod limiter;

pub use agent::ResearchAgent;
pub use cache::ResponseCache;
pub use graph::{build_knowledge_graph, extract_keywords};
pub use limiter::{MAX_CONCURRENT_SEARCHES, RateLimiter, SearchSlot};
