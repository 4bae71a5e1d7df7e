//! Search-provider integration.
//!
//! This crate provides:
//! - [`SearchProvider`] — the outbound search seam, injectable for testing
//! - [`tavily`] — the Tavily HTTP client
//! - [`normalize`] — resolution of raw provider payloads into results

pub mod normalize;
pub mod tavily;

use async_trait::async_trait;

use webscout_shared::Result;

pub use normalize::{RawResult, SearchPayload, normalize};
pub use tavily::{TavilyClient, provider_status_message};

// ---------------------------------------------------------------------------
// SearchMode
// ---------------------------------------------------------------------------

/// Provider search mode, derived from the requested research depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Shallow single-pass search.
    Basic,
    /// Deeper multi-pass search.
    Advanced,
}

impl SearchMode {
    /// Basic for depth ≤ 1, advanced otherwise.
    pub fn for_depth(depth: u8) -> Self {
        if depth <= 1 { Self::Basic } else { Self::Advanced }
    }

    /// Wire value expected by the provider.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Advanced => "advanced",
        }
    }
}

// ---------------------------------------------------------------------------
// SearchProvider
// ---------------------------------------------------------------------------

/// The external web-search collaborator.
///
/// Implementations return the provider's payload as raw JSON; shape
/// resolution happens in [`normalize`], so a stub can return any value the
/// real provider might.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run one search and return the raw response payload.
    async fn search(
        &self,
        query: &str,
        mode: SearchMode,
        include_answer: bool,
    ) -> Result<serde_json::Value>;
}
