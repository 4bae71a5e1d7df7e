//! Core domain types for WebScout research responses.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, WebScoutError};

/// Minimum trimmed query length accepted by [`SearchRequest::new`].
pub const MIN_QUERY_LEN: usize = 3;

/// Inclusive depth bounds accepted by [`SearchRequest::new`].
pub const DEPTH_RANGE: std::ops::RangeInclusive<i64> = 1..=5;

// ---------------------------------------------------------------------------
// SearchRequest
// ---------------------------------------------------------------------------

/// A validated research request. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    query: String,
    depth: u8,
}

impl SearchRequest {
    /// Validate and construct a request.
    ///
    /// Collects a reason per offending field so a caller can highlight
    /// multiple bad fields at once.
    pub fn new(query: &str, depth: i64) -> Result<Self> {
        let mut errors = BTreeMap::new();

        if query.is_empty() {
            errors.insert(
                "query".to_string(),
                "Query must be a non-empty string".to_string(),
            );
        } else if query.trim().chars().count() < MIN_QUERY_LEN {
            errors.insert(
                "query".to_string(),
                format!("Query must be at least {MIN_QUERY_LEN} characters long"),
            );
        }

        if !DEPTH_RANGE.contains(&depth) {
            errors.insert(
                "depth".to_string(),
                "Depth must be between 1 and 5".to_string(),
            );
        }

        if !errors.is_empty() {
            return Err(WebScoutError::validation(errors));
        }

        Ok(Self {
            query: query.to_string(),
            depth: depth as u8,
        })
    }

    /// The original (untrimmed) query string.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Search depth in `[1, 5]`.
    pub fn depth(&self) -> u8 {
        self.depth
    }
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// Coarse content classification inferred from a source URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Pdf,
    Document,
    Image,
    Webpage,
    Unknown,
}

impl ContentType {
    /// Infer the content type from URL extension/path heuristics.
    pub fn from_url(url: &str) -> Self {
        if url.is_empty() {
            return Self::Unknown;
        }
        let url = url.to_lowercase();
        if url.contains(".pdf") {
            Self::Pdf
        } else if url.contains(".doc") || url.contains(".docx") {
            Self::Document
        } else if [".jpg", ".png", ".gif"].iter().any(|ext| url.contains(ext)) {
            Self::Image
        } else {
            Self::Webpage
        }
    }
}

/// A normalized search result document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Document title.
    pub title: String,
    /// Original document URL.
    pub url: String,
    /// Extracted text content.
    pub content: String,
    /// Content classification derived from the URL.
    #[serde(rename = "type")]
    pub content_type: ContentType,
    /// Host of the URL, or a fallback (see [`extract_domain`]).
    pub domain: String,
}

impl Source {
    /// Build a source from raw provider fields, deriving type and domain.
    pub fn new(title: String, url: String, content: String) -> Self {
        let content_type = ContentType::from_url(&url);
        let domain = extract_domain(&url);
        Self {
            title,
            url,
            content,
            content_type,
            domain,
        }
    }
}

/// Extract the host from a URL.
///
/// Malformed URLs yield the original string rather than failing; an empty
/// URL yields an empty domain.
pub fn extract_domain(url: &str) -> String {
    if url.is_empty() {
        return String::new();
    }
    match Url::parse(url) {
        Ok(parsed) => parsed
            .host_str()
            .map(str::to_string)
            .unwrap_or_else(|| url.to_string()),
        Err(_) => url.to_string(),
    }
}

// ---------------------------------------------------------------------------
// KnowledgeGraph
// ---------------------------------------------------------------------------

/// Node classification in the knowledge graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Source,
    Keyword,
}

/// A node in the knowledge graph (D3-compatible shape).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Node identity: truncated source title or keyword text.
    pub id: String,
    /// Display label (same as `id`).
    pub label: String,
    /// Node classification.
    #[serde(rename = "type")]
    pub kind: NodeKind,
}

/// An undirected edge between a source node and a keyword node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
}

/// A simple undirected graph linking sources to extracted keywords.
///
/// Node and link order is first-insertion order, so identical input yields
/// an identical serialized graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

// ---------------------------------------------------------------------------
// ResponseEnvelope
// ---------------------------------------------------------------------------

/// Counts describing a research response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeMetadata {
    /// Source count before truncation to the URL cap.
    pub total_sources: usize,
    /// Source count actually included in the envelope.
    pub processed_sources: usize,
    /// Node count of the knowledge graph.
    pub graph_nodes: usize,
    /// Edge count of the knowledge graph.
    pub graph_edges: usize,
}

/// The cached unit: a complete research response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Always `"success"`.
    pub status: String,
    /// The original query.
    pub query: String,
    /// The requested search depth.
    pub depth: u8,
    /// When the response was assembled.
    pub timestamp: DateTime<Utc>,
    /// Normalized sources, truncated to the configured URL cap.
    pub sources: Vec<Source>,
    /// Graph over the full (pre-truncation) source list.
    pub knowledge_graph: KnowledgeGraph,
    /// Response counts.
    pub metadata: EnvelopeMetadata,
}
