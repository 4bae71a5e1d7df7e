//! Knowledge-graph construction from normalized sources.
//!
//! Builds a simple undirected graph linking each source document to the
//! keywords extracted from its content. Node and link order is
//! first-insertion order, so identical input produces an identical graph.

use std::collections::{HashMap, HashSet};

use webscout_shared::{GraphLink, GraphNode, KnowledgeGraph, NodeKind, Source};

/// Source titles are truncated to this many characters for node identity.
const MAX_TITLE_LEN: usize = 50;

/// At most this many keywords are taken per source.
const MAX_KEYWORDS_PER_SOURCE: usize = 10;

/// Tokens must be strictly longer than this to count as keywords.
const MIN_KEYWORD_LEN: usize = 4;

/// Common words excluded from keyword extraction. Kept sorted for binary
/// search.
static STOP_WORDS: &[&str] = &[
    "about", "above", "after", "again", "against", "all", "and", "any", "are", "because", "been",
    "before", "being", "below", "between", "both", "but", "by", "could", "did", "does", "doing",
    "down", "during", "each", "few", "for", "from", "further", "had", "has", "have", "having",
    "her", "here", "hers", "herself", "him", "himself", "his", "how", "into", "its", "itself",
    "just", "more", "most", "myself", "nor", "not", "now", "off", "once", "only", "other",
    "ought", "our", "ours", "ourselves", "out", "over", "own", "same", "she", "should", "some",
    "such", "than", "that", "the", "their", "theirs", "them", "themselves", "then", "there",
    "these", "they", "this", "those", "through", "too", "under", "until", "very", "was", "way",
    "were", "what", "when", "where", "which", "while", "who", "whom", "why", "with", "would",
    "you", "your", "yours", "yourself", "yourselves",
];

fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.binary_search(&token).is_ok()
}

/// Extract keywords from source content.
///
/// Tokens are lowercased whitespace splits, kept when longer than
/// [`MIN_KEYWORD_LEN`] and not a stop word, deduplicated in first-occurrence
/// order, and capped at [`MAX_KEYWORDS_PER_SOURCE`].
pub fn extract_keywords(content: &str) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut keywords = Vec::new();

    for token in content.to_lowercase().split_whitespace() {
        if token.chars().count() <= MIN_KEYWORD_LEN || is_stop_word(token) {
            continue;
        }
        if seen.insert(token.to_string()) {
            keywords.push(token.to_string());
            if keywords.len() == MAX_KEYWORDS_PER_SOURCE {
                break;
            }
        }
    }

    keywords
}

/// Build the knowledge graph over the full source list.
///
/// Each source contributes one `source` node keyed by its truncated title;
/// each extracted keyword contributes (or reuses) a `keyword` node and an
/// undirected edge to the source node. Repeated pairs collapse to one edge.
pub fn build_knowledge_graph(sources: &[Source]) -> KnowledgeGraph {
    let mut nodes: Vec<GraphNode> = Vec::new();
    let mut node_ids: HashMap<String, usize> = HashMap::new();
    let mut links: Vec<GraphLink> = Vec::new();
    let mut seen_links: HashSet<(String, String)> = HashSet::new();

    for source in sources {
        let title: String = source.title.chars().take(MAX_TITLE_LEN).collect();
        add_node(&mut nodes, &mut node_ids, &title, NodeKind::Source);

        for keyword in extract_keywords(&source.content) {
            add_node(&mut nodes, &mut node_ids, &keyword, NodeKind::Keyword);

            // Normalize the pair so the same undirected edge dedups
            // regardless of endpoint roles.
            let pair = if title <= keyword {
                (title.clone(), keyword.clone())
            } else {
                (keyword.clone(), title.clone())
            };
            if seen_links.insert(pair) {
                links.push(GraphLink {
                    source: title.clone(),
                    target: keyword,
                });
            }
        }
    }

    KnowledgeGraph { nodes, links }
}

fn add_node(
    nodes: &mut Vec<GraphNode>,
    node_ids: &mut HashMap<String, usize>,
    id: &str,
    kind: NodeKind,
) {
    if !node_ids.contains_key(id) {
        node_ids.insert(id.to_string(), nodes.len());
        nodes.push(GraphNode {
            id: id.to_string(),
            label: id.to_string(),
            kind,
        });
    }
}
