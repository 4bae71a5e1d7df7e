//! The research pipeline: validate → cache → rate-limit → search →
//! normalize → graph → envelope.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, instrument, warn};

use webscout_ledger::ErrorLedger;
use webscout_search::{SearchMode, SearchProvider, normalize};
use webscout_shared::{
    EnvelopeMetadata, ResearchConfig, ResponseEnvelope, Result, SearchRequest, Source,
    WebScoutError,
};

use crate::cache::ResponseCache;
use crate::graph::build_knowledge_graph;
use crate::limiter::{MAX_CONCURRENT_SEARCHES, RateLimiter};

/// Orchestrates one research request end to end.
///
/// The provider and ledger are injected at construction, so independent
/// agents (and tests) own their collaborators explicitly. The cache and
/// rate limiter are per-agent state shared by all concurrent calls on it.
pub struct ResearchAgent {
    provider: Arc<dyn SearchProvider>,
    ledger: Arc<ErrorLedger>,
    cache: ResponseCache,
    limiter: RateLimiter,
    max_urls: usize,
}

impl ResearchAgent {
    /// Create an agent with the given collaborators and research settings.
    pub fn new(
        provider: Arc<dyn SearchProvider>,
        ledger: Arc<ErrorLedger>,
        config: &ResearchConfig,
    ) -> Self {
        Self {
            provider,
            ledger,
            cache: ResponseCache::new(Duration::from_secs(60 * config.cache_expiry_minutes)),
            limiter: RateLimiter::new(MAX_CONCURRENT_SEARCHES),
            max_urls: config.max_urls,
        }
    }

    /// Run a search and assemble the analyzed response envelope.
    ///
    /// Every failure is recorded in the error ledger with the query, depth,
    /// and pipeline stage before propagating in classified form.
    #[instrument(skip_all, fields(query = %query, depth))]
    pub async fn search_and_analyze(&self, query: &str, depth: i64) -> Result<ResponseEnvelope> {
        match self.run(query, depth).await {
            Ok(envelope) => Ok(envelope),
            Err(err) => {
                let mut context = BTreeMap::new();
                context.insert("query".to_string(), serde_json::json!(query));
                context.insert("depth".to_string(), serde_json::json!(depth));
                context.insert("stage".to_string(), serde_json::json!(stage_of(&err)));
                self.ledger.track_error(&err, context);
                Err(err)
            }
        }
    }

    async fn run(&self, query: &str, depth: i64) -> Result<ResponseEnvelope> {
        let request = SearchRequest::new(query, depth)?;

        let key = ResponseCache::key(request.query(), request.depth());
        if let Some(hit) = self.cache.get(&key) {
            info!("cache hit");
            return Ok(hit);
        }

        let _slot = self.limiter.acquire().await;

        let mode = SearchMode::for_depth(request.depth());
        info!(mode = mode.as_str(), "dispatching search");
        let raw = self.provider.search(request.query(), mode, true).await?;

        let payload = normalize(raw)?;

        let sources: Vec<Source> = payload
            .results
            .into_iter()
            .map(|r| Source::new(r.title, r.url, r.content))
            .collect();

        // Graph over the full list; the envelope truncates afterwards.
        let graph = build_knowledge_graph(&sources);

        let total_sources = sources.len();
        let mut sources = sources;
        sources.truncate(self.max_urls);
        if total_sources > sources.len() {
            warn!(
                total_sources,
                kept = sources.len(),
                "truncating sources to URL cap"
            );
        }

        let envelope = ResponseEnvelope {
            status: "success".into(),
            query: request.query().to_string(),
            depth: request.depth(),
            timestamp: Utc::now(),
            metadata: EnvelopeMetadata {
                total_sources,
                processed_sources: sources.len(),
                graph_nodes: graph.nodes.len(),
                graph_edges: graph.links.len(),
            },
            sources,
            knowledge_graph: graph,
        };

        self.cache.insert(key, envelope.clone());

        info!(
            total_sources,
            graph_nodes = envelope.metadata.graph_nodes,
            graph_edges = envelope.metadata.graph_edges,
            "search complete"
        );

        Ok(envelope)
    }
}

/// Pipeline stage a failure belongs to, for ledger context.
fn stage_of(err: &WebScoutError) -> &'static str {
    match err {
        WebScoutError::Validation { .. } => "validate",
        WebScoutError::Provider { .. } => "search",
        WebScoutError::Serialization(_) => "serialize",
        _ => "search_and_analyze",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubProvider {
        payload: serde_json::Value,
        delay: Duration,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        modes: std::sync::Mutex<Vec<&'static str>>,
    }

    impl StubProvider {
        fn returning(payload: serde_json::Value) -> Arc<Self> {
            Self::slow(payload, Duration::ZERO)
        }

        fn slow(payload: serde_json::Value, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                payload,
                delay,
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                modes: std::sync::Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl SearchProvider for StubProvider {
        async fn search(
            &self,
            _query: &str,
            mode: SearchMode,
            _include_answer: bool,
        ) -> webscout_shared::Result<serde_json::Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.modes.lock().unwrap().push(mode.as_str());

            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            Ok(self.payload.clone())
        }
    }

    fn results_payload(count: usize) -> serde_json::Value {
        let results: Vec<serde_json::Value> = (0..count)
            .map(|i| {
                serde_json::json!({
                    "title": format!("Result {i}"),
                    "url": format!("https://example.com/page-{i}"),
                    "content": format!("content about distributed systems part{i}"),
                })
            })
            .collect();
        serde_json::json!({"results": results})
    }

    fn test_ledger() -> (Arc<ErrorLedger>, std::path::PathBuf) {
        let path = std::env::temp_dir().join(format!("ws-agent-test-{}.json", uuid::Uuid::now_v7()));
        (Arc::new(ErrorLedger::open(&path)), path)
    }

    fn agent_with(provider: Arc<StubProvider>) -> (ResearchAgent, Arc<StubProvider>, std::path::PathBuf) {
        let (ledger, path) = test_ledger();
        let agent = ResearchAgent::new(provider.clone(), ledger, &ResearchConfig::default());
        (agent, provider, path)
    }

    #[tokio::test]
    async fn envelope_truncates_sources_but_counts_all() {
        let (agent, _, path) = agent_with(StubProvider::returning(results_payload(7)));

        let envelope = agent.search_and_analyze("rust async runtimes", 2).await.unwrap();

        assert_eq!(envelope.status, "success");
        assert_eq!(envelope.query, "rust async runtimes");
        assert_eq!(envelope.depth, 2);
        // Default max_urls is 5; the graph covers the full list
        assert_eq!(envelope.sources.len(), 5);
        assert_eq!(envelope.metadata.total_sources, 7);
        assert_eq!(envelope.metadata.processed_sources, 5);
        assert!(envelope.metadata.graph_nodes >= 7);
        assert_eq!(envelope.metadata.graph_nodes, envelope.knowledge_graph.nodes.len());

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn second_call_is_served_from_cache() {
        let (agent, provider, path) = agent_with(StubProvider::returning(results_payload(2)));

        let first = agent.search_and_analyze("rust async runtimes", 2).await.unwrap();
        let second = agent.search_and_analyze("rust async runtimes", 2).await.unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        // Byte-for-byte identical, timestamp included
        assert_eq!(first, second);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn different_depth_misses_cache() {
        let (agent, provider, path) = agent_with(StubProvider::returning(results_payload(2)));

        agent.search_and_analyze("rust async runtimes", 2).await.unwrap();
        agent.search_and_analyze("rust async runtimes", 3).await.unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn depth_selects_search_mode() {
        let (agent, provider, path) = agent_with(StubProvider::returning(results_payload(1)));

        agent.search_and_analyze("shallow query", 1).await.unwrap();
        agent.search_and_analyze("deep query here", 4).await.unwrap();

        assert_eq!(*provider.modes.lock().unwrap(), vec!["basic", "advanced"]);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn invalid_input_is_rejected_and_tracked() {
        let (ledger, path) = test_ledger();
        let agent = ResearchAgent::new(
            StubProvider::returning(results_payload(1)),
            ledger.clone(),
            &ResearchConfig::default(),
        );

        let err = agent.search_and_analyze("ab", 3).await.unwrap_err();
        match err {
            WebScoutError::Validation { fields } => {
                assert!(fields.contains_key("query"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }

        let stats = ledger.snapshot();
        assert_eq!(stats.total_errors, 1);
        assert_eq!(stats.error_kinds["ValidationError"], 1);
        assert_eq!(stats.timeline[0].context["stage"], serde_json::json!("validate"));

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn provider_error_field_is_status_422() {
        let (agent, _, path) =
            agent_with(StubProvider::returning(serde_json::json!({"error": "bad key"})));

        let err = agent.search_and_analyze("rust async", 2).await.unwrap_err();
        match err {
            WebScoutError::Provider { status, .. } => assert_eq!(status, 422),
            other => panic!("expected provider error, got {other:?}"),
        }
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn empty_results_is_status_404() {
        let (agent, _, path) =
            agent_with(StubProvider::returning(serde_json::json!({"results": []})));

        let err = agent.search_and_analyze("rust async", 2).await.unwrap_err();
        match err {
            WebScoutError::Provider { status, .. } => assert_eq!(status, 404),
            other => panic!("expected provider error, got {other:?}"),
        }
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn unparseable_payload_is_status_500_and_tracked() {
        let (ledger, path) = test_ledger();
        let agent = ResearchAgent::new(
            StubProvider::returning(serde_json::json!("<html>down</html>")),
            ledger.clone(),
            &ResearchConfig::default(),
        );

        let err = agent.search_and_analyze("rust async", 2).await.unwrap_err();
        match err {
            WebScoutError::Provider { status, .. } => assert_eq!(status, 500),
            other => panic!("expected provider error, got {other:?}"),
        }

        let stats = ledger.snapshot();
        assert_eq!(stats.error_kinds["ProviderError"], 1);
        assert_eq!(stats.timeline[0].context["stage"], serde_json::json!("search"));

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn concurrent_dispatch_is_bounded_by_limiter() {
        let provider = StubProvider::slow(results_payload(1), Duration::from_millis(40));
        let (ledger, path) = test_ledger();
        let agent = Arc::new(ResearchAgent::new(
            provider.clone(),
            ledger,
            &ResearchConfig::default(),
        ));

        let mut handles = Vec::new();
        for i in 0..12 {
            let agent = agent.clone();
            handles.push(tokio::spawn(async move {
                // Distinct queries so nothing hits the cache
                agent
                    .search_and_analyze(&format!("concurrent query {i}"), 2)
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(provider.calls.load(Ordering::SeqCst), 12);
        assert!(provider.max_in_flight.load(Ordering::SeqCst) <= MAX_CONCURRENT_SEARCHES);

        let _ = std::fs::remove_file(&path);
    }
}
