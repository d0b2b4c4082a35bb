// Fetch batch runner
// One render task per endpoint, joined before anything downstream sees results

use crate::errors::RenderError;
use crate::models::{EndpointSpec, FetchResult};
use crate::renderer::PageRenderer;
use crate::telemetry;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

/// Outcome of one fetch batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub results: FetchResult,
    /// Identifiers that failed to load, sorted
    pub failed: Vec<String>,
}

/// Render every endpoint concurrently and wait for all of them.
///
/// Failures are logged and left out of `results`; they never abort the
/// batch. `max_concurrency` of 0 means one in-flight request per endpoint.
#[instrument(skip_all, fields(endpoints = endpoints.len()))]
pub async fn fetch_batch(
    renderer: Arc<dyn PageRenderer>,
    endpoints: &[EndpointSpec],
    max_concurrency: usize,
) -> BatchOutcome {
    let permits = if max_concurrency == 0 {
        endpoints.len().max(1)
    } else {
        max_concurrency
    };
    let semaphore = Arc::new(Semaphore::new(permits));
    let mut tasks = JoinSet::new();
    let mut identifiers = HashMap::with_capacity(endpoints.len());

    for endpoint in endpoints.iter().cloned() {
        let renderer = renderer.clone();
        let semaphore = semaphore.clone();
        let identifier = endpoint.identifier.clone();

        let handle = tasks.spawn(async move {
            let result = match semaphore.acquire_owned().await {
                Ok(_permit) => renderer.render(&endpoint.identifier, &endpoint.selector).await,
                Err(e) => Err(RenderError::Aborted(e.to_string())),
            };
            (endpoint.identifier, result)
        });
        identifiers.insert(handle.id(), identifier);
    }

    let mut outcome = BatchOutcome::default();

    while let Some(joined) = tasks.join_next_with_id().await {
        match joined {
            Ok((_, (identifier, Ok(text)))) => {
                debug!(endpoint = %identifier, "Resource loaded");
                outcome.results.entry(identifier).or_insert(text);
            }
            Ok((_, (identifier, Err(e)))) => {
                warn!(endpoint = %identifier, error = %e, "Resource data failed to load");
                telemetry::record_render_failure();
                outcome.failed.push(identifier);
            }
            Err(e) => {
                let identifier = identifiers.remove(&e.id()).unwrap_or_default();
                warn!(endpoint = %identifier, error = %e, "Render task failed to complete");
                telemetry::record_render_failure();
                outcome.failed.push(identifier);
            }
        }
    }

    outcome.failed.sort();
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct StaticRenderer {
        pages: HashMap<String, Result<String, u16>>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl StaticRenderer {
        fn new(pages: &[(&str, Result<&str, u16>)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(url, page)| (url.to_string(), page.map(str::to_string)))
                    .collect(),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PageRenderer for StaticRenderer {
        async fn render(&self, url: &str, _selector: &str) -> Result<String, RenderError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if url == "panic" {
                panic!("renderer crashed");
            }

            match self.pages.get(url) {
                Some(Ok(text)) => Ok(text.clone()),
                Some(Err(status)) => Err(RenderError::Status(*status)),
                None => Err(RenderError::NoMatch("body".to_string())),
            }
        }
    }

    fn specs(urls: &[&str]) -> Vec<EndpointSpec> {
        urls.iter().map(|u| EndpointSpec::new(*u, "body")).collect()
    }

    #[tokio::test]
    async fn test_batch_collects_successes_and_omits_failures() {
        let renderer = Arc::new(StaticRenderer::new(&[
            ("a", Ok("alpha")),
            ("b", Err(503)),
            ("c", Ok("gamma")),
        ]));

        let outcome = fetch_batch(renderer, &specs(&["a", "b", "c"]), 0).await;

        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.results.get("a").map(String::as_str), Some("alpha"));
        assert_eq!(outcome.results.get("c").map(String::as_str), Some("gamma"));
        assert_eq!(outcome.failed, vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn test_batch_reports_panicked_render_as_failed() {
        let renderer = Arc::new(StaticRenderer::new(&[("a", Ok("alpha"))]));

        let outcome = fetch_batch(renderer, &specs(&["panic", "a"]), 0).await;

        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.failed, vec!["panic".to_string()]);
    }

    #[tokio::test]
    async fn test_batch_with_no_endpoints_is_empty() {
        let renderer = Arc::new(StaticRenderer::new(&[]));
        let outcome = fetch_batch(renderer, &[], 0).await;
        assert_eq!(outcome, BatchOutcome::default());
    }

    #[tokio::test]
    async fn test_batch_respects_concurrency_cap() {
        let renderer = Arc::new(StaticRenderer::new(&[
            ("a", Ok("1")),
            ("b", Ok("2")),
            ("c", Ok("3")),
            ("d", Ok("4")),
        ]));

        let outcome = fetch_batch(renderer.clone(), &specs(&["a", "b", "c", "d"]), 2).await;

        assert_eq!(outcome.results.len(), 4);
        assert!(renderer.peak.load(Ordering::SeqCst) <= 2);
    }
}
