//! Throttled, retrying batch download of filing documents.

use std::pin::pin;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{FuturesOrdered, StreamExt};
use scraper::Html;
use tokio::time::sleep;

use super::Harvester;
use super::config::{RetryPolicy, ThrottleConfig};
use super::error::{HarvestError, Result};
use super::traits::{DocumentSource, FetchOutcome};

/// A downloaded filing body
#[derive(Debug)]
pub enum Document {
    /// Legacy `.txt` submission, kept verbatim
    Text(String),
    /// `.xml`/`.htm` rendering, parsed into a navigable tree
    Markup(Html),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Text,
    Markup,
}

impl DocumentKind {
    /// Decides the kind from the URL suffix alone; the response's declared
    /// content type is never consulted.
    pub fn from_url(url: &str) -> Self {
        if url.ends_with(".txt") {
            DocumentKind::Text
        } else {
            DocumentKind::Markup
        }
    }
}

impl Document {
    pub fn classify(url: &str, body: String) -> Self {
        match DocumentKind::from_url(url) {
            DocumentKind::Text => Document::Text(body),
            DocumentKind::Markup => Document::Markup(Html::parse_document(&body)),
        }
    }

    pub fn kind(&self) -> DocumentKind {
        match self {
            Document::Text(_) => DocumentKind::Text,
            Document::Markup(_) => DocumentKind::Markup,
        }
    }
}

/// Counts issued requests and says when the issuer has to pause.
#[derive(Debug)]
pub struct IssueThrottle {
    config: ThrottleConfig,
    issued: usize,
}

impl IssueThrottle {
    pub fn new(config: ThrottleConfig) -> Self {
        Self { config, issued: 0 }
    }

    /// Records one issued request. Returns the pause owed after it, if any.
    pub fn admit(&mut self) -> Option<Duration> {
        self.issued += 1;
        if self.config.burst > 0 && self.issued == self.config.burst {
            self.issued = 0;
            Some(self.config.pause)
        } else {
            None
        }
    }
}

/// Fetches one document, retrying transient failures per `retry`.
///
/// # Errors
///
/// * `HarvestError::ExhaustedRetry` - Every attempt failed transiently
/// * Any fatal error reported by the source, unchanged
pub async fn fetch_document<D>(source: &D, url: &str, retry: RetryPolicy) -> Result<Document>
where
    D: DocumentSource + ?Sized,
{
    let mut attempt = 1;

    loop {
        match source.fetch_text(url).await {
            FetchOutcome::Body(body) => return Ok(Document::classify(url, body)),
            FetchOutcome::Fatal(e) => return Err(e),
            FetchOutcome::Transient(e) if attempt < retry.max_attempts => {
                tracing::warn!(
                    "Fetch failed for {}: {}. Attempt {}/{}. Retrying in {:?}.",
                    url,
                    e,
                    attempt,
                    retry.max_attempts,
                    retry.backoff
                );
                sleep(retry.backoff).await;
                attempt += 1;
            }
            FetchOutcome::Transient(e) => {
                return Err(HarvestError::ExhaustedRetry {
                    url: url.to_string(),
                    attempts: attempt,
                    source: Box::new(e),
                });
            }
        }
    }
}

/// Downloads every URL and returns the documents in input order.
///
/// Fetches are issued in order and run concurrently on the calling task.
/// After every `throttle.burst` issuances the issuer sleeps for
/// `throttle.pause`; fetches already issued keep progressing meanwhile.
/// The call returns once all fetches have settled, or on the first error, in
/// which case the remaining fetches are dropped.
pub async fn download_all<D>(
    source: &D,
    urls: &[String],
    throttle: ThrottleConfig,
    retry: RetryPolicy,
) -> Result<Vec<Document>>
where
    D: DocumentSource + ?Sized,
{
    let mut throttle = IssueThrottle::new(throttle);
    let mut in_flight = FuturesOrdered::new();
    let mut settled = Vec::with_capacity(urls.len());

    for url in urls {
        in_flight.push_back(fetch_document(source, url, retry));

        if let Some(pause) = throttle.admit() {
            tracing::debug!("Issued a burst of requests, pausing for {:?}", pause);
            let mut pause = pin!(sleep(pause));
            loop {
                tokio::select! {
                    _ = &mut pause => break,
                    Some(result) = in_flight.next(), if !in_flight.is_empty() => {
                        settled.push(result?);
                    }
                }
            }
        }
    }

    while let Some(result) = in_flight.next().await {
        settled.push(result?);
    }

    Ok(settled)
}

#[async_trait]
impl DocumentSource for Harvester {
    async fn fetch_text(&self, url: &str) -> FetchOutcome {
        self.get_text(url).await
    }
}

impl Harvester {
    /// Downloads a batch with this harvester's throttle and retry settings.
    pub async fn download_all(&self, urls: &[String]) -> Result<Vec<Document>> {
        download_all(self, urls, self.throttle, self.retry).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Scripted source: each URL pops outcomes from its queue, then succeeds.
    #[derive(Default)]
    struct ScriptedSource {
        failures: Mutex<HashMap<String, Vec<FetchOutcome>>>,
        delays: HashMap<String, Duration>,
        calls: Mutex<Vec<(String, Instant)>>,
    }

    impl ScriptedSource {
        fn fail_with(self, url: &str, outcomes: Vec<FetchOutcome>) -> Self {
            self.failures.lock().unwrap().insert(url.to_string(), outcomes);
            self
        }

        fn delay(mut self, url: &str, delay: Duration) -> Self {
            self.delays.insert(url.to_string(), delay);
            self
        }

        fn calls_for(&self, url: &str) -> usize {
            self.calls.lock().unwrap().iter().filter(|(u, _)| u == url).count()
        }
    }

    #[async_trait]
    impl DocumentSource for ScriptedSource {
        async fn fetch_text(&self, url: &str) -> FetchOutcome {
            self.calls.lock().unwrap().push((url.to_string(), Instant::now()));
            if let Some(delay) = self.delays.get(url) {
                sleep(*delay).await;
            }
            let next = self
                .failures
                .lock()
                .unwrap()
                .get_mut(url)
                .and_then(|queue| (!queue.is_empty()).then(|| queue.remove(0)));
            next.unwrap_or_else(|| FetchOutcome::Body(format!("<body>{}</body>", url)))
        }
    }

    fn defaults() -> (ThrottleConfig, RetryPolicy) {
        (ThrottleConfig::default(), RetryPolicy::default())
    }

    fn transient() -> FetchOutcome {
        FetchOutcome::Transient(HarvestError::RateLimitExceeded)
    }

    fn urls(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("https://archive.test/{}/form4.xml", i)).collect()
    }

    #[test]
    fn test_classification_by_suffix() {
        assert_eq!(DocumentKind::from_url("https://a.test/1/x.txt"), DocumentKind::Text);
        assert_eq!(DocumentKind::from_url("https://a.test/1/x.xml"), DocumentKind::Markup);
        assert_eq!(DocumentKind::from_url("https://a.test/1/x.htm"), DocumentKind::Markup);

        let text = Document::classify(
            "https://a.test/1/x.txt",
            "<html>not parsed</html>".to_string(),
        );
        assert!(matches!(text, Document::Text(ref body) if body == "<html>not parsed</html>"));

        let markup = Document::classify("https://a.test/1/x.xml", "plain words".to_string());
        assert_eq!(markup.kind(), DocumentKind::Markup);
    }

    #[test]
    fn test_throttle_pauses_after_every_burst() {
        let mut throttle = IssueThrottle::new(ThrottleConfig::default());
        let pauses: Vec<usize> = (1..=20)
            .filter(|_| throttle.admit().is_some())
            .collect();
        assert_eq!(pauses.len(), 2);

        let mut throttle = IssueThrottle::new(ThrottleConfig::default());
        let positions: Vec<usize> = (1..=20)
            .filter_map(|i| throttle.admit().map(|_| i))
            .collect();
        assert_eq!(positions, vec![9, 18]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_of_twenty_pauses_twice() {
        let source = ScriptedSource::default();
        let start = Instant::now();

        let documents = download_all(&source, &urls(20), defaults().0, defaults().1)
            .await
            .unwrap();

        assert_eq!(documents.len(), 20);
        assert_eq!(start.elapsed().as_secs(), 2);

        // The 10th and 19th requests are only issued after a pause
        let calls = source.calls.lock().unwrap();
        assert_eq!((calls[8].1 - start).as_secs(), 0);
        assert_eq!((calls[9].1 - start).as_secs(), 1);
        assert_eq!((calls[18].1 - start).as_secs(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_issued_fetches_progress_during_pause() {
        let all = urls(10);
        // The first request is slower than the pause; issuing continues anyway
        let source = ScriptedSource::default().delay(&all[0], Duration::from_secs(5));
        let start = Instant::now();

        let documents = download_all(&source, &all, defaults().0, defaults().1)
            .await
            .unwrap();

        assert_eq!(documents.len(), 10);
        assert_eq!(start.elapsed().as_secs(), 5);
        assert_eq!((source.calls.lock().unwrap()[9].1 - start).as_secs(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_keep_input_order() {
        let all = vec![
            "https://archive.test/1/slow.xml".to_string(),
            "https://archive.test/1/fast.txt".to_string(),
        ];
        let source = ScriptedSource::default().delay(&all[0], Duration::from_millis(300));

        let documents = download_all(&source, &all, defaults().0, defaults().1)
            .await
            .unwrap();

        assert_eq!(documents[0].kind(), DocumentKind::Markup);
        assert!(matches!(&documents[1], Document::Text(body) if body.contains("fast.txt")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_is_retried_once() {
        let url = "https://archive.test/1/a.txt";
        let source = ScriptedSource::default().fail_with(url, vec![transient()]);
        let start = Instant::now();

        let document = fetch_document(&source, url, RetryPolicy::default()).await.unwrap();

        assert!(matches!(document, Document::Text(_)));
        assert_eq!(source.calls_for(url), 2);
        assert_eq!(start.elapsed().as_secs(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_transient_failure_aborts_batch() {
        let all = urls(3);
        let source = ScriptedSource::default().fail_with(&all[1], vec![transient(), transient()]);

        let result = download_all(&source, &all, defaults().0, defaults().1).await;

        match result {
            Err(HarvestError::ExhaustedRetry { url, attempts, .. }) => {
                assert_eq!(url, all[1]);
                assert_eq!(attempts, 2);
            }
            other => panic!("expected ExhaustedRetry, got {:?}", other.map(|d| d.len())),
        }
        assert_eq!(source.calls_for(&all[1]), 2);
    }

    #[tokio::test]
    async fn test_fatal_failure_is_not_retried() {
        let url = "https://archive.test/1/a.xml";
        let source = ScriptedSource::default().fail_with(
            url,
            vec![FetchOutcome::Fatal(HarvestError::InvalidResponse("404".to_string()))],
        );

        let result = fetch_document(&source, url, RetryPolicy::default()).await;

        assert!(matches!(result, Err(HarvestError::InvalidResponse(_))));
        assert_eq!(source.calls_for(url), 1);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let source = ScriptedSource::default();
        let documents = download_all(&source, &[], defaults().0, defaults().1)
            .await
            .unwrap();
        assert!(documents.is_empty());
    }
}
