use crate::candidate::{self, Candidate};
use crate::config::ScanConfig;
use crate::dom::DomQuery;
use crate::protocol::{self, Request, Response};
use scraper::Html;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Interval, MissedTickBehavior};
use url::Url;

/// Provider of the current rendered document
///
/// The driver reads a fresh copy on every tick, so a source backed by
/// something that changes between ticks behaves like a live page.
pub trait DocumentSource: Send + 'static {
    /// Returns the document HTML, or None if it is currently unreadable
    fn current_html(&mut self) -> Option<String>;
}

/// Document source that re-reads a file on every tick
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DocumentSource for FileSource {
    fn current_html(&mut self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(html) => Some(html),
            Err(e) => {
                ::log::warn!("Cannot read document {}: {}", self.path.display(), e);
                None
            }
        }
    }
}

/// Document source over a fixed in-memory string
pub struct InlineSource {
    html: String,
}

impl InlineSource {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }
}

impl DocumentSource for InlineSource {
    fn current_html(&mut self) -> Option<String> {
        Some(self.html.clone())
    }
}

/// Scans one document for usable candidates, in document order
///
/// This is the whole tick body, kept free of any timer coupling: pick
/// the active container, derive the item selector, extract every item,
/// keep the usable ones. No container match yields an empty snapshot.
pub fn scan_document(html: &str, config: &ScanConfig) -> Vec<Candidate> {
    let doc = Html::parse_document(html);

    let Some(container) = active_container_selector(&doc, config) else {
        ::log::debug!("No scan container matched the document");
        return Vec::new();
    };

    let item_selector = format!("{} {}", container, config.item_selector);
    let items = match DomQuery::select_all(&doc, &item_selector) {
        Ok(items) => items,
        Err(e) => {
            ::log::error!("Cannot query items: {}", e);
            return Vec::new();
        }
    };

    let base = parse_base(config);
    items
        .into_iter()
        .map(|item| candidate::extract(item, config, base.as_ref()))
        .filter(|c| c.is_usable())
        .collect()
}

/// First container selector that matches at least one element
///
/// Re-derived on every tick: the active container can change as the
/// user moves around the host page without a full reload.
fn active_container_selector<'a>(doc: &Html, config: &'a ScanConfig) -> Option<&'a str> {
    for selector in &config.container_selectors {
        match DomQuery::select_all(doc, selector) {
            Ok(matches) if !matches.is_empty() => return Some(selector),
            Ok(_) => {}
            Err(e) => ::log::error!("Skipping container selector: {}", e),
        }
    }
    None
}

fn parse_base(config: &ScanConfig) -> Option<Url> {
    let raw = config.base_url.as_deref()?;
    match Url::parse(raw) {
        Ok(url) => Some(url),
        Err(e) => {
            ::log::warn!("Ignoring invalid base_url {:?}: {}", raw, e);
            None
        }
    }
}

enum Command {
    Start,
    Stop,
    Retrieve(oneshot::Sender<Response>),
}

enum Event {
    Command(Option<Command>),
    Tick,
}

/// Spawns a scan driver task over the given source and returns its handle
///
/// The task starts in the idle state; retrieval works in both states
/// (idle answers with an empty snapshot).
pub fn spawn<S: DocumentSource>(source: S, config: ScanConfig) -> DriverHandle {
    let (tx, rx) = mpsc::channel(16);
    let driver = Driver {
        source,
        config,
        snapshot: Vec::new(),
    };
    let task = tokio::spawn(driver.run(rx));
    DriverHandle { tx, task }
}

struct Driver<S> {
    source: S,
    config: ScanConfig,
    snapshot: Vec<Candidate>,
}

impl<S: DocumentSource> Driver<S> {
    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        // The timer is present iff the driver is scanning; everything
        // here mutates from this single task, no locks involved.
        let mut interval: Option<Interval> = None;

        loop {
            let event = tokio::select! {
                command = rx.recv() => Event::Command(command),
                _ = tick_ready(interval.as_mut()) => Event::Tick,
            };

            match event {
                Event::Command(None) => break,
                Event::Command(Some(Command::Start)) => {
                    if interval.is_some() {
                        ::log::debug!("Scan already running, start ignored");
                        continue;
                    }
                    ::log::info!(
                        "Starting page scan every {}ms",
                        self.config.poll_interval_ms
                    );

                    // Immediate first tick so the consumer never waits a
                    // full poll interval for an initial snapshot.
                    self.tick();

                    let period = Duration::from_millis(self.config.poll_interval_ms.max(1));
                    let mut timer = time::interval_at(time::Instant::now() + period, period);
                    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    interval = Some(timer);
                }
                Event::Command(Some(Command::Stop)) => {
                    if interval.is_none() {
                        ::log::debug!("Scan not running, stop ignored");
                        continue;
                    }
                    ::log::info!("Stopping page scan");
                    interval = None;
                    self.snapshot.clear();
                }
                Event::Command(Some(Command::Retrieve(reply))) => {
                    // Requester may have gone away; that is not an error.
                    let _ = reply.send(self.snapshot.clone());
                }
                Event::Tick => self.tick(),
            }
        }

        ::log::debug!("Scan driver task finished");
    }

    fn tick(&mut self) {
        let snapshot = match self.source.current_html() {
            Some(html) => scan_document(&html, &self.config),
            None => Vec::new(),
        };
        ::log::debug!("Scan tick found {} usable candidates", snapshot.len());
        self.snapshot = snapshot;
    }
}

async fn tick_ready(interval: Option<&mut Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Handle to a running scan driver task
///
/// This is the sole coupling point between the driver and any
/// presentation surface; presentation code never touches the document.
pub struct DriverHandle {
    tx: mpsc::Sender<Command>,
    task: JoinHandle<()>,
}

impl DriverHandle {
    /// Begin watching the document; a no-op if already scanning
    pub async fn start(&self) {
        self.send(Command::Start).await;
    }

    /// Stop watching and reset the snapshot; a no-op if idle
    pub async fn stop(&self) {
        self.send(Command::Stop).await;
    }

    async fn send(&self, command: Command) {
        if self.tx.send(command).await.is_err() {
            ::log::error!("Scan driver task is gone, command dropped");
        }
    }

    /// Current snapshot of usable candidates, in document order
    pub async fn retrieve_candidates(&self) -> Response {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.tx.send(Command::Retrieve(reply_tx)).await.is_err() {
            ::log::error!("Scan driver task is gone, returning no candidates");
            return Vec::new();
        }
        match reply_rx.await {
            Ok(snapshot) => snapshot,
            Err(_) => {
                ::log::error!("Scan driver dropped the reply channel");
                Vec::new()
            }
        }
    }

    /// Answers a typed protocol request
    pub async fn request(&self, request: Request) -> Response {
        match request {
            Request::RetrieveCandidates => self.retrieve_candidates().await,
        }
    }

    /// Answers a raw message from the untrusted transport
    ///
    /// Returns None (and no response goes out) for messages that do not
    /// decode; the handle stays usable afterwards.
    pub async fn handle_raw(&self, raw: &str) -> Option<String> {
        let request = protocol::decode_request(raw)?;
        let response = self.request(request).await;
        match protocol::encode_response(&response) {
            Ok(encoded) => Some(encoded),
            Err(e) => {
                ::log::error!("Cannot encode response: {}", e);
                None
            }
        }
    }

    /// Shut the driver task down and wait for it to finish
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.task.await {
            ::log::warn!("Scan driver task ended abnormally: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    fn doc_with_items(titles: &[&str]) -> String {
        let mut items = String::new();
        for (i, title) in titles.iter().enumerate() {
            items.push_str(&format!(
                r##"<div class="wrap">
                        <ytd-thumbnail>
                            <a id="thumbnail" href="https://example.com/watch?v={i}"></a>
                        </ytd-thumbnail>
                        <a id="video-title">{title}</a>
                    </div>"##
            ));
        }
        format!(r#"<html><body><ytd-browse role="main">{items}</ytd-browse></body></html>"#)
    }

    fn titles(snapshot: &[Candidate]) -> Vec<&str> {
        snapshot.iter().filter_map(|c| c.title.as_deref()).collect()
    }

    /// Serves each queued document once, then keeps serving the last one
    struct QueueSource {
        docs: VecDeque<String>,
    }

    impl QueueSource {
        fn new(docs: &[String]) -> Self {
            Self {
                docs: docs.iter().cloned().collect(),
            }
        }
    }

    impl DocumentSource for QueueSource {
        fn current_html(&mut self) -> Option<String> {
            if self.docs.len() > 1 {
                self.docs.pop_front()
            } else {
                self.docs.front().cloned()
            }
        }
    }

    #[test]
    fn test_scan_document_order_and_filtering() {
        let config = ScanConfig::default();
        let mut html = doc_with_items(&["First", "Second"]);
        // An item with no link at all must be excluded, not fail the scan
        html = html.replace(
            "</ytd-browse>",
            r##"<div class="wrap"><ytd-thumbnail></ytd-thumbnail><a id="video-title">Linkless</a></div></ytd-browse>"##,
        );

        let snapshot = scan_document(&html, &config);
        assert_eq!(titles(&snapshot), vec!["First", "Second"]);
    }

    #[test]
    fn test_scan_document_without_container() {
        let config = ScanConfig::default();
        let html = r#"<html><body><p>nothing to see</p></body></html>"#;
        assert!(scan_document(html, &config).is_empty());
    }

    #[test]
    fn test_scan_document_container_with_no_items() {
        let config = ScanConfig::default();
        let html = r#"<html><body><ytd-browse role="main"></ytd-browse></body></html>"#;
        assert!(scan_document(html, &config).is_empty());
    }

    #[test]
    fn test_container_priority_order() {
        let config = ScanConfig::default();
        // Both containers present: the first selector in the list wins,
        // so only items under ytd-watch-flexy are scanned.
        let html = format!(
            r##"<html><body>
                <ytd-watch-flexy role="main">
                    <div class="wrap">
                        <ytd-thumbnail><a id="thumbnail" href="https://example.com/watch?v=w"></a></ytd-thumbnail>
                        <a id="video-title">Watch item</a>
                    </div>
                </ytd-watch-flexy>
                {}
            </body></html>"##,
            r#"<ytd-browse role="main"><div class="wrap"><ytd-thumbnail><a id="thumbnail" href="https://example.com/watch?v=b"></a></ytd-thumbnail><a id="video-title">Browse item</a></div></ytd-browse>"#
        );

        let snapshot = scan_document(&html, &config);
        assert_eq!(titles(&snapshot), vec!["Watch item"]);
    }

    #[tokio::test]
    async fn test_start_then_retrieve() {
        let source = InlineSource::new(doc_with_items(&["A", "B"]));
        let handle = spawn(source, ScanConfig::default());

        handle.start().await;
        let snapshot = handle.retrieve_candidates().await;
        assert_eq!(titles(&snapshot), vec!["A", "B"]);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_retrieve_while_idle_is_empty() {
        let source = InlineSource::new(doc_with_items(&["A"]));
        let handle = spawn(source, ScanConfig::default());

        assert!(handle.retrieve_candidates().await.is_empty());

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_stop_clears_snapshot() {
        let source = InlineSource::new(doc_with_items(&["A", "B"]));
        let handle = spawn(source, ScanConfig::default());

        handle.start().await;
        assert_eq!(handle.retrieve_candidates().await.len(), 2);

        handle.stop().await;
        assert!(handle.retrieve_candidates().await.is_empty());

        // A second stop while idle is a no-op
        handle.stop().await;
        assert!(handle.retrieve_candidates().await.is_empty());

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_start_is_idempotent_and_restartable() {
        let source = InlineSource::new(doc_with_items(&["A"]));
        let handle = spawn(source, ScanConfig::default());

        handle.start().await;
        handle.start().await;
        assert_eq!(handle.retrieve_candidates().await.len(), 1);

        handle.stop().await;
        handle.start().await;
        assert_eq!(handle.retrieve_candidates().await.len(), 1);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_empty_document_never_fails() {
        let source = InlineSource::new("<html><body></body></html>");
        let handle = spawn(source, ScanConfig::default());

        handle.start().await;
        assert!(handle.retrieve_candidates().await.is_empty());

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_raw_boundary_stays_open_after_bad_message() {
        let source = InlineSource::new(doc_with_items(&["A"]));
        let handle = spawn(source, ScanConfig::default());
        handle.start().await;

        assert!(handle.handle_raw(r#"{"type":"unknownThing"}"#).await.is_none());

        let encoded = handle.handle_raw(r#"{"type":"retrieveCandidates"}"#).await;
        let encoded = encoded.expect("valid request should get a response");
        assert!(encoded.contains(r#""title":"A""#));

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_rescans_changed_document() {
        let source = QueueSource::new(&[
            doc_with_items(&["Only"]),
            doc_with_items(&["New one", "New two"]),
        ]);
        let handle = spawn(source, ScanConfig::default());

        handle.start().await;
        assert_eq!(handle.retrieve_candidates().await.len(), 1);

        // Cross the poll interval and let the driver take its tick
        time::advance(Duration::from_millis(1250)).await;
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        let snapshot = handle.retrieve_candidates().await;
        assert_eq!(titles(&snapshot), vec!["New one", "New two"]);

        handle.shutdown().await;
    }
}
