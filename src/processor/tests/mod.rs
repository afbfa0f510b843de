use super::*;
use crate::config::{Config, DedupConfig, DownloadConfig, PersistenceConfig};
use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// Build a minimal single-file torrent payload with the given name
fn torrent_payload(name: &str) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(b"d4:infod6:lengthi1024e4:name");
    payload.extend_from_slice(format!("{}:{}", name.len(), name).as_bytes());
    payload.extend_from_slice(b"12:piece lengthi16384ee");
    payload.push(b'e');
    payload
}

/// Fetcher returning a fixed payload and counting invocations
struct ScriptedFetcher {
    payload: Vec<u8>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    fn new(payload: Vec<u8>) -> Self {
        Self {
            payload,
            calls: AtomicUsize::new(0),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TorrentFetcher for ScriptedFetcher {
    async fn fetch(&self, _url: &str) -> crate::Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.payload.clone())
    }
}

/// Fetcher that always fails with a transport-style error
struct FailingFetcher;

#[async_trait]
impl TorrentFetcher for FailingFetcher {
    async fn fetch(&self, url: &str) -> crate::Result<Vec<u8>> {
        Err(crate::Error::InvalidTorrent(format!(
            "connection refused: {}",
            url
        )))
    }
}

fn test_config(root: &Path, search_dirs: Vec<std::path::PathBuf>) -> Config {
    Config {
        persistence: PersistenceConfig {
            ledger_path: root.join("ledger.db"),
        },
        dedup: DedupConfig { search_dirs },
        download: DownloadConfig {
            target_dir: Some(root.join("torrents")),
            ..Default::default()
        },
        ..Default::default()
    }
}

async fn create_test_downloader() -> (RssDownloader, TempDir) {
    let root = tempfile::tempdir().unwrap();
    let downloader = RssDownloader::new(test_config(root.path(), Vec::new()))
        .await
        .unwrap();
    (downloader, root)
}

#[tokio::test]
async fn test_new_url_is_downloaded() {
    let (downloader, root) = create_test_downloader().await;
    let fetcher = ScriptedFetcher::new(torrent_payload("My.Show.S01E01"));

    let outcome = downloader
        .process("http://x/a.torrent", &fetcher)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        Outcome::Downloaded {
            content_id: "My.Show.S01E01".to_string()
        }
    );

    // Torrent file written under the sanitized name
    let written = root.path().join("torrents").join("My.Show.S01E01.torrent");
    assert_eq!(
        std::fs::read(written).unwrap(),
        torrent_payload("My.Show.S01E01")
    );

    // Ledger row in terminal downloaded state
    let entry = downloader
        .db
        .get_entry("http://x/a.torrent")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.path, "My.Show.S01E01");
    assert!(entry.is_downloaded());
    assert!(entry.is_finished());
}

#[tokio::test]
async fn test_second_process_is_already_processed_without_fetching() {
    let (downloader, _root) = create_test_downloader().await;
    let fetcher = ScriptedFetcher::new(torrent_payload("My.Show.S01E01"));

    let first = downloader
        .process("http://x/a.torrent", &fetcher)
        .await
        .unwrap();
    assert!(matches!(first, Outcome::Downloaded { .. }));

    let second = downloader
        .process("http://x/a.torrent", &fetcher)
        .await
        .unwrap();
    assert_eq!(second, Outcome::AlreadyProcessed);

    // The fetch collaborator must not be consulted for a terminal URL
    assert_eq!(fetcher.call_count(), 1);
}

#[tokio::test]
async fn test_on_disk_content_is_skipped_as_duplicate() {
    let root = tempfile::tempdir().unwrap();
    let complete = root.path().join("complete");
    std::fs::create_dir_all(complete.join("My.Show.S01E01")).unwrap();

    let downloader = RssDownloader::new(test_config(root.path(), vec![complete]))
        .await
        .unwrap();
    let fetcher = ScriptedFetcher::new(torrent_payload("My.Show.S01E01"));

    let outcome = downloader
        .process("http://x/a.torrent", &fetcher)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        Outcome::Duplicate {
            content_id: "My.Show.S01E01".to_string()
        }
    );

    // Duplicate precedence: the materializer must never run
    assert!(!root
        .path()
        .join("torrents")
        .join("My.Show.S01E01.torrent")
        .exists());

    let entry = downloader
        .db
        .get_entry("http://x/a.torrent")
        .await
        .unwrap()
        .unwrap();
    assert!(entry.is_finished());
    assert!(!entry.is_downloaded());
}

#[tokio::test]
async fn test_existing_target_file_is_treated_as_duplicate() {
    let (downloader, root) = create_test_downloader().await;

    let target = root.path().join("torrents");
    std::fs::write(target.join("My.Show.S01E01.torrent"), b"prior run").unwrap();

    let fetcher = ScriptedFetcher::new(torrent_payload("My.Show.S01E01"));
    let outcome = downloader
        .process("http://x/a.torrent", &fetcher)
        .await
        .unwrap();

    assert!(matches!(outcome, Outcome::Duplicate { .. }));

    // Existing file must not be overwritten
    assert_eq!(
        std::fs::read(target.join("My.Show.S01E01.torrent")).unwrap(),
        b"prior run"
    );

    let entry = downloader
        .db
        .get_entry("http://x/a.torrent")
        .await
        .unwrap()
        .unwrap();
    assert!(entry.is_finished());
    assert!(!entry.is_downloaded());
}

#[tokio::test]
async fn test_fetch_failure_leaves_row_pending_and_retryable() {
    let (downloader, _root) = create_test_downloader().await;

    let outcome = downloader
        .process("http://x/a.torrent", &FailingFetcher)
        .await
        .unwrap();
    assert!(matches!(outcome, Outcome::FetchFailed { .. }));

    // Row stays claimed but unfinished
    let entry = downloader
        .db
        .get_entry("http://x/a.torrent")
        .await
        .unwrap()
        .unwrap();
    assert!(!entry.is_finished());

    // A later process call must not report the URL as terminal
    let again = downloader
        .process("http://x/a.torrent", &FailingFetcher)
        .await
        .unwrap();
    assert_eq!(again, Outcome::Pending);

    // Explicit retry with a working fetcher completes the row
    let fetcher = ScriptedFetcher::new(torrent_payload("My.Show.S01E01"));
    let retried = downloader
        .retry("http://x/a.torrent", &fetcher)
        .await
        .unwrap();
    assert!(matches!(retried, Outcome::Downloaded { .. }));

    let entry = downloader
        .db
        .get_entry("http://x/a.torrent")
        .await
        .unwrap()
        .unwrap();
    assert!(entry.is_finished());
    assert!(entry.is_downloaded());
}

#[tokio::test]
async fn test_retry_of_finished_url_is_already_processed() {
    let (downloader, _root) = create_test_downloader().await;
    let fetcher = ScriptedFetcher::new(torrent_payload("My.Show.S01E01"));

    downloader
        .process("http://x/a.torrent", &fetcher)
        .await
        .unwrap();

    let outcome = downloader
        .retry("http://x/a.torrent", &fetcher)
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::AlreadyProcessed);
    assert_eq!(fetcher.call_count(), 1);
}

#[tokio::test]
async fn test_retry_of_unknown_url_is_an_error() {
    let (downloader, _root) = create_test_downloader().await;
    let fetcher = ScriptedFetcher::new(torrent_payload("My.Show.S01E01"));

    let result = downloader.retry("http://x/never-seen.torrent", &fetcher).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_malformed_payload_is_a_fetch_failure() {
    let (downloader, _root) = create_test_downloader().await;
    let fetcher = ScriptedFetcher::new(b"<html>not a torrent</html>".to_vec());

    let outcome = downloader
        .process("http://x/a.torrent", &fetcher)
        .await
        .unwrap();
    assert!(matches!(outcome, Outcome::FetchFailed { .. }));

    let entry = downloader
        .db
        .get_entry("http://x/a.torrent")
        .await
        .unwrap()
        .unwrap();
    assert!(!entry.is_finished());
}

#[tokio::test]
async fn test_skip_marks_url_finished_without_fetch() {
    let (downloader, _root) = create_test_downloader().await;

    downloader.skip("http://x/unwanted.torrent").await.unwrap();

    let entry = downloader
        .db
        .get_entry("http://x/unwanted.torrent")
        .await
        .unwrap()
        .unwrap();
    assert!(entry.is_finished());
    assert!(!entry.is_downloaded());

    // Skipped URLs are terminal for later runs
    let fetcher = ScriptedFetcher::new(torrent_payload("X"));
    let outcome = downloader
        .process("http://x/unwanted.torrent", &fetcher)
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::AlreadyProcessed);
    assert_eq!(fetcher.call_count(), 0);
}

#[tokio::test]
async fn test_content_name_sanitized_before_materialization() {
    let (downloader, root) = create_test_downloader().await;
    let fetcher = ScriptedFetcher::new(torrent_payload("Weird/Name*?"));

    let outcome = downloader
        .process("http://x/weird.torrent", &fetcher)
        .await
        .unwrap();
    assert!(matches!(outcome, Outcome::Downloaded { .. }));

    assert!(root
        .path()
        .join("torrents")
        .join("Weird_Name__.torrent")
        .is_file());

    // The ledger records the unsanitized content identifier
    let entry = downloader
        .db
        .get_entry("http://x/weird.torrent")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.path, "Weird/Name*?");
}

#[tokio::test]
async fn test_same_content_under_two_urls_registers_once() {
    // Two workers with separate target directories share one ledger; the
    // path uniqueness constraint must reject the second registration.
    let root_a = tempfile::tempdir().unwrap();
    let root_b = tempfile::tempdir().unwrap();
    let ledger = root_a.path().join("shared-ledger.db");

    let mut config_a = test_config(root_a.path(), Vec::new());
    config_a.persistence.ledger_path = ledger.clone();
    let mut config_b = test_config(root_b.path(), Vec::new());
    config_b.persistence.ledger_path = ledger;

    let worker_a = RssDownloader::new(config_a).await.unwrap();
    let worker_b = RssDownloader::new(config_b).await.unwrap();

    let fetcher = ScriptedFetcher::new(torrent_payload("My.Show.S01E01"));

    let first = worker_a
        .process("http://tracker-a/x.torrent", &fetcher)
        .await
        .unwrap();
    assert!(matches!(first, Outcome::Downloaded { .. }));

    let second = worker_b
        .process("http://tracker-b/y.torrent", &fetcher)
        .await
        .unwrap();
    assert!(matches!(second, Outcome::Duplicate { .. }));

    // The losing URL still reaches a terminal state
    let entry = worker_b
        .db
        .get_entry("http://tracker-b/y.torrent")
        .await
        .unwrap()
        .unwrap();
    assert!(entry.is_finished());
    assert!(!entry.is_downloaded());
}

#[tokio::test]
async fn test_unfinished_lists_interrupted_urls() {
    let (downloader, _root) = create_test_downloader().await;

    downloader
        .process("http://x/broken.torrent", &FailingFetcher)
        .await
        .unwrap();

    let fetcher = ScriptedFetcher::new(torrent_payload("Good.Show"));
    downloader
        .process("http://x/good.torrent", &fetcher)
        .await
        .unwrap();

    let unfinished = downloader.unfinished().await.unwrap();
    assert_eq!(unfinished.len(), 1);
    assert_eq!(unfinished[0].url, "http://x/broken.torrent");
}

#[tokio::test]
async fn test_missing_target_dir_is_a_config_error() {
    let root = tempfile::tempdir().unwrap();
    let mut config = test_config(root.path(), Vec::new());
    config.download.target_dir = None;

    let result = RssDownloader::new(config).await;
    assert!(matches!(result, Err(Error::Config { .. })));
}

#[tokio::test]
async fn test_finish_skips_notification_for_empty_run() {
    struct PanickyNotifier;

    #[async_trait]
    impl Notifier for PanickyNotifier {
        async fn notify(&self, _body: &str) -> crate::Result<()> {
            panic!("empty run must not notify");
        }
    }

    let (downloader, _root) = create_test_downloader().await;
    let report = RunReport::new();

    downloader
        .finish(&report, Some(&PanickyNotifier))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_finish_succeeds_when_report_delivery_fails() {
    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn notify(&self, _body: &str) -> crate::Result<()> {
            Err(Error::Notification("endpoint unreachable".to_string()))
        }
    }

    let (downloader, _root) = create_test_downloader().await;
    let fetcher = ScriptedFetcher::new(torrent_payload("My.Show.S01E01"));

    let mut report = RunReport::new();
    let outcome = downloader
        .process("http://x/a.torrent", &fetcher)
        .await
        .unwrap();
    report.record("http://x/a.torrent", &outcome);

    // Ledger state is committed; a failed delivery must not fail the run
    downloader
        .finish(&report, Some(&FailingNotifier))
        .await
        .unwrap();
}
