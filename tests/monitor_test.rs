use cookiewatch::monitor::{
    Ack, AgentRequest, AgentResponse, ChangeNotice, CookieMonitor, MessageChannel, MonitorConfig,
    SendError, Sending,
};
use cookiewatch::page::{PageEventKind, PageRealm};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// Channel that records every notice and can be scripted to fail.
struct RecordingChannel {
    sent: Mutex<Vec<ChangeNotice>>,
    failure: Mutex<Option<SendError>>,
}

impl RecordingChannel {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
        })
    }

    fn sent(&self) -> Vec<ChangeNotice> {
        self.sent.lock().unwrap().clone()
    }

    fn fail_with(&self, error: Option<SendError>) {
        *self.failure.lock().unwrap() = error;
    }
}

impl MessageChannel for RecordingChannel {
    fn send(&self, notice: ChangeNotice) -> Sending {
        if let Some(error) = self.failure.lock().unwrap().clone() {
            return Box::pin(std::future::ready(Err(error)));
        }
        self.sent.lock().unwrap().push(notice);
        Box::pin(std::future::ready(Ok(Ack)))
    }
}

fn realm() -> Arc<PageRealm> {
    PageRealm::new(Url::parse("https://example.com/app").unwrap())
}

/// Let a bit more than one poll period elapse (time is paused, so this
/// auto-advances instead of sleeping).
async fn one_poll_period() {
    tokio::time::sleep(Duration::from_millis(1100)).await;
}

#[tokio::test(start_paused = true)]
async fn test_poll_detects_net_change() {
    let realm = realm();
    let channel = RecordingChannel::new();
    let monitor = CookieMonitor::spawn(
        Arc::clone(&realm),
        channel.clone(),
        MonitorConfig::default(),
    );

    // Nothing changed yet
    one_poll_period().await;
    assert!(channel.sent().is_empty());

    realm.document_set_cookie("a=1");
    one_poll_period().await;

    let sent = channel.sent();
    assert_eq!(sent.len(), 1);
    match &sent[0] {
        ChangeNotice::SnapshotChanged {
            previous, current, ..
        } => {
            assert_eq!(previous, "");
            assert_eq!(current, "a=1");
        }
        other => panic!("unexpected notice: {other:?}"),
    }

    // Identical consecutive snapshots never fire
    one_poll_period().await;
    assert_eq!(channel.sent().len(), 1);

    monitor.teardown();
}

#[tokio::test(start_paused = true)]
async fn test_mutations_within_one_period_collapse() {
    let realm = realm();
    let channel = RecordingChannel::new();
    let monitor = CookieMonitor::spawn(
        Arc::clone(&realm),
        channel.clone(),
        MonitorConfig::default(),
    );
    one_poll_period().await;

    realm.document_set_cookie("a=1");
    realm.document_set_cookie("b=2");
    one_poll_period().await;

    let sent = channel.sent();
    assert_eq!(sent.len(), 1);
    match &sent[0] {
        ChangeNotice::SnapshotChanged {
            previous, current, ..
        } => {
            assert_eq!(previous, "");
            assert_eq!(current, "a=1; b=2");
        }
        other => panic!("unexpected notice: {other:?}"),
    }

    monitor.teardown();
}

#[tokio::test(start_paused = true)]
async fn test_unavailable_receiver_is_swallowed() {
    let realm = realm();
    let channel = RecordingChannel::new();
    let monitor = CookieMonitor::spawn(
        Arc::clone(&realm),
        channel.clone(),
        MonitorConfig::default(),
    );
    one_poll_period().await;

    channel.fail_with(Some(SendError::NoReceiver));
    realm.document_set_cookie("a=1");
    one_poll_period().await;

    // The notice was lost but monitoring continues
    assert!(monitor.is_active());
    assert!(channel.sent().is_empty());

    channel.fail_with(None);
    realm.document_set_cookie("b=2");
    one_poll_period().await;
    assert_eq!(channel.sent().len(), 1);

    monitor.teardown();
}

#[tokio::test(start_paused = true)]
async fn test_context_invalidation_stops_everything() {
    let realm = realm();
    let channel = RecordingChannel::new();
    let monitor = CookieMonitor::spawn(
        Arc::clone(&realm),
        channel.clone(),
        MonitorConfig::default(),
    );
    one_poll_period().await;

    channel.fail_with(Some(SendError::ContextInvalidated));
    realm.document_set_cookie("a=1");
    one_poll_period().await;

    assert!(!monitor.is_active());
    assert!(monitor.notifier().is_invalidated());

    // The channel recovering changes nothing; the monitor is gone
    channel.fail_with(None);
    realm.document_set_cookie("b=2");
    one_poll_period().await;
    one_poll_period().await;
    assert!(channel.sent().is_empty());

    // And the message listener is gone too
    assert_eq!(monitor.handle_request(AgentRequest::PageInfo), None);
}

#[tokio::test(start_paused = true)]
async fn test_unload_tears_down() {
    let realm = realm();
    let channel = RecordingChannel::new();
    let monitor = CookieMonitor::spawn(
        Arc::clone(&realm),
        channel.clone(),
        MonitorConfig::default(),
    );
    one_poll_period().await;

    realm.unload();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(!monitor.is_active());

    realm.document_set_cookie("a=1");
    one_poll_period().await;
    assert!(channel.sent().is_empty());

    // Teardown stays idempotent after unload
    monitor.teardown();
    monitor.teardown();
}

#[tokio::test(start_paused = true)]
async fn test_injected_events_are_second_detection_path() {
    let realm = realm();
    let channel = RecordingChannel::new();
    let monitor = CookieMonitor::spawn(
        Arc::clone(&realm),
        channel.clone(),
        MonitorConfig::default(),
    );
    one_poll_period().await;

    let installed = monitor.handle_request(AgentRequest::InstallInstrumentation);
    assert!(matches!(
        installed,
        Some(AgentResponse::Installed(report)) if report.cookie_hook
    ));

    realm.document_set_cookie("a=1");
    one_poll_period().await;

    let sent = channel.sent();
    // Both paths fire for the same write; the consumer treats them as
    // idempotent
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().any(|n| matches!(
        n,
        ChangeNotice::CookieActivity { event, .. } if event.kind == PageEventKind::CookieSet
    )));
    assert!(sent
        .iter()
        .any(|n| matches!(n, ChangeNotice::SnapshotChanged { .. })));

    monitor.teardown();
}

#[tokio::test(start_paused = true)]
async fn test_agent_requests() {
    let realm = realm();
    realm.set_title("Example App");
    realm.document_set_cookie("sid=abc");

    let channel = RecordingChannel::new();
    let monitor = CookieMonitor::spawn(
        Arc::clone(&realm),
        channel.clone(),
        MonitorConfig::default(),
    );

    match monitor.handle_request(AgentRequest::DocumentCookies) {
        Some(AgentResponse::DocumentCookies(cookies)) => {
            assert_eq!(cookies.len(), 1);
            assert_eq!(cookies[0].name, "sid");
            assert_eq!(cookies[0].domain, "example.com");
            assert!(!cookies[0].http_only);
        }
        other => panic!("unexpected response: {other:?}"),
    }

    match monitor.handle_request(AgentRequest::PageInfo) {
        Some(AgentResponse::PageInfo(info)) => {
            assert_eq!(info.hostname, "example.com");
            assert_eq!(info.title, "Example App");
            assert_eq!(info.cookie_count, 1);
        }
        other => panic!("unexpected response: {other:?}"),
    }

    monitor.teardown();
    assert_eq!(monitor.handle_request(AgentRequest::DocumentCookies), None);
}
