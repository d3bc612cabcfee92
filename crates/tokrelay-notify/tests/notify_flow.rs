use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use tokrelay_core::{Session, Token, TokenSourceKind, TokenSources};
use tokrelay_notify::{
    EmptyTokenPolicy, MessageHandle, NotificationStore, Notifier, NotifierConfig, NotifyOptions,
    NotifyOutcome, StaticConfig, Transport, TransportError,
};

/// What the transport saw: artifact contents and the message text.
#[derive(Debug, Clone, PartialEq)]
struct Delivery {
    tokens: Vec<Token>,
    message: String,
}

#[derive(Default)]
struct SlowTransport {
    sends: Mutex<Vec<Delivery>>,
    edits: Mutex<Vec<(MessageHandle, Delivery)>>,
}

fn read_delivery(artifact: &Path, message: &str) -> Delivery {
    let text = std::fs::read_to_string(artifact).expect("artifact exists while in flight");
    let mut tokens: Vec<Token> = serde_json::from_str(&text).expect("artifact is token JSON");
    // Expiration is stamped per call; compare everything else.
    for token in &mut tokens {
        token.expiration_date = None;
    }
    Delivery {
        tokens,
        message: message.to_owned(),
    }
}

impl Transport for SlowTransport {
    async fn send(
        &self,
        _config: &NotifierConfig,
        message: &str,
        artifact: &Path,
    ) -> Result<Option<MessageHandle>, TransportError> {
        let delivery = read_delivery(artifact, message);
        // Widen the window in which a second create could slip in.
        tokio::time::sleep(Duration::from_millis(25)).await;
        let mut sends = self.sends.lock().expect("lock");
        sends.push(delivery);
        Ok(Some(MessageHandle::new(format!("{}", 1000 + sends.len()))))
    }

    async fn edit(
        &self,
        _config: &NotifierConfig,
        handle: &MessageHandle,
        artifact: &Path,
        message: &str,
    ) -> Result<(), TransportError> {
        let delivery = read_delivery(artifact, message);
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.edits
            .lock()
            .expect("lock")
            .push((handle.clone(), delivery));
        Ok(())
    }
}

fn captured_session(id: &str) -> Session {
    Session {
        id: id.to_owned(),
        username: "bob@example.com".to_owned(),
        password: "pw".to_owned(),
        landing_url: "https://portal.example.com/".to_owned(),
        user_agent: "Mozilla/5.0".to_owned(),
        remote_addr: "198.51.100.4".to_owned(),
        create_time: 1_767_225_600,
        update_time: 1_767_225_660,
        tokens: TokenSources::default()
            .with(
                TokenSourceKind::Session,
                r#"{".example.com":{"/":{"Name":"SID","Value":"cookie-1","Secure":true}}}"#,
            )
            .with(TokenSourceKind::Http, r#"[{"token":"http-1"}]"#)
            .with(TokenSourceKind::Body, r#"[{"token":"body-1"}]"#)
            .with(TokenSourceKind::Custom, r#"[{"token":"custom-1"}]"#),
    }
}

fn build(dir: &Path) -> Notifier<Arc<SlowTransport>, StaticConfig> {
    Notifier::new(
        Arc::new(SlowTransport::default()),
        StaticConfig::new("-100", "123:abc"),
        NotificationStore::new(),
        NotifyOptions {
            artifact_dir: dir.to_owned(),
            empty_tokens: EmptyTokenPolicy::Skip,
        },
    )
}

fn assert_no_artifacts(dir: &Path) {
    let left: Vec<_> = std::fs::read_dir(dir)
        .expect("read dir")
        .map(|e| e.expect("entry").path())
        .collect();
    assert!(left.is_empty(), "artifacts left behind: {left:?}");
}

#[tokio::test]
async fn repeated_notify_is_one_create_and_one_identical_edit() {
    let dir = tempfile::tempdir().expect("tempdir");
    let notifier = build(dir.path());
    let session = captured_session("sess-idem");

    let first = notifier.notify(&session).await.expect("first");
    let second = notifier.notify(&session).await.expect("second");

    let handle = MessageHandle::new("1001");
    assert_eq!(first, NotifyOutcome::Created { handle: Some(handle.clone()) });
    assert_eq!(second, NotifyOutcome::Updated { handle: handle.clone() });

    let transport = notifier.transport();
    let sends = transport.sends.lock().expect("lock").clone();
    let edits = transport.edits.lock().expect("lock").clone();
    assert_eq!(sends.len(), 1);
    assert_eq!(edits.len(), 1);
    assert_eq!(edits[0].0, handle);
    assert_eq!(edits[0].1, sends[0], "edit carries identical content");

    let record = notifier.store().record("sess-idem").await.expect("sent");
    assert_eq!(record.delivered_handle, Some(handle));
    assert_no_artifacts(dir.path());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_notifies_create_exactly_once() {
    const CALLS: usize = 8;
    let dir = tempfile::tempdir().expect("tempdir");
    let notifier = Arc::new(build(dir.path()));

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..CALLS {
        let notifier = Arc::clone(&notifier);
        tasks.spawn(async move { notifier.notify(&captured_session("sess-race")).await });
    }

    let mut created = 0;
    let mut updated = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined.expect("join").expect("notify") {
            NotifyOutcome::Created { .. } => created += 1,
            NotifyOutcome::Updated { .. } => updated += 1,
            NotifyOutcome::Skipped => panic!("session has tokens"),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(updated, CALLS - 1);
    let transport = notifier.transport();
    assert_eq!(transport.sends.lock().expect("lock").len(), 1);
    assert_eq!(transport.edits.lock().expect("lock").len(), CALLS - 1);
    assert_no_artifacts(dir.path());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn distinct_sessions_with_identical_tokens_each_send() {
    let dir = tempfile::tempdir().expect("tempdir");
    let notifier = Arc::new(build(dir.path()));

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..4 {
        let notifier = Arc::clone(&notifier);
        tasks.spawn(async move { notifier.notify(&captured_session(&format!("sess-{i}"))).await });
    }
    while let Some(joined) = tasks.join_next().await {
        assert!(matches!(
            joined.expect("join").expect("notify"),
            NotifyOutcome::Created { .. }
        ));
    }

    assert_eq!(notifier.transport().sends.lock().expect("lock").len(), 4);
    assert_eq!(notifier.store().sent_count().await, 4);
    assert_no_artifacts(dir.path());
}

#[tokio::test]
async fn artifact_holds_tokens_in_source_order_and_summary_does_not() {
    let dir = tempfile::tempdir().expect("tempdir");
    let notifier = build(dir.path());

    notifier
        .notify(&captured_session("sess-order"))
        .await
        .expect("notify");

    let sends = notifier.transport().sends.lock().expect("lock").clone();
    let delivery = &sends[0];
    let values: Vec<_> = delivery.tokens.iter().map(|t| t.value.as_str()).collect();
    assert_eq!(values, vec!["cookie-1", "http-1", "body-1", "custom-1"]);
    assert_eq!(delivery.tokens[0].domain.as_deref(), Some("example.com"));
    assert!(delivery.tokens[0].secure);

    assert!(delivery.message.contains("bob@example.com"));
    assert!(delivery.message.contains("Thu, 01 Jan 2026 00:00:00 UTC"));
    for value in values {
        assert!(!delivery.message.contains(value), "summary leaks {value}");
    }
}

#[tokio::test]
async fn later_observation_updates_with_drifted_fields() {
    let dir = tempfile::tempdir().expect("tempdir");
    let notifier = build(dir.path());

    let mut session = captured_session("sess-drift");
    notifier.notify(&session).await.expect("create");

    session.password = "changed".to_owned();
    session.tokens = session
        .tokens
        .with(TokenSourceKind::Custom, r#"[{"token":"custom-2"}]"#);
    let outcome = notifier.notify(&session).await.expect("update");
    assert!(matches!(outcome, NotifyOutcome::Updated { .. }));

    let edits = notifier.transport().edits.lock().expect("lock").clone();
    let (_, delivery) = &edits[0];
    assert!(delivery.message.contains("changed"));
    assert_eq!(
        delivery.tokens.last().map(|t| t.value.as_str()),
        Some("custom-2")
    );
}
