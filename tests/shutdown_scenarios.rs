//! End-to-end shutdown scenarios against a real listener
//!
//! Each test binds `127.0.0.1:0`, drives the verifier over HTTP with
//! `reqwest` and checks which trigger ended the process.

use eventhook_verifier::config::VERIFICATION_HEADER;
use eventhook_verifier::{ShutdownReport, ShutdownTrigger, Verifier, VerifierConfig, VerifierResult};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct Running {
    addr: SocketAddr,
    signal: Option<oneshot::Sender<()>>,
    task: JoinHandle<VerifierResult<ShutdownReport>>,
}

impl Running {
    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    fn send_signal(&mut self) {
        if let Some(signal) = self.signal.take() {
            let _ = signal.send(());
        }
    }

    async fn finished(self) -> ShutdownReport {
        tokio::time::timeout(Duration::from_secs(10), self.task)
            .await
            .expect("verifier should shut down")
            .expect("verifier task")
            .expect("verifier result")
    }
}

async fn start(paths: &str, exit_when_done: bool, time_out_hours: u64) -> Running {
    let config = VerifierConfig {
        listen_address: "127.0.0.1:0".into(),
        event_hook_paths: paths.into(),
        exit_when_done,
        time_out_hours,
        ..VerifierConfig::default()
    };

    let verifier = Verifier::bind(config).await.expect("bind");
    let addr = verifier.local_addr().unwrap();
    let (signal, rx) = oneshot::channel::<()>();
    // Dropping the sender is not a signal.
    let task = tokio::spawn(verifier.run_until(async move {
        if rx.await.is_err() {
            std::future::pending::<()>().await;
        }
    }));

    Running {
        addr,
        signal: Some(signal),
        task,
    }
}

async fn verify(client: &reqwest::Client, url: &str, challenge: &str) -> (u16, String) {
    let response = client
        .get(url)
        .header(VERIFICATION_HEADER, challenge)
        .send()
        .await
        .expect("request");
    let status = response.status().as_u16();
    (status, response.text().await.expect("body"))
}

#[tokio::test]
async fn single_path_shuts_down_after_verification() {
    let running = start("/eventhook/test", true, 0).await;
    let client = reqwest::Client::new();

    let (status, body) = verify(
        &client,
        &running.url("/eventhook/test"),
        "random-test-shared-key",
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body, r#"{"verification" : "random-test-shared-key"}"#);

    let report = running.finished().await;
    assert_eq!(report.trigger, ShutdownTrigger::AllVerified);
    assert_eq!(report.stop, Ok(()));
}

#[tokio::test]
async fn two_paths_wait_for_both() {
    let running = start("/hooks/a,/hooks/b", true, 0).await;
    let client = reqwest::Client::new();

    let (status, _) = verify(&client, &running.url("/hooks/b"), "key-b").await;
    assert_eq!(status, 200);

    // Re-verifying the same path does not count twice.
    let (status, _) = verify(&client, &running.url("/hooks/b"), "key-b").await;
    assert_eq!(status, 200);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!running.task.is_finished(), "one verified path must not stop the server");

    let (status, _) = verify(&client, &running.url("/hooks/a"), "key-a").await;
    assert_eq!(status, 200);

    let report = running.finished().await;
    assert_eq!(report.trigger, ShutdownTrigger::AllVerified);
}

#[tokio::test]
async fn failed_attempts_do_not_count() {
    let mut running = start("/hook", true, 0).await;
    let client = reqwest::Client::new();

    let status = client
        .post(running.url("/hook"))
        .header(VERIFICATION_HEADER, "key")
        .send()
        .await
        .unwrap()
        .status();
    assert_eq!(status.as_u16(), 400);

    let (status, body) = verify(&client, &running.url("/hook"), "   ").await;
    assert_eq!(status, 400);
    assert!(body.is_empty());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!running.task.is_finished());

    running.send_signal();
    let report = running.finished().await;
    assert_eq!(report.trigger, ShutdownTrigger::OperatorSignal);
}

#[tokio::test]
async fn exit_when_done_disabled_only_stops_on_signal() {
    let mut running = start("/a,/b", false, 0).await;
    let client = reqwest::Client::new();

    for path in ["/a", "/b", "/a"] {
        let (status, _) = verify(&client, &running.url(path), "key").await;
        assert_eq!(status, 200);
    }

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!running.task.is_finished());

    running.send_signal();
    let report = running.finished().await;
    assert_eq!(report.trigger, ShutdownTrigger::OperatorSignal);
    assert_eq!(report.stop, Ok(()));
}

#[tokio::test(start_paused = true)]
async fn deadline_shuts_down_without_verification() {
    let running = start("/eventhook/test", true, 1).await;
    let started = tokio::time::Instant::now();

    let report = tokio::time::timeout(Duration::from_secs(2 * 3600), running.task)
        .await
        .expect("deadline fires before two hours")
        .unwrap()
        .unwrap();

    assert_eq!(report.trigger, ShutdownTrigger::Deadline);
    assert!(started.elapsed() >= Duration::from_secs(3600));
}
