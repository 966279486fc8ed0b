//! Blocking and async dispatch over a real HTTP/2 connection to a local
//! cleartext gateway.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use courier_apns::{
    ApnsClient, BridgeOptions, Connection, Credentials, CredentialsError, Endpoint,
    HttpConnection, PushRequest, PushResponse, TransportError,
};
use courier_core::{BatchResult, DeliveryOptions, Notification, Outcome, Payload};
use courier_settings::ConnectionSettings;
use wiremock::matchers::{header, method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOPIC: &str = "com.example.App";

/// Local gateway answering by token prefix: `ok*` → 200, `bad*` → 400,
/// `gone*` → 410. It runs on its own thread, independent of the test's
/// runtime.
async fn local_gateway() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex("^/3/device/ok"))
        .and(header("apns-topic", TOPIC))
        .respond_with(ResponseTemplate::new(200).insert_header("apns-id", "9E0B4A4E-0000"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex("^/3/device/bad"))
        .respond_with(
            ResponseTemplate::new(400).set_body_raw(r#"{"reason":"BadDeviceToken"}"#, "application/json"),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex("^/3/device/gone"))
        .respond_with(ResponseTemplate::new(410).set_body_raw(
            r#"{"reason":"Unregistered","timestamp":"1700000000"}"#,
            "application/json",
        ))
        .mount(&server)
        .await;
    server
}

/// [`HttpConnection`] pointed at the local gateway instead of the
/// production host.
struct Redirected {
    http: HttpConnection,
    from: String,
    to: String,
}

#[async_trait]
impl Connection for Redirected {
    async fn post(&self, mut request: PushRequest) -> Result<PushResponse, TransportError> {
        request.url = request.url.replacen(&self.from, &self.to, 1);
        self.http.post(request).await
    }
}

#[derive(Debug)]
struct NoAuth;

impl Credentials for NoAuth {
    fn authorization(&self, _topic: Option<&str>) -> Result<Option<String>, CredentialsError> {
        Ok(None)
    }
}

fn client_for(server: &MockServer) -> ApnsClient {
    let endpoint = Endpoint::default();
    let connection = Redirected {
        http: HttpConnection::new(&ConnectionSettings::default(), None).unwrap(),
        from: format!("https://{endpoint}"),
        to: server.uri(),
    };
    ApnsClient::builder(Arc::new(NoAuth))
        .connection(Arc::new(connection))
        .bridge(BridgeOptions {
            force_thread_isolation: false,
            join_timeout: Duration::from_secs(10),
        })
        .build()
        .unwrap()
}

fn batch(tokens: &[&str]) -> Vec<Notification> {
    tokens
        .iter()
        .map(|t| Notification::new(*t, Payload::alert("Hello")))
        .collect()
}

fn assert_mixed(results: &BatchResult) {
    assert_eq!(results.len(), 3);
    assert_eq!(results["ok1"], Outcome::Success);
    assert_eq!(
        results["bad1"],
        Outcome::Rejected {
            reason: "BadDeviceToken".into()
        }
    );
    assert!(results["gone1"].is_gone());
}

#[tokio::test]
async fn blocking_send_after_async_send_inside_current_thread_runtime() {
    let server = local_gateway().await;
    let client = client_for(&server);
    let options = DeliveryOptions::for_topic(TOPIC);

    let first = client.send("ok1", Payload::alert("Hello"), &options).await.unwrap();
    assert_eq!(first, Outcome::Success);

    // The runtime's only thread is parked in the bridge while this runs.
    let second = client
        .send_blocking("ok2", Payload::alert("Hello"), &options)
        .unwrap();
    assert_eq!(second, Outcome::Success);

    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn blocking_batch_after_async_batch_inside_runtime() {
    let server = local_gateway().await;
    let client = client_for(&server);
    let options = DeliveryOptions::for_topic(TOPIC);

    let async_results = client
        .send_batch(&batch(&["ok1", "bad1", "gone1"]), &options)
        .await;
    assert_mixed(&async_results);

    let blocking_results = client
        .send_batch_blocking(batch(&["ok1", "bad1", "gone1"]), &options)
        .unwrap();
    assert_eq!(blocking_results, async_results);
}

#[tokio::test]
async fn blocking_results_match_inside_and_outside_runtime() {
    let server = local_gateway().await;
    let client = client_for(&server);
    let options = DeliveryOptions::for_topic(TOPIC);

    let inside = client
        .send_batch_blocking(batch(&["ok1", "bad1", "gone1"]), &options)
        .unwrap();

    let outside = {
        let client = client.clone();
        let options = options.clone();
        std::thread::spawn(move || {
            client
                .send_batch_blocking(batch(&["ok1", "bad1", "gone1"]), &options)
                .unwrap()
        })
        .join()
        .unwrap()
    };

    assert_mixed(&inside);
    assert_eq!(inside, outside);
}

#[test]
fn repeated_blocking_sends_from_plain_thread() {
    let setup = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let server = setup.block_on(local_gateway());
    let client = client_for(&server);
    let options = DeliveryOptions::for_topic(TOPIC);

    for i in 0..5 {
        let outcome = client
            .send_blocking(format!("ok{i}"), Payload::alert("Hello"), &options)
            .unwrap();
        assert_eq!(outcome, Outcome::Success);
    }

    let received = setup.block_on(server.received_requests()).unwrap();
    assert_eq!(received.len(), 5);
}
