use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use shiroclient::options::*;
use shiroclient::{
    is_timeout_error, CallOutcome, Client, ClientError, Error, HttpRequest, HttpResponse,
    ProtocolViolation, Result, Transport,
};

#[derive(Clone)]
struct MockTransport {
    status: u16,
    body: Vec<u8>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl MockTransport {
    fn replying(status: u16, body: Value) -> Self {
        Self {
            status,
            body: body.to_string().into_bytes(),
            requests: Default::default(),
        }
    }

    fn sent(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request);
        Ok(HttpResponse {
            status: self.status,
            body: self.body.clone(),
        })
    }
}

#[derive(serde::Deserialize, Debug)]
struct HealthCheckReport {
    status: String,
    service_name: String,
}

#[derive(serde::Deserialize, Debug)]
struct HealthCheckResponse {
    reports: Vec<HealthCheckReport>,
}

fn envelope(error_level: i64, result: Value, code: Value, message: Value, data: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": "ignored",
        "result": {
            "error_level": error_level,
            "result": result,
            "code": code,
            "message": message,
            "data": data,
        },
    })
}

#[tokio::test]
async fn healthcheck_success() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let mut body = envelope(
        0,
        json!({"reports": [{"status": "UP", "service_name": "phylum", "service_version": "1", "timestamp": "now"}]}),
        Value::Null,
        Value::Null,
        Value::Null,
    );
    body["$commit_tx_id"] = json!("tx1");
    let transport = MockTransport::replying(200, body);
    let client = Client::with_transport(
        transport.clone(),
        [with_endpoint("http://h"), with_creator("martin")],
    );

    let outcome = client
        .call("healthcheck", [with_params(json!({})), with_transient_data_map(Vec::<(String, Vec<u8>)>::new())])
        .await
        .unwrap();

    let CallOutcome::Success(ref success) = outcome else {
        panic!("expected success, got {outcome:?}");
    };
    assert_eq!(success.transaction_id(), "tx1");
    let health: HealthCheckResponse = success.unmarshal().unwrap();
    assert_eq!(health.reports.len(), 1);
    assert_eq!(health.reports[0].status, "UP");
    assert_eq!(health.reports[0].service_name, "phylum");

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].url, "http://h");
    assert_eq!(sent[0].headers["content-type"], "application/json");
    let request: Value = serde_json::from_slice(&sent[0].body).unwrap();
    assert_eq!(request["jsonrpc"], "2.0");
    assert_eq!(request["method"], "Call");
    assert_eq!(request["params"]["method"], "healthcheck");
    assert_eq!(request["params"]["params"], json!({}));
    assert_eq!(request["params"]["creator_msp_id"], "martin");
    assert!(uuid::Uuid::parse_str(request["id"].as_str().unwrap()).is_ok());
}

#[tokio::test]
async fn phylum_error_is_returned() {
    let transport = MockTransport::replying(
        200,
        envelope(2, Value::Null, json!(409), json!("duplicate"), json!({"id": "x"})),
    );
    let client = Client::with_transport(transport, [with_endpoint("http://h")]);

    let outcome = client.call("create", []).await.unwrap();
    let failure = outcome.error().expect("failure outcome");
    assert_eq!(failure.code(), 409);
    assert_eq!(failure.message(), "duplicate");
    assert_eq!(failure.data_json(), serde_json::to_vec(&json!({"id": "x"})).unwrap());
}

#[tokio::test]
async fn client_timeout_is_thrown() {
    let transport = MockTransport::replying(
        200,
        envelope(1, Value::Null, json!(1), json!("timed out"), Value::Null),
    );
    let client = Client::with_transport(transport, [with_endpoint("http://h")]);

    let err = client.call("slow", []).await.unwrap_err();
    assert!(matches!(err, Error::Client(ClientError { code: 1, ref message }) if message == "timed out"));
    assert!(is_timeout_error(&err));
}

#[tokio::test]
async fn missing_error_level_is_protocol_violation() {
    let transport = MockTransport::replying(
        200,
        json!({
            "jsonrpc": "2.0",
            "result": {"result": null, "code": null, "message": null, "data": null},
        }),
    );
    let client = Client::with_transport(transport, [with_endpoint("http://h")]);

    let err = client.call("m", []).await.unwrap_err();
    match err {
        Error::Protocol(violation) => {
            assert_eq!(violation.field(), Some("result.error_level"));
            assert!(matches!(violation, ProtocolViolation::MissingField(_)));
        }
        other => panic!("expected protocol violation, got {other:?}"),
    }
}

#[tokio::test]
async fn non_2xx_status_is_still_classified() {
    let transport = MockTransport::replying(
        500,
        envelope(0, json!(1), Value::Null, Value::Null, Value::Null),
    );
    let client = Client::with_transport(transport, [with_endpoint("http://h")]);

    let outcome = client.call("m", []).await.unwrap();
    assert_eq!(outcome.unmarshal::<i32>().unwrap(), 1);
    assert_eq!(outcome.transaction_id(), Some(""));
}

#[tokio::test]
async fn invalid_arguments_fail_before_sending() {
    let transport = MockTransport::replying(200, json!({}));
    let client = Client::with_transport(transport.clone(), []);

    assert!(matches!(
        client.call("", [with_endpoint("http://h")]).await,
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(
        client.call("m", []).await,
        Err(Error::InvalidArgument(_))
    ));
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn call_options_override_base_options() {
    let transport = MockTransport::replying(
        200,
        envelope(0, Value::Null, Value::Null, Value::Null, Value::Null),
    );
    let client = Client::with_transport(
        transport.clone(),
        [
            with_endpoint("http://base"),
            with_header("X-Tenant", "base"),
            with_transient_data("a", b"1".to_vec()),
            with_auth_token("token"),
        ],
    );

    client
        .call(
            "m",
            [
                with_id("fixed"),
                with_header("X-Tenant", "call"),
                with_transient_data("b", b"2".to_vec()),
                with_timestamp_generator(|| "ts".to_string()),
            ],
        )
        .await
        .unwrap();

    let sent = transport.sent();
    assert_eq!(sent[0].url, "http://base");
    assert_eq!(sent[0].headers["x-tenant"], "call");
    assert_eq!(sent[0].headers["authorization"], "Bearer token");
    let request: Value = serde_json::from_slice(&sent[0].body).unwrap();
    assert_eq!(request["id"], "fixed");
    assert_eq!(
        request["params"]["transient"],
        json!({"a": "31", "b": "32", "timestamp_override": "7473"})
    );
}

#[tokio::test]
async fn concurrent_calls_share_a_client() {
    let transport = MockTransport::replying(
        200,
        envelope(0, json!("ok"), Value::Null, Value::Null, Value::Null),
    );
    let client = Client::with_transport(transport.clone(), [with_endpoint("http://h")]);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move { client.call("m", [with_id(format!("req-{i}"))]).await })
        })
        .collect();
    for handle in handles {
        assert!(handle.await.unwrap().unwrap().is_success());
    }

    let mut ids: Vec<String> = transport
        .sent()
        .iter()
        .map(|req| serde_json::from_slice::<Value>(&req.body).unwrap()["id"].as_str().unwrap().to_string())
        .collect();
    ids.sort();
    assert_eq!(ids.len(), 8);
    ids.dedup();
    assert_eq!(ids.len(), 8);
    assert_eq!(client.base_options().len(), 1);
}
