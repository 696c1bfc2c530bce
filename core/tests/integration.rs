//! End-to-end calls over real HTTP against the mock echo server.
//!
//! # Design
//! Starts the mock server on a random port and drives the client through the
//! default `UreqTransport`, checking what actually arrived on the wire.

use mock_server::Echo;
use postal_core::{
    add_request_pre_processor, add_response_post_processor, CallOptions, CallPatch, Client,
    ClientError, ClientOptions, Format, Payload,
};

async fn start_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { mock_server::run(listener).await.unwrap() });
    format!("http://{addr}")
}

fn echo(body: &str) -> Echo {
    serde_json::from_str(body).unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn requests_reach_the_server() {
    let host = start_server().await;
    let client = Client::new(ClientOptions::new(host).format(Format::Json)).unwrap();
    assert!(!client.config().use_https);

    // GET folds the payload into the query string.
    let response = client
        .get("/1/profile", [("details", "true")], CallOptions::new())
        .await
        .unwrap();
    assert_eq!(response.status, 200);
    let seen = echo(&response.body);
    assert_eq!(seen.method, "GET");
    assert_eq!(seen.path, "/1/profile");
    assert_eq!(seen.query.as_deref(), Some("details=true"));
    assert_eq!(seen.body, "");

    // POST sends the default format.
    let response = client
        .post("1/photos", [("caption", "sunset at 6pm")], CallOptions::new())
        .await
        .unwrap();
    let seen = echo(&response.body);
    assert_eq!(seen.method, "POST");
    assert_eq!(seen.path, "/1/photos");
    assert_eq!(seen.body, r#"{"caption":"sunset at 6pm"}"#);
    assert_eq!(seen.headers["content-type"], "application/json");

    // PATCH with an explicit multipart format.
    let response = client
        .patch(
            "/1/photos/7",
            [("caption", "dusk")],
            CallOptions::new().format("multipart").header("X-Trace", "abc"),
        )
        .await
        .unwrap();
    let seen = echo(&response.body);
    assert_eq!(seen.method, "PATCH");
    assert_eq!(seen.headers["x-trace"], "abc");
    let content_type = &seen.headers["content-type"];
    let boundary = content_type
        .strip_prefix("multipart/form-data; boundary=")
        .unwrap();
    assert_eq!(
        seen.body,
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"caption\"\r\n\r\ndusk\r\n--{boundary}--"
        )
    );

    // PUT and DELETE with raw bodies.
    let response = client
        .put("/notes/1", "remember the milk", CallOptions::new())
        .await
        .unwrap();
    let seen = echo(&response.body);
    assert_eq!(seen.method, "PUT");
    assert_eq!(seen.body, "remember the milk");
    assert_eq!(seen.headers["content-type"], "text/plain");

    let response = client
        .delete("/notes/1", Payload::Empty, CallOptions::new())
        .await
        .unwrap();
    assert_eq!(echo(&response.body).method, "DELETE");
}

#[tokio::test(flavor = "multi_thread")]
async fn error_statuses_are_responses_not_failures() {
    let host = start_server().await;
    let client = Client::new(ClientOptions::new(host)).unwrap();

    let response = client
        .get("/status/404", Payload::Empty, CallOptions::new())
        .await
        .unwrap();
    assert_eq!(response.status, 404);
    assert_eq!(response.body, "status 404");
}

#[tokio::test(flavor = "multi_thread")]
async fn processors_wrap_real_requests() {
    let host = start_server().await;
    let client = Client::new(ClientOptions::new(host)).unwrap();

    let authed = add_request_pre_processor(&client, |_, _, _, options| {
        Ok(CallPatch::new().options(options.clone().header("Authorization", "Bearer t0ken")))
    });
    let strict = add_response_post_processor(&authed, |response| async move {
        if response.status >= 400 {
            return Err(ClientError::processor(response.body));
        }
        Ok(response)
    });

    let response = strict
        .post("/1/photos", [("data", "123")], CallOptions::new())
        .await
        .unwrap();
    let seen = echo(&response.body);
    assert_eq!(seen.headers["authorization"], "Bearer t0ken");
    assert_eq!(seen.body, "data=123");

    let err = strict
        .post("/status/500", Payload::Empty, CallOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "status 500");
}

#[tokio::test(flavor = "multi_thread")]
async fn connection_failure_is_a_transport_error() {
    // Bind then drop to get a port nothing listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = Client::new(ClientOptions::new(format!("http://{addr}"))).unwrap();
    let err = client
        .get("/", Payload::Empty, CallOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
}
