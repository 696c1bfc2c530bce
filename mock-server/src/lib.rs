//! Echo server used as the far end of real-transport tests.
//!
//! Every request on an ordinary path is answered with a JSON description of
//! what arrived and recorded in memory. `/status/{code}` answers with the
//! requested status, and `/_requests` lists everything recorded so far.

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// What the server saw for a single request.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Echo {
    pub id: Uuid,
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    /// Header names are lower-case; repeated headers keep the last value.
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

pub type Log = Arc<RwLock<Vec<Echo>>>;

pub fn app() -> Router {
    let log: Log = Arc::new(RwLock::new(Vec::new()));
    Router::new()
        .route("/_requests", get(list_requests))
        .route("/status/{code}", any(respond_with_status))
        .fallback(echo)
        .with_state(log)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn echo(
    State(log): State<Log>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Json<Echo> {
    let echo = Echo {
        id: Uuid::new_v4(),
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers: headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect(),
        body,
    };
    tracing::info!(id = %echo.id, method = %echo.method, path = %echo.path, "echo");
    log.write().await.push(echo.clone());
    Json(echo)
}

async fn respond_with_status(Path(code): Path<u16>) -> Result<(StatusCode, String), StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok((status, format!("status {code}")))
}

async fn list_requests(State(log): State<Log>) -> Json<Vec<Echo>> {
    Json(log.read().await.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo() -> Echo {
        Echo {
            id: Uuid::nil(),
            method: "POST".to_string(),
            path: "/1/photos".to_string(),
            query: None,
            headers: BTreeMap::from([("content-type".to_string(), "text/plain".to_string())]),
            body: "hello".to_string(),
        }
    }

    #[test]
    fn echo_serializes_to_json() {
        let json = serde_json::to_value(echo()).unwrap();
        assert_eq!(json["id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["method"], "POST");
        assert_eq!(json["query"], serde_json::Value::Null);
        assert_eq!(json["headers"]["content-type"], "text/plain");
        assert_eq!(json["body"], "hello");
    }

    #[test]
    fn echo_roundtrips_through_json() {
        let json = serde_json::to_string(&echo()).unwrap();
        let back: Echo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, echo());
    }
}
