/// In-process fake of the Cosmos DB REST API
///
/// Serves the subset of endpoints the task store uses, verifies every
/// master-key signature, and exposes knobs for paging and fault injection:
/// - `page_size`: documents per feed page (continuation tokens are offsets)
/// - `fail_with`: answer every request with this status
///
/// Each test gets its own server on an ephemeral port.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use taskboard_shared::cosmos::CosmosConfig;

/// Master key the fake accepts
pub const ACCOUNT_KEY: &[u8] = b"fake-cosmos-account-key";

/// Mutable server state
#[derive(Debug, Default)]
pub struct FakeState {
    pub databases: Vec<String>,
    /// Container link -> partition key paths
    pub containers: HashMap<String, Value>,
    /// Container link -> documents in insertion order
    pub documents: HashMap<String, Vec<Value>>,
    pub page_size: usize,
    pub fail_with: Option<u16>,
    /// `METHOD path` of every authenticated request
    pub requests: Vec<String>,
    etag_counter: u64,
}

/// Handle to a running fake server
pub struct FakeCosmos {
    pub endpoint: String,
    pub state: Arc<Mutex<FakeState>>,
}

impl FakeCosmos {
    /// Starts a fresh server
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(FakeState {
            page_size: 100,
            ..Default::default()
        }));

        let app = Router::new().fallback(handle).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            endpoint: format!("http://{}", addr),
            state,
        }
    }

    /// Client configuration that authenticates against this server
    pub fn config(&self) -> CosmosConfig {
        CosmosConfig::new(self.endpoint.clone(), STANDARD.encode(ACCOUNT_KEY))
    }

    /// Client configuration with a key the server rejects
    pub fn config_with_wrong_key(&self) -> CosmosConfig {
        CosmosConfig::new(self.endpoint.clone(), STANDARD.encode(b"some-other-key"))
    }

    pub fn set_page_size(&self, size: usize) {
        self.state.lock().unwrap().page_size = size;
    }

    pub fn fail_with(&self, status: Option<u16>) {
        self.state.lock().unwrap().fail_with = status;
    }

    pub fn request_log(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }
}

fn error(status: StatusCode, code: &str, message: &str) -> Response {
    (status, Json(json!({ "code": code, "message": message }))).into_response()
}

/// Splits a request path into (resource type, resource link)
fn resource_of(segments: &[String]) -> (String, String) {
    if segments.len() % 2 == 1 {
        let (link, kind) = segments.split_at(segments.len() - 1);
        (kind[0].clone(), link.join("/"))
    } else {
        (segments[segments.len() - 2].clone(), segments.join("/"))
    }
}

fn signature_ok(method: &Method, kind: &str, link: &str, headers: &HeaderMap) -> bool {
    let Some(date) = headers.get("x-ms-date").and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) else {
        return false;
    };
    if headers.get("x-ms-version").is_none() {
        return false;
    }

    let payload = format!(
        "{}\n{}\n{}\n{}\n\n",
        method.as_str().to_lowercase(),
        kind,
        link,
        date.to_lowercase()
    );
    let mut mac = Hmac::<Sha256>::new_from_slice(ACCOUNT_KEY).unwrap();
    mac.update(payload.as_bytes());
    let expected = format!(
        "type=master&ver=1.0&sig={}",
        STANDARD.encode(mac.finalize().into_bytes())
    );

    urlencoding::decode(auth).map(|d| d == expected).unwrap_or(false)
}

fn partition_key_ok(headers: &HeaderMap, id: &str) -> bool {
    headers
        .get("x-ms-documentdb-partitionkey")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| serde_json::from_str::<Vec<String>>(v).ok())
        .map(|keys| keys == vec![id.to_string()])
        .unwrap_or(false)
}

fn with_system_fields(state: &mut FakeState, mut doc: Value) -> Value {
    state.etag_counter += 1;
    if let Some(obj) = doc.as_object_mut() {
        obj.insert("_rid".to_string(), json!(format!("rid{}", state.etag_counter)));
        obj.insert("_etag".to_string(), json!(format!("\"{:08}\"", state.etag_counter)));
        obj.insert("_ts".to_string(), json!(1_700_000_000 + state.etag_counter));
    }
    doc
}

async fn handle(
    State(state): State<Arc<Mutex<FakeState>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let segments: Vec<String> = uri
        .path()
        .trim_matches('/')
        .split('/')
        .map(|s| urlencoding::decode(s).map(|d| d.into_owned()).unwrap_or_default())
        .collect();
    let (kind, link) = resource_of(&segments);

    if !signature_ok(&method, &kind, &link, &headers) {
        return error(StatusCode::UNAUTHORIZED, "Unauthorized", "The input authorization token can't serve the request.");
    }

    let mut state = state.lock().unwrap();
    state.requests.push(format!("{} {}", method, uri.path()));

    if let Some(status) = state.fail_with {
        let status = StatusCode::from_u16(status).unwrap();
        return error(status, "Injected", "injected failure");
    }

    let body: Value = if body.is_empty() {
        Value::Null
    } else {
        match serde_json::from_slice(&body) {
            Ok(value) => value,
            Err(_) => return error(StatusCode::BAD_REQUEST, "BadRequest", "invalid json"),
        }
    };
    let segs: Vec<&str> = segments.iter().map(String::as_str).collect();

    match (method.clone(), segs.as_slice()) {
        (Method::POST, ["dbs"]) => {
            let id = body["id"].as_str().unwrap_or_default().to_string();
            if state.databases.contains(&id) {
                return error(StatusCode::CONFLICT, "Conflict", "Resource with specified id or name already exists.");
            }
            state.databases.push(id.clone());
            (StatusCode::CREATED, Json(json!({ "id": id }))).into_response()
        }
        (Method::POST, ["dbs", db, "colls"]) => {
            if !state.databases.iter().any(|d| d == db) {
                return error(StatusCode::NOT_FOUND, "NotFound", "Owner resource does not exist");
            }
            let id = body["id"].as_str().unwrap_or_default();
            let coll_link = format!("dbs/{}/colls/{}", db, id);
            if state.containers.contains_key(&coll_link) {
                return error(StatusCode::CONFLICT, "Conflict", "Resource with specified id or name already exists.");
            }
            state.containers.insert(coll_link.clone(), body["partitionKey"].clone());
            state.documents.insert(coll_link, Vec::new());
            (StatusCode::CREATED, Json(body)).into_response()
        }
        (Method::GET, ["dbs", _, "colls", _]) => {
            if state.containers.contains_key(&link) {
                (StatusCode::OK, Json(json!({ "id": segs[3] }))).into_response()
            } else {
                error(StatusCode::NOT_FOUND, "NotFound", "Resource Not Found")
            }
        }
        (Method::GET, ["dbs", _, "colls", _, "docs"]) => {
            let page_size = state.page_size;
            let Some(docs) = state.documents.get(&link) else {
                return error(StatusCode::NOT_FOUND, "NotFound", "Resource Not Found");
            };
            let start: usize = headers
                .get("x-ms-continuation")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);
            let page: Vec<Value> = docs.iter().skip(start).take(page_size).cloned().collect();
            let next = start + page.len();
            let mut response = (
                StatusCode::OK,
                Json(json!({ "_rid": "coll", "Documents": page, "_count": page.len() })),
            )
                .into_response();
            if next < docs.len() {
                response
                    .headers_mut()
                    .insert("x-ms-continuation", next.to_string().parse().unwrap());
            }
            response
        }
        (Method::POST, ["dbs", _, "colls", _, "docs"]) => {
            let id = body["id"].as_str().unwrap_or_default().to_string();
            if !partition_key_ok(&headers, &id) {
                return error(StatusCode::BAD_REQUEST, "BadRequest", "Partition key mismatch");
            }
            let doc = with_system_fields(&mut state, body);
            let Some(docs) = state.documents.get_mut(&link) else {
                return error(StatusCode::NOT_FOUND, "NotFound", "Resource Not Found");
            };
            if docs.iter().any(|d| d["id"] == json!(id)) {
                return error(StatusCode::CONFLICT, "Conflict", "Entity with the specified id already exists in the system.");
            }
            docs.push(doc.clone());
            (StatusCode::CREATED, Json(doc)).into_response()
        }
        (method, ["dbs", db, "colls", coll, "docs", id]) => {
            if !partition_key_ok(&headers, id) {
                return error(StatusCode::BAD_REQUEST, "BadRequest", "Partition key mismatch");
            }
            let coll_link = format!("dbs/{}/colls/{}", db, coll);
            let replacement = if method == Method::PUT {
                Some(with_system_fields(&mut state, body))
            } else {
                None
            };
            let Some(docs) = state.documents.get_mut(&coll_link) else {
                return error(StatusCode::NOT_FOUND, "NotFound", "Resource Not Found");
            };
            let Some(index) = docs.iter().position(|d| d["id"] == json!(id)) else {
                return error(StatusCode::NOT_FOUND, "NotFound", "Entity with the specified id does not exist in the system.");
            };

            match method {
                Method::GET => (StatusCode::OK, Json(docs[index].clone())).into_response(),
                Method::PUT => {
                    let doc = replacement.unwrap_or_default();
                    docs[index] = doc.clone();
                    (StatusCode::OK, Json(doc)).into_response()
                }
                Method::DELETE => {
                    docs.remove(index);
                    StatusCode::NO_CONTENT.into_response()
                }
                _ => error(StatusCode::METHOD_NOT_ALLOWED, "MethodNotAllowed", "unsupported"),
            }
        }
        _ => error(StatusCode::NOT_FOUND, "NotFound", "Unknown route"),
    }
}
