//! Integration tests: API, query, and datasource runs write their outcome
//! back into the document.

use std::sync::Mutex;
use std::time::Duration;

use ab_core::persist::{self, MemoryStore};
use ab_core::{
    ApiEndpoint, AuthType, Authentication, CanvasConfig, Datasource, DatasourceKind, HttpMethod, RecordId, SqlQuery,
};
use ab_core::ComponentKind;
use ab_editor::{
    ApiRequest, ApiRun, ApiTransport, CollaboratorConfig, ConnectionTest, ConnectionTester, Editor, QueryRun,
    SimulatedExecutor, SimulatedTester, TransportError, run_api, run_query, test_datasource,
};
use kurbo::Point;
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

// ─── Fakes ───────────────────────────────────────────────────────────────

#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<ApiRequest>>,
}

#[async_trait]
impl ApiTransport for RecordingTransport {
    async fn send(&self, request: &ApiRequest) -> Result<Value, TransportError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(request.clone());
        }
        Ok(json!({ "users": [{ "id": 1 }] }))
    }
}

struct FailingTransport;

#[async_trait]
impl ApiTransport for FailingTransport {
    async fn send(&self, _request: &ApiRequest) -> Result<Value, TransportError> {
        Err(TransportError::Failed("connection refused".into()))
    }
}

struct SlowTransport;

#[async_trait]
impl ApiTransport for SlowTransport {
    async fn send(&self, _request: &ApiRequest) -> Result<Value, TransportError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(Value::Null)
    }
}

struct EmptyBody;

#[async_trait]
impl ApiTransport for EmptyBody {
    async fn send(&self, _request: &ApiRequest) -> Result<Value, TransportError> {
        Ok(Value::Null)
    }
}

struct Unreachable;

#[async_trait]
impl ConnectionTester for Unreachable {
    async fn test(&self, _datasource: &Datasource) -> Result<(), TransportError> {
        Err(TransportError::Failed("host not found".into()))
    }
}

fn editor() -> Editor<MemoryStore> {
    Editor::open(MemoryStore::new(), CanvasConfig::default())
}

fn users_api() -> ApiEndpoint {
    let mut api = ApiEndpoint::new(
        RecordId::intern("api-users"),
        "Fetch Users",
        HttpMethod::Post,
        "https://example.test/users",
    );
    api.headers.insert("Accept".into(), json!("application/json"));
    api.body = Some("{\"page\":1}".into());
    api.authentication = Some(Authentication {
        auth_type: AuthType::Bearer,
        token: Some("abc".into()),
        ..Authentication::default()
    });
    api
}

// ─── APIs ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn api_run_stores_response_and_persists() {
    let mut ed = editor();
    let api = users_api();
    let id = api.id;
    ed.add_api(api);

    let transport = RecordingTransport::default();
    assert!(run_api(&mut ed, &transport, id, &CollaboratorConfig::default()).await);

    let sent = transport.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].method, HttpMethod::Post);
    assert_eq!(sent[0].body.as_deref(), Some("{\"page\":1}"));
    assert_eq!(
        sent[0].headers,
        vec![
            ("Accept".to_string(), "application/json".to_string()),
            ("Authorization".to_string(), "Bearer abc".to_string()),
        ]
    );
    assert_eq!(sent[0].timeout, Duration::from_millis(30_000));

    let stored = ed.document().api(id).unwrap();
    assert!(!stored.is_loading);
    assert_eq!(stored.error, None);
    assert_eq!(stored.response, Some(json!({ "users": [{ "id": 1 }] })));

    let reloaded = persist::load(ed.store()).unwrap();
    assert_eq!(reloaded.api(id), Some(stored));
}

#[tokio::test]
async fn api_failure_records_error_string() {
    let mut ed = editor();
    let api = users_api();
    let id = api.id;
    ed.add_api(api);

    assert!(!run_api(&mut ed, &FailingTransport, id, &CollaboratorConfig::default()).await);
    let stored = ed.document().api(id).unwrap();
    assert!(!stored.is_loading);
    assert_eq!(stored.error.as_deref(), Some("connection refused"));
    assert_eq!(stored.response, None);
}

#[tokio::test]
async fn slow_api_times_out_on_record_limit() {
    let mut ed = editor();
    let mut api = users_api();
    api.timeout = Some(20);
    let id = api.id;
    ed.add_api(api);

    assert!(!run_api(&mut ed, &SlowTransport, id, &CollaboratorConfig::default()).await);
    let stored = ed.document().api(id).unwrap();
    assert!(!stored.is_loading);
    assert_eq!(stored.error.as_deref(), Some("request timed out after 20 ms"));
}

#[tokio::test]
async fn unknown_api_is_not_run() {
    let mut ed = editor();
    let transport = RecordingTransport::default();
    assert!(!run_api(&mut ed, &transport, RecordId::intern("api-missing"), &CollaboratorConfig::default()).await);
    assert!(transport.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn null_response_is_kept_through_reload() {
    let mut ed = editor();
    let api = users_api();
    let id = api.id;
    ed.add_api(api);

    assert!(run_api(&mut ed, &EmptyBody, id, &CollaboratorConfig::default()).await);
    assert_eq!(ed.document().api(id).unwrap().response, Some(Value::Null));
    let reloaded = persist::load(ed.store()).unwrap();
    assert_eq!(reloaded.api(id).unwrap().response, Some(Value::Null));
}

#[tokio::test]
async fn editor_stays_editable_while_api_is_in_flight() {
    let mut ed = editor();
    let api = users_api();
    let id = api.id;
    ed.add_api(api);

    let transport = RecordingTransport::default();
    let run = ApiRun::begin(&mut ed, id, &CollaboratorConfig::default()).unwrap();
    assert_eq!(run.id(), id);
    assert_eq!(run.request().url, "https://example.test/users");

    let (result, placed) = tokio::join!(run.send(&transport), async {
        assert!(ed.document().api(id).unwrap().is_loading);
        ed.place_component(&ComponentKind::Button, Point::new(100.0, 100.0))
    });
    let placed = placed.unwrap().unwrap();
    assert!(run.finish(&mut ed, result));

    let stored = ed.document().api(id).unwrap();
    assert!(!stored.is_loading);
    assert_eq!(stored.response, Some(json!({ "users": [{ "id": 1 }] })));
    assert!(ed.document().component(placed).is_some());

    let reloaded = persist::load(ed.store()).unwrap();
    assert!(reloaded.component(placed).is_some());
    assert_eq!(reloaded.api(id), Some(stored));
}

#[tokio::test]
async fn api_deleted_in_flight_stays_deleted() {
    let mut ed = editor();
    let api = users_api();
    let id = api.id;
    ed.add_api(api);

    let run = ApiRun::begin(&mut ed, id, &CollaboratorConfig::default()).unwrap();
    assert!(ed.delete_api(id));
    let result = run.send(&RecordingTransport::default()).await;
    assert!(run.finish(&mut ed, result));
    assert_eq!(ed.document().api(id), None);
}

// ─── Queries ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn simulated_query_returns_sample_rows() {
    let mut ed = editor();
    let query = SqlQuery::new(RecordId::intern("query-users"), "All users", "SELECT * FROM users", "ds-1");
    let id = query.id;
    ed.add_query(query);

    let config = CollaboratorConfig::instant();
    let executor = SimulatedExecutor::new(&config);
    assert!(run_query(&mut ed, &executor, id, &config).await);

    let stored = ed.document().query(id).unwrap();
    assert!(!stored.is_loading);
    let rows = stored.result.as_ref().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["name"], json!("John Doe"));
    assert_eq!(rows[2]["role"], json!("Editor"));
}

#[tokio::test]
async fn query_run_splits_around_other_edits() {
    let mut ed = editor();
    let query = SqlQuery::new(RecordId::intern("query-split"), "Split", "SELECT 1", "ds-split");
    let id = query.id;
    ed.add_query(query);

    let config = CollaboratorConfig::instant();
    let run = QueryRun::begin(&mut ed, id, &config).unwrap();
    assert!(ed.document().query(id).unwrap().is_loading);
    let other = SqlQuery::new(RecordId::intern("query-other"), "Other", "SELECT 2", "ds-split");
    assert!(ed.add_query(other));

    let result = run.send(&SimulatedExecutor::new(&config)).await;
    assert!(run.finish(&mut ed, result));
    assert_eq!(ed.document().query(id).unwrap().result.as_ref().map(Vec::len), Some(3));
    assert!(ed.document().query(RecordId::intern("query-other")).is_some());
    assert!(QueryRun::begin(&mut ed, RecordId::intern("query-nope"), &config).is_none());
}

// ─── Datasources ─────────────────────────────────────────────────────────

#[tokio::test]
async fn datasource_tests_record_outcome() {
    let mut ed = editor();
    let ds = Datasource::new(RecordId::intern("ds-1"), "Main DB", DatasourceKind::Postgresql);
    let id = ds.id;
    ed.add_datasource(ds);

    let config = CollaboratorConfig::instant();
    assert!(test_datasource(&mut ed, &SimulatedTester::new(&config), id, &config).await);
    let stored = ed.document().datasource(id).unwrap();
    assert_eq!(stored.is_connected, Some(true));
    let first_test = stored.last_tested.unwrap();

    assert!(!test_datasource(&mut ed, &Unreachable, id, &config).await);
    let stored = ed.document().datasource(id).unwrap();
    assert_eq!(stored.is_connected, Some(false));
    assert!(stored.last_tested.unwrap() >= first_test);
}

#[tokio::test]
async fn connection_test_needs_no_editor_while_sent() {
    let mut ed = editor();
    let ds = Datasource::new(RecordId::intern("ds-split"), "Split DB", DatasourceKind::Mysql);
    let id = ds.id;
    ed.add_datasource(ds);

    let config = CollaboratorConfig::instant();
    let test = ConnectionTest::begin(&ed, id, &config).unwrap();
    assert_eq!(test.id(), id);
    ed.place_component(&ComponentKind::Text, Point::new(300.0, 300.0)).unwrap();
    let result = test.send(&Unreachable).await;
    assert!(!test.finish(&mut ed, result));
    assert_eq!(ed.document().datasource(id).unwrap().is_connected, Some(false));
    assert_eq!(ed.document().components().len(), 1);
}
