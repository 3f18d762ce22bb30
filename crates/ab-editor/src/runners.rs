//! Collaborator runners: API calls, SQL queries, and datasource tests.
//!
//! Each run follows the same discipline. The record is marked loading, the
//! collaborator runs under a timeout, and the record is always marked
//! finished with either a result or an error string. A run writes only its
//! own record, and failures never propagate past the runner.
//!
//! A run is three steps. `begin` borrows the editor to mark the record and
//! snapshot what the collaborator needs, `send` awaits the collaborator
//! without touching the editor, and `finish` borrows it again to record the
//! outcome. The editor stays free for other edits while a run is in flight.
//! `run_api`, `run_query` and `test_datasource` chain the three for callers
//! with nothing else to do meanwhile.
//!
//! Transports sit behind traits so tests and the CLI can swap in their own.

use crate::error::TransportError;
use crate::session::Editor;
use ab_core::persist::KvStore;
use ab_core::{ApiEndpoint, AuthType, Datasource, HttpMethod, RecordId, SqlQuery};
use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use serde_json::{Value, json};
use std::future::Future;
use std::ops::RangeInclusive;
use std::time::Duration;

// ─── Config ──────────────────────────────────────────────────────────────

/// Timeouts and simulated latencies for collaborator runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollaboratorConfig {
    /// Applies when a record has no timeout of its own.
    pub default_timeout: Duration,
    /// Milliseconds a simulated query takes.
    pub query_latency_ms: RangeInclusive<u64>,
    /// Milliseconds a simulated connection test takes.
    pub test_latency_ms: RangeInclusive<u64>,
}

impl Default for CollaboratorConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_millis(30_000),
            query_latency_ms: 1000..=3000,
            test_latency_ms: 1500..=2500,
        }
    }
}

impl CollaboratorConfig {
    /// No simulated latency.
    pub fn instant() -> Self {
        Self {
            query_latency_ms: 0..=0,
            test_latency_ms: 0..=0,
            ..Self::default()
        }
    }
}

fn pick_latency(range: &RangeInclusive<u64>) -> Duration {
    let (lo, hi) = (*range.start(), *range.end());
    if lo >= hi {
        return Duration::from_millis(lo);
    }
    Duration::from_millis(rand::thread_rng().gen_range(lo..=hi))
}

async fn with_timeout<T>(
    limit: Duration,
    fut: impl Future<Output = Result<T, TransportError>>,
) -> Result<T, TransportError> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout(u64::try_from(limit.as_millis()).unwrap_or(u64::MAX))),
    }
}

// ─── API requests ────────────────────────────────────────────────────────

/// A fully resolved HTTP request for one API endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    /// Username and optional password for HTTP basic auth.
    pub basic_auth: Option<(String, Option<String>)>,
    /// Sent only for non-GET methods.
    pub body: Option<String>,
    pub timeout: Duration,
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl ApiRequest {
    /// Resolve headers, auth, and body for `endpoint`.
    pub fn from_endpoint(endpoint: &ApiEndpoint, default_timeout: Duration) -> Self {
        let mut headers: Vec<(String, String)> = endpoint
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), value_text(v)))
            .collect();
        let mut basic_auth = None;

        if let Some(auth) = &endpoint.authentication {
            match auth.auth_type {
                AuthType::Bearer => {
                    if let Some(token) = auth.token.as_deref().filter(|t| !t.is_empty()) {
                        headers.push(("Authorization".into(), format!("Bearer {token}")));
                    }
                }
                AuthType::ApiKey => {
                    if let Some(key) = auth.api_key.as_deref().filter(|k| !k.is_empty()) {
                        let name = auth
                            .api_key_header
                            .as_deref()
                            .filter(|h| !h.is_empty())
                            .unwrap_or("X-API-Key");
                        headers.push((name.to_string(), key.to_string()));
                    }
                }
                AuthType::Basic => {
                    if let Some(user) = auth.username.as_deref().filter(|u| !u.is_empty()) {
                        basic_auth = Some((user.to_string(), auth.password.clone()));
                    }
                }
                AuthType::None => {}
            }
        }

        let query = endpoint
            .params
            .iter()
            .flatten()
            .map(|(k, v)| (k.clone(), value_text(v)))
            .collect();

        Self {
            method: endpoint.method,
            url: endpoint.url.clone(),
            headers,
            query,
            basic_auth,
            body: if endpoint.method == HttpMethod::Get {
                None
            } else {
                endpoint.body.clone()
            },
            timeout: endpoint.timeout.map_or(default_timeout, Duration::from_millis),
        }
    }
}

/// Sends an [`ApiRequest`] and returns the parsed JSON response.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<Value, TransportError>;
}

/// The real network transport.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Patch => reqwest::Method::PATCH,
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<Value, TransportError> {
        let mut builder = self
            .client
            .request(reqwest_method(request.method), &request.url)
            .timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some((user, password)) = &request.basic_auth {
            builder = builder.basic_auth(user, password.as_deref());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        let response = builder.send().await?;
        Ok(response.json::<Value>().await?)
    }
}

/// An API run between [`ApiRun::begin`] and [`ApiRun::finish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRun {
    id: RecordId,
    name: String,
    request: ApiRequest,
}

impl ApiRun {
    /// Mark the endpoint loading and resolve its request. `None` when there
    /// is no such endpoint.
    pub fn begin<S: KvStore>(editor: &mut Editor<S>, id: RecordId, config: &CollaboratorConfig) -> Option<Self> {
        let Some(endpoint) = editor.begin_api_run(id) else {
            log::debug!("no API {id} to run");
            return None;
        };
        Some(Self {
            id,
            request: ApiRequest::from_endpoint(&endpoint, config.default_timeout),
            name: endpoint.name,
        })
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn request(&self) -> &ApiRequest {
        &self.request
    }

    /// Send the request under its timeout.
    pub async fn send<T: ApiTransport + ?Sized>(&self, transport: &T) -> Result<Value, TransportError> {
        with_timeout(self.request.timeout, transport.send(&self.request)).await
    }

    /// Record the outcome on the endpoint. Returns whether the run succeeded.
    /// An endpoint deleted while in flight is left deleted.
    pub fn finish<S: KvStore>(self, editor: &mut Editor<S>, result: Result<Value, TransportError>) -> bool {
        let ok = result.is_ok();
        if let Err(e) = &result {
            log::warn!("API `{}` failed: {e}", self.name);
        }
        editor.finish_api_run(self.id, result.map_err(|e| e.to_string()));
        ok
    }
}

/// Run an API endpoint. Returns true on success; on failure the error is
/// recorded on the endpoint.
pub async fn run_api<S, T>(editor: &mut Editor<S>, transport: &T, id: RecordId, config: &CollaboratorConfig) -> bool
where
    S: KvStore,
    T: ApiTransport + ?Sized,
{
    let Some(run) = ApiRun::begin(editor, id, config) else {
        return false;
    };
    let result = run.send(transport).await;
    run.finish(editor, result)
}

// ─── SQL queries ─────────────────────────────────────────────────────────

/// Executes a query against its datasource.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, query: &SqlQuery, datasource: Option<&Datasource>) -> Result<Vec<Value>, TransportError>;
}

/// Returns a fixed set of user rows after a random latency.
#[derive(Debug, Clone)]
pub struct SimulatedExecutor {
    latency_ms: RangeInclusive<u64>,
}

impl SimulatedExecutor {
    pub fn new(config: &CollaboratorConfig) -> Self {
        Self {
            latency_ms: config.query_latency_ms.clone(),
        }
    }

    pub fn mock_rows() -> Vec<Value> {
        vec![
            json!({ "id": 1, "name": "John Doe", "email": "john@example.com", "role": "Admin", "created_at": "2024-01-15" }),
            json!({ "id": 2, "name": "Jane Smith", "email": "jane@example.com", "role": "User", "created_at": "2024-01-16" }),
            json!({ "id": 3, "name": "Bob Johnson", "email": "bob@example.com", "role": "Editor", "created_at": "2024-01-17" }),
        ]
    }
}

#[async_trait]
impl QueryExecutor for SimulatedExecutor {
    async fn execute(&self, _query: &SqlQuery, _datasource: Option<&Datasource>) -> Result<Vec<Value>, TransportError> {
        let delay = pick_latency(&self.latency_ms);
        tokio::time::sleep(delay).await;
        Ok(Self::mock_rows())
    }
}

/// A query run between [`QueryRun::begin`] and [`QueryRun::finish`]. The
/// query and its datasource are snapshots taken at `begin`.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRun {
    query: SqlQuery,
    datasource: Option<Datasource>,
    limit: Duration,
}

impl QueryRun {
    /// Mark the query loading. `None` when there is no such query.
    pub fn begin<S: KvStore>(editor: &mut Editor<S>, id: RecordId, config: &CollaboratorConfig) -> Option<Self> {
        let Some(query) = editor.begin_query_run(id) else {
            log::debug!("no query {id} to run");
            return None;
        };
        let datasource = editor.document().datasource(RecordId::intern(&query.datasource)).cloned();
        let limit = query.timeout.map_or(config.default_timeout, Duration::from_millis);
        Some(Self { query, datasource, limit })
    }

    pub fn id(&self) -> RecordId {
        self.query.id
    }

    pub async fn send<E: QueryExecutor + ?Sized>(&self, executor: &E) -> Result<Vec<Value>, TransportError> {
        with_timeout(self.limit, executor.execute(&self.query, self.datasource.as_ref())).await
    }

    /// Record the rows or the error on the query. Returns whether it succeeded.
    pub fn finish<S: KvStore>(self, editor: &mut Editor<S>, result: Result<Vec<Value>, TransportError>) -> bool {
        let ok = result.is_ok();
        if let Err(e) = &result {
            log::warn!("query `{}` failed: {e}", self.query.name);
        }
        editor.finish_query_run(self.query.id, result.map_err(|e| e.to_string()));
        ok
    }
}

/// Run a SQL query. Returns true on success.
pub async fn run_query<S, E>(editor: &mut Editor<S>, executor: &E, id: RecordId, config: &CollaboratorConfig) -> bool
where
    S: KvStore,
    E: QueryExecutor + ?Sized,
{
    let Some(run) = QueryRun::begin(editor, id, config) else {
        return false;
    };
    let result = run.send(executor).await;
    run.finish(editor, result)
}

// ─── Datasource tests ────────────────────────────────────────────────────

/// Checks that a datasource is reachable.
#[async_trait]
pub trait ConnectionTester: Send + Sync {
    async fn test(&self, datasource: &Datasource) -> Result<(), TransportError>;
}

/// Succeeds after a random latency.
#[derive(Debug, Clone)]
pub struct SimulatedTester {
    latency_ms: RangeInclusive<u64>,
}

impl SimulatedTester {
    pub fn new(config: &CollaboratorConfig) -> Self {
        Self {
            latency_ms: config.test_latency_ms.clone(),
        }
    }
}

#[async_trait]
impl ConnectionTester for SimulatedTester {
    async fn test(&self, _datasource: &Datasource) -> Result<(), TransportError> {
        let delay = pick_latency(&self.latency_ms);
        tokio::time::sleep(delay).await;
        Ok(())
    }
}

/// A datasource test between [`ConnectionTest::begin`] and
/// [`ConnectionTest::finish`].
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionTest {
    datasource: Datasource,
    limit: Duration,
}

impl ConnectionTest {
    /// Snapshot the datasource. `None` when there is no such datasource.
    pub fn begin<S: KvStore>(editor: &Editor<S>, id: RecordId, config: &CollaboratorConfig) -> Option<Self> {
        let Some(datasource) = editor.document().datasource(id).cloned() else {
            log::debug!("no datasource {id} to test");
            return None;
        };
        Some(Self {
            datasource,
            limit: config.default_timeout,
        })
    }

    pub fn id(&self) -> RecordId {
        self.datasource.id
    }

    pub async fn send<C: ConnectionTester + ?Sized>(&self, tester: &C) -> Result<(), TransportError> {
        with_timeout(self.limit, tester.test(&self.datasource)).await
    }

    /// Record `isConnected` and `lastTested`. Returns whether it connected.
    pub fn finish<S: KvStore>(self, editor: &mut Editor<S>, result: Result<(), TransportError>) -> bool {
        let connected = match result {
            Ok(()) => true,
            Err(e) => {
                log::warn!("datasource `{}` unreachable: {e}", self.datasource.name);
                false
            }
        };
        editor.record_connection_test(self.datasource.id, connected, Utc::now());
        connected
    }
}

/// Test a datasource and record `isConnected` and `lastTested`. Returns
/// whether the connection succeeded; an unknown id returns false.
pub async fn test_datasource<S, C>(editor: &mut Editor<S>, tester: &C, id: RecordId, config: &CollaboratorConfig) -> bool
where
    S: KvStore,
    C: ConnectionTester + ?Sized,
{
    let Some(test) = ConnectionTest::begin(editor, id, config) else {
        return false;
    };
    let result = test.send(tester).await;
    test.finish(editor, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ab_core::Authentication;
    use pretty_assertions::assert_eq;

    fn endpoint(method: HttpMethod) -> ApiEndpoint {
        let mut api = ApiEndpoint::new(RecordId::intern("api-t"), "T", method, "https://example.com/t");
        api.headers.insert("Accept".into(), json!("application/json"));
        api.body = Some("{\"a\":1}".into());
        api
    }

    #[test]
    fn get_requests_drop_the_body() {
        let req = ApiRequest::from_endpoint(&endpoint(HttpMethod::Get), Duration::from_secs(30));
        assert_eq!(req.body, None);
        let req = ApiRequest::from_endpoint(&endpoint(HttpMethod::Post), Duration::from_secs(30));
        assert_eq!(req.body.as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn bearer_token_becomes_authorization_header() {
        let mut api = endpoint(HttpMethod::Get);
        api.authentication = Some(Authentication {
            auth_type: AuthType::Bearer,
            token: Some("abc".into()),
            ..Authentication::default()
        });
        let req = ApiRequest::from_endpoint(&api, Duration::from_secs(30));
        assert_eq!(
            req.headers,
            vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("Authorization".to_string(), "Bearer abc".to_string()),
            ]
        );
    }

    #[test]
    fn api_key_uses_custom_or_default_header() {
        let mut api = endpoint(HttpMethod::Get);
        api.authentication = Some(Authentication {
            auth_type: AuthType::ApiKey,
            api_key: Some("k".into()),
            ..Authentication::default()
        });
        let req = ApiRequest::from_endpoint(&api, Duration::from_secs(30));
        assert!(req.headers.contains(&("X-API-Key".to_string(), "k".to_string())));

        if let Some(auth) = api.authentication.as_mut() {
            auth.api_key_header = Some("X-Token".into());
        }
        let req = ApiRequest::from_endpoint(&api, Duration::from_secs(30));
        assert!(req.headers.contains(&("X-Token".to_string(), "k".to_string())));
    }

    #[test]
    fn basic_auth_carries_credentials() {
        let mut api = endpoint(HttpMethod::Get);
        api.authentication = Some(Authentication {
            auth_type: AuthType::Basic,
            username: Some("ada".into()),
            password: Some("pw".into()),
            ..Authentication::default()
        });
        let req = ApiRequest::from_endpoint(&api, Duration::from_secs(30));
        assert_eq!(req.basic_auth, Some(("ada".to_string(), Some("pw".to_string()))));
    }

    #[test]
    fn record_timeout_overrides_default() {
        let mut api = endpoint(HttpMethod::Get);
        assert_eq!(ApiRequest::from_endpoint(&api, Duration::from_secs(30)).timeout, Duration::from_secs(30));
        api.timeout = Some(1500);
        assert_eq!(ApiRequest::from_endpoint(&api, Duration::from_secs(30)).timeout, Duration::from_millis(1500));
    }

    #[test]
    fn latency_range_is_respected() {
        for _ in 0..20 {
            let d = pick_latency(&(10..=20));
            assert!(d >= Duration::from_millis(10) && d <= Duration::from_millis(20));
        }
        assert_eq!(pick_latency(&(0..=0)), Duration::ZERO);
    }

    #[tokio::test]
    async fn timeout_becomes_error() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<(), TransportError>(())
        };
        let err = with_timeout(Duration::from_millis(10), slow).await.unwrap_err();
        assert_eq!(err.to_string(), "request timed out after 10 ms");
    }
}
