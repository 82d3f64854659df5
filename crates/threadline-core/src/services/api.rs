//! HTTP client for report commands.
//!
//! Each command carries three batches of store writes: optimistic data applied
//! before the request, success data applied with the server's own updates, and
//! failure data applied when the request fails. Callers never await the
//! request; they observe the store.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};

use super::ReportService;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::models::{ReportAction, Session};
use crate::store::keys::{collection, SESSION};
use crate::store::{Store, StoreKey, StoreUpdate};
use crate::util::{compact_text, unix_timestamp_millis};

const JSON_CODE_SUCCESS: i64 = 200;

type FailureData = Box<dyn FnOnce(&str) -> Vec<StoreUpdate> + Send>;

struct ApiRequest {
    command: &'static str,
    params: Value,
    optimistic: Vec<StoreUpdate>,
    success: Vec<StoreUpdate>,
    failure: FailureData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse {
    json_code: Option<i64>,
    message: Option<String>,
    #[serde(default)]
    onyx_data: Vec<StoreUpdate>,
}

/// HTTP client that runs report commands against the backend and writes their
/// results into the store.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    auth_token: Option<String>,
    client: reqwest::Client,
    store: Store,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Builds a client from validated configuration.
    pub fn new(config: &ClientConfig, store: Store) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            base_url: config.api_base_url.clone(),
            auth_token: config.auth_token.clone(),
            client,
            store,
        })
    }

    /// Returns the base URL this client was configured with.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn dispatch(&self, request: ApiRequest) {
        let ApiRequest {
            command,
            params,
            optimistic,
            success,
            failure,
        } = request;
        self.apply_logged(command, optimistic);

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(command, "No async runtime available; failing request");
            self.apply_logged(command, failure("Request could not be started"));
            return;
        };

        let client = self.clone();
        runtime.spawn(async move {
            match client.post_command(command, params).await {
                Ok(updates) => {
                    tracing::debug!(command, updates = updates.len(), "Command succeeded");
                    client.apply_logged(command, updates);
                    client.apply_logged(command, success);
                }
                Err(error) => {
                    tracing::warn!(command, "Command failed: {error}");
                    client.apply_logged(command, failure(&error.to_string()));
                }
            }
        });
    }

    fn apply_logged(&self, command: &str, updates: Vec<StoreUpdate>) {
        if let Err(error) = self.store.apply(updates) {
            tracing::warn!(command, "Failed to apply store updates: {error}");
        }
    }

    async fn post_command(&self, command: &str, mut params: Value) -> Result<Vec<StoreUpdate>> {
        if let (Some(token), Value::Object(fields)) = (&self.auth_token, &mut params) {
            fields.insert("authToken".to_string(), Value::String(token.clone()));
        }

        let response = self
            .client
            .post(format!("{}/api/{command}", self.base_url))
            .header("Accept", "application/json")
            .json(&params)
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!(
                "{command} failed with HTTP {status}: {}",
                compact_text(&body)
            )));
        }

        let body = response.text().await?;
        parse_response(command, &body)
    }

    fn session_account_id(&self) -> Option<u64> {
        self.store
            .get::<Session>(&StoreKey::single(SESSION))
            .ok()
            .flatten()
            .and_then(|session| session.account_id)
    }
}

impl ReportService for ApiClient {
    fn open_report(&self, report_id: &str) {
        let report_id = report_id.trim();
        if report_id.is_empty() {
            tracing::debug!("Skipping OpenReport without a report ID");
            return;
        }
        tracing::debug!(report_id, "OpenReport");
        self.dispatch(open_report_request(report_id));
    }

    fn add_comment(&self, report_id: &str, text: &str) {
        let report_id = report_id.trim();
        let text = text.trim();
        if report_id.is_empty() || text.is_empty() {
            tracing::debug!("Skipping AddComment with empty report ID or text");
            return;
        }
        let action = ReportAction::optimistic_comment(text, self.session_account_id());
        tracing::debug!(report_id, report_action_id = %action.report_action_id, "AddComment");
        self.dispatch(add_comment_request(report_id, action));
    }
}

fn open_report_request(report_id: &str) -> ApiRequest {
    let key = StoreKey::member(collection::REPORT, report_id);
    let failure_key = key.clone();
    ApiRequest {
        command: "OpenReport",
        params: json!({ "reportID": report_id }),
        optimistic: vec![StoreUpdate::merge(
            &key,
            json!({ "isLoadingReportActions": true }),
        )],
        success: vec![StoreUpdate::merge(
            &key,
            json!({ "isLoadingReportActions": false, "errorFields": { "openReport": null } }),
        )],
        failure: Box::new(move |message| {
            vec![StoreUpdate::merge(
                &failure_key,
                json!({
                    "isLoadingReportActions": false,
                    "errorFields": { "openReport": error_entry(message) },
                }),
            )]
        }),
    }
}

fn add_comment_request(report_id: &str, action: ReportAction) -> ApiRequest {
    let key = StoreKey::member(collection::REPORT_ACTIONS, report_id);
    let action_id = action.report_action_id.clone();
    let failure_key = key.clone();
    let failure_action_id = action_id.clone();
    ApiRequest {
        command: "AddComment",
        params: json!({
            "reportID": report_id,
            "reportActionID": action_id,
            "reportComment": action.message,
        }),
        optimistic: vec![StoreUpdate::merge(&key, json!({ action_id.clone(): action }))],
        success: vec![StoreUpdate::merge(
            &key,
            json!({ action_id: { "pendingAction": null } }),
        )],
        failure: Box::new(move |message| {
            vec![StoreUpdate::merge(
                &failure_key,
                json!({ failure_action_id: { "errors": error_entry(message) } }),
            )]
        }),
    }
}

fn error_entry(message: &str) -> Value {
    json!({ unix_timestamp_millis().to_string(): message })
}

fn parse_response(command: &str, body: &str) -> Result<Vec<StoreUpdate>> {
    let response: ApiResponse = serde_json::from_str(body)?;
    match response.json_code {
        Some(JSON_CODE_SUCCESS) | None => Ok(response.onyx_data),
        Some(code) => Err(Error::Api(format!(
            "{command} returned jsonCode {code}: {}",
            response.message.as_deref().unwrap_or("no message")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use tokio::sync::broadcast;

    use super::*;
    use crate::models::{PendingAction, Report, ReportActions};
    use crate::services::test_server::serve;
    use crate::store::StoreChange;

    fn client(store: &Store) -> ApiClient {
        client_for("http://127.0.0.1:9", store)
    }

    fn client_for(base_url: &str, store: &Store) -> ApiClient {
        let config = ClientConfig {
            api_base_url: base_url.to_string(),
            auth_token: Some("token-1".to_string()),
            request_timeout_secs: 5,
            ..ClientConfig::default()
        };
        ApiClient::new(&config, store.clone()).unwrap()
    }

    fn report(store: &Store, report_id: &str) -> Report {
        store
            .get(&StoreKey::member(collection::REPORT, report_id))
            .unwrap()
            .unwrap_or_default()
    }

    async fn wait_for(changes: &mut broadcast::Receiver<StoreChange>, done: impl Fn() -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !done() {
                let _ = changes.recv().await;
            }
        })
        .await
        .expect("store reached the expected state");
    }

    #[test]
    fn parse_response_returns_updates() {
        let updates = parse_response(
            "OpenReport",
            r#"{"jsonCode":200,"onyxData":[{"onyxMethod":"merge","key":"report_1","value":{"reportID":"1"}}]}"#,
        )
        .unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].key, "report_1");
    }

    #[test]
    fn parse_response_rejects_error_codes() {
        let error = parse_response("OpenReport", r#"{"jsonCode":404,"message":"Not found"}"#)
            .unwrap_err();
        assert!(error.to_string().contains("Not found"));
    }

    #[test]
    fn open_report_without_runtime_records_failure() {
        let store = Store::default();
        client(&store).open_report("12");

        let report: Report = store
            .get(&StoreKey::member(collection::REPORT, "12"))
            .unwrap()
            .unwrap();
        assert!(!report.exists());
        assert!(!report.is_loading_report_actions);
        assert!(report.error_fields.contains_key("openReport"));
    }

    #[test]
    fn open_report_ignores_empty_id() {
        let store = Store::default();
        client(&store).open_report("  ");
        assert!(store.is_empty());
    }

    #[test]
    fn add_comment_appends_optimistically_then_records_failure() {
        let store = Store::default();
        store
            .set(&StoreKey::single(SESSION), json!({"accountID": 3}))
            .unwrap();
        client(&store).add_comment("12", " hi there ");

        let actions: ReportActions = store
            .get(&StoreKey::member(collection::REPORT_ACTIONS, "12"))
            .unwrap()
            .unwrap();
        let action = actions.values().next().unwrap();
        assert_eq!(action.message, "hi there");
        assert_eq!(action.actor_account_id, Some(3));
        assert_eq!(action.pending_action, Some(PendingAction::Add));
        assert_eq!(action.errors.len(), 1);
    }

    #[tokio::test]
    async fn open_report_sets_loading_flag_before_request_completes() {
        let store = Store::default();
        client(&store).open_report("5");

        let report: Report = store
            .get(&StoreKey::member(collection::REPORT, "5"))
            .unwrap()
            .unwrap();
        assert!(report.is_loading_report_actions);
    }

    #[tokio::test]
    async fn open_report_applies_server_data_then_clears_loading_and_errors() {
        let body = json!({
            "jsonCode": 200,
            "onyxData": [
                {"onyxMethod": "merge", "key": "report_5", "value": {"reportID": "5", "reportName": "Ops"}},
                {"onyxMethod": "merge", "key": "reportActions_5", "value": {
                    "a1": {"reportActionID": "a1", "message": "hello", "created": "2026-01-02T03:04:05Z"}
                }}
            ]
        })
        .to_string();
        let (base_url, mut requests) = serve(vec![("200 OK", body)]).await;
        let store = Store::default();
        store
            .merge(
                &StoreKey::member(collection::REPORT, "5"),
                json!({"errorFields": {"openReport": {"1": "Network request failed"}}}),
            )
            .unwrap();
        let mut changes = store.changes();

        client_for(&base_url, &store).open_report("5");
        assert!(report(&store, "5").is_loading_report_actions);
        wait_for(&mut changes, || {
            let report = report(&store, "5");
            report.exists() && !report.is_loading_report_actions
        })
        .await;

        let report = report(&store, "5");
        assert_eq!(report.report_id, "5");
        assert!(!report.error_fields.contains_key("openReport"));
        let actions: ReportActions = store
            .get(&StoreKey::member(collection::REPORT_ACTIONS, "5"))
            .unwrap()
            .unwrap();
        assert_eq!(actions["a1"].message, "hello");

        let request = requests.recv().await.unwrap();
        assert_eq!(request.request_line, "POST /api/OpenReport HTTP/1.1");
        let params: Value = serde_json::from_str(&request.body).unwrap();
        assert_eq!(params, json!({"reportID": "5", "authToken": "token-1"}));
    }

    #[tokio::test]
    async fn open_report_records_http_failure_on_the_report() {
        let (base_url, _requests) =
            serve(vec![("500 Internal Server Error", "upstream down".to_string())]).await;
        let store = Store::default();
        let mut changes = store.changes();

        client_for(&base_url, &store).open_report("5");
        wait_for(&mut changes, || !report(&store, "5").is_loading_report_actions).await;

        let report = report(&store, "5");
        assert!(!report.exists());
        let errors = &report.error_fields["openReport"];
        let message = errors.values().next().unwrap();
        assert!(message.contains("HTTP 500"));
        assert!(message.contains("upstream down"));
    }

    #[tokio::test]
    async fn add_comment_clears_pending_flag_on_success() {
        let (base_url, mut requests) = serve(vec![("200 OK", r#"{"jsonCode":200}"#.to_string())]).await;
        let store = Store::default();
        let key = StoreKey::member(collection::REPORT_ACTIONS, "12");
        let mut changes = store.changes();

        client_for(&base_url, &store).add_comment("12", "ship it");
        let pending = || {
            store
                .get::<ReportActions>(&key)
                .unwrap()
                .unwrap_or_default()
                .values()
                .any(|action| action.pending_action.is_some())
        };
        assert!(pending());
        wait_for(&mut changes, || !pending()).await;

        let actions: ReportActions = store.get(&key).unwrap().unwrap();
        let action = actions.values().next().unwrap();
        assert_eq!(action.message, "ship it");
        assert!(action.errors.is_empty());

        let request = requests.recv().await.unwrap();
        assert_eq!(request.request_line, "POST /api/AddComment HTTP/1.1");
        let params: Value = serde_json::from_str(&request.body).unwrap();
        assert_eq!(params["reportComment"], "ship it");
        assert_eq!(params["reportActionID"], json!(action.report_action_id));
    }

    #[test]
    fn debug_redacts_token() {
        let config = ClientConfig {
            api_base_url: "https://api.example.com".to_string(),
            auth_token: Some("secret".to_string()),
            ..ClientConfig::default()
        };
        let debug = format!("{:?}", ApiClient::new(&config, Store::default()).unwrap());
        assert!(!debug.contains("secret"));
    }
}
