use crate::config::FieldDefaults;
use crate::store::{UserRecord, UserStore};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::HeaderMap,
    routing::get,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

/// OAuth-proxy identity headers, in resolution order.
const IDENTITY_HEADERS: [&str; 3] = [
    "x-forwarded-user",
    "x-auth-request-user",
    "x-forwarded-preferred-username",
];

/// Username assumed when neither the proxy nor the caller asserts one.
const FALLBACK_USERNAME: &str = "user1";

const PASSWORD_MASK: &str = "***";

#[derive(Clone)]
pub struct AppState {
    pub store: UserStore,
    pub defaults: FieldDefaults,
    pub hide_passwords: bool,
}

pub fn router(state: AppState) -> Router {
    // The workshop frontend calls this API cross-origin, hence the open CORS
    // policy; authentication is enforced by the upstream proxy.
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/user-info", get(user_info))
        .route("/api/users", get(list_users))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Fully defaulted view of one user's cluster access data.
#[derive(Serialize, Debug, PartialEq)]
pub struct UserInfoResponse {
    pub user: String,
    pub console_url: String,
    pub password: String,
    pub login_command: String,
    pub openshift_cluster_ingress_domain: String,
    pub api_url: String,
}

#[derive(Serialize)]
struct UsersResponse {
    users: Vec<String>,
    count: usize,
}

#[derive(Deserialize, Debug)]
struct UserParams {
    user: Option<String>,
}

/// Resolve the caller's identity: trusted proxy headers first, then the
/// `user` query parameter for development without OAuth, then the fallback.
fn resolve_username(headers: &HeaderMap, params: &UserParams) -> String {
    for name in IDENTITY_HEADERS {
        if let Some(value) = headers.get(name).and_then(|v| v.to_str().ok())
            && !value.is_empty()
        {
            return value.to_string();
        }
    }

    params
        .user
        .clone()
        .filter(|user| !user.is_empty())
        .unwrap_or_else(|| FALLBACK_USERNAME.to_string())
}

/// Build the response for `username`, filling absent record fields from the
/// configured defaults. Unknown users get the all-defaults record.
fn resolve_record(
    username: &str,
    record: Option<UserRecord>,
    defaults: &FieldDefaults,
    hide_passwords: bool,
) -> UserInfoResponse {
    let record = record.unwrap_or_default();

    let mut password = record.password.unwrap_or_default();
    let mut login_command = record.login_command.unwrap_or_else(|| {
        format!(
            "oc login --insecure-skip-tls-verify=false -u {username} -p <password> {}",
            defaults.api_url
        )
    });

    if hide_passwords {
        // Redact the real password before masking the field, so it never
        // appears verbatim anywhere in the response.
        if !password.is_empty() {
            login_command = login_command.replace(&password, PASSWORD_MASK);
        }
        password = PASSWORD_MASK.to_string();
    }

    UserInfoResponse {
        user: username.to_string(),
        console_url: record
            .console_url
            .or(record.openshift_console_url)
            .unwrap_or_else(|| defaults.console_url.clone()),
        password,
        login_command,
        openshift_cluster_ingress_domain: record
            .openshift_cluster_ingress_domain
            .unwrap_or_else(|| defaults.ingress_domain.clone()),
        api_url: record.api_url.unwrap_or_else(|| defaults.api_url.clone()),
    }
}

async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Always answers 200: unknown users, a missing data file, and a malformed
/// data file are indistinguishable to the caller and all yield defaults.
async fn user_info(
    State(state): State<AppState>,
    Query(params): Query<UserParams>,
    headers: HeaderMap,
) -> Json<UserInfoResponse> {
    let username = resolve_username(&headers, &params);
    tracing::info!(user = %username, "user info request");

    state.store.ensure_loaded();
    let record = state.store.get(&username);

    Json(resolve_record(
        &username,
        record,
        &state.defaults,
        state.hide_passwords,
    ))
}

/// List all known usernames, for admin/debugging.
async fn list_users(State(state): State<AppState>) -> Json<UsersResponse> {
    state.store.ensure_loaded();

    let users = state.store.usernames();
    Json(UsersResponse {
        count: users.len(),
        users,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use std::io::Write;
    use tokio::net::TcpListener;

    fn test_defaults() -> FieldDefaults {
        FieldDefaults {
            console_url: "https://console.test.example.com".to_string(),
            api_url: "https://api.test.example.com:6443".to_string(),
            ingress_domain: "apps.test.example.com".to_string(),
        }
    }

    fn write_tmp_file(s: &str) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        write!(tmp, "{}", s).expect("write yaml");

        tmp
    }

    async fn start_api(user_yaml: &str, hide_passwords: bool) -> (String, tempfile::NamedTempFile) {
        let tmp = write_tmp_file(user_yaml);
        let state = AppState {
            store: UserStore::new(tmp.path()),
            defaults: test_defaults(),
            hide_passwords,
        };

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });

        (url, tmp)
    }

    #[tokio::test]
    async fn test_healthz() {
        let (url, _tmp) = start_api("", false).await;

        let response = reqwest::get(format!("{url}/healthz")).await.unwrap();
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_user_info_from_forwarded_header() {
        let (url, _tmp) = start_api("alice: {console_url: \"https://x\"}\n", false).await;

        let body: Value = reqwest::Client::new()
            .get(format!("{url}/api/user-info"))
            .header("X-Forwarded-User", "alice")
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["user"], "alice");
        assert_eq!(body["console_url"], "https://x");
        // Everything absent from the record falls back to the defaults.
        assert_eq!(body["password"], "");
        assert_eq!(body["api_url"], "https://api.test.example.com:6443");
        assert_eq!(
            body["openshift_cluster_ingress_domain"],
            "apps.test.example.com"
        );
        assert_eq!(
            body["login_command"],
            "oc login --insecure-skip-tls-verify=false -u alice -p <password> https://api.test.example.com:6443"
        );
    }

    #[tokio::test]
    async fn test_unknown_user_gets_defaults_not_404() {
        let (url, _tmp) = start_api("alice: {password: pw}\n", false).await;

        let response = reqwest::Client::new()
            .get(format!("{url}/api/user-info"))
            .header("X-Forwarded-User", "nobody")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["user"], "nobody");
        assert_eq!(body["console_url"], "https://console.test.example.com");
    }

    #[tokio::test]
    async fn test_identity_resolution_order() {
        let (url, _tmp) = start_api("", false).await;
        let client = reqwest::Client::new();

        // Primary header wins over the others and the query parameter.
        let body: Value = client
            .get(format!("{url}/api/user-info?user=query-user"))
            .header("X-Forwarded-User", "primary")
            .header("X-Auth-Request-User", "secondary")
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["user"], "primary");

        // Secondary headers are consulted in order.
        let body: Value = client
            .get(format!("{url}/api/user-info"))
            .header("X-Forwarded-Preferred-Username", "preferred")
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["user"], "preferred");

        // Query parameter is the development fallback.
        let body: Value = client
            .get(format!("{url}/api/user-info?user=query-user"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["user"], "query-user");

        // Nothing asserted at all.
        let body: Value = client
            .get(format!("{url}/api/user-info"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["user"], "user1");
    }

    #[tokio::test]
    async fn test_hidden_passwords_are_redacted() {
        let yaml = r#"
alice:
    password: hunter2
    login_command: oc login -u alice -p hunter2 https://api.test.example.com:6443
"#;
        let (url, _tmp) = start_api(yaml, true).await;

        let body: Value = reqwest::Client::new()
            .get(format!("{url}/api/user-info"))
            .header("X-Forwarded-User", "alice")
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["password"], "***");
        let login_command = body["login_command"].as_str().unwrap();
        assert!(!login_command.contains("hunter2"));
        assert!(login_command.contains("***"));
    }

    #[tokio::test]
    async fn test_list_users() {
        let yaml = "users:\n  user1: {password: a}\n  user2: {password: b}\n";
        let (url, _tmp) = start_api(yaml, false).await;

        let body: Value = reqwest::get(format!("{url}/api/users"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["count"], 2);
        assert_eq!(body["users"], json!(["user1", "user2"]));
    }

    #[tokio::test]
    async fn test_missing_data_file_still_answers() {
        let state = AppState {
            store: UserStore::new("/nonexistent/users.yaml"),
            defaults: test_defaults(),
            hide_passwords: false,
        };
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });

        let response = reqwest::Client::new()
            .get(format!("{url}/api/user-info"))
            .header("X-Forwarded-User", "alice")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["console_url"], "https://console.test.example.com");

        let body: Value = reqwest::get(format!("{url}/api/users"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body, json!({"users": [], "count": 0}));
    }

    #[test]
    fn test_resolve_record_legacy_console_url_key() {
        let record = UserRecord {
            openshift_console_url: Some("https://legacy.example.com".to_string()),
            ..UserRecord::default()
        };

        let resolved = resolve_record("alice", Some(record), &test_defaults(), false);
        assert_eq!(resolved.console_url, "https://legacy.example.com");
    }

    #[test]
    fn test_resolve_record_mask_without_password() {
        // No stored password: the field is still masked, the synthesized
        // login command keeps its placeholder.
        let resolved = resolve_record("bob", None, &test_defaults(), true);
        assert_eq!(resolved.password, "***");
        assert!(resolved.login_command.contains("-p <password>"));
    }
}
