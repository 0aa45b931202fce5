use crate::clients::transport::RpcTransport;
use crate::error::AppError;
use log::{debug, info};
use serde_json::{Value, json};
use tokio::sync::Mutex;

/// Stable placeholder uid reported in API-key mode, where the key itself
/// carries authority and no login call is ever made.
pub const API_KEY_UID: i64 = 1;

/// How a client instance authenticates against Odoo. Selected once at
/// construction; the API key takes precedence when both are configured.
#[derive(Debug, Clone)]
pub enum AuthMode {
    Credentials { username: String, password: String },
    ApiKey,
}

#[derive(Debug, Default)]
struct Session {
    uid: Option<i64>,
    session_token: Option<String>,
}

/// Guards the single lazily-established upstream identity of one client
/// instance. The session mutex is held across the login round trip, so
/// concurrent first callers await one in-flight login instead of issuing
/// duplicates.
#[derive(Debug)]
pub struct SessionManager {
    db: String,
    mode: AuthMode,
    session: Mutex<Session>,
}

impl SessionManager {
    pub fn new(db: String, mode: AuthMode) -> Self {
        Self {
            db,
            mode,
            session: Mutex::new(Session::default()),
        }
    }

    /// Return the authenticated uid, performing the login RPC call on
    /// first use. Subsequent calls on the same instance reuse the stored
    /// identity until `invalidate` is called.
    pub async fn ensure_authenticated(&self, transport: &RpcTransport) -> Result<i64, AppError> {
        let (username, password) = match &self.mode {
            AuthMode::ApiKey => return Ok(API_KEY_UID),
            AuthMode::Credentials { username, password } => (username, password),
        };

        let mut session = self.session.lock().await;
        if let Some(uid) = session.uid {
            return Ok(uid);
        }

        debug!("Authenticating against Odoo database '{}'", self.db);
        let payload = json!({
            "jsonrpc": "2.0",
            "params": {
                "db": self.db,
                "login": username,
                "password": password,
            },
        });

        let response = transport.call("/web/session/authenticate", &payload).await?;

        if let Some(error) = response.body.get("error") {
            return Err(AppError::Authentication(format!(
                "Authentication failed: {}",
                error
            )));
        }

        // Odoo reports `false` instead of a numeric uid on rejected logins.
        let uid = response
            .body
            .pointer("/result/uid")
            .and_then(Value::as_i64)
            .filter(|uid| *uid != 0)
            .ok_or_else(|| {
                AppError::Authentication("Authentication failed: No user ID returned".to_string())
            })?;

        session.uid = Some(uid);
        session.session_token = response.session_token;
        info!("Authenticated with Odoo as uid {}", uid);

        Ok(uid)
    }

    /// Clear the stored identity; the next `ensure_authenticated` call
    /// repeats the login flow. No-op under API-key mode.
    pub async fn invalidate(&self) {
        let mut session = self.session.lock().await;
        session.uid = None;
        session.session_token = None;
    }

    pub async fn current_uid(&self) -> Option<i64> {
        self.session.lock().await.uid
    }

    pub async fn session_token(&self) -> Option<String> {
        self.session.lock().await.session_token.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> AuthMode {
        AuthMode::Credentials {
            username: "admin".to_string(),
            password: "admin".to_string(),
        }
    }

    #[actix_web::test]
    async fn login_stores_uid_and_session_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/web/session/authenticate")
            .with_status(200)
            .with_header("set-cookie", "session_id=tok-1; Path=/")
            .with_body(r#"{"result": {"uid": 123, "username": "admin"}}"#)
            .expect(1)
            .create_async()
            .await;

        let transport = RpcTransport::new(&server.url(), None).unwrap();
        let manager = SessionManager::new("odoo".to_string(), credentials());

        assert_eq!(manager.ensure_authenticated(&transport).await.unwrap(), 123);
        // Second call reuses the stored identity without a network call.
        assert_eq!(manager.ensure_authenticated(&transport).await.unwrap(), 123);
        assert_eq!(manager.session_token().await.as_deref(), Some("tok-1"));
        mock.assert_async().await;
    }

    #[actix_web::test]
    async fn concurrent_first_callers_issue_one_login() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/web/session/authenticate")
            .with_status(200)
            .with_body(r#"{"result": {"uid": 42}}"#)
            .expect(1)
            .create_async()
            .await;

        let transport = RpcTransport::new(&server.url(), None).unwrap();
        let manager = SessionManager::new("odoo".to_string(), credentials());

        // The session lock is held across the login round trip, so the
        // second caller waits for the first instead of logging in again.
        let (first, second) = tokio::join!(
            manager.ensure_authenticated(&transport),
            manager.ensure_authenticated(&transport),
        );
        assert_eq!(first.unwrap(), 42);
        assert_eq!(second.unwrap(), 42);
        mock.assert_async().await;
    }

    #[actix_web::test]
    async fn rpc_error_payload_fails_authentication() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/web/session/authenticate")
            .with_status(200)
            .with_body(r#"{"error": {"message": "Invalid credentials"}}"#)
            .create_async()
            .await;

        let transport = RpcTransport::new(&server.url(), None).unwrap();
        let manager = SessionManager::new("odoo".to_string(), credentials());

        let err = manager.ensure_authenticated(&transport).await.unwrap_err();
        match err {
            AppError::Authentication(msg) => assert!(msg.contains("Invalid credentials")),
            other => panic!("expected Authentication error, got {:?}", other),
        }
        assert_eq!(manager.current_uid().await, None);
    }

    #[actix_web::test]
    async fn missing_uid_fails_authentication() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/web/session/authenticate")
            .with_status(200)
            .with_body(r#"{"result": {}}"#)
            .create_async()
            .await;

        let transport = RpcTransport::new(&server.url(), None).unwrap();
        let manager = SessionManager::new("odoo".to_string(), credentials());

        let err = manager.ensure_authenticated(&transport).await.unwrap_err();
        match err {
            AppError::Authentication(msg) => assert!(msg.contains("No user ID returned")),
            other => panic!("expected Authentication error, got {:?}", other),
        }
    }

    #[actix_web::test]
    async fn false_uid_fails_authentication() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/web/session/authenticate")
            .with_status(200)
            .with_body(r#"{"result": {"uid": false}}"#)
            .create_async()
            .await;

        let transport = RpcTransport::new(&server.url(), None).unwrap();
        let manager = SessionManager::new("odoo".to_string(), credentials());

        assert!(manager.ensure_authenticated(&transport).await.is_err());
    }

    #[actix_web::test]
    async fn api_key_mode_never_calls_the_network() {
        // No mock registered: any request to this server would not match.
        let server = mockito::Server::new_async().await;
        let transport = RpcTransport::new(&server.url(), Some("test-key")).unwrap();
        let manager = SessionManager::new("odoo".to_string(), AuthMode::ApiKey);

        assert_eq!(
            manager.ensure_authenticated(&transport).await.unwrap(),
            API_KEY_UID
        );
        // Sentinel is stable across calls.
        assert_eq!(
            manager.ensure_authenticated(&transport).await.unwrap(),
            API_KEY_UID
        );
    }

    #[actix_web::test]
    async fn invalidate_forces_a_fresh_login() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/web/session/authenticate")
            .with_status(200)
            .with_body(r#"{"result": {"uid": 5}}"#)
            .expect(2)
            .create_async()
            .await;

        let transport = RpcTransport::new(&server.url(), None).unwrap();
        let manager = SessionManager::new("odoo".to_string(), credentials());

        manager.ensure_authenticated(&transport).await.unwrap();
        manager.invalidate().await;
        assert_eq!(manager.current_uid().await, None);
        manager.ensure_authenticated(&transport).await.unwrap();
        mock.assert_async().await;
    }
}
