use crate::clients::session::{AuthMode, SessionManager};
use crate::clients::transport::RpcTransport;
use crate::config::settings::OdooConfig;
use crate::error::AppError;
use serde_json::{Value, json};

const CONTACT_FIELDS: &[&str] = &["id", "name", "email", "phone", "company_name"];
const USER_FIELDS: &[&str] = &["id", "name", "login", "email"];

/// Client for interacting with the Odoo JSON-RPC API.
///
/// Authentication happens transparently on first use and the resulting
/// identity is reused for every later call on the same instance.
#[derive(Debug)]
pub struct OdooClient {
    transport: RpcTransport,
    session: SessionManager,
}

impl OdooClient {
    pub fn new(config: &OdooConfig) -> Result<Self, AppError> {
        let mode = match &config.api_key {
            Some(_) => AuthMode::ApiKey,
            None => AuthMode::Credentials {
                username: config.username.clone(),
                password: config.password.clone(),
            },
        };

        let transport = RpcTransport::new(&config.url, config.api_key.as_deref())?;
        let session = SessionManager::new(config.db.clone(), mode);

        Ok(Self { transport, session })
    }

    /// One generic `call_kw` invocation: ensure we are authenticated, then
    /// issue exactly one transport call and unwrap the discriminated
    /// result/error payload.
    pub async fn call_kw(
        &self,
        model: &str,
        method: &str,
        args: Value,
        kwargs: Value,
    ) -> Result<Value, AppError> {
        self.session.ensure_authenticated(&self.transport).await?;

        let payload = json!({
            "jsonrpc": "2.0",
            "method": "call",
            "params": {
                "model": model,
                "method": method,
                "args": args,
                "kwargs": kwargs,
            },
            "id": 1,
        });

        let response = self.transport.call("/web/dataset/call_kw", &payload).await?;

        if let Some(error) = response.body.get("error") {
            return Err(AppError::Rpc(error.to_string()));
        }

        Ok(response.body.get("result").cloned().unwrap_or(Value::Null))
    }

    /// `search_read` with an empty domain filter; record order is
    /// whatever the upstream returned.
    pub async fn search_read(&self, model: &str, fields: &[&str]) -> Result<Vec<Value>, AppError> {
        let result = self
            .call_kw(model, "search_read", json!([[]]), json!({ "fields": fields }))
            .await?;
        Ok(result.as_array().cloned().unwrap_or_default())
    }

    /// `read` of a single record id; returns a one-element or empty list.
    pub async fn read(&self, model: &str, fields: &[&str], id: i64) -> Result<Vec<Value>, AppError> {
        let result = self
            .call_kw(model, "read", json!([[id]]), json!({ "fields": fields }))
            .await?;
        Ok(result.as_array().cloned().unwrap_or_default())
    }

    pub async fn get_contacts(&self) -> Result<Vec<Value>, AppError> {
        self.search_read("res.partner", CONTACT_FIELDS).await
    }

    pub async fn get_contact_by_id(&self, id: i64) -> Result<Value, AppError> {
        let mut records = self.read("res.partner", CONTACT_FIELDS, id).await?;
        if records.is_empty() {
            return Err(AppError::NotFound(format!("Contact with ID {} not found", id)));
        }
        Ok(records.remove(0))
    }

    pub async fn get_users(&self) -> Result<Vec<Value>, AppError> {
        self.search_read("res.users", USER_FIELDS).await
    }

    /// Drop the stored upstream identity; the next call re-authenticates.
    pub async fn invalidate_session(&self) {
        self.session.invalidate().await;
    }
}
