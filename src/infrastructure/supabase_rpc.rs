// Supabase PostgREST client for remote aggregation procedures
use crate::application::aggregation_client::AggregationClient;
use crate::application::identity_provider::IdentityProvider;
use crate::domain::aggregation::AggregationRow;
use crate::domain::errors::FetchError;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

#[derive(Clone)]
pub struct SupabaseRpcClient {
    base_url: String,
    anon_key: String,
    http: reqwest::Client,
    identity: Arc<dyn IdentityProvider>,
}

impl SupabaseRpcClient {
    pub fn new(base_url: String, anon_key: String, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
            http: reqwest::Client::new(),
            identity,
        }
    }

    fn build_rpc_url(&self, procedure: &str) -> String {
        format!("{}/rest/v1/rpc/{}", self.base_url, urlencoding::encode(procedure))
    }

    /// The operator's access token, or the anon key when nobody is signed in.
    async fn bearer_token(&self) -> String {
        match self.identity.get_session().await {
            Some(session) => session.access_token,
            None => self.anon_key.clone(),
        }
    }
}

/// Decode an RPC body. `null` means the procedure produced no result at all.
fn parse_rows(procedure: &str, body: &str) -> Result<Vec<AggregationRow>, FetchError> {
    let value: Value = serde_json::from_str(body).map_err(|e| FetchError::Decode {
        procedure: procedure.to_string(),
        reason: e.to_string(),
    })?;

    match value {
        Value::Null => Err(FetchError::Absent {
            procedure: procedure.to_string(),
        }),
        Value::Array(rows) => Ok(rows.into_iter().map(AggregationRow::new).collect()),
        other => Err(FetchError::Decode {
            procedure: procedure.to_string(),
            reason: format!("expected an array of rows, got {}", other),
        }),
    }
}

#[async_trait]
impl AggregationClient for SupabaseRpcClient {
    async fn call(&self, procedure: &str) -> Result<Vec<AggregationRow>, FetchError> {
        let url = self.build_rpc_url(procedure);
        let token = self.bearer_token().await;

        tracing::debug!("Calling remote procedure {}", procedure);

        let response = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .header("Accept", "application/json")
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                procedure: procedure.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| FetchError::Transport {
            procedure: procedure.to_string(),
            reason: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(FetchError::Status {
                procedure: procedure.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        parse_rows(procedure, &body)
    }
}
