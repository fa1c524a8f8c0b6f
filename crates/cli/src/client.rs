// HTTP implementation of the agent API
//
// Every call carries JSON accept/content-type headers and the bearer token.
// Failures are classified into DirectoryError here, so nothing above this
// layer ever sees a reqwest error.

use agentdesk_core::error::{DirectoryError, Result};
use agentdesk_core::{Agent, AgentApi};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

pub struct HttpAgentApi {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl HttpAgentApi {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            base_url: format!("{}/", base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.http
            .request(method, url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "request failed before a response arrived");
            DirectoryError::Connectivity
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            warn!(error = %e, "failed to read response body");
            DirectoryError::Connectivity
        })?;
        debug!(status = status.as_u16(), bytes = body.len(), "response received");

        if !status.is_success() {
            return Err(DirectoryError::from_status(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            warn!(error = %e, "unexpected response body");
            DirectoryError::unknown(format!("Respuesta inesperada del servidor: {e}"))
        })
    }
}

#[async_trait]
impl AgentApi for HttpAgentApi {
    async fn list_agents(&self) -> Result<Vec<Agent>> {
        let request = self
            .request(Method::GET, "")
            .query(&[("id", self.api_key.as_str())]);
        self.send(request).await
    }

    async fn create_agent(&self, agent: &Agent) -> Result<Agent> {
        self.send(self.request(Method::POST, "create").json(agent))
            .await
    }

    async fn delete_agent(&self, id: &str) -> Result<bool> {
        let request = self
            .request(Method::DELETE, "model/delete")
            .query(&[("id", id)]);
        self.send(request).await
    }

    async fn update_agent(&self, agent: &Agent) -> Result<Agent> {
        let request = self
            .request(Method::POST, "model/update")
            .query(&[("id", agent.id.as_str())])
            .json(agent);
        self.send(request).await
    }
}
