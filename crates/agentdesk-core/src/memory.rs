// In-memory AgentApi implementation for demos and testing
//
// Keeps records in a Vec behind a shared lock and can be told to fail the
// next call, which makes the directory's error paths easy to exercise.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::agent::Agent;
use crate::error::{DirectoryError, Result};
use crate::traits::AgentApi;

/// In-memory agent API
///
/// Cloning shares the underlying records, so a test can keep a handle to
/// the API it gave to the directory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryAgentApi {
    agents: Arc<RwLock<Vec<Agent>>>,
    fail_next: Arc<RwLock<Option<DirectoryError>>>,
    strip_owner: Arc<AtomicBool>,
    refuse_deletes: Arc<AtomicBool>,
    omit_created_ids: Arc<AtomicBool>,
    stall: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl InMemoryAgentApi {
    /// Create an empty API
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an API pre-populated with agents
    pub fn with_agents(agents: Vec<Agent>) -> Self {
        Self {
            agents: Arc::new(RwLock::new(agents)),
            ..Default::default()
        }
    }

    /// Make the next call fail with the given error
    pub async fn fail_next(&self, error: DirectoryError) {
        *self.fail_next.write().await = Some(error);
    }

    /// Drop the owner summary from update responses
    pub fn strip_owner_on_update(&self, strip: bool) {
        self.strip_owner.store(strip, Ordering::SeqCst);
    }

    /// Answer deletes with `false` instead of removing the record
    pub fn refuse_deletes(&self, refuse: bool) {
        self.refuse_deletes.store(refuse, Ordering::SeqCst);
    }

    /// Leave the id out of create responses
    pub fn omit_created_ids(&self, omit: bool) {
        self.omit_created_ids.store(omit, Ordering::SeqCst);
    }

    /// Never answer calls received while set
    pub fn stall(&self, stall: bool) {
        self.stall.store(stall, Ordering::SeqCst);
    }

    /// Number of calls received so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Current server-side records
    pub async fn stored(&self) -> Vec<Agent> {
        self.agents.read().await.clone()
    }

    async fn enter(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.stall.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        match self.fail_next.write().await.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AgentApi for InMemoryAgentApi {
    async fn list_agents(&self) -> Result<Vec<Agent>> {
        self.enter().await?;
        Ok(self.agents.read().await.clone())
    }

    async fn create_agent(&self, agent: &Agent) -> Result<Agent> {
        self.enter().await?;
        let mut agents = self.agents.write().await;
        if agents.iter().any(|a| a.id == agent.id) {
            return Err(DirectoryError::Validation {
                details: vec![format!("Ya existe un agente con id {}", agent.id)],
            });
        }
        agents.push(agent.clone());

        let mut response = agent.clone();
        if self.omit_created_ids.load(Ordering::SeqCst) {
            response.id.clear();
        }
        Ok(response)
    }

    async fn delete_agent(&self, id: &str) -> Result<bool> {
        self.enter().await?;
        if self.refuse_deletes.load(Ordering::SeqCst) {
            return Ok(false);
        }
        let mut agents = self.agents.write().await;
        let before = agents.len();
        agents.retain(|a| a.id != id);
        if agents.len() == before {
            return Err(DirectoryError::NotFound);
        }
        Ok(true)
    }

    async fn update_agent(&self, agent: &Agent) -> Result<Agent> {
        self.enter().await?;
        let mut agents = self.agents.write().await;
        let slot = agents
            .iter_mut()
            .find(|a| a.id == agent.id)
            .ok_or(DirectoryError::NotFound)?;
        *slot = agent.clone();

        let mut response = agent.clone();
        if self.strip_owner.load(Ordering::SeqCst) {
            response.user = None;
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fail_next_applies_once() {
        let api = InMemoryAgentApi::new();
        api.fail_next(DirectoryError::Forbidden).await;

        assert_eq!(api.list_agents().await, Err(DirectoryError::Forbidden));
        assert_eq!(api.list_agents().await, Ok(vec![]));
        assert_eq!(api.call_count(), 2);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_id() {
        let api = InMemoryAgentApi::new();
        let agent = Agent {
            id: "dup".to_string(),
            ..Default::default()
        };
        api.create_agent(&agent).await.unwrap();
        let err = api.create_agent(&agent).await.unwrap_err();
        assert!(matches!(err, DirectoryError::Validation { .. }));
        assert_eq!(api.stored().await.len(), 1);
    }
}
