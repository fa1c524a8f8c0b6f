// Port to the remote agent-management API
//
// The directory store only talks to the API through this trait:
// - HTTP implementation in the CLI for production
// - In-memory implementation for tests and demos

use async_trait::async_trait;
use std::sync::Arc;

use crate::agent::Agent;
use crate::error::Result;

/// Remote operations on agent records
///
/// Implementations must classify every failure into a [`DirectoryError`]
/// before returning it.
///
/// [`DirectoryError`]: crate::error::DirectoryError
#[async_trait]
pub trait AgentApi: Send + Sync {
    /// Fetch the full agent collection
    async fn list_agents(&self) -> Result<Vec<Agent>>;

    /// Create an agent from a complete record, returning the stored record
    async fn create_agent(&self, agent: &Agent) -> Result<Agent>;

    /// Delete an agent by id. `Ok(false)` means the API refused without an error status.
    async fn delete_agent(&self, id: &str) -> Result<bool>;

    /// Replace an agent with the given full record, returning the stored record
    async fn update_agent(&self, agent: &Agent) -> Result<Agent>;
}

#[async_trait]
impl<T: AgentApi + ?Sized> AgentApi for Arc<T> {
    async fn list_agents(&self) -> Result<Vec<Agent>> {
        (**self).list_agents().await
    }

    async fn create_agent(&self, agent: &Agent) -> Result<Agent> {
        (**self).create_agent(agent).await
    }

    async fn delete_agent(&self, id: &str) -> Result<bool> {
        (**self).delete_agent(id).await
    }

    async fn update_agent(&self, agent: &Agent) -> Result<Agent> {
        (**self).update_agent(agent).await
    }
}
