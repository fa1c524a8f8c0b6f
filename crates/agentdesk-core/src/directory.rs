// Agent directory store
//
// Holds the authoritative in-memory collection of agents and wraps the
// remote calls that mutate it. Every state change is published through a
// watch channel so views can re-derive what they show.
//
// Fetches are sequence-numbered: a response is applied only when it belongs
// to the most recently issued fetch, so a slow earlier fetch can never
// overwrite fresher data.

use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::agent::Agent;
use crate::error::{DirectoryError, Result};
use crate::traits::AgentApi;

/// Point-in-time view of the directory state
#[derive(Debug, Clone, Default)]
pub struct DirectorySnapshot {
    pub agents: Vec<Agent>,
    /// Error of the last failed call, cleared when a new call starts
    pub error: Option<DirectoryError>,
    /// Bumped on every state change
    pub revision: u64,
    in_flight: usize,
}

impl DirectorySnapshot {
    /// True while any remote call is outstanding
    pub fn loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn get(&self, id: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == id)
    }
}

/// Marks one outstanding remote call.
///
/// Dropping the guard without [`CallGuard::finish`] (the caller's future was
/// cancelled) still releases the call, so `loading` cannot stick.
struct CallGuard<'a> {
    state: &'a watch::Sender<DirectorySnapshot>,
    finished: bool,
}

impl CallGuard<'_> {
    fn finish(mut self, apply: impl FnOnce(&mut DirectorySnapshot)) {
        self.finished = true;
        self.state.send_modify(|s| {
            s.in_flight = s.in_flight.saturating_sub(1);
            apply(s);
            s.revision += 1;
        });
    }
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        debug!("remote call dropped before completing");
        self.state.send_modify(|s| {
            s.in_flight = s.in_flight.saturating_sub(1);
            s.revision += 1;
        });
    }
}

/// In-memory agent collection backed by a remote [`AgentApi`]
pub struct AgentDirectory<A> {
    api: A,
    state: watch::Sender<DirectorySnapshot>,
    fetch_seq: AtomicU64,
}

impl<A: AgentApi> AgentDirectory<A> {
    /// Create an empty directory on top of the given API
    pub fn new(api: A) -> Self {
        let (state, _) = watch::channel(DirectorySnapshot::default());
        Self {
            api,
            state,
            fetch_seq: AtomicU64::new(0),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<DirectorySnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> DirectorySnapshot {
        self.state.borrow().clone()
    }

    pub fn agents(&self) -> Vec<Agent> {
        self.state.borrow().agents.clone()
    }

    pub fn get(&self, id: &str) -> Option<Agent> {
        self.state.borrow().get(id).cloned()
    }

    pub fn active_agents(&self) -> Vec<Agent> {
        self.filtered(|a| a.is_active)
    }

    pub fn inactive_agents(&self) -> Vec<Agent> {
        self.filtered(|a| !a.is_active)
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading()
    }

    pub fn error(&self) -> Option<DirectoryError> {
        self.state.borrow().error.clone()
    }

    fn filtered(&self, keep: impl Fn(&Agent) -> bool) -> Vec<Agent> {
        self.state
            .borrow()
            .agents
            .iter()
            .filter(|a| keep(a))
            .cloned()
            .collect()
    }

    fn begin_call(&self) -> CallGuard<'_> {
        self.state.send_modify(|s| {
            s.in_flight += 1;
            s.error = None;
            s.revision += 1;
        });
        CallGuard {
            state: &self.state,
            finished: false,
        }
    }

    /// Fetch the full collection and replace the local one.
    ///
    /// On failure the previous collection is kept and the classified error
    /// is recorded. Responses of superseded fetches are discarded.
    pub async fn fetch_all(&self) -> Result<()> {
        let seq = self.fetch_seq.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(seq, "fetching agents");
        let call = self.begin_call();

        let result = self.api.list_agents().await;
        let latest = self.fetch_seq.load(Ordering::SeqCst) == seq;

        match result {
            Ok(agents) => {
                if latest {
                    debug!(seq, count = agents.len(), "agents loaded");
                } else {
                    warn!(seq, "discarding stale agent list response");
                }
                call.finish(|s| {
                    if latest {
                        s.agents = agents;
                    }
                });
                Ok(())
            }
            Err(e) => {
                warn!(seq, error = %e, "failed to fetch agents");
                call.finish(|s| {
                    if latest {
                        s.error = Some(e.clone());
                    }
                });
                Err(e)
            }
        }
    }

    /// Fetch and rely on the recorded error state instead of the result
    pub async fn refresh(&self) {
        if let Err(e) = self.fetch_all().await {
            debug!(error = %e, "refresh failed");
        }
    }

    /// Create an agent remotely and append it locally.
    ///
    /// An empty id is replaced with a generated one before sending.
    pub async fn create(&self, mut agent: Agent) -> Result<Agent> {
        if agent.id.is_empty() {
            agent.id = Uuid::now_v7().to_string();
        }
        debug!(agent_id = %agent.id, "creating agent");
        let call = self.begin_call();

        match self.api.create_agent(&agent).await {
            Ok(mut created) => {
                if created.id.is_empty() {
                    created.id = agent.id.clone();
                }
                info!(agent_id = %created.id, "agent created");
                let stored = created.clone();
                call.finish(|s| s.agents.push(stored));
                Ok(created)
            }
            Err(e) => {
                warn!(agent_id = %agent.id, error = %e, "failed to create agent");
                call.finish(|s| s.error = Some(e.clone()));
                Err(e)
            }
        }
    }

    /// Delete an agent remotely and drop it locally
    pub async fn delete(&self, id: &str) -> Result<()> {
        debug!(agent_id = %id, "deleting agent");
        let call = self.begin_call();

        let result = match self.api.delete_agent(id).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(DirectoryError::unknown(
                "El servidor no confirmó la eliminación del agente",
            )),
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                info!(agent_id = %id, "agent deleted");
                call.finish(|s| s.agents.retain(|a| a.id != id));
                Ok(())
            }
            Err(e) => {
                warn!(agent_id = %id, error = %e, "failed to delete agent");
                call.finish(|s| s.error = Some(e.clone()));
                Err(e)
            }
        }
    }

    /// Activate or deactivate an agent.
    ///
    /// Sends the full current record with only the active flag changed and
    /// replaces the local record with the response. The owner summary is
    /// kept when the response omits it.
    pub async fn update_status(&self, id: &str, active: bool) -> Result<Agent> {
        let current = self.get(id).ok_or(DirectoryError::NotFound)?;
        debug!(agent_id = %id, active, "updating agent status");
        let call = self.begin_call();

        match self.api.update_agent(&current.with_active(active)).await {
            Ok(mut updated) => {
                if updated.user.is_none() {
                    updated.user = current.user.clone();
                }
                info!(agent_id = %id, active = updated.is_active, "agent status updated");
                let stored = updated.clone();
                call.finish(|s| {
                    if let Some(slot) = s.agents.iter_mut().find(|a| a.id == id) {
                        *slot = stored;
                    }
                });
                Ok(updated)
            }
            Err(e) => {
                warn!(agent_id = %id, error = %e, "failed to update agent status");
                call.finish(|s| s.error = Some(e.clone()));
                Err(e)
            }
        }
    }
}
