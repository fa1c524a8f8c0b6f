// Action confirmation flow
//
// Destructive and state-changing actions go through an explicit
// request -> confirm/cancel step:
//
//   Idle --request--> Pending --confirm--> InFlight --ok--> Idle
//                       ^  |                  |
//                       |  +--cancel--> Idle  |
//                       +-------failure-------+
//
// While a call is in flight the flow cannot be confirmed again or cancelled.
// A confirmation whose future is dropped before the call settles goes back
// to Pending.

use tracing::debug;

use crate::agent::Agent;
use crate::directory::AgentDirectory;
use crate::error::FlowError;
use crate::traits::AgentApi;

/// State of a confirmation flow
#[derive(Debug, Clone, PartialEq)]
pub enum FlowState<T> {
    Idle,
    Pending(T),
    InFlight(T),
}

impl<T> Default for FlowState<T> {
    fn default() -> Self {
        FlowState::Idle
    }
}

/// Requested activation change
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub agent: Agent,
    pub active: bool,
}

/// Emitted when a status change has been applied
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChanged {
    pub agent: Agent,
    pub active: bool,
}

/// Gate for a single kind of action
#[derive(Debug, Clone)]
pub struct ConfirmationFlow<T> {
    state: FlowState<T>,
}

impl<T> Default for ConfirmationFlow<T> {
    fn default() -> Self {
        Self {
            state: FlowState::Idle,
        }
    }
}

/// Flow guarding agent deletion
pub type DeleteFlow = ConfirmationFlow<Agent>;

/// Flow guarding activation changes
pub type StatusFlow = ConfirmationFlow<StatusChange>;

impl<T: Clone> ConfirmationFlow<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FlowState<T> {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, FlowState::Idle)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, FlowState::Pending(_))
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self.state, FlowState::InFlight(_))
    }

    /// Target awaiting confirmation or being processed
    pub fn target(&self) -> Option<&T> {
        match &self.state {
            FlowState::Idle => None,
            FlowState::Pending(t) | FlowState::InFlight(t) => Some(t),
        }
    }

    /// Open the flow for a target. Only valid from `Idle`.
    pub fn request(&mut self, target: T) -> Result<(), FlowError> {
        match self.state {
            FlowState::Idle => {
                self.state = FlowState::Pending(target);
                Ok(())
            }
            _ => Err(FlowError::Busy),
        }
    }

    /// Discard the pending target. Only valid from `Pending`.
    pub fn cancel(&mut self) -> Result<T, FlowError> {
        match std::mem::take(&mut self.state) {
            FlowState::Pending(target) => Ok(target),
            FlowState::Idle => Err(FlowError::NothingPending),
            in_flight @ FlowState::InFlight(_) => {
                self.state = in_flight;
                Err(FlowError::InFlight)
            }
        }
    }

    /// Move `Pending` to `InFlight` and hand out the target to act on
    pub fn begin_confirm(&mut self) -> Result<T, FlowError> {
        match &self.state {
            FlowState::Pending(target) => {
                let target = target.clone();
                self.state = FlowState::InFlight(target.clone());
                Ok(target)
            }
            FlowState::Idle => Err(FlowError::NothingPending),
            FlowState::InFlight(_) => Err(FlowError::InFlight),
        }
    }

    /// Settle an in-flight action: success returns to `Idle`, failure back to `Pending`
    pub fn finish<R, E>(&mut self, result: Result<R, E>) -> Result<R, E> {
        self.state = match std::mem::take(&mut self.state) {
            FlowState::InFlight(target) if result.is_err() => FlowState::Pending(target),
            FlowState::InFlight(_) => FlowState::Idle,
            other => other,
        };
        result
    }
}

/// Holds a flow while its call is awaited. Dropping it without settling puts
/// the target back to `Pending`.
struct InFlightGuard<'a, T> {
    flow: &'a mut ConfirmationFlow<T>,
}

impl<T> Drop for InFlightGuard<'_, T> {
    fn drop(&mut self) {
        self.flow.state = match std::mem::take(&mut self.flow.state) {
            FlowState::InFlight(target) => {
                debug!("confirmation dropped before the call settled");
                FlowState::Pending(target)
            }
            settled => settled,
        };
    }
}

impl DeleteFlow {
    /// Confirm the pending deletion against the directory
    pub async fn confirm<A: AgentApi>(
        &mut self,
        directory: &AgentDirectory<A>,
    ) -> Result<(), FlowError> {
        let target = self.begin_confirm()?;
        debug!(agent_id = %target.id, "delete confirmed");
        let mut guard = InFlightGuard { flow: self };
        let result = directory.delete(&target.id).await;
        guard.flow.finish(result).map_err(FlowError::from)
    }
}

impl StatusFlow {
    /// Request an activation change for an agent
    pub fn request_change(&mut self, agent: Agent, active: bool) -> Result<(), FlowError> {
        self.request(StatusChange { agent, active })
    }

    /// Confirm the pending status change against the directory
    pub async fn confirm<A: AgentApi>(
        &mut self,
        directory: &AgentDirectory<A>,
    ) -> Result<StatusChanged, FlowError> {
        let change = self.begin_confirm()?;
        debug!(agent_id = %change.agent.id, active = change.active, "status change confirmed");
        let mut guard = InFlightGuard { flow: self };
        let result = directory
            .update_status(&change.agent.id, change.active)
            .await
            .map(|agent| StatusChanged {
                agent,
                active: change.active,
            });
        guard.flow.finish(result).map_err(FlowError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DirectoryError;
    use crate::memory::InMemoryAgentApi;
    use std::time::Duration;

    fn agent(id: &str) -> Agent {
        Agent {
            id: id.to_string(),
            name: id.to_uppercase(),
            is_active: true,
            ..Default::default()
        }
    }

    async fn loaded(agents: Vec<Agent>) -> (InMemoryAgentApi, AgentDirectory<InMemoryAgentApi>) {
        let api = InMemoryAgentApi::with_agents(agents);
        let directory = AgentDirectory::new(api.clone());
        directory.fetch_all().await.unwrap();
        (api, directory)
    }

    #[test]
    fn test_request_only_from_idle() {
        let mut flow = DeleteFlow::new();
        flow.request(agent("a")).unwrap();
        assert_eq!(flow.request(agent("b")), Err(FlowError::Busy));
        assert_eq!(flow.target().map(|a| a.id.as_str()), Some("a"));
    }

    #[test]
    fn test_cancel_on_idle_is_rejected() {
        let mut flow = DeleteFlow::new();
        assert_eq!(flow.cancel(), Err(FlowError::NothingPending));
        assert!(flow.is_idle());
    }

    #[test]
    fn test_cancel_returns_to_idle() {
        let mut flow = DeleteFlow::new();
        flow.request(agent("a")).unwrap();
        let target = flow.cancel().unwrap();
        assert_eq!(target.id, "a");
        assert!(flow.is_idle());
    }

    #[test]
    fn test_no_cancel_or_reconfirm_while_in_flight() {
        let mut flow = DeleteFlow::new();
        flow.request(agent("a")).unwrap();
        flow.begin_confirm().unwrap();
        assert!(flow.is_in_flight());

        assert_eq!(flow.cancel(), Err(FlowError::InFlight));
        assert_eq!(flow.begin_confirm(), Err(FlowError::InFlight));
        assert!(flow.is_in_flight());
    }

    #[test]
    fn test_finish_failure_returns_to_pending() {
        let mut flow = DeleteFlow::new();
        flow.request(agent("a")).unwrap();
        flow.begin_confirm().unwrap();

        let result: Result<(), &str> = flow.finish(Err("boom"));

        assert!(result.is_err());
        assert!(matches!(flow.state(), FlowState::Pending(a) if a.id == "a"));
    }

    #[tokio::test]
    async fn test_delete_flow_success() {
        let (_api, directory) = loaded(vec![agent("x"), agent("y")]).await;
        let mut flow = DeleteFlow::new();

        flow.request(directory.get("x").unwrap()).unwrap();
        assert!(matches!(flow.state(), FlowState::Pending(_)));
        flow.confirm(&directory).await.unwrap();

        assert!(flow.is_idle());
        assert!(directory.get("x").is_none());
        assert!(directory.get("y").is_some());
    }

    #[tokio::test]
    async fn test_delete_flow_failure_allows_retry() {
        let (api, directory) = loaded(vec![agent("x")]).await;
        let mut flow = DeleteFlow::new();
        flow.request(directory.get("x").unwrap()).unwrap();
        api.fail_next(DirectoryError::Connectivity).await;

        let err = flow.confirm(&directory).await.unwrap_err();

        assert_eq!(err, FlowError::Directory(DirectoryError::Connectivity));
        assert!(matches!(flow.state(), FlowState::Pending(_)));
        assert!(directory.get("x").is_some());

        flow.confirm(&directory).await.unwrap();
        assert!(directory.get("x").is_none());
    }

    #[tokio::test]
    async fn test_status_flow_emits_change() {
        let (_api, directory) = loaded(vec![agent("x")]).await;
        let mut flow = StatusFlow::new();

        flow.request_change(directory.get("x").unwrap(), false).unwrap();
        let changed = flow.confirm(&directory).await.unwrap();

        assert!(!changed.active);
        assert!(!changed.agent.is_active);
        assert!(flow.is_idle());
        assert!(!directory.get("x").unwrap().is_active);
    }

    #[tokio::test]
    async fn test_confirm_without_request() {
        let (_api, directory) = loaded(vec![agent("x")]).await;
        let mut flow = StatusFlow::new();
        assert_eq!(
            flow.confirm(&directory).await,
            Err(FlowError::NothingPending)
        );
    }

    #[tokio::test]
    async fn test_dropped_confirmation_returns_to_pending() {
        let (api, directory) = loaded(vec![agent("x")]).await;
        let mut flow = DeleteFlow::new();
        flow.request(directory.get("x").unwrap()).unwrap();
        api.stall(true);

        let outcome =
            tokio::time::timeout(Duration::from_millis(10), flow.confirm(&directory)).await;

        assert!(outcome.is_err());
        assert!(flow.is_pending());
        assert!(!directory.is_loading());
        assert!(directory.get("x").is_some());

        api.stall(false);
        flow.confirm(&directory).await.unwrap();
        assert!(flow.is_idle());
        assert!(directory.get("x").is_none());
    }

    #[tokio::test]
    async fn test_dropped_status_change_can_be_cancelled() {
        let (api, directory) = loaded(vec![agent("x")]).await;
        let mut flow = StatusFlow::new();
        flow.request_change(directory.get("x").unwrap(), false).unwrap();
        api.stall(true);

        let outcome =
            tokio::time::timeout(Duration::from_millis(10), flow.confirm(&directory)).await;

        assert!(outcome.is_err());
        assert_eq!(flow.cancel().map(|c| c.active), Ok(false));
        assert!(flow.is_idle());
        assert!(directory.get("x").unwrap().is_active);
    }
}
