// Integration tests for the directory store and the confirmation flows
//
// Run with: cargo test -p agentdesk-core --test directory_test

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

use agentdesk_core::{
    Agent, AgentApi, AgentDirectory, Console, ConsoleConfig, DirectoryError, FlowError,
    InMemoryAgentApi, Result,
};

/// API whose list responses are released by the test, one channel per call
#[derive(Default)]
struct GatedApi {
    pending: Mutex<VecDeque<oneshot::Receiver<Result<Vec<Agent>>>>>,
    started: AtomicUsize,
}

impl GatedApi {
    fn gate(&self) -> oneshot::Sender<Result<Vec<Agent>>> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().push_back(rx);
        tx
    }

    async fn wait_started(&self, count: usize) {
        while self.started.load(Ordering::SeqCst) < count {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl AgentApi for GatedApi {
    async fn list_agents(&self) -> Result<Vec<Agent>> {
        let rx = self
            .pending
            .lock()
            .unwrap()
            .pop_front()
            .expect("no gate prepared");
        self.started.fetch_add(1, Ordering::SeqCst);
        rx.await.unwrap_or(Err(DirectoryError::Connectivity))
    }

    async fn create_agent(&self, _agent: &Agent) -> Result<Agent> {
        Err(DirectoryError::unknown("unsupported"))
    }

    async fn delete_agent(&self, _id: &str) -> Result<bool> {
        Err(DirectoryError::unknown("unsupported"))
    }

    async fn update_agent(&self, _agent: &Agent) -> Result<Agent> {
        Err(DirectoryError::unknown("unsupported"))
    }
}

fn agent(id: &str, active: bool) -> Agent {
    Agent {
        id: id.to_string(),
        name: format!("Agente {id}"),
        is_active: active,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_stale_fetch_never_overwrites_newer_data() {
    let api = Arc::new(GatedApi::default());
    let directory = Arc::new(AgentDirectory::new(api.clone()));
    let first_gate = api.gate();
    let second_gate = api.gate();

    let first = tokio::spawn({
        let directory = directory.clone();
        async move { directory.fetch_all().await }
    });
    api.wait_started(1).await;
    let second = tokio::spawn({
        let directory = directory.clone();
        async move { directory.fetch_all().await }
    });
    api.wait_started(2).await;
    assert!(directory.is_loading());

    second_gate.send(Ok(vec![agent("fresh", true)])).unwrap();
    second.await.unwrap().unwrap();
    assert!(directory.is_loading());

    first_gate.send(Ok(vec![agent("stale", true)])).unwrap();
    first.await.unwrap().unwrap();

    let snapshot = directory.snapshot();
    assert_eq!(snapshot.agents, vec![agent("fresh", true)]);
    assert!(!snapshot.loading());
    assert_eq!(snapshot.error, None);
}

#[tokio::test]
async fn test_stale_failure_does_not_record_error() {
    let api = Arc::new(GatedApi::default());
    let directory = Arc::new(AgentDirectory::new(api.clone()));
    let first_gate = api.gate();
    let second_gate = api.gate();

    let first = tokio::spawn({
        let directory = directory.clone();
        async move { directory.fetch_all().await }
    });
    api.wait_started(1).await;
    let second = tokio::spawn({
        let directory = directory.clone();
        async move { directory.fetch_all().await }
    });
    api.wait_started(2).await;

    second_gate.send(Ok(vec![agent("a", true)])).unwrap();
    second.await.unwrap().unwrap();
    drop(first_gate);

    assert_eq!(first.await.unwrap(), Err(DirectoryError::Connectivity));
    assert_eq!(directory.error(), None);
    assert_eq!(directory.agents().len(), 1);
}

#[tokio::test]
async fn test_subscribers_see_every_mutation() {
    let api = InMemoryAgentApi::with_agents(vec![agent("a", true)]);
    let directory = AgentDirectory::new(api);
    let mut rx = directory.subscribe();

    directory.fetch_all().await.unwrap();
    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().agents.len(), 1);

    directory.update_status("a", false).await.unwrap();
    assert!(rx.has_changed().unwrap());
    let snapshot = rx.borrow_and_update().clone();
    assert!(!snapshot.agents[0].is_active);
    assert!(!snapshot.loading());
}

#[tokio::test]
async fn test_failed_delete_can_be_retried() {
    let api = InMemoryAgentApi::with_agents(vec![agent("a", true), agent("b", true)]);
    let directory = Arc::new(AgentDirectory::new(api.clone()));
    let mut console = Console::new(directory.clone(), &ConsoleConfig::default());
    console.load().await.unwrap();

    console.request_delete("a").unwrap();
    api.fail_next(DirectoryError::Server { status: 502 }).await;
    let err = console.confirm_delete().await.unwrap_err();

    assert_eq!(err, FlowError::Directory(DirectoryError::Server { status: 502 }));
    assert_eq!(directory.agents().len(), 2);
    assert_eq!(
        directory.error(),
        Some(DirectoryError::Server { status: 502 })
    );

    console.confirm_delete().await.unwrap();
    assert_eq!(directory.agents(), vec![agent("b", true)]);
    assert_eq!(api.stored().await, vec![agent("b", true)]);
    assert_eq!(directory.error(), None);
}

#[tokio::test]
async fn test_cancel_leaves_collection_untouched() {
    let api = InMemoryAgentApi::with_agents(vec![agent("a", true)]);
    let directory = Arc::new(AgentDirectory::new(api.clone()));
    let mut console = Console::new(directory.clone(), &ConsoleConfig::default());
    console.load().await.unwrap();
    let calls = api.call_count();

    console.request_status_change("a", false).unwrap();
    console.cancel_status_change().unwrap();

    assert_eq!(api.call_count(), calls);
    assert!(directory.get("a").unwrap().is_active);
    assert_eq!(
        console.cancel_status_change(),
        Err(FlowError::NothingPending)
    );
}
