// Console session
//
// Wires the directory store, the query state, both confirmation flows, the
// row menu and the notification center into one object owned by the
// presentation layer. The directory is injected so several views (or
// tests) can share one instance.

use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::agent::Agent;
use crate::config::ConsoleConfig;
use crate::confirm::{ConfirmationFlow, DeleteFlow, StatusChanged, StatusFlow};
use crate::directory::AgentDirectory;
use crate::error::{DirectoryError, FlowError};
use crate::form::{AgentForm, FormError};
use crate::menu::{AnchorGeometry, ClickTarget, Placement, RowMenu};
use crate::notify::{Notification, NotificationCenter};
use crate::query::{PageView, QueryState, StatusFilter};
use crate::traits::AgentApi;

/// Top-level views of the console
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Agents,
    Create,
}

/// Failure while submitting the create form
#[derive(Debug, thiserror::Error)]
pub enum CreateError {
    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

/// State of one console session
pub struct Console<A> {
    directory: Arc<AgentDirectory<A>>,
    query: QueryState,
    delete_flow: DeleteFlow,
    status_flow: StatusFlow,
    menu: RowMenu,
    notifications: NotificationCenter,
    view: View,
}

impl<A: AgentApi> Console<A> {
    pub fn new(directory: Arc<AgentDirectory<A>>, config: &ConsoleConfig) -> Self {
        Self {
            directory,
            query: QueryState::new(config.page_size),
            delete_flow: DeleteFlow::new(),
            status_flow: StatusFlow::new(),
            menu: RowMenu::default(),
            notifications: NotificationCenter::new(config.notification_duration),
            view: View::Agents,
        }
    }

    pub fn directory(&self) -> &AgentDirectory<A> {
        &self.directory
    }

    pub fn query(&self) -> &QueryState {
        &self.query
    }

    pub fn delete_flow(&self) -> &DeleteFlow {
        &self.delete_flow
    }

    pub fn status_flow(&self) -> &StatusFlow {
        &self.status_flow
    }

    pub fn menu(&self) -> &RowMenu {
        &self.menu
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn view(&self) -> View {
        self.view
    }

    /// Switch views. Closes the row menu and drops pending (not in-flight) confirmations.
    pub fn navigate(&mut self, view: View) {
        debug!(?view, "navigate");
        self.view = view;
        self.menu.close();
        cancel_on_navigate("delete", &mut self.delete_flow);
        cancel_on_navigate("status", &mut self.status_flow);
    }

    fn notify(&mut self, notification: Notification) {
        self.notifications.show(notification, Instant::now());
    }

    fn notify_error(&mut self, title: &str, error: &DirectoryError) {
        self.notify(Notification::alert(title, error.to_string()));
    }

    /// Load the collection; failures end up in the directory error and an alert
    pub async fn load(&mut self) -> Result<(), DirectoryError> {
        let result = self.directory.fetch_all().await;
        if let Err(e) = &result {
            self.notify_error("Error al cargar agentes", e);
        }
        result
    }

    /// Current page of the listing, clamping the page to the available range
    pub fn page(&mut self) -> PageView {
        let snapshot = self.directory.snapshot();
        self.query.view(&snapshot.agents)
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.query.set_search(search);
    }

    pub fn set_status_filter(&mut self, status: StatusFilter) {
        self.query.set_status_filter(status);
    }

    pub fn go_to_page(&mut self, page: usize) -> bool {
        let total = self.query.total_pages(&self.directory.snapshot().agents);
        self.query.go_to_page(page, total)
    }

    pub fn next_page(&mut self) -> bool {
        let total = self.query.total_pages(&self.directory.snapshot().agents);
        self.query.next_page(total)
    }

    pub fn previous_page(&mut self) -> bool {
        self.query.previous_page()
    }

    fn lookup(&self, id: &str) -> Result<Agent, FlowError> {
        self.directory
            .get(id)
            .ok_or_else(|| FlowError::UnknownAgent(id.to_string()))
    }

    /// Only one action of any kind may await confirmation at a time
    fn ensure_no_pending_action(&self) -> Result<(), FlowError> {
        if self.delete_flow.is_idle() && self.status_flow.is_idle() {
            Ok(())
        } else {
            Err(FlowError::Busy)
        }
    }

    pub fn request_delete(&mut self, id: &str) -> Result<(), FlowError> {
        self.ensure_no_pending_action()?;
        let agent = self.lookup(id)?;
        self.menu.close();
        self.delete_flow.request(agent)
    }

    pub async fn confirm_delete(&mut self) -> Result<(), FlowError> {
        let name = self.delete_flow.target().map(|a| a.name.clone());
        match self.delete_flow.confirm(&*self.directory).await {
            Ok(()) => {
                self.notify(Notification::success(
                    "Agente eliminado",
                    format!("El agente {} fue eliminado.", name.unwrap_or_default()),
                ));
                Ok(())
            }
            Err(FlowError::Directory(e)) => {
                self.notify_error("No se pudo eliminar el agente", &e);
                Err(FlowError::Directory(e))
            }
            Err(e) => Err(e),
        }
    }

    pub fn cancel_delete(&mut self) -> Result<Agent, FlowError> {
        self.delete_flow.cancel()
    }

    pub fn request_status_change(&mut self, id: &str, active: bool) -> Result<(), FlowError> {
        self.ensure_no_pending_action()?;
        let agent = self.lookup(id)?;
        self.menu.close();
        self.status_flow.request_change(agent, active)
    }

    pub async fn confirm_status_change(&mut self) -> Result<StatusChanged, FlowError> {
        match self.status_flow.confirm(&*self.directory).await {
            Ok(changed) => {
                let (title, verb) = if changed.active {
                    ("Agente activado", "activado")
                } else {
                    ("Agente desactivado", "desactivado")
                };
                self.notify(Notification::success(
                    title,
                    format!("El agente {} fue {verb}.", changed.agent.name),
                ));
                Ok(changed)
            }
            Err(FlowError::Directory(e)) => {
                self.notify_error("No se pudo cambiar el estado", &e);
                Err(FlowError::Directory(e))
            }
            Err(e) => Err(e),
        }
    }

    pub fn cancel_status_change(&mut self) -> Result<(), FlowError> {
        self.status_flow.cancel().map(|_| ())
    }

    /// Submit the create form and return to the listing on success
    pub async fn create(
        &mut self,
        form: AgentForm,
        owner_id: &str,
        now: i64,
    ) -> Result<Agent, CreateError> {
        let agent = form.into_agent(owner_id, now)?;
        match self.directory.create(agent).await {
            Ok(created) => {
                self.notify(Notification::success(
                    "Agente creado",
                    format!("El agente {} fue creado.", created.name),
                ));
                self.navigate(View::Agents);
                Ok(created)
            }
            Err(e) => {
                self.notify_error("No se pudo crear el agente", &e);
                Err(e.into())
            }
        }
    }

    /// Trigger click on a row's action menu
    pub fn toggle_menu(&mut self, row_id: &str, geometry: &AnchorGeometry) -> Option<Placement> {
        self.menu.toggle(row_id, geometry)
    }

    pub fn close_menu(&mut self) {
        self.menu.close();
    }

    pub fn handle_click(&mut self, target: ClickTarget<'_>) -> bool {
        self.menu.handle_click(target)
    }
}

fn cancel_on_navigate<T: Clone>(kind: &str, flow: &mut ConfirmationFlow<T>) {
    match flow.cancel() {
        Ok(_) => debug!(kind, "pending confirmation dropped on navigation"),
        Err(FlowError::InFlight) => debug!(kind, "confirmation in flight, kept across navigation"),
        Err(_) => {}
    }
}
