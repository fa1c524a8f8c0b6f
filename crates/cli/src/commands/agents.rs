// Agent management commands

use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;

use agentdesk_core::{
    format_timestamp, Agent, AgentApi, AgentDirectory, AgentForm, Capabilities, Console,
    ConsoleConfig, FileCandidate, FlowError, NotificationKind, StatusFilter,
};
use anyhow::{Context, Result};
use clap::Subcommand;
use serde::{Deserialize, Serialize};

use crate::output::{
    print_field, print_notification, print_table_header, print_table_row, OutputFormat,
};

#[derive(Subcommand)]
pub enum AgentsCommand {
    /// List agents, one page at a time
    List {
        /// Filter by name, description, model or owner (case-insensitive)
        #[arg(long, short)]
        search: Option<String>,

        /// Filter by status
        #[arg(long, default_value = "all", value_parser = ["all", "active", "inactive"])]
        status: String,

        /// Page to show (1-based, clamped to the available pages)
        #[arg(long, short, default_value = "1")]
        page: usize,

        /// Agents per page (defaults to AGENTDESK_PAGE_SIZE)
        #[arg(long)]
        page_size: Option<NonZeroUsize>,
    },

    /// Show agent details
    Show {
        /// Agent ID
        agent_id: String,
    },

    /// Create a new agent
    Create {
        /// YAML/JSON file with agent definition
        #[arg(short, long)]
        file: Option<String>,

        /// Agent name (required if no --file)
        #[arg(long)]
        name: Option<String>,

        /// Agent description (required if no --file)
        #[arg(long)]
        description: Option<String>,

        /// Base model ID
        #[arg(long)]
        model: Option<String>,

        /// System prompt
        #[arg(long)]
        system_prompt: Option<String>,

        /// Capability to enable (repeatable)
        #[arg(long, short)]
        capability: Vec<String>,

        /// Knowledge file to attach (repeatable)
        #[arg(long, short)]
        attach: Vec<String>,

        /// Owner user ID recorded on the agent
        #[arg(long, env = "AGENTDESK_OWNER_ID", default_value = "")]
        owner: String,
    },

    /// Delete an agent
    Delete {
        /// Agent ID
        agent_id: String,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },

    /// Activate an agent
    Activate {
        /// Agent ID
        agent_id: String,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },

    /// Deactivate an agent
    Deactivate {
        /// Agent ID
        agent_id: String,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}

/// Agent definition from YAML/JSON file
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AgentFile {
    pub name: Option<String>,
    pub description: Option<String>,
    pub base_model_id: Option<String>,
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub attachments: Vec<String>,
}

pub async fn run<A: AgentApi>(
    command: AgentsCommand,
    api: A,
    mut config: ConsoleConfig,
    output: OutputFormat,
    quiet: bool,
) -> Result<()> {
    if let AgentsCommand::List {
        page_size: Some(size),
        ..
    } = &command
    {
        config.page_size = *size;
    }
    let mut console = Console::new(Arc::new(AgentDirectory::new(api)), &config);

    match command {
        AgentsCommand::List {
            search,
            status,
            page,
            ..
        } => list(&mut console, output, search, &status, page).await,
        AgentsCommand::Show { agent_id } => show(&mut console, output, &agent_id).await,
        AgentsCommand::Create {
            file,
            name,
            description,
            model,
            system_prompt,
            capability,
            attach,
            owner,
        } => {
            let form = build_form(file, name, description, model, system_prompt, capability, attach)?;
            create(&mut console, output, quiet, form, &owner).await
        }
        AgentsCommand::Delete { agent_id, yes } => {
            delete(&mut console, output, quiet, &agent_id, yes).await
        }
        AgentsCommand::Activate { agent_id, yes } => {
            set_active(&mut console, output, quiet, &agent_id, true, yes).await
        }
        AgentsCommand::Deactivate { agent_id, yes } => {
            set_active(&mut console, output, quiet, &agent_id, false, yes).await
        }
    }
}

/// Turn the latest alert into the command error, falling back to `error`
fn failure<A: AgentApi>(console: &Console<A>, error: impl Into<anyhow::Error>) -> anyhow::Error {
    match console.notifications().latest() {
        Some(n) if n.kind == NotificationKind::Alert => {
            anyhow::anyhow!("{}: {}", n.title, n.message)
        }
        _ => error.into(),
    }
}

fn report<A: AgentApi>(console: &Console<A>, quiet: bool) {
    if quiet {
        return;
    }
    if let Some(notification) = console.notifications().latest() {
        print_notification(notification);
    }
}

fn flow_failure<A: AgentApi>(console: &Console<A>, error: FlowError) -> anyhow::Error {
    match error {
        FlowError::UnknownAgent(id) => anyhow::anyhow!("Agent not found: {}", id),
        e => failure(console, e),
    }
}

async fn load<A: AgentApi>(console: &mut Console<A>) -> Result<()> {
    console.load().await.map_err(|e| failure(console, e))
}

fn confirm(yes: bool, prompt: &str) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .context("Failed to read confirmation (use --yes when not on a terminal)")
}

async fn list<A: AgentApi>(
    console: &mut Console<A>,
    output: OutputFormat,
    search: Option<String>,
    status: &str,
    page: usize,
) -> Result<()> {
    load(console).await?;

    if let Some(search) = search {
        console.set_search(search);
    }
    console.set_status_filter(status.parse::<StatusFilter>().map_err(anyhow::Error::msg)?);
    let total = console
        .query()
        .total_pages(&console.directory().agents());
    console.go_to_page(page.clamp(1, total));

    let view = console.page();

    if !output.is_text() {
        output.print_value(&view)?;
        return Ok(());
    }

    if view.items.is_empty() {
        println!("No agents found");
    } else {
        print_table_header(&[
            ("ID", 36),
            ("NAME", 24),
            ("MODEL", 14),
            ("STATUS", 9),
            ("UPDATED", 20),
        ]);
        for agent in &view.items {
            print_table_row(&[
                (&agent.id, 36),
                (&agent.name, 24),
                (agent.model_name(), 14),
                (agent.status().label(), 9),
                (&format_timestamp(agent.updated_at), 20),
            ]);
        }
    }

    let (first, last, matching) = view.range();
    println!();
    println!(
        "Total: {}  Activos: {}  Inactivos: {}",
        view.summary.total, view.summary.active, view.summary.inactive
    );
    println!(
        "Mostrando {}-{} de {}  (página {} de {})",
        first, last, matching, view.page, view.total_pages
    );

    Ok(())
}

fn print_agent(agent: &Agent) {
    print_field("ID", &agent.id);
    print_field("Name", &agent.name);
    print_field("Model", agent.model_name());
    print_field("Status", agent.status().label());
    if !agent.description().is_empty() {
        print_field("Description", agent.description());
    }
    if let Some(owner) = agent.owner_name() {
        print_field("Owner", owner);
    }
    let capabilities = agent.meta.capabilities.enabled();
    if !capabilities.is_empty() {
        print_field("Capabilities", &capabilities.join(", "));
    }
    if !agent.meta.knowledge.is_empty() {
        print_field("Knowledge", &agent.meta.knowledge.join(", "));
    }
    print_field("Created", &format_timestamp(agent.created_at));
    print_field("Updated", &format_timestamp(agent.updated_at));
    if !agent.system_prompt().is_empty() {
        println!();
        println!("{}", agent.system_prompt());
    }
}

async fn show<A: AgentApi>(
    console: &mut Console<A>,
    output: OutputFormat,
    agent_id: &str,
) -> Result<()> {
    load(console).await?;
    let agent = console
        .directory()
        .get(agent_id)
        .with_context(|| format!("Agent not found: {}", agent_id))?;

    if output.is_text() {
        print_agent(&agent);
    } else {
        output.print_value(&agent)?;
    }

    Ok(())
}

fn read_agent_file(path: &str) -> Result<AgentFile> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))?;

    if path.ends_with(".json") {
        serde_json::from_str(&content).with_context(|| format!("Failed to parse JSON: {}", path))
    } else {
        serde_yaml::from_str(&content)
            .or_else(|_| serde_json::from_str(&content))
            .with_context(|| format!("Failed to parse file (tried YAML and JSON): {}", path))
    }
}

fn file_candidate(path: &str) -> Result<FileCandidate> {
    let metadata =
        std::fs::metadata(path).with_context(|| format!("Failed to read attachment: {}", path))?;
    let name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("Attachment path has no file name: {}", path))?;
    Ok(FileCandidate::new(name, metadata.len()))
}

/// Merge file values and flags into a form; flags override the file
fn build_form(
    file: Option<String>,
    name: Option<String>,
    description: Option<String>,
    model: Option<String>,
    system_prompt: Option<String>,
    capabilities: Vec<String>,
    attachments: Vec<String>,
) -> Result<AgentForm> {
    let file_config = match file {
        Some(path) => read_agent_file(&path)?,
        None => AgentFile::default(),
    };

    let mut form = AgentForm::default();
    if let Some(name) = name.or(file_config.name) {
        form.name = name;
    }
    if let Some(description) = description.or(file_config.description) {
        form.description = description;
    }
    if let Some(model) = model.or(file_config.base_model_id) {
        form.base_model_id = model;
    }
    if let Some(prompt) = system_prompt.or(file_config.system_prompt) {
        form.system_prompt = prompt;
    }

    let capabilities = if capabilities.is_empty() {
        file_config.capabilities
    } else {
        capabilities
    };
    for capability in &capabilities {
        if !form.capabilities.enable(capability) {
            anyhow::bail!(
                "Unknown capability: {} (expected one of: {})",
                capability,
                Capabilities::NAMES.join(", ")
            );
        }
    }

    let attachments = if attachments.is_empty() {
        file_config.attachments
    } else {
        attachments
    };
    let candidates = attachments
        .iter()
        .map(|path| file_candidate(path))
        .collect::<Result<Vec<_>>>()?;
    form.attachments
        .stage(candidates)
        .context("Attachment rejected")?;

    Ok(form)
}

async fn create<A: AgentApi>(
    console: &mut Console<A>,
    output: OutputFormat,
    quiet: bool,
    form: AgentForm,
    owner: &str,
) -> Result<()> {
    let now = chrono::Utc::now().timestamp();
    let agent = console
        .create(form, owner, now)
        .await
        .map_err(|e| failure(console, e))?;

    if output.is_text() {
        if quiet {
            println!("{}", agent.id);
        } else {
            report(console, quiet);
            print_agent(&agent);
        }
    } else {
        output.print_value(&agent)?;
    }

    Ok(())
}

async fn delete<A: AgentApi>(
    console: &mut Console<A>,
    output: OutputFormat,
    quiet: bool,
    agent_id: &str,
    yes: bool,
) -> Result<()> {
    load(console).await?;
    console
        .request_delete(agent_id)
        .map_err(|e| flow_failure(console, e))?;

    let name = console
        .delete_flow()
        .target()
        .map(|a| a.name.clone())
        .unwrap_or_default();
    let prompt = format!("¿Eliminar el agente \"{name}\"? Esta acción no se puede deshacer.");
    if !confirm(yes, &prompt)? {
        console.cancel_delete()?;
        if !quiet {
            eprintln!("Cancelled");
        }
        return Ok(());
    }

    console
        .confirm_delete()
        .await
        .map_err(|e| flow_failure(console, e))?;

    if output.is_text() {
        report(console, quiet);
    } else {
        output.print_value(&serde_json::json!({ "id": agent_id, "deleted": true }))?;
    }

    Ok(())
}

async fn set_active<A: AgentApi>(
    console: &mut Console<A>,
    output: OutputFormat,
    quiet: bool,
    agent_id: &str,
    active: bool,
    yes: bool,
) -> Result<()> {
    load(console).await?;
    console
        .request_status_change(agent_id, active)
        .map_err(|e| flow_failure(console, e))?;

    let name = console
        .status_flow()
        .target()
        .map(|change| change.agent.name.clone())
        .unwrap_or_default();
    let verb = if active { "Activar" } else { "Desactivar" };
    if !confirm(yes, &format!("¿{verb} el agente \"{name}\"?"))? {
        console.cancel_status_change()?;
        if !quiet {
            eprintln!("Cancelled");
        }
        return Ok(());
    }

    let changed = console
        .confirm_status_change()
        .await
        .map_err(|e| flow_failure(console, e))?;

    if output.is_text() {
        report(console, quiet);
        if !quiet {
            print_field("Status", changed.agent.status().label());
        }
    } else {
        output.print_value(&changed.agent)?;
    }

    Ok(())
}
