// Agent domain types
//
// These types mirror the records served by the agent-management API.
// The status shown in the console is derived on every read, never stored.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::display::model_display_name;

/// Fields the API sends that the console does not model. Kept so that
/// whole-record updates send them back unchanged.
pub type ExtraFields = Map<String, Value>;

/// Treat an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Capability flags toggled per agent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    pub vision: bool,
    pub file_upload: bool,
    pub web_search: bool,
    pub image_generation: bool,
    pub code_interpreter: bool,
    pub citations: bool,
    pub usage: bool,
}

impl Capabilities {
    /// Names of all capabilities, in display order
    pub const NAMES: [&'static str; 7] = [
        "vision",
        "file_upload",
        "web_search",
        "image_generation",
        "code_interpreter",
        "citations",
        "usage",
    ];

    /// Enable a capability by name. Returns false for unknown names.
    pub fn enable(&mut self, name: &str) -> bool {
        let flag = match name {
            "vision" => &mut self.vision,
            "file_upload" => &mut self.file_upload,
            "web_search" => &mut self.web_search,
            "image_generation" => &mut self.image_generation,
            "code_interpreter" => &mut self.code_interpreter,
            "citations" => &mut self.citations,
            "usage" => &mut self.usage,
            _ => return false,
        };
        *flag = true;
        true
    }

    /// Names of the enabled capabilities
    pub fn enabled(&self) -> Vec<&'static str> {
        let flags = [
            self.vision,
            self.file_upload,
            self.web_search,
            self.image_generation,
            self.code_interpreter,
            self.citations,
            self.usage,
        ];
        Self::NAMES
            .iter()
            .zip(flags)
            .filter_map(|(name, on)| on.then_some(*name))
            .collect()
    }
}

/// Model parameters sent with the agent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Descriptive metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub capabilities: Capabilities,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion_prompts: Option<Vec<String>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    /// Names of knowledge files staged when the agent was created
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub knowledge: Vec<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Denormalized owner summary attached by the API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
}

/// Agent record as stored by the remote API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub base_model_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub params: AgentParams,
    #[serde(default, deserialize_with = "null_as_default")]
    pub meta: AgentMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_control: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_active: bool,
    /// Seconds since epoch
    #[serde(default, deserialize_with = "null_as_default")]
    pub updated_at: i64,
    /// Seconds since epoch
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<OwnerSummary>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Agent {
    pub fn description(&self) -> &str {
        self.meta.description.as_deref().unwrap_or_default()
    }

    pub fn system_prompt(&self) -> &str {
        self.params.system.as_deref().unwrap_or_default()
    }

    pub fn owner_name(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.name.as_str())
    }

    /// Display name of the base model, falling back to the raw id
    pub fn model_name(&self) -> &str {
        model_display_name(&self.base_model_id)
    }

    /// Status derived from the current field values
    pub fn status(&self) -> AgentStatus {
        AgentStatus::of(self)
    }

    /// Copy of the full record with only the active flag changed
    pub fn with_active(&self, active: bool) -> Agent {
        Agent {
            is_active: active,
            ..self.clone()
        }
    }
}

/// Status shown for an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Active,
    Inactive,
    Draft,
}

impl AgentStatus {
    /// Derive the status: inactive wins, then an agent with neither a
    /// description nor a system prompt is still a draft.
    pub fn of(agent: &Agent) -> Self {
        if !agent.is_active {
            AgentStatus::Inactive
        } else if agent.description().is_empty() && agent.system_prompt().is_empty() {
            AgentStatus::Draft
        } else {
            AgentStatus::Active
        }
    }

    /// Localized label
    pub fn label(&self) -> &'static str {
        match self {
            AgentStatus::Active => "Activo",
            AgentStatus::Inactive => "Inactivo",
            AgentStatus::Draft => "Borrador",
        }
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
