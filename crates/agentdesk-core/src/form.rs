// Create-agent form
//
// Field validation and knowledge-file staging for new agents. Upload
// transport is not handled here; only validated file names are staged.

use thiserror::Error;
use uuid::Uuid;

use crate::agent::{Agent, AgentMeta, AgentParams, Capabilities};

/// File extensions accepted for knowledge files
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["pdf", "doc", "docx", "txt"];

/// Largest accepted knowledge file (10 MiB)
pub const MAX_ATTACHMENT_BYTES: u64 = 10 * 1024 * 1024;

/// Base model preselected in the form
pub const DEFAULT_BASE_MODEL: &str = "gpt-4o";

const NAME_LEN: (usize, usize) = (3, 100);
const DESCRIPTION_LEN: (usize, usize) = (10, 500);

/// A single field validation failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("{field} es requerido")]
    Required { field: &'static str },

    #[error("{field} debe tener al menos {min} caracteres")]
    TooShort { field: &'static str, min: usize },

    #[error("{field} no puede exceder {max} caracteres")]
    TooLong { field: &'static str, max: usize },
}

impl FieldError {
    pub fn field(&self) -> &'static str {
        match self {
            FieldError::Required { field }
            | FieldError::TooShort { field, .. }
            | FieldError::TooLong { field, .. } => field,
        }
    }
}

/// Rejected knowledge file
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttachmentError {
    #[error("Tipo de archivo no permitido. Solo se permiten: {}", ALLOWED_EXTENSIONS.join(", "))]
    UnsupportedType { name: String },

    #[error("El archivo es demasiado grande. Máximo 10MB.")]
    TooLarge { name: String, size: u64 },

    #[error("Este archivo ya ha sido agregado.")]
    Duplicate { name: String },
}

/// Form submission failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("{}", join_field_errors(.0))]
    Invalid(Vec<FieldError>),
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Candidate knowledge file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    pub name: String,
    pub size: u64,
}

impl FileCandidate {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

/// Knowledge files staged for a new agent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachmentStaging {
    files: Vec<String>,
}

impl AttachmentStaging {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    fn check(&self, file: &FileCandidate) -> Result<(), AttachmentError> {
        let extension = file
            .name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase());
        if !extension.is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str())) {
            return Err(AttachmentError::UnsupportedType {
                name: file.name.clone(),
            });
        }
        if file.size > MAX_ATTACHMENT_BYTES {
            return Err(AttachmentError::TooLarge {
                name: file.name.clone(),
                size: file.size,
            });
        }
        if self.files.contains(&file.name) {
            return Err(AttachmentError::Duplicate {
                name: file.name.clone(),
            });
        }
        Ok(())
    }

    /// Stage a batch of files.
    ///
    /// Every valid file is staged; if any file was rejected, the first
    /// rejection is returned.
    pub fn stage(
        &mut self,
        files: impl IntoIterator<Item = FileCandidate>,
    ) -> Result<(), AttachmentError> {
        let mut first_error = None;
        for file in files {
            match self.check(&file) {
                Ok(()) => self.files.push(file.name),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Remove a staged file; unknown names are ignored
    pub fn remove(&mut self, name: &str) {
        if let Some(index) = self.files.iter().position(|f| f == name) {
            self.files.remove(index);
        }
    }
}

/// Values entered in the create-agent form
#[derive(Debug, Clone, PartialEq)]
pub struct AgentForm {
    pub name: String,
    pub description: String,
    pub base_model_id: String,
    pub system_prompt: String,
    pub capabilities: Capabilities,
    pub attachments: AttachmentStaging,
}

impl Default for AgentForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            base_model_id: DEFAULT_BASE_MODEL.to_string(),
            system_prompt: String::new(),
            capabilities: Capabilities::default(),
            attachments: AttachmentStaging::new(),
        }
    }
}

fn check_length(field: &'static str, value: &str, (min, max): (usize, usize)) -> Option<FieldError> {
    let len = value.trim().chars().count();
    if len == 0 {
        Some(FieldError::Required { field })
    } else if len < min {
        Some(FieldError::TooShort { field, min })
    } else if len > max {
        Some(FieldError::TooLong { field, max })
    } else {
        None
    }
}

impl AgentForm {
    /// All field errors, in form order
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors: Vec<FieldError> = [
            check_length("name", &self.name, NAME_LEN),
            check_length("description", &self.description, DESCRIPTION_LEN),
        ]
        .into_iter()
        .flatten()
        .collect();
        if self.base_model_id.trim().is_empty() {
            errors.push(FieldError::Required { field: "type" });
        }
        errors
    }

    /// Build the record to send to the API.
    ///
    /// The agent starts active with a fresh UUID v7 id.
    pub fn into_agent(self, owner_id: &str, now: i64) -> Result<Agent, FormError> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(FormError::Invalid(errors));
        }

        let system = self.system_prompt.trim();
        Ok(Agent {
            id: Uuid::now_v7().to_string(),
            user_id: owner_id.to_string(),
            base_model_id: self.base_model_id.trim().to_string(),
            name: self.name.trim().to_string(),
            params: AgentParams {
                system: (!system.is_empty()).then(|| system.to_string()),
                ..Default::default()
            },
            meta: AgentMeta {
                description: Some(self.description.trim().to_string()),
                capabilities: self.capabilities,
                knowledge: self.attachments.files,
                ..Default::default()
            },
            is_active: true,
            updated_at: now,
            created_at: now,
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> AgentForm {
        AgentForm {
            name: "Agente de Soporte".to_string(),
            description: "Responde tickets de clientes".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_form_reports_required_fields() {
        let errors = AgentForm::default().validate();
        assert_eq!(
            errors,
            vec![
                FieldError::Required { field: "name" },
                FieldError::Required { field: "description" },
            ]
        );
        assert_eq!(errors[0].to_string(), "name es requerido");
    }

    #[test]
    fn test_length_bounds() {
        let mut form = valid_form();
        form.name = "ab".to_string();
        form.description = "x".repeat(501);

        let errors = form.validate();
        assert_eq!(errors[0].to_string(), "name debe tener al menos 3 caracteres");
        assert_eq!(errors[1].to_string(), "description no puede exceder 500 caracteres");
        assert_eq!(errors[1].field(), "description");
    }

    #[test]
    fn test_into_agent() {
        let mut form = valid_form();
        form.system_prompt = "  Sé amable  ".to_string();
        form.capabilities.enable("citations");
        form.attachments
            .stage([FileCandidate::new("manual.pdf", 1024)])
            .unwrap();

        let agent = form.into_agent("u-1", 1_700_000_000).unwrap();

        assert!(!agent.id.is_empty());
        assert_eq!(agent.user_id, "u-1");
        assert_eq!(agent.base_model_id, "gpt-4o");
        assert_eq!(agent.system_prompt(), "Sé amable");
        assert!(agent.is_active);
        assert!(agent.meta.capabilities.citations);
        assert_eq!(agent.meta.knowledge, vec!["manual.pdf".to_string()]);
        assert_eq!(agent.created_at, 1_700_000_000);
    }

    #[test]
    fn test_into_agent_rejects_invalid_form() {
        let err = AgentForm::default().into_agent("u-1", 0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "name es requerido; description es requerido"
        );
    }

    #[test]
    fn test_stage_keeps_valid_files_and_reports_first_error() {
        let mut staging = AttachmentStaging::new();
        let err = staging
            .stage([
                FileCandidate::new("notes.TXT", 10),
                FileCandidate::new("image.png", 10),
                FileCandidate::new("huge.pdf", MAX_ATTACHMENT_BYTES + 1),
                FileCandidate::new("guia.docx", 10),
            ])
            .unwrap_err();

        assert_eq!(
            err,
            AttachmentError::UnsupportedType {
                name: "image.png".to_string()
            }
        );
        assert_eq!(
            err.to_string(),
            "Tipo de archivo no permitido. Solo se permiten: pdf, doc, docx, txt"
        );
        assert_eq!(staging.files(), ["notes.TXT", "guia.docx"]);
    }

    #[test]
    fn test_stage_rejects_duplicates_and_missing_extension() {
        let mut staging = AttachmentStaging::new();
        staging.stage([FileCandidate::new("a.pdf", 1)]).unwrap();

        let dup = staging.stage([FileCandidate::new("a.pdf", 1)]).unwrap_err();
        assert_eq!(dup.to_string(), "Este archivo ya ha sido agregado.");

        let no_ext = staging.stage([FileCandidate::new("README", 1)]).unwrap_err();
        assert!(matches!(no_ext, AttachmentError::UnsupportedType { .. }));
        assert_eq!(staging.files().len(), 1);
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        let mut staging = AttachmentStaging::new();
        assert!(staging
            .stage([FileCandidate::new("max.pdf", MAX_ATTACHMENT_BYTES)])
            .is_ok());
    }

    #[test]
    fn test_remove() {
        let mut staging = AttachmentStaging::new();
        staging
            .stage([FileCandidate::new("a.pdf", 1), FileCandidate::new("b.pdf", 1)])
            .unwrap();
        staging.remove("a.pdf");
        staging.remove("missing.pdf");
        assert_eq!(staging.files(), ["b.pdf"]);
    }
}
