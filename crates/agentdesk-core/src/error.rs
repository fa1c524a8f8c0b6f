// Error types for the agent directory and the confirmation flows

use serde_json::Value;
use thiserror::Error;

/// Result type alias for directory operations
pub type Result<T> = std::result::Result<T, DirectoryError>;

/// Message used when the server gives no usable explanation
pub const UNKNOWN_ERROR_MESSAGE: &str = "Error desconocido al comunicarse con el servidor";

/// Classified failure of a remote call.
///
/// `Display` renders the localized message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    /// No response reached us (DNS, refused connection, TLS, dropped socket)
    #[error("Error de conexión. Verifique su conexión a internet.")]
    Connectivity,

    #[error("No autorizado. Verifique la API Key.")]
    Unauthorized,

    #[error("Acceso denegado. Permisos insuficientes.")]
    Forbidden,

    #[error("Endpoint no encontrado.")]
    NotFound,

    /// Request rejected by server-side validation
    #[error("{}", validation_message(.details))]
    Validation { details: Vec<String> },

    #[error("Error del servidor. Intente más tarde.")]
    Server { status: u16 },

    #[error("{message}")]
    Unknown { message: String },
}

fn validation_message(details: &[String]) -> String {
    if details.is_empty() {
        "Datos inválidos.".to_string()
    } else {
        format!("Datos inválidos: {}", details.join("; "))
    }
}

impl DirectoryError {
    /// Create an unknown error with a custom message
    pub fn unknown(message: impl Into<String>) -> Self {
        DirectoryError::Unknown {
            message: message.into(),
        }
    }

    /// Classify an HTTP error response by status code and body
    pub fn from_status(status: u16, body: &str) -> Self {
        let parsed: Option<Value> = serde_json::from_str(body).ok();
        match status {
            401 => DirectoryError::Unauthorized,
            403 => DirectoryError::Forbidden,
            404 => DirectoryError::NotFound,
            400 | 422 => DirectoryError::Validation {
                details: parsed.as_ref().map(validation_details).unwrap_or_default(),
            },
            s if s >= 500 => DirectoryError::Server { status: s },
            _ => DirectoryError::Unknown {
                message: parsed
                    .as_ref()
                    .and_then(body_message)
                    .unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string()),
            },
        }
    }

    /// HTTP status behind the error, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            DirectoryError::Connectivity => None,
            DirectoryError::Unauthorized => Some(401),
            DirectoryError::Forbidden => Some(403),
            DirectoryError::NotFound => Some(404),
            DirectoryError::Validation { .. } => Some(422),
            DirectoryError::Server { status } => Some(*status),
            DirectoryError::Unknown { .. } => None,
        }
    }
}

/// Top-level `message` or string `detail` of an error body
fn body_message(body: &Value) -> Option<String> {
    ["message", "detail", "error"]
        .iter()
        .find_map(|key| body.get(key).and_then(Value::as_str))
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Field-level messages from a validation body.
///
/// Accepts `{"detail": [{"msg": ..}, ..]}`, `{"errors": [..]}` (strings or
/// objects with `msg`/`message`), or a single message.
fn validation_details(body: &Value) -> Vec<String> {
    for key in ["detail", "errors"] {
        if let Some(items) = body.get(key).and_then(Value::as_array) {
            let details: Vec<String> = items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Object(_) => item
                        .get("msg")
                        .or_else(|| item.get("message"))
                        .and_then(Value::as_str)
                        .map(String::from),
                    _ => None,
                })
                .collect();
            if !details.is_empty() {
                return details;
            }
        }
    }
    body_message(body).into_iter().collect()
}

/// Errors raised by the confirmation flows
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    /// Another action is already pending or in flight
    #[error("another action is already awaiting confirmation")]
    Busy,

    #[error("no action is awaiting confirmation")]
    NothingPending,

    #[error("the action is already being processed")]
    InFlight,

    #[error("agent not found: {0}")]
    UnknownAgent(String),

    /// The remote call failed; the flow is back in the pending state
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}
