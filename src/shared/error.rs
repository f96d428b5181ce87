use crate::collections::domain::ResourceId;
use crate::collections::services::ConfirmationPhase;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application.
///
/// These codes allow scripts to distinguish a rejected delete from
/// a broken setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success - the command completed (a cancelled delete is also a success)
    Success = 0,
    /// The backend or a local rule rejected the requested delete
    MutationRejected = 1,
    /// Invalid command-line arguments (clap parsing errors)
    InvalidArguments = 2,
    /// Application error (config, network, permission resolution, etc.)
    ApplicationError = 3,
}

impl ExitCode {
    /// Convert to i32 for use with std::process::exit
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitCode::Success => write!(f, "Success (0)"),
            ExitCode::MutationRejected => write!(f, "Mutation Rejected (1)"),
            ExitCode::InvalidArguments => write!(f, "Invalid Arguments (2)"),
            ExitCode::ApplicationError => write!(f, "Application Error (3)"),
        }
    }
}

/// Application-level errors raised outside the list-view core
/// (configuration, command-line usage, session setup).
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Failed to read config file: {path}\nDetails: {details}\n\n💡 Hint: Check that the file exists and is readable.")]
    ConfigReadError { path: PathBuf, details: String },

    #[error("Failed to parse config file: {path}\nDetails: {details}\n\n💡 Hint: Ensure the file contains valid YAML (.yml/.yaml) or TOML (.toml).")]
    ConfigParseError { path: PathBuf, details: String },

    #[error("Invalid config: {message}\n\n💡 Hint: {hint}")]
    InvalidConfig { message: String, hint: String },

    #[error("Unknown resource class: {class}\n\n💡 Hint: Known classes: {known}")]
    UnknownResourceClass { class: String, known: String },

    #[error("Access denied: you are not allowed to {action} {class}\n\n💡 Hint: Ask an administrator for the matching permission.")]
    AccessDenied { class: String, action: String },

    #[error("Failed to load {class}: {details}\n\n💡 Hint: Check the base URL, the API token, and that the admin API is reachable.")]
    CollectionUnavailable { class: String, details: String },

    #[error("Security violation: {path}\nReason: {reason}\n\n💡 Hint: {hint}")]
    SecurityError {
        path: PathBuf,
        reason: String,
        hint: String,
    },
}

/// A failed collection fetch. Converted into `status = error` on the cache entry.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("backend returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("unexpected response shape: {0}")]
    Decode(String),

    #[error("no response within {0} seconds")]
    Timeout(u64),
}

/// A per-target message from a backend that refused a delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMessage {
    /// The rejected id, when the backend names one
    pub id: Option<ResourceId>,
    pub message: String,
}

impl FieldMessage {
    pub fn new(id: Option<ResourceId>, message: impl Into<String>) -> Self {
        Self {
            id,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}: {}", id, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// How the backend answered a rejected delete, before any cache effect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteRejection {
    /// Structured, id- or field-level messages
    Validation(Vec<FieldMessage>),
    /// Anything else: network failure, 5xx, unparseable body
    Generic(String),
    /// Some targets were deleted before the backend refused the rest
    Partial {
        applied: Vec<ResourceId>,
        rejection: Box<DeleteRejection>,
    },
}

impl DeleteRejection {
    /// Ids the backend did delete despite the rejection
    pub fn applied(&self) -> &[ResourceId] {
        match self {
            DeleteRejection::Partial { applied, .. } => applied,
            _ => &[],
        }
    }

    /// The refusal itself, without the partial-success wrapper
    pub fn cause(&self) -> &DeleteRejection {
        match self {
            DeleteRejection::Partial { rejection, .. } => rejection.cause(),
            other => other,
        }
    }
}

/// A failed delete. The cache is only invalidated when the backend reports
/// that some targets were deleted anyway.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MutationError {
    #[error("delete rejected: {}", join_messages(.messages))]
    Validation { messages: Vec<FieldMessage> },

    #[error("delete failed: {message}")]
    Generic { message: String },

    #[error("caller is not allowed to delete these records")]
    PermissionDenied,

    #[error("records cannot be deleted: {}", join_ids(.ids))]
    ImmutableTarget { ids: Vec<ResourceId> },

    #[error("no records selected for deletion")]
    EmptyTarget,
}

impl MutationError {
    /// Whether the backend was ever contacted
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            MutationError::PermissionDenied
                | MutationError::ImmutableTarget { .. }
                | MutationError::EmptyTarget
        )
    }
}

impl From<DeleteRejection> for MutationError {
    fn from(rejection: DeleteRejection) -> Self {
        match rejection {
            DeleteRejection::Validation(messages) if !messages.is_empty() => {
                MutationError::Validation { messages }
            }
            DeleteRejection::Validation(_) => MutationError::Generic {
                message: "the backend rejected the request".to_string(),
            },
            DeleteRejection::Generic(message) => MutationError::Generic { message },
            DeleteRejection::Partial { rejection, .. } => (*rejection).into(),
        }
    }
}

/// An intent that does not fit the confirmation protocol's current phase
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum GateError {
    #[error("a delete is already pending ({0:?})")]
    NotIdle(ConfirmationPhase),

    #[error("there is no delete awaiting confirmation")]
    NotAwaitingConfirmation,

    #[error("a delete is already in flight")]
    AlreadyInFlight,

    #[error("nothing to delete")]
    EmptyTarget,
}

/// Outcome of a rejected `confirm`
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfirmError {
    #[error(transparent)]
    Gate(#[from] GateError),

    #[error(transparent)]
    Mutation(#[from] MutationError),
}

/// The session could not produce the caller's grants. Never fatal: the
/// resolver degrades to a fully denied permission set.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("could not resolve permissions for {caller}: {details}")]
pub struct PermissionResolutionError {
    pub caller: String,
    pub details: String,
}

fn join_messages(messages: &[FieldMessage]) -> String {
    messages
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn join_ids(ids: &[ResourceId]) -> String {
    ids.iter()
        .map(ResourceId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
