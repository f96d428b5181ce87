use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The four capability atoms a list view cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityAction {
    Create,
    Read,
    Update,
    Delete,
}

impl CapabilityAction {
    pub const ALL: [CapabilityAction; 4] = [
        CapabilityAction::Create,
        CapabilityAction::Read,
        CapabilityAction::Update,
        CapabilityAction::Delete,
    ];
}

impl std::fmt::Display for CapabilityAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CapabilityAction::Create => "create",
            CapabilityAction::Read => "read",
            CapabilityAction::Update => "update",
            CapabilityAction::Delete => "delete",
        };
        write!(f, "{}", name)
    }
}

/// An opaque policy requirement, e.g. `plugin::users-permissions.roles.delete`.
///
/// A descriptor without a subject matches a grant of the same action on any subject.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PolicyDescriptor {
    pub action: String,
    #[serde(default)]
    pub subject: Option<String>,
}

impl PolicyDescriptor {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            subject: None,
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn is_satisfied_by(&self, grant: &GrantedCapability) -> bool {
        if self.action != grant.action {
            return false;
        }
        match &self.subject {
            None => true,
            Some(subject) => grant.subject.as_deref() == Some(subject.as_str()),
        }
    }
}

/// A capability actually held by the caller, as reported by the session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GrantedCapability {
    pub action: String,
    #[serde(default)]
    pub subject: Option<String>,
}

impl GrantedCapability {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            subject: None,
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }
}

/// Required capabilities for one resource class.
///
/// An action is granted when any of its descriptors is satisfied. An action
/// with no descriptors is never granted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilitySpec {
    requirements: BTreeMap<CapabilityAction, Vec<PolicyDescriptor>>,
}

impl CapabilitySpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require(mut self, action: CapabilityAction, descriptor: PolicyDescriptor) -> Self {
        let entry = self.requirements.entry(action).or_default();
        if !entry.contains(&descriptor) {
            entry.push(descriptor);
            entry.sort();
        }
        self
    }

    /// Conventional `<prefix>.<verb>` descriptors for all four actions
    pub fn crud(prefix: &str) -> Self {
        CapabilityAction::ALL
            .iter()
            .fold(Self::new(), |spec, action| {
                spec.require(*action, PolicyDescriptor::new(format!("{}.{}", prefix, action)))
            })
    }

    pub fn requirements(&self, action: CapabilityAction) -> &[PolicyDescriptor] {
        self.requirements
            .get(&action)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.values().all(Vec::is_empty)
    }

    /// Evaluates the spec against a set of grants
    pub fn evaluate(&self, grants: &[GrantedCapability]) -> PermissionSet {
        let allows = |action: CapabilityAction| {
            self.requirements(action)
                .iter()
                .any(|descriptor| grants.iter().any(|g| descriptor.is_satisfied_by(g)))
        };

        PermissionSet {
            can_create: allows(CapabilityAction::Create),
            can_read: allows(CapabilityAction::Read),
            can_update: allows(CapabilityAction::Update),
            can_delete: allows(CapabilityAction::Delete),
        }
    }
}

/// Resolved capabilities for one caller on one resource class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    pub can_create: bool,
    pub can_read: bool,
    pub can_update: bool,
    pub can_delete: bool,
}

impl PermissionSet {
    /// Fail-closed value used whenever a decision cannot be made
    pub fn denied() -> Self {
        Self::default()
    }

    pub fn allowed() -> Self {
        Self {
            can_create: true,
            can_read: true,
            can_update: true,
            can_delete: true,
        }
    }

    pub fn allows(&self, action: CapabilityAction) -> bool {
        match action {
            CapabilityAction::Create => self.can_create,
            CapabilityAction::Read => self.can_read,
            CapabilityAction::Update => self.can_update,
            CapabilityAction::Delete => self.can_delete,
        }
    }
}

/// Who is asking. Supplied by the session collaborator, never derived here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallerIdentity(String);

impl CallerIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CallerIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
