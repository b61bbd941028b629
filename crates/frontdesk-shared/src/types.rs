use serde::{Deserialize, Serialize};

// Visitor identity = opaque uid issued by the identity collaborator.
// The core never validates credentials; it trusts what it is handed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a conversation.  Every conversation belongs to exactly one
/// visitor, so the id is that visitor's uid; the operator has no conversation
/// of their own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn for_visitor(uid: &UserId) -> Self {
        Self(uid.0.clone())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The party that authored a message.
///
/// The operator is a single shared identity with no uid, so role checks are
/// structural rather than comparisons against a reserved string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "role", content = "uid", rename_all = "lowercase")]
pub enum Sender {
    Visitor(UserId),
    Operator,
}

impl Sender {
    pub fn is_operator(&self) -> bool {
        matches!(self, Sender::Operator)
    }

    pub fn is_visitor(&self) -> bool {
        matches!(self, Sender::Visitor(_))
    }

    /// The visitor uid, if the sender is a visitor.
    pub fn visitor_uid(&self) -> Option<&UserId> {
        match self {
            Sender::Visitor(uid) => Some(uid),
            Sender::Operator => None,
        }
    }
}

/// What the identity collaborator hands the core after authentication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VisitorIdentity {
    pub uid: UserId,
    pub display_name: String,
    /// Optional display metadata shown next to the name in the roster.
    pub country: Option<String>,
}

impl VisitorIdentity {
    pub fn new(uid: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            uid: UserId::new(uid),
            display_name: display_name.into(),
            country: None,
        }
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// The conversation this visitor participates in.
    pub fn conversation(&self) -> ConversationId {
        ConversationId::for_visitor(&self.uid)
    }
}
