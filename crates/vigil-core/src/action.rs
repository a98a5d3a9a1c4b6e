//! Actions submitted for a decision.
//!
//! An [`Action`] is either something an autonomous agent wants to do
//! ([`AgentAction`]) or a tool invocation relayed by the MCP gateway
//! ([`ToolCall`]). Both carry the classifier's [`RiskLevel`] and a list of
//! concerns; the variant decides which source-specific fields exist.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};
use crate::types::{ActionId, ActionSource, RiskLevel, Timestamp};

/// The `action_type` reported for every tool call.
pub const TOOL_CALL_ACTION_TYPE: &str = "tool_call";

/// An action proposed by an autonomous agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentAction {
    /// Client-assigned identifier.
    pub id: ActionId,
    /// Name of the agent proposing the action (e.g. `claude-code`).
    pub agent: String,
    /// Kind of action (e.g. `file_write`, `shell_command`, `network_request`).
    pub action_type: String,
    /// Path, URL, or command line the action operates on.
    #[serde(default)]
    pub target: Option<String>,
    /// Classifier-assigned risk level.
    pub risk_level: RiskLevel,
    /// Classifier concerns (e.g. `credential_access`).
    #[serde(default)]
    pub concerns: Vec<String>,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// When the agent proposed the action.
    pub timestamp: Timestamp,
}

impl AgentAction {
    /// Create a new agent action with a random id.
    #[must_use]
    pub fn new(
        agent: impl Into<String>,
        action_type: impl Into<String>,
        risk_level: RiskLevel,
    ) -> Self {
        Self {
            id: ActionId::new(),
            agent: agent.into(),
            action_type: action_type.into(),
            target: None,
            risk_level,
            concerns: Vec::new(),
            description: String::new(),
            timestamp: Timestamp::now(),
        }
    }

    /// Set the action id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<ActionId>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the target.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a classifier concern.
    #[must_use]
    pub fn with_concern(mut self, concern: impl Into<String>) -> Self {
        self.concerns.push(concern.into());
        self
    }
}

/// A tool call relayed by the MCP gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Client-assigned identifier.
    pub id: ActionId,
    /// MCP server hosting the tool.
    pub server_name: String,
    /// Tool being invoked.
    pub tool_name: String,
    /// Raw tool arguments.
    #[serde(default)]
    pub arguments: serde_json::Value,
    /// Classifier-assigned risk level.
    pub risk_level: RiskLevel,
    /// Classifier concerns.
    #[serde(default)]
    pub concerns: Vec<String>,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// When the call was intercepted.
    pub timestamp: Timestamp,
}

impl ToolCall {
    /// Create a new tool call with a random id.
    #[must_use]
    pub fn new(
        server_name: impl Into<String>,
        tool_name: impl Into<String>,
        risk_level: RiskLevel,
    ) -> Self {
        Self {
            id: ActionId::new(),
            server_name: server_name.into(),
            tool_name: tool_name.into(),
            arguments: serde_json::Value::Null,
            risk_level,
            concerns: Vec::new(),
            description: String::new(),
            timestamp: Timestamp::now(),
        }
    }

    /// Set the action id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<ActionId>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the tool arguments.
    #[must_use]
    pub fn with_arguments(mut self, arguments: serde_json::Value) -> Self {
        self.arguments = arguments;
        self
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a classifier concern.
    #[must_use]
    pub fn with_concern(mut self, concern: impl Into<String>) -> Self {
        self.concerns.push(concern.into());
        self
    }
}

/// An action awaiting a decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Proposed by an agent.
    Agent(AgentAction),
    /// Relayed by the MCP gateway.
    ToolCall(ToolCall),
}

impl Action {
    /// The client-assigned id.
    #[must_use]
    pub fn id(&self) -> &ActionId {
        match self {
            Self::Agent(a) => &a.id,
            Self::ToolCall(t) => &t.id,
        }
    }

    /// The classifier-assigned risk level.
    #[must_use]
    pub fn risk_level(&self) -> RiskLevel {
        match self {
            Self::Agent(a) => a.risk_level,
            Self::ToolCall(t) => t.risk_level,
        }
    }

    /// When the action was proposed.
    #[must_use]
    pub fn timestamp(&self) -> Timestamp {
        match self {
            Self::Agent(a) => a.timestamp,
            Self::ToolCall(t) => t.timestamp,
        }
    }

    /// Human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        match self {
            Self::Agent(a) => &a.description,
            Self::ToolCall(t) => &t.description,
        }
    }

    /// Classifier concerns.
    #[must_use]
    pub fn concerns(&self) -> &[String] {
        match self {
            Self::Agent(a) => &a.concerns,
            Self::ToolCall(t) => &t.concerns,
        }
    }

    /// The intake path this kind of action arrives through.
    #[must_use]
    pub fn source(&self) -> ActionSource {
        match self {
            Self::Agent(_) => ActionSource::AgentShield,
            Self::ToolCall(_) => ActionSource::McpGateway,
        }
    }

    /// The action kind; every tool call reports [`TOOL_CALL_ACTION_TYPE`].
    #[must_use]
    pub fn action_type(&self) -> &str {
        match self {
            Self::Agent(a) => &a.action_type,
            Self::ToolCall(_) => TOOL_CALL_ACTION_TYPE,
        }
    }

    /// One-line summary for logs and UI lists.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Agent(a) => match &a.target {
                Some(target) => format!("{} {} {}", a.agent, a.action_type, target),
                None => format!("{} {}", a.agent, a.action_type),
            },
            Self::ToolCall(t) => format!("{}:{}", t.server_name, t.tool_name),
        }
    }

    /// Check required fields.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingField`] if the id or a source-specific
    /// identifying field is empty.
    pub fn validate(&self) -> CoreResult<()> {
        if self.id().is_empty() {
            return Err(CoreError::MissingField("id"));
        }
        match self {
            Self::Agent(a) => {
                if a.action_type.trim().is_empty() {
                    return Err(CoreError::MissingField("action_type"));
                }
            },
            Self::ToolCall(t) => {
                if t.tool_name.trim().is_empty() {
                    return Err(CoreError::MissingField("tool_name"));
                }
            },
        }
        Ok(())
    }
}

impl From<AgentAction> for Action {
    fn from(a: AgentAction) -> Self {
        Self::Agent(a)
    }
}

impl From<ToolCall> for Action {
    fn from(t: ToolCall) -> Self {
        Self::ToolCall(t)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.risk_level(), self.summary())
    }
}
