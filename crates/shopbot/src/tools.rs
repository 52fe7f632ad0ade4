//! The fixed set of tools advertised to the model.
//!
//! Tool names form a closed enum; the registry builds every descriptor once at startup and
//! dispatches calls by parsing the requested name back into that enum. A name outside the
//! enum resolves to an empty result so a hallucinated tool never aborts a reply.

use serde::Deserialize;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, EnumIter, EnumString};
use tracing::{info, warn};

use crate::errors::{AgentError, AgentResult};
use crate::models::tool::{Tool, ToolCall};
use crate::notifier::Notifier;

const NAME_NOT_PROVIDED: &str = "Name not provided";
const NOTES_NOT_PROVIDED: &str = "not provided";

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ToolKind {
    RecordUserDetails,
    RecordUnknownQuestion,
}

impl ToolKind {
    fn descriptor(self) -> Tool {
        match self {
            ToolKind::RecordUserDetails => Tool::new(
                self.as_ref(),
                "Use this tool to record that a user is interested in being in touch and \
                provided a phone number",
                json!({
                    "type": "object",
                    "properties": {
                        "phone_number": {
                            "type": "string",
                            "description": "The phone number of this user"
                        },
                        "name": {
                            "type": "string",
                            "description": "The user's name, if they provided it"
                        },
                        "notes": {
                            "type": "string",
                            "description": "Any additional information about the conversation that's worth recording to give context"
                        }
                    },
                    "required": ["phone_number"],
                    "additionalProperties": false
                }),
            ),
            ToolKind::RecordUnknownQuestion => Tool::new(
                self.as_ref(),
                "Always use this tool to record any question that couldn't be answered as you \
                didn't know the answer",
                json!({
                    "type": "object",
                    "properties": {
                        "question": {
                            "type": "string",
                            "description": "The question that couldn't be answered"
                        }
                    },
                    "required": ["question"],
                    "additionalProperties": false
                }),
            ),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UserDetails {
    phone_number: String,
    name: Option<String>,
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UnknownQuestion {
    question: String,
}

pub struct ToolRegistry {
    tools: Vec<Tool>,
    notifier: Arc<dyn Notifier>,
}

impl ToolRegistry {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            tools: ToolKind::iter().map(ToolKind::descriptor).collect(),
            notifier,
        }
    }

    /// Descriptors in the order they are advertised to the model
    pub fn describe(&self) -> &[Tool] {
        &self.tools
    }

    /// Run the handler for a tool call.
    ///
    /// Unknown tool names yield `{}`. Arguments that do not match the tool's schema are
    /// reported as `InvalidParameters`, which aborts the reply.
    pub fn dispatch(&self, call: &ToolCall) -> AgentResult<Value> {
        info!("Tool called: {}", call.name);
        let Ok(kind) = ToolKind::from_str(&call.name) else {
            warn!("Model requested unregistered tool {}", call.name);
            return Ok(json!({}));
        };

        match kind {
            ToolKind::RecordUserDetails => {
                let details: UserDetails = parse_arguments(kind, &call.arguments)?;
                self.record_user_details(details)
            }
            ToolKind::RecordUnknownQuestion => {
                let question: UnknownQuestion = parse_arguments(kind, &call.arguments)?;
                self.record_unknown_question(question)
            }
        }
    }

    fn record_user_details(&self, details: UserDetails) -> AgentResult<Value> {
        let name = details.name.as_deref().unwrap_or(NAME_NOT_PROVIDED);
        let notes = details.notes.as_deref().unwrap_or(NOTES_NOT_PROVIDED);
        self.notifier.notify(format!(
            "Recording interest from {} with phone number {} and notes {}",
            name, details.phone_number, notes
        ));
        Ok(json!({"recorded": "ok"}))
    }

    fn record_unknown_question(&self, question: UnknownQuestion) -> AgentResult<Value> {
        self.notifier.notify(format!(
            "Recording {} asked that I couldn't answer",
            question.question
        ));
        Ok(json!({"recorded": "ok"}))
    }
}

fn parse_arguments<T: serde::de::DeserializeOwned>(
    kind: ToolKind,
    arguments: &Value,
) -> AgentResult<T> {
    T::deserialize(arguments).map_err(|e| {
        AgentError::InvalidParameters(format!("{}: {}", kind.as_ref(), e))
    })
}
