//! These models represent the objects passed around by the agent
//!
//! There are two related formats we need to interact with:
//! - openai-compatible chat messages/tools, sent from the agent to the LLM
//! - the running conversation the agent keeps while resolving tool calls
//!
//! We always immediately convert the wire format into the internal structs using the
//! helpers in `providers::utils`. The internal models carry typed tool results, so they are
//! not an exact match to the wire format.
pub mod message;
pub mod role;
pub mod tool;
