//! Callback model: typed requests-for-input within one continuation step
//!
//! A server continuation response carries an ordered list of raw callback
//! payloads.  Each payload names a callback type and two field lists:
//! `output` (what the server tells the client) and `input` (what the client
//! must answer).  The [`CallbackRegistry`](registry::CallbackRegistry) maps
//! each payload to a typed [`Callback`] value object; the order of the
//! enclosing list is significant and preserved end-to-end.
//!
//! The set of callback types is open: capability modules register new
//! factories at `initialize` time without recompiling the engine.  Unknown
//! types degrade to an opaque pass-through
//! [`UnknownCallback`](types::UnknownCallback) so that forward-compatible
//! server additions never abort a flow.

pub mod registry;
pub mod types;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;

pub use registry::CallbackRegistry;
pub use types::{
    ChoiceCallback, ConfirmationCallback, HiddenValueCallback, KbaCreateCallback, NameCallback,
    PasswordCallback, TextOutputCallback, UnknownCallback,
};

/// One named field inside a raw callback's `output` or `input` list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Field {
    /// Field name, e.g. `"prompt"` or `"IDToken1"`.
    pub name: String,
    /// Field value; arbitrary JSON.
    #[serde(default)]
    pub value: Value,
}

/// Raw wire representation of one callback.
///
/// ```json
/// { "type": "NameCallback",
///   "output": [ {"name": "prompt", "value": "User Name"} ],
///   "input":  [ {"name": "IDToken1", "value": ""} ] }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCallback {
    /// Type discriminator, e.g. `"NameCallback"`.
    #[serde(rename = "type")]
    pub callback_type: String,

    /// Server-supplied output fields, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output: Vec<Field>,

    /// Input fields the client must fill, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input: Vec<Field>,

    /// Optional callback identifier echoed back to the server.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
}

/// A typed request-for-input or piece-of-output within one continuation step.
///
/// Concrete callbacks are built by the registry in three steps, in order:
/// the factory produces an empty instance, [`Callback::init_input`] captures
/// the input-field template, and [`Callback::init_value`] is invoked once
/// per `output` entry in list order.  [`Callback::payload`] later serializes
/// the answer state back into the raw shape, with the `input` values filled.
pub trait Callback: Any + Send + Sync {
    /// The type discriminator this callback answers to.
    fn callback_type(&self) -> &str;

    /// Receives one server-supplied output field.  Called once per `output`
    /// entry, in list order, during construction.
    fn init_value(&mut self, name: &str, value: &Value);

    /// Captures the input-field template so [`Callback::payload`] knows the
    /// field names to answer under.  Default: ignore.
    fn init_input(&mut self, fields: &[Field]) {
        let _ = fields;
    }

    /// Records the optional `_id` of the raw payload.  Default: ignore.
    fn init_id(&mut self, id: Option<u64>) {
        let _ = id;
    }

    /// Serializes the current answer state into the raw callback shape.
    fn payload(&self) -> Value;

    /// Upcast for typed downcasting via [`std::any::Any`].
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for typed downcasting via [`std::any::Any`].
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Serializes a callback type plus field lists into the raw wire shape.
///
/// Shared by the concrete `payload()` implementations.
pub(crate) fn to_raw_payload(
    callback_type: &str,
    output: &[Field],
    input: &[Field],
    id: Option<u64>,
) -> Value {
    let raw = RawCallback {
        callback_type: callback_type.to_string(),
        output: output.to_vec(),
        input: input.to_vec(),
        id,
    };
    // RawCallback serialization cannot fail: all fields are plain JSON.
    serde_json::to_value(raw).unwrap_or(Value::Null)
}
