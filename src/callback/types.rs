//! Concrete callback types
//!
//! One value object per interaction type.  Each type is closed at compile
//! time, but the set of types is open: anything not registered resolves to
//! the pass-through [`UnknownCallback`].
//!
//! All concrete callbacks follow the same construction protocol driven by
//! the registry: capture the input template, then absorb output fields via
//! `init_value` in list order.  Setters record the caller's answer, and
//! `payload()` re-serializes the raw shape with the answers filled into the
//! input list.

use serde_json::Value;
use std::any::Any;

use super::{to_raw_payload, Callback, Field};

/// Writes `value` into the input field at `index`, if present.
fn fill_input(input: &mut [Field], index: usize, value: Value) {
    if let Some(field) = input.get_mut(index) {
        field.value = value;
    }
}

// ---------------------------------------------------------------------------
// NameCallback
// ---------------------------------------------------------------------------

/// Collects a plain-text identifier such as a username.
///
/// # Examples
///
/// ```
/// use authflow::callback::{Callback, NameCallback};
///
/// let mut callback = NameCallback::default();
/// callback.init_value("prompt", &serde_json::json!("User Name"));
/// callback.set_name("demo");
/// assert_eq!(callback.prompt(), "User Name");
/// ```
#[derive(Debug, Default)]
pub struct NameCallback {
    prompt: String,
    name: String,
    input: Vec<Field>,
    id: Option<u64>,
}

impl NameCallback {
    /// The server-supplied prompt text.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Records the answer.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }
}

impl Callback for NameCallback {
    fn callback_type(&self) -> &str {
        "NameCallback"
    }

    fn init_value(&mut self, name: &str, value: &Value) {
        if name == "prompt" {
            self.prompt = value.as_str().unwrap_or_default().to_string();
        }
    }

    fn init_input(&mut self, fields: &[Field]) {
        self.input = fields.to_vec();
    }

    fn init_id(&mut self, id: Option<u64>) {
        self.id = id;
    }

    fn payload(&self) -> Value {
        let output = vec![Field {
            name: "prompt".to_string(),
            value: Value::String(self.prompt.clone()),
        }];
        let mut input = self.input.clone();
        fill_input(&mut input, 0, Value::String(self.name.clone()));
        to_raw_payload(self.callback_type(), &output, &input, self.id)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// PasswordCallback
// ---------------------------------------------------------------------------

/// Collects a secret such as a password or one-time code.
#[derive(Debug, Default)]
pub struct PasswordCallback {
    prompt: String,
    password: String,
    input: Vec<Field>,
    id: Option<u64>,
}

impl PasswordCallback {
    /// The server-supplied prompt text.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Records the answer.
    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = password.into();
    }
}

impl Callback for PasswordCallback {
    fn callback_type(&self) -> &str {
        "PasswordCallback"
    }

    fn init_value(&mut self, name: &str, value: &Value) {
        if name == "prompt" {
            self.prompt = value.as_str().unwrap_or_default().to_string();
        }
    }

    fn init_input(&mut self, fields: &[Field]) {
        self.input = fields.to_vec();
    }

    fn init_id(&mut self, id: Option<u64>) {
        self.id = id;
    }

    fn payload(&self) -> Value {
        let output = vec![Field {
            name: "prompt".to_string(),
            value: Value::String(self.prompt.clone()),
        }];
        let mut input = self.input.clone();
        fill_input(&mut input, 0, Value::String(self.password.clone()));
        to_raw_payload(self.callback_type(), &output, &input, self.id)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// ChoiceCallback
// ---------------------------------------------------------------------------

/// Presents a list of choices; the answer is the selected index.
#[derive(Debug, Default)]
pub struct ChoiceCallback {
    prompt: String,
    choices: Vec<String>,
    default_choice: u64,
    selected_index: u64,
    input: Vec<Field>,
    id: Option<u64>,
}

impl ChoiceCallback {
    /// The server-supplied prompt text.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// The server-supplied choice labels, in order.
    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    /// The server-suggested default index.
    pub fn default_choice(&self) -> u64 {
        self.default_choice
    }

    /// Records the selected index.
    pub fn set_selected_index(&mut self, index: u64) {
        self.selected_index = index;
    }
}

impl Callback for ChoiceCallback {
    fn callback_type(&self) -> &str {
        "ChoiceCallback"
    }

    fn init_value(&mut self, name: &str, value: &Value) {
        match name {
            "prompt" => self.prompt = value.as_str().unwrap_or_default().to_string(),
            "choices" => {
                self.choices = value
                    .as_array()
                    .map(|items| {
                        items
                            .iter()
                            .map(|v| v.as_str().unwrap_or_default().to_string())
                            .collect()
                    })
                    .unwrap_or_default();
            }
            "defaultChoice" => {
                self.default_choice = value.as_u64().unwrap_or(0);
                self.selected_index = self.default_choice;
            }
            _ => {}
        }
    }

    fn init_input(&mut self, fields: &[Field]) {
        self.input = fields.to_vec();
    }

    fn init_id(&mut self, id: Option<u64>) {
        self.id = id;
    }

    fn payload(&self) -> Value {
        let output = vec![
            Field {
                name: "prompt".to_string(),
                value: Value::String(self.prompt.clone()),
            },
            Field {
                name: "choices".to_string(),
                value: Value::Array(
                    self.choices
                        .iter()
                        .map(|c| Value::String(c.clone()))
                        .collect(),
                ),
            },
            Field {
                name: "defaultChoice".to_string(),
                value: Value::from(self.default_choice),
            },
        ];
        let mut input = self.input.clone();
        fill_input(&mut input, 0, Value::from(self.selected_index));
        to_raw_payload(self.callback_type(), &output, &input, self.id)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// ConfirmationCallback
// ---------------------------------------------------------------------------

/// Asks the user to confirm one of a set of options (Yes/No, Retry, etc.).
#[derive(Debug, Default)]
pub struct ConfirmationCallback {
    prompt: String,
    options: Vec<String>,
    option_type: i64,
    default_option: u64,
    selected_option: u64,
    input: Vec<Field>,
    id: Option<u64>,
}

impl ConfirmationCallback {
    /// The server-supplied prompt text.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// The confirmation option labels, in order.
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Records the selected option index.
    pub fn set_selected_option(&mut self, index: u64) {
        self.selected_option = index;
    }
}

impl Callback for ConfirmationCallback {
    fn callback_type(&self) -> &str {
        "ConfirmationCallback"
    }

    fn init_value(&mut self, name: &str, value: &Value) {
        match name {
            "prompt" => self.prompt = value.as_str().unwrap_or_default().to_string(),
            "options" => {
                self.options = value
                    .as_array()
                    .map(|items| {
                        items
                            .iter()
                            .map(|v| v.as_str().unwrap_or_default().to_string())
                            .collect()
                    })
                    .unwrap_or_default();
            }
            "optionType" => self.option_type = value.as_i64().unwrap_or(-1),
            "defaultOption" => {
                self.default_option = value.as_u64().unwrap_or(0);
                self.selected_option = self.default_option;
            }
            _ => {}
        }
    }

    fn init_input(&mut self, fields: &[Field]) {
        self.input = fields.to_vec();
    }

    fn init_id(&mut self, id: Option<u64>) {
        self.id = id;
    }

    fn payload(&self) -> Value {
        let output = vec![
            Field {
                name: "prompt".to_string(),
                value: Value::String(self.prompt.clone()),
            },
            Field {
                name: "options".to_string(),
                value: Value::Array(
                    self.options
                        .iter()
                        .map(|o| Value::String(o.clone()))
                        .collect(),
                ),
            },
            Field {
                name: "optionType".to_string(),
                value: Value::from(self.option_type),
            },
            Field {
                name: "defaultOption".to_string(),
                value: Value::from(self.default_option),
            },
        ];
        let mut input = self.input.clone();
        fill_input(&mut input, 0, Value::from(self.selected_option));
        to_raw_payload(self.callback_type(), &output, &input, self.id)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// TextOutputCallback
// ---------------------------------------------------------------------------

/// Server-to-client message with no answer; `payload()` echoes the raw shape.
#[derive(Debug, Default)]
pub struct TextOutputCallback {
    message: String,
    message_type: String,
    id: Option<u64>,
}

impl TextOutputCallback {
    /// The message text to present.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The message severity: `"0"` info, `"1"` warning, `"2"` error.
    pub fn message_type(&self) -> &str {
        &self.message_type
    }
}

impl Callback for TextOutputCallback {
    fn callback_type(&self) -> &str {
        "TextOutputCallback"
    }

    fn init_value(&mut self, name: &str, value: &Value) {
        match name {
            "message" => self.message = value.as_str().unwrap_or_default().to_string(),
            "messageType" => {
                self.message_type = value.as_str().unwrap_or_default().to_string();
            }
            _ => {}
        }
    }

    fn init_id(&mut self, id: Option<u64>) {
        self.id = id;
    }

    fn payload(&self) -> Value {
        let output = vec![
            Field {
                name: "message".to_string(),
                value: Value::String(self.message.clone()),
            },
            Field {
                name: "messageType".to_string(),
                value: Value::String(self.message_type.clone()),
            },
        ];
        to_raw_payload(self.callback_type(), &output, &[], self.id)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// KbaCreateCallback
// ---------------------------------------------------------------------------

/// Knowledge-based-authentication enrolment: pick a question, give an answer.
#[derive(Debug, Default)]
pub struct KbaCreateCallback {
    prompt: String,
    predefined_questions: Vec<String>,
    question: String,
    answer: String,
    input: Vec<Field>,
    id: Option<u64>,
}

impl KbaCreateCallback {
    /// The server-supplied prompt text.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// The server-proposed security questions.
    pub fn predefined_questions(&self) -> &[String] {
        &self.predefined_questions
    }

    /// Records the chosen question.
    pub fn set_question(&mut self, question: impl Into<String>) {
        self.question = question.into();
    }

    /// Records the answer to the chosen question.
    pub fn set_answer(&mut self, answer: impl Into<String>) {
        self.answer = answer.into();
    }
}

impl Callback for KbaCreateCallback {
    fn callback_type(&self) -> &str {
        "KbaCreateCallback"
    }

    fn init_value(&mut self, name: &str, value: &Value) {
        match name {
            "prompt" => self.prompt = value.as_str().unwrap_or_default().to_string(),
            "predefinedQuestions" => {
                self.predefined_questions = value
                    .as_array()
                    .map(|items| {
                        items
                            .iter()
                            .map(|v| v.as_str().unwrap_or_default().to_string())
                            .collect()
                    })
                    .unwrap_or_default();
            }
            _ => {}
        }
    }

    fn init_input(&mut self, fields: &[Field]) {
        self.input = fields.to_vec();
    }

    fn init_id(&mut self, id: Option<u64>) {
        self.id = id;
    }

    fn payload(&self) -> Value {
        let output = vec![
            Field {
                name: "prompt".to_string(),
                value: Value::String(self.prompt.clone()),
            },
            Field {
                name: "predefinedQuestions".to_string(),
                value: Value::Array(
                    self.predefined_questions
                        .iter()
                        .map(|q| Value::String(q.clone()))
                        .collect(),
                ),
            },
        ];
        // Input order is question then answer, matching the wire template.
        let mut input = self.input.clone();
        fill_input(&mut input, 0, Value::String(self.question.clone()));
        fill_input(&mut input, 1, Value::String(self.answer.clone()));
        to_raw_payload(self.callback_type(), &output, &input, self.id)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// HiddenValueCallback
// ---------------------------------------------------------------------------

/// Carries a value the server wants echoed back, invisible to the user.
///
/// Capability modules use this as a mailbox: a module's callback-injection
/// hook can read the `id` and write the computed value (e.g. a signed JWT)
/// without any user interaction.
#[derive(Debug, Default)]
pub struct HiddenValueCallback {
    value_id: String,
    initial_value: String,
    value: Option<String>,
    input: Vec<Field>,
    id: Option<u64>,
}

impl HiddenValueCallback {
    /// The server-assigned identifier for this hidden slot.
    pub fn value_id(&self) -> &str {
        &self.value_id
    }

    /// The server-supplied initial value.
    pub fn initial_value(&self) -> &str {
        &self.initial_value
    }

    /// Records the value to echo back.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = Some(value.into());
    }
}

impl Callback for HiddenValueCallback {
    fn callback_type(&self) -> &str {
        "HiddenValueCallback"
    }

    fn init_value(&mut self, name: &str, value: &Value) {
        match name {
            "id" => self.value_id = value.as_str().unwrap_or_default().to_string(),
            "value" => self.initial_value = value.as_str().unwrap_or_default().to_string(),
            _ => {}
        }
    }

    fn init_input(&mut self, fields: &[Field]) {
        self.input = fields.to_vec();
    }

    fn init_id(&mut self, id: Option<u64>) {
        self.id = id;
    }

    fn payload(&self) -> Value {
        let output = vec![
            Field {
                name: "value".to_string(),
                value: Value::String(self.initial_value.clone()),
            },
            Field {
                name: "id".to_string(),
                value: Value::String(self.value_id.clone()),
            },
        ];
        let answer = self
            .value
            .clone()
            .unwrap_or_else(|| self.initial_value.clone());
        let mut input = self.input.clone();
        fill_input(&mut input, 0, Value::String(answer));
        to_raw_payload(self.callback_type(), &output, &input, self.id)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// UnknownCallback
// ---------------------------------------------------------------------------

/// Opaque pass-through for callback types with no registered factory.
///
/// Retains the raw payload untouched and echoes it from `payload()`, so a
/// server that introduces a new callback type does not abort the whole flow.
#[derive(Debug, Default)]
pub struct UnknownCallback {
    callback_type: String,
    output: Vec<Field>,
    input: Vec<Field>,
    id: Option<u64>,
}

impl UnknownCallback {
    /// Builds a pass-through callback for the given unregistered type.
    pub fn new(callback_type: impl Into<String>) -> Self {
        Self {
            callback_type: callback_type.into(),
            ..Self::default()
        }
    }

    /// The raw output fields, untouched.
    pub fn output(&self) -> &[Field] {
        &self.output
    }
}

impl Callback for UnknownCallback {
    fn callback_type(&self) -> &str {
        &self.callback_type
    }

    fn init_value(&mut self, name: &str, value: &Value) {
        self.output.push(Field {
            name: name.to_string(),
            value: value.clone(),
        });
    }

    fn init_input(&mut self, fields: &[Field]) {
        self.input = fields.to_vec();
    }

    fn init_id(&mut self, id: Option<u64>) {
        self.id = id;
    }

    fn payload(&self) -> Value {
        to_raw_payload(&self.callback_type, &self.output, &self.input, self.id)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
