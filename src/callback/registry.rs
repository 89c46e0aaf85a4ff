//! Callback registry: string discriminator to factory table
//!
//! The registry turns an ordered list of raw callback payloads into typed
//! [`Callback`] objects.  It is an explicit instance owned by the workflow,
//! not a process-wide singleton; test isolation comes from constructing a
//! fresh registry instead of resetting shared state.
//!
//! Registration is open: capability modules add factories from their
//! `initialize` hooks, including modules that run after the core set.  Late
//! additions never reset earlier registrations, and registering an existing
//! type overwrites its factory.

use std::collections::HashMap;
use std::sync::RwLock;

use super::types::{
    ChoiceCallback, ConfirmationCallback, HiddenValueCallback, KbaCreateCallback, NameCallback,
    PasswordCallback, TextOutputCallback, UnknownCallback,
};
use super::{Callback, RawCallback};

/// Factory producing one empty callback instance.
pub type CallbackFactory = Box<dyn Fn() -> Box<dyn Callback> + Send + Sync>;

/// Table from callback-type discriminator to factory.
///
/// # Examples
///
/// ```
/// use authflow::callback::{CallbackRegistry, NameCallback, RawCallback};
///
/// let registry = CallbackRegistry::with_defaults();
/// let raw: RawCallback = serde_json::from_str(r#"{
///     "type": "NameCallback",
///     "output": [{"name": "prompt", "value": "User Name"}],
///     "input": [{"name": "IDToken1", "value": ""}]
/// }"#).unwrap();
///
/// let callbacks = registry.resolve(&[raw]);
/// assert_eq!(callbacks.len(), 1);
/// assert_eq!(callbacks[0].callback_type(), "NameCallback");
/// ```
pub struct CallbackRegistry {
    factories: RwLock<HashMap<String, CallbackFactory>>,
}

impl CallbackRegistry {
    /// Creates an empty registry with no factories.
    pub fn new() -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a registry pre-loaded with the built-in callback types.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register("NameCallback", || Box::<NameCallback>::default());
        registry.register("PasswordCallback", || Box::<PasswordCallback>::default());
        registry.register("ChoiceCallback", || Box::<ChoiceCallback>::default());
        registry.register("ConfirmationCallback", || {
            Box::<ConfirmationCallback>::default()
        });
        registry.register("TextOutputCallback", || Box::<TextOutputCallback>::default());
        registry.register("KbaCreateCallback", || Box::<KbaCreateCallback>::default());
        registry.register("HiddenValueCallback", || {
            Box::<HiddenValueCallback>::default()
        });
        registry
    }

    /// Adds or overwrites the factory for a callback type.  Idempotent.
    ///
    /// Safe to call from any module's `initialize` hook; a write lock
    /// serializes concurrent registrations.
    pub fn register<F>(&self, callback_type: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Callback> + Send + Sync + 'static,
    {
        let callback_type = callback_type.into();
        tracing::debug!("Registering callback factory: {}", callback_type);
        self.factories
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(callback_type, Box::new(factory));
    }

    /// Returns `true` when a factory is registered for the type.
    pub fn is_registered(&self, callback_type: &str) -> bool {
        self.factories
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains_key(callback_type)
    }

    /// Maps raw payloads to typed callbacks, in input order.
    ///
    /// Each raw entry produces a fresh instance: the factory runs, the input
    /// template is captured, and `init_value` is invoked once per output
    /// field in listed order.  Unknown types degrade to
    /// [`UnknownCallback`] rather than aborting the flow.
    pub fn resolve(&self, raw_list: &[RawCallback]) -> Vec<Box<dyn Callback>> {
        let factories = self
            .factories
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        raw_list
            .iter()
            .map(|raw| {
                let mut callback: Box<dyn Callback> = match factories.get(&raw.callback_type) {
                    Some(factory) => factory(),
                    None => {
                        tracing::warn!(
                            "No factory for callback type '{}'; passing through",
                            raw.callback_type
                        );
                        Box::new(UnknownCallback::new(raw.callback_type.clone()))
                    }
                };
                callback.init_id(raw.id);
                callback.init_input(&raw.input);
                for field in &raw.output {
                    callback.init_value(&field.name, &field.value);
                }
                callback
            })
            .collect()
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::any::Any;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn raw(callback_type: &str, output: Value, input: Value) -> RawCallback {
        serde_json::from_value(serde_json::json!({
            "type": callback_type,
            "output": output,
            "input": input,
        }))
        .unwrap()
    }

    /// Callback that counts its `init_value` invocations and records the
    /// order of the field names it saw.
    #[derive(Default)]
    struct CountingCallback {
        calls: Vec<String>,
    }

    impl Callback for CountingCallback {
        fn callback_type(&self) -> &str {
            "X"
        }

        fn init_value(&mut self, name: &str, _value: &Value) {
            self.calls.push(name.to_string());
        }

        fn payload(&self) -> Value {
            Value::Null
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn test_resolve_invokes_init_value_once_per_output_field_in_order() {
        let registry = CallbackRegistry::new();
        registry.register("X", || Box::<CountingCallback>::default());

        let raw_list = vec![raw(
            "X",
            serde_json::json!([
                {"name": "first", "value": "1"},
                {"name": "second", "value": "2"}
            ]),
            serde_json::json!([]),
        )];

        let callbacks = registry.resolve(&raw_list);
        assert_eq!(callbacks.len(), 1);
        let counting = callbacks[0]
            .as_any()
            .downcast_ref::<CountingCallback>()
            .expect("registered type must downcast");
        assert_eq!(counting.calls, vec!["first", "second"]);
    }

    #[test]
    fn test_resolve_preserves_list_order() {
        let registry = CallbackRegistry::with_defaults();
        let raw_list = vec![
            raw("NameCallback", serde_json::json!([]), serde_json::json!([])),
            raw(
                "PasswordCallback",
                serde_json::json!([]),
                serde_json::json!([]),
            ),
        ];

        let callbacks = registry.resolve(&raw_list);
        assert_eq!(callbacks[0].callback_type(), "NameCallback");
        assert_eq!(callbacks[1].callback_type(), "PasswordCallback");
    }

    #[test]
    fn test_resolve_produces_distinct_instances_for_same_type() {
        let registry = CallbackRegistry::with_defaults();
        let raw_list = vec![
            raw("NameCallback", serde_json::json!([]), serde_json::json!([])),
            raw("NameCallback", serde_json::json!([]), serde_json::json!([])),
        ];

        let callbacks = registry.resolve(&raw_list);
        let a = callbacks[0]
            .as_any()
            .downcast_ref::<NameCallback>()
            .expect("NameCallback");
        let b = callbacks[1]
            .as_any()
            .downcast_ref::<NameCallback>()
            .expect("NameCallback");
        assert!(!std::ptr::eq(a, b));
    }

    #[test]
    fn test_unknown_type_degrades_to_pass_through() {
        let registry = CallbackRegistry::with_defaults();
        let raw_list = vec![raw(
            "BrandNewCallback",
            serde_json::json!([{"name": "data", "value": 42}]),
            serde_json::json!([{"name": "IDToken1", "value": ""}]),
        )];

        let callbacks = registry.resolve(&raw_list);
        assert_eq!(callbacks[0].callback_type(), "BrandNewCallback");
        let payload = callbacks[0].payload();
        assert_eq!(payload["output"][0]["value"], 42);
    }

    #[test]
    fn test_register_overwrites_existing_factory() {
        let counter = Arc::new(AtomicUsize::new(0));
        let registry = CallbackRegistry::with_defaults();

        let c = Arc::clone(&counter);
        registry.register("NameCallback", move || {
            c.fetch_add(1, Ordering::SeqCst);
            Box::<NameCallback>::default()
        });

        registry.resolve(&[raw(
            "NameCallback",
            serde_json::json!([]),
            serde_json::json!([]),
        )]);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_late_registration_does_not_reset_earlier_ones() {
        let registry = CallbackRegistry::with_defaults();
        registry.register("LateCallback", || Box::<NameCallback>::default());
        assert!(registry.is_registered("LateCallback"));
        assert!(registry.is_registered("NameCallback"));
    }

    #[test]
    fn test_resolve_empty_list_yields_empty_vec() {
        let registry = CallbackRegistry::with_defaults();
        assert!(registry.resolve(&[]).is_empty());
    }
}
