//! Emergency number override store
//!
//! A single persisted override for the number dialed by the emergency
//! gesture, reachable only through the method-call interface. The tabular
//! query/insert/update/delete surface is deliberately unsupported.

use std::{collections::BTreeMap, path::Path};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::services::preferences::Preferences;

/// Key under which the override is stored and exchanged
pub const EMERGENCY_GESTURE_CALL_NUMBER: &str = "emergency_gesture_call_number";
/// Method returning the current override
pub const METHOD_GET_EMERGENCY_NUMBER_OVERRIDE: &str = "GET_EMERGENCY_NUMBER_OVERRIDE";
/// Method replacing the current override
pub const METHOD_SET_EMERGENCY_NUMBER_OVERRIDE: &str = "SET_EMERGENCY_NUMBER_OVERRIDE";
/// Topic every successful set is announced on
pub const EMERGENCY_NUMBER_OVERRIDE_TOPIC: &str = "emergency_number_override";

const PREFERENCES_NAME: &str = "local_emergency_number_override_shared_pref";

/// Flat key to optional string mapping used for requests and responses
pub type Bundle = BTreeMap<String, Option<String>>;

/// Change notification carrying nothing but its topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideChanged {
    pub topic: &'static str,
}

/// Provider failures
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
    #[error("failed to persist override: {0}")]
    Storage(#[from] std::io::Error),
}

/// Persistent emergency number override store
#[derive(Debug)]
pub struct EmergencyNumberProvider {
    preferences: Preferences,
    change_tx: broadcast::Sender<OverrideChanged>,
}

impl EmergencyNumberProvider {
    /// Open the store under `data_dir`
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let (change_tx, _) = broadcast::channel(16);
        Self {
            preferences: Preferences::open(data_dir, PREFERENCES_NAME),
            change_tx,
        }
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<OverrideChanged> {
        self.change_tx.subscribe()
    }

    /// Dispatch a method call
    pub fn call(&self, method: &str, _arg: Option<&str>, extras: &Bundle) -> Result<Bundle, ProviderError> {
        let mut bundle = Bundle::new();
        match method {
            METHOD_GET_EMERGENCY_NUMBER_OVERRIDE => {
                debug!("{}", METHOD_GET_EMERGENCY_NUMBER_OVERRIDE);
                bundle.insert(EMERGENCY_GESTURE_CALL_NUMBER.to_string(), self.get());
            }
            METHOD_SET_EMERGENCY_NUMBER_OVERRIDE => {
                debug!("{}", METHOD_SET_EMERGENCY_NUMBER_OVERRIDE);
                let input = extras
                    .get(EMERGENCY_GESTURE_CALL_NUMBER)
                    .and_then(|value| value.as_deref());
                self.set(input)?;
            }
            other => {
                warn!("Unknown override method, returning empty bundle: {}", other);
            }
        }
        Ok(bundle)
    }

    /// Current override, if any
    pub fn get(&self) -> Option<String> {
        self.preferences.get_string(EMERGENCY_GESTURE_CALL_NUMBER)
    }

    /// Store `number` (`None` clears the override) and announce the change
    pub fn set(&self, number: Option<&str>) -> Result<(), ProviderError> {
        self.preferences
            .edit()
            .put_string(EMERGENCY_GESTURE_CALL_NUMBER, number)
            .apply()?;

        let notification = OverrideChanged {
            topic: EMERGENCY_NUMBER_OVERRIDE_TOPIC,
        };
        if self.change_tx.send(notification).is_err() {
            debug!("No listeners for override change notification");
        }
        Ok(())
    }

    pub fn query(&self) -> Result<Bundle, ProviderError> {
        Err(ProviderError::Unsupported("query"))
    }

    pub fn get_type(&self) -> Result<String, ProviderError> {
        Err(ProviderError::Unsupported("getType"))
    }

    pub fn insert(&self, _values: &Bundle) -> Result<(), ProviderError> {
        Err(ProviderError::Unsupported("insert"))
    }

    pub fn update(&self, _values: &Bundle) -> Result<usize, ProviderError> {
        Err(ProviderError::Unsupported("update"))
    }

    pub fn delete(&self) -> Result<usize, ProviderError> {
        Err(ProviderError::Unsupported("delete"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    fn extras(number: Option<&str>) -> Bundle {
        let mut bundle = Bundle::new();
        bundle.insert(
            EMERGENCY_GESTURE_CALL_NUMBER.to_string(),
            number.map(str::to_string),
        );
        bundle
    }

    #[test]
    fn get_without_set_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let provider = EmergencyNumberProvider::new(dir.path());

        let bundle = provider
            .call(METHOD_GET_EMERGENCY_NUMBER_OVERRIDE, None, &Bundle::new())
            .unwrap();
        assert_eq!(bundle.get(EMERGENCY_GESTURE_CALL_NUMBER), Some(&None));
    }

    #[test]
    fn set_then_get_round_trips_and_notifies_once() {
        let dir = tempfile::tempdir().unwrap();
        let provider = EmergencyNumberProvider::new(dir.path());
        let mut changes = provider.subscribe();

        let reply = provider
            .call(METHOD_SET_EMERGENCY_NUMBER_OVERRIDE, None, &extras(Some("123")))
            .unwrap();
        assert!(reply.is_empty());

        assert_eq!(
            changes.try_recv().unwrap(),
            OverrideChanged { topic: EMERGENCY_NUMBER_OVERRIDE_TOPIC }
        );
        assert!(matches!(changes.try_recv(), Err(TryRecvError::Empty)));

        let bundle = provider
            .call(METHOD_GET_EMERGENCY_NUMBER_OVERRIDE, None, &Bundle::new())
            .unwrap();
        assert_eq!(
            bundle.get(EMERGENCY_GESTURE_CALL_NUMBER),
            Some(&Some("123".to_string()))
        );
    }

    #[test]
    fn override_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        EmergencyNumberProvider::new(dir.path()).set(Some("911")).unwrap();
        assert_eq!(
            EmergencyNumberProvider::new(dir.path()).get().as_deref(),
            Some("911")
        );
    }

    #[test]
    fn set_without_value_clears_override() {
        let dir = tempfile::tempdir().unwrap();
        let provider = EmergencyNumberProvider::new(dir.path());
        provider.set(Some("123")).unwrap();

        provider
            .call(METHOD_SET_EMERGENCY_NUMBER_OVERRIDE, None, &Bundle::new())
            .unwrap();
        assert_eq!(provider.get(), None);
    }

    #[test]
    fn numbers_are_stored_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let provider = EmergencyNumberProvider::new(dir.path());
        provider.set(Some("not a number #*")).unwrap();
        assert_eq!(provider.get().as_deref(), Some("not a number #*"));
    }

    #[test]
    fn unknown_method_returns_empty_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let provider = EmergencyNumberProvider::new(dir.path());
        let bundle = provider.call("DROP_TABLE", None, &Bundle::new()).unwrap();
        assert!(bundle.is_empty());
    }

    #[test]
    fn tabular_surface_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let provider = EmergencyNumberProvider::new(dir.path());

        assert!(matches!(provider.query(), Err(ProviderError::Unsupported("query"))));
        assert!(matches!(provider.get_type(), Err(ProviderError::Unsupported(_))));
        assert!(matches!(provider.insert(&Bundle::new()), Err(ProviderError::Unsupported(_))));
        assert!(matches!(provider.update(&Bundle::new()), Err(ProviderError::Unsupported(_))));
        assert!(matches!(provider.delete(), Err(ProviderError::Unsupported(_))));
    }
}
