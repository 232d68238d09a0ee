//! Emergency number resolution and call placement

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::emergency_number::EmergencyNumberProvider;
use super::platform::{CallPlacer, CallRequest, EmergencyNumberSource, TelephonyFeature};

/// Number dialed when neither an override nor a platform number exists
pub const FALLBACK_EMERGENCY_NUMBER: &str = "112";

/// Resolves the police number: override, then platform list, then fallback.
/// Every lookup re-reads the override.
pub struct EmergencyNumberResolver {
    provider: Arc<EmergencyNumberProvider>,
    source: Arc<dyn EmergencyNumberSource>,
}

impl EmergencyNumberResolver {
    pub fn new(provider: Arc<EmergencyNumberProvider>, source: Arc<dyn EmergencyNumberSource>) -> Self {
        Self { provider, source }
    }

    /// Current police number
    pub fn police_number(&self) -> String {
        if let Some(number) = self.provider.get().filter(|n| !n.is_empty()) {
            debug!("Using emergency number override");
            return number;
        }

        match self.source.police_numbers() {
            Ok(numbers) => {
                if let Some(number) = numbers.into_iter().find(|n| !n.is_empty()) {
                    return number;
                }
                debug!("Platform reported no police numbers, using fallback");
            }
            Err(e) => {
                warn!("Failed to read platform emergency numbers, using fallback: {}", e);
            }
        }
        FALLBACK_EMERGENCY_NUMBER.to_string()
    }
}

/// What happened when an emergency call was requested
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    Placed(String),
    NoTelephony,
    Failed(String),
}

/// Places emergency calls to the resolved police number
pub struct EmergencyCaller {
    telephony: Arc<dyn TelephonyFeature>,
    placer: Arc<dyn CallPlacer>,
    numbers: Arc<EmergencyNumberResolver>,
}

impl EmergencyCaller {
    pub fn new(
        telephony: Arc<dyn TelephonyFeature>,
        placer: Arc<dyn CallPlacer>,
        numbers: Arc<EmergencyNumberResolver>,
    ) -> Self {
        Self { telephony, placer, numbers }
    }

    pub fn numbers(&self) -> &Arc<EmergencyNumberResolver> {
        &self.numbers
    }

    /// Place a call to the police number; skipped when telephony is absent
    pub fn place_emergency_call(&self) -> CallOutcome {
        if !self.telephony.has_telephony() {
            info!("Telephony is not supported, skipping emergency call");
            return CallOutcome::NoTelephony;
        }

        let number = self.numbers.police_number();
        let request = CallRequest::emergency_shortcut(number.clone());
        match self.placer.place_call(&request) {
            Ok(()) => {
                info!("Emergency call placed to {}", number);
                CallOutcome::Placed(number)
            }
            Err(e) => {
                error!("Failed to place emergency call: {}", e);
                CallOutcome::Failed(e)
            }
        }
    }
}
