//! EAP-AKA method configuration
//!
//! Loaded from YAML. The settings may sit at the document root or under an
//! `eap_aka:` section:
//!
//! ```yaml
//! eap_aka:
//!   network_id: WLAN
//!   request_identity: true
//!   protected_success: false
//!   method: aka_prime
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::types::EapMethod;

/// Settings shared by every session
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EapAkaConfig {
    /// Access network name bound into CK'/IK' (AT_KDF_INPUT), required for EAP-AKA'
    pub network_id: Option<String>,
    /// Always start with an AKA-Identity round, even for tagged identities
    pub request_identity: bool,
    /// Send AT_RESULT_IND and the success notification round
    pub protected_success: bool,
    pub method: EapMethod,
}

#[derive(Deserialize)]
struct Document {
    eap_aka: EapAkaConfig,
}

impl EapAkaConfig {
    /// Parse from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let value: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        let config = if value.get("eap_aka").is_some() {
            serde_yaml::from_value::<Document>(value)?.eap_aka
        } else if value.is_null() {
            Self::default()
        } else {
            serde_yaml::from_value(value)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        log::info!("Loading EAP-AKA configuration from {}", path.display());
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.method == EapMethod::AkaPrime
            && self.network_id.as_deref().map_or(true, str::is_empty)
        {
            return Err(ConfigError::Invalid(
                "network_id is required for aka_prime".into(),
            ));
        }
        if let Some(name) = &self.network_id {
            if name.len() > u16::MAX as usize {
                return Err(ConfigError::Invalid("network_id too long".into()));
            }
        }
        Ok(())
    }
}
