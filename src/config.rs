use crate::domain::recipient::IdentifierLayout;
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// ISO 4217 numeric code for Thai Baht.
pub const THB_CURRENCY_CODE: &str = "764";
pub const THAILAND_COUNTRY_CODE: &str = "TH";
/// Upper bound on an assembled payload, checked before the checksum is computed.
pub const DEFAULT_MAX_PAYLOAD_LEN: usize = 512;

/// Settings that stay fixed for every payload an encoder produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderConfig {
    pub currency_code: String,
    pub country_code: String,
    pub layout: IdentifierLayout,
    pub max_payload_len: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            currency_code: THB_CURRENCY_CODE.to_string(),
            country_code: THAILAND_COUNTRY_CODE.to_string(),
            layout: IdentifierLayout::default(),
            max_payload_len: DEFAULT_MAX_PAYLOAD_LEN,
        }
    }
}

impl EncoderConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.currency_code.len() != 3 || !self.currency_code.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(ValidationError::InvalidConfig(format!(
                "currency code {:?} must be 3 digits",
                self.currency_code
            )));
        }
        if self.country_code.len() != 2
            || !self.country_code.bytes().all(|b| b.is_ascii_uppercase())
        {
            return Err(ValidationError::InvalidConfig(format!(
                "country code {:?} must be 2 uppercase letters",
                self.country_code
            )));
        }
        if self.max_payload_len == 0 {
            return Err(ValidationError::InvalidConfig(
                "payload length cap must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
