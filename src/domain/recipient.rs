use crate::error::ValidationError;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the normalized identifier is laid out inside the merchant account template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierLayout {
    /// Proxy type chosen from the identifier length, mobile numbers in `0066` form.
    #[default]
    Standard,
    /// Any identifier zero-padded to 13 digits under the mobile sub-tag.
    Legacy,
}

/// PromptPay proxy types and their sub-tags in the merchant account template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProxyType {
    Mobile,
    NationalId,
    EWallet,
}

impl ProxyType {
    pub fn sub_tag(self) -> u8 {
        match self {
            ProxyType::Mobile => 1,
            ProxyType::NationalId => 2,
            ProxyType::EWallet => 3,
        }
    }

    pub fn from_sub_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(ProxyType::Mobile),
            2 => Some(ProxyType::NationalId),
            3 => Some(ProxyType::EWallet),
            _ => None,
        }
    }
}

impl fmt::Display for ProxyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyType::Mobile => write!(f, "mobile"),
            ProxyType::NationalId => write!(f, "national_id"),
            ProxyType::EWallet => write!(f, "e_wallet"),
        }
    }
}

const PADDED_LEN: usize = 13;
const NATIONAL_ID_LEN: usize = 13;
const E_WALLET_LEN: usize = 15;
const MOBILE_COUNTRY_PREFIX: &str = "66";

/// A recipient identifier reduced to digits and resolved to its wire form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientId {
    digits: String,
    proxy_type: ProxyType,
    encoded: String,
}

impl RecipientId {
    /// Strips every non-digit from `raw` and classifies the result under `layout`.
    pub fn parse(raw: &str, layout: IdentifierLayout) -> Result<Self, ValidationError> {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        if digits.is_empty() {
            return Err(ValidationError::EmptyRecipient);
        }

        let (proxy_type, encoded) = match layout {
            IdentifierLayout::Standard => match digits.len() {
                E_WALLET_LEN => (ProxyType::EWallet, digits.clone()),
                NATIONAL_ID_LEN => (ProxyType::NationalId, digits.clone()),
                n if n < NATIONAL_ID_LEN => {
                    let international = match digits.strip_prefix('0') {
                        Some(rest) => format!("{MOBILE_COUNTRY_PREFIX}{rest}"),
                        None => digits.clone(),
                    };
                    (ProxyType::Mobile, zero_pad(&international))
                }
                n => return Err(ValidationError::InvalidRecipientLength(n)),
            },
            IdentifierLayout::Legacy => {
                if digits.len() > PADDED_LEN {
                    return Err(ValidationError::InvalidRecipientLength(digits.len()));
                }
                (ProxyType::Mobile, zero_pad(&digits))
            }
        };

        Ok(Self {
            digits,
            proxy_type,
            encoded,
        })
    }

    /// The identifier as supplied, minus any separators.
    pub fn digits(&self) -> &str {
        &self.digits
    }

    pub fn proxy_type(&self) -> ProxyType {
        self.proxy_type
    }

    /// The value placed under the proxy sub-tag.
    pub fn encoded(&self) -> &str {
        &self.encoded
    }
}

fn zero_pad(digits: &str) -> String {
    format!("{:0>width$}", digits, width = PADDED_LEN)
}
