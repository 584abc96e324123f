use super::amount::Amount;
use super::crc::crc16_hex;
use super::recipient::{ProxyType, RecipientId};
use super::reference::Reference;
use super::tlv::{self, TlvField, push_field};
use crate::config::EncoderConfig;
use crate::error::{DecodeError, ValidationError};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashSet;
use std::str::FromStr;

const TAG_FORMAT_INDICATOR: u8 = 0;
const TAG_INITIATION_METHOD: u8 = 1;
const TAG_MERCHANT_ACCOUNT: u8 = 29;
const TAG_CURRENCY: u8 = 53;
const TAG_AMOUNT: u8 = 54;
const TAG_COUNTRY: u8 = 58;
const TAG_ADDITIONAL_DATA: u8 = 62;
const TAG_CRC: u8 = 63;

const SUB_TAG_APPLICATION_ID: u8 = 0;
const SUB_TAG_REFERENCE_LABEL: u8 = 5;

pub const PAYLOAD_FORMAT_INDICATOR: &str = "01";
/// PromptPay application identifier, always the first merchant account sub-field.
pub const PROMPTPAY_AID: &str = "A000000677010111";
/// Tag and length of the trailing CRC field, included in the checksum input.
const CRC_HEADER: &str = "6304";
const CRC_LEN: usize = 4;

const REQUIRED_TAGS: [u8; 5] = [
    TAG_FORMAT_INDICATOR,
    TAG_INITIATION_METHOD,
    TAG_MERCHANT_ACCOUNT,
    TAG_CURRENCY,
    TAG_COUNTRY,
];

/// Point of Initiation Method (tag 01).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InitiationMethod {
    /// Reusable code, the payer enters the amount.
    Static,
    /// Single-use code with the amount pre-filled.
    Dynamic,
}

impl InitiationMethod {
    pub fn code(self) -> &'static str {
        match self {
            InitiationMethod::Static => "11",
            InitiationMethod::Dynamic => "12",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "11" => Some(InitiationMethod::Static),
            "12" => Some(InitiationMethod::Dynamic),
            _ => None,
        }
    }
}

/// Validated inputs for a single payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentPayload {
    pub recipient: RecipientId,
    pub amount: Option<Amount>,
    pub reference: Option<Reference>,
}

impl PaymentPayload {
    pub fn initiation_method(&self) -> InitiationMethod {
        if self.amount.is_some() {
            InitiationMethod::Dynamic
        } else {
            InitiationMethod::Static
        }
    }
}

/// Builds PromptPay EMV QR payload strings.
///
/// The encoder holds only immutable configuration, so a single instance can be
/// shared freely across threads.
#[derive(Debug, Clone, Default)]
pub struct PromptPayEncoder {
    config: EncoderConfig,
}

impl PromptPayEncoder {
    pub fn new(config: EncoderConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Validates the raw inputs and encodes a dynamic payload.
    pub fn encode(
        &self,
        recipient_id: &str,
        amount: &str,
        reference: &str,
    ) -> Result<String, ValidationError> {
        let payload = self.prepare(recipient_id, Some(amount), Some(reference))?;
        self.encode_payload(&payload)
    }

    /// Validates raw inputs into a [`PaymentPayload`] without encoding it.
    pub fn prepare(
        &self,
        recipient_id: &str,
        amount: Option<&str>,
        reference: Option<&str>,
    ) -> Result<PaymentPayload, ValidationError> {
        Ok(PaymentPayload {
            recipient: RecipientId::parse(recipient_id, self.config.layout)?,
            amount: amount.map(Amount::from_str).transpose()?,
            reference: reference.map(Reference::new).transpose()?,
        })
    }

    /// Serializes `payload` and appends its checksum.
    ///
    /// Tags are emitted in the order 00, 01, 29, 53, 54, 58, 62, 63. Tag 54 is
    /// omitted for static payloads and tag 62 when there is no reference.
    pub fn encode_payload(&self, payload: &PaymentPayload) -> Result<String, ValidationError> {
        let mut merchant_account = String::new();
        push_field(&mut merchant_account, SUB_TAG_APPLICATION_ID, PROMPTPAY_AID)?;
        push_field(
            &mut merchant_account,
            payload.recipient.proxy_type().sub_tag(),
            payload.recipient.encoded(),
        )?;

        let mut out = String::new();
        push_field(&mut out, TAG_FORMAT_INDICATOR, PAYLOAD_FORMAT_INDICATOR)?;
        push_field(
            &mut out,
            TAG_INITIATION_METHOD,
            payload.initiation_method().code(),
        )?;
        push_field(&mut out, TAG_MERCHANT_ACCOUNT, &merchant_account)?;
        push_field(&mut out, TAG_CURRENCY, &self.config.currency_code)?;
        if let Some(amount) = &payload.amount {
            push_field(&mut out, TAG_AMOUNT, &amount.render())?;
        }
        push_field(&mut out, TAG_COUNTRY, &self.config.country_code)?;
        if let Some(reference) = &payload.reference {
            let mut additional = String::new();
            push_field(&mut additional, SUB_TAG_REFERENCE_LABEL, reference.as_str())?;
            push_field(&mut out, TAG_ADDITIONAL_DATA, &additional)?;
        }
        out.push_str(CRC_HEADER);

        let len = out.len() + CRC_LEN;
        if len > self.config.max_payload_len {
            return Err(ValidationError::PayloadTooLong {
                len,
                max: self.config.max_payload_len,
            });
        }

        let checksum = crc16_hex(&out);
        out.push_str(&checksum);
        Ok(out)
    }
}

/// Encodes a dynamic Thai Baht payload with the default configuration.
pub fn encode(recipient_id: &str, amount: &str, reference: &str) -> Result<String, ValidationError> {
    PromptPayEncoder::default().encode(recipient_id, amount, reference)
}

/// Fields recovered from a payload whose structure and checksum are valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedPayload {
    pub format_indicator: String,
    pub initiation_method: InitiationMethod,
    pub proxy_type: ProxyType,
    pub recipient: String,
    pub currency_code: String,
    pub amount: Option<Decimal>,
    pub country_code: String,
    pub reference: Option<String>,
    pub checksum: String,
}

/// Returns true when the trailing CRC field matches the rest of the payload.
pub fn verify_checksum(payload: &str) -> bool {
    if !payload.is_ascii() || payload.len() < CRC_HEADER.len() + CRC_LEN {
        return false;
    }
    let (body, checksum) = payload.split_at(payload.len() - CRC_LEN);
    body.ends_with(CRC_HEADER) && crc16_hex(body) == checksum
}

/// Parses a payload, checks its checksum and extracts the PromptPay fields.
pub fn decode(payload: &str) -> Result<DecodedPayload, DecodeError> {
    let fields = tlv::parse(payload)?;

    let crc_field = fields
        .last()
        .filter(|f| f.tag == TAG_CRC && f.value.len() == CRC_LEN)
        .ok_or(DecodeError::MissingChecksum)?;
    let computed = crc16_hex(&payload[..payload.len() - CRC_LEN]);
    if crc_field.value != computed {
        return Err(DecodeError::ChecksumMismatch {
            found: crc_field.value.to_string(),
            computed,
        });
    }

    let mut seen = HashSet::new();
    for field in &fields {
        if !seen.insert(field.tag) {
            return Err(DecodeError::DuplicateTag(field.tag));
        }
    }
    if let Some(missing) = REQUIRED_TAGS.iter().find(|tag| !seen.contains(*tag)) {
        return Err(DecodeError::MissingTag(*missing));
    }

    let value_of = |tag: u8| fields.iter().find(|f| f.tag == tag).map(|f| f.value);
    let required = |tag: u8| value_of(tag).ok_or(DecodeError::MissingTag(tag));

    let format_indicator = required(TAG_FORMAT_INDICATOR)?;
    if format_indicator != PAYLOAD_FORMAT_INDICATOR {
        return Err(invalid(TAG_FORMAT_INDICATOR, format_indicator));
    }

    let initiation = required(TAG_INITIATION_METHOD)?;
    let initiation_method = InitiationMethod::from_code(initiation)
        .ok_or_else(|| invalid(TAG_INITIATION_METHOD, initiation))?;

    let merchant_template = required(TAG_MERCHANT_ACCOUNT)?;
    let merchant_account = tlv::parse(merchant_template)?;
    match merchant_account.first() {
        Some(aid) if aid.tag == SUB_TAG_APPLICATION_ID && aid.value == PROMPTPAY_AID => {}
        Some(aid) if aid.tag == SUB_TAG_APPLICATION_ID => {
            return Err(invalid(TAG_MERCHANT_ACCOUNT, aid.value));
        }
        _ => return Err(invalid(TAG_MERCHANT_ACCOUNT, merchant_template)),
    }
    let (proxy_type, recipient) = merchant_account
        .iter()
        .find_map(|f| ProxyType::from_sub_tag(f.tag).map(|proxy| (proxy, f.value)))
        .ok_or(DecodeError::MissingRecipient)?;

    let amount = value_of(TAG_AMOUNT)
        .map(|raw| Decimal::from_str_exact(raw).map_err(|_| invalid(TAG_AMOUNT, raw)))
        .transpose()?;

    let reference = match value_of(TAG_ADDITIONAL_DATA) {
        Some(raw) => find_sub_field(&tlv::parse(raw)?, SUB_TAG_REFERENCE_LABEL),
        None => None,
    };

    Ok(DecodedPayload {
        format_indicator: format_indicator.to_string(),
        initiation_method,
        proxy_type,
        recipient: recipient.to_string(),
        currency_code: required(TAG_CURRENCY)?.to_string(),
        amount,
        country_code: required(TAG_COUNTRY)?.to_string(),
        reference,
        checksum: crc_field.value.to_string(),
    })
}

fn find_sub_field(fields: &[TlvField<'_>], tag: u8) -> Option<String> {
    fields
        .iter()
        .find(|f| f.tag == tag)
        .map(|f| f.value.to_string())
}

fn invalid(tag: u8, value: &str) -> DecodeError {
    DecodeError::InvalidField {
        tag,
        value: value.to_string(),
    }
}
