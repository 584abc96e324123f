use crate::domain::payment::PaymentStatus;
use rust_decimal::Decimal;
use thiserror::Error;

/// Input rejected before any payload bytes are produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("recipient identifier contains no digits")]
    EmptyRecipient,
    #[error("recipient identifier has {0} digits, which matches no PromptPay proxy type")]
    InvalidRecipientLength(usize),
    #[error("amount {0:?} is not a decimal number")]
    UnparseableAmount(String),
    #[error("amount must be positive")]
    NonPositiveAmount,
    #[error("amount {0} has more than 2 fractional digits")]
    TooManyDecimals(String),
    #[error("amount {0} does not fit the 13 character amount field")]
    AmountTooLarge(String),
    #[error("reference must not be empty")]
    EmptyReference,
    #[error("reference is {len} characters long, the limit is {max}")]
    ReferenceTooLong { len: usize, max: usize },
    #[error("reference contains non-printable or non-ASCII characters")]
    NonPrintableReference,
    #[error("value for tag {tag:02} is {len} bytes long, the limit is 99")]
    FieldTooLong { tag: u8, len: usize },
    #[error("payload is {len} bytes long, the limit is {max}")]
    PayloadTooLong { len: usize, max: usize },
    #[error("invalid encoder configuration: {0}")]
    InvalidConfig(String),
}

/// A payload string that cannot be parsed or fails its checksum.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("payload contains non-ASCII bytes")]
    NonAscii,
    #[error("truncated field at offset {0}")]
    Truncated(usize),
    #[error("malformed tag or length at offset {0}")]
    MalformedHeader(usize),
    #[error("payload does not end with a CRC field")]
    MissingChecksum,
    #[error("checksum mismatch: payload carries {found}, computed {computed}")]
    ChecksumMismatch { found: String, computed: String },
    #[error("tag {0:02} appears more than once")]
    DuplicateTag(u8),
    #[error("required tag {0:02} is missing")]
    MissingTag(u8),
    #[error("merchant account information has no PromptPay identifier")]
    MissingRecipient,
    #[error("tag {tag:02} carries an invalid value {value:?}")]
    InvalidField { tag: u8, value: String },
}

#[derive(Error, Debug)]
pub enum PromptPayError {
    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationError),
    #[error("Decode error: {0}")]
    DecodeError(#[from] DecodeError),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Notification error: {0}")]
    NotificationError(#[from] serde_json::Error),
    #[error("a payment request with reference {0} already exists")]
    DuplicateReference(String),
    #[error("no payment request with reference {0}")]
    UnknownReference(String),
    #[error("payment request {0} has expired")]
    PaymentExpired(String),
    #[error("payment request {reference} expects {expected}, notification reported {received}")]
    AmountMismatch {
        reference: String,
        expected: Decimal,
        received: Decimal,
    },
    #[error("payment request {reference} cannot move from {from} to {to}")]
    InvalidTransition {
        reference: String,
        from: PaymentStatus,
        to: PaymentStatus,
    },
}

pub type Result<T> = std::result::Result<T, PromptPayError>;
