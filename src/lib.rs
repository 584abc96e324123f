pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
pub mod logging;

pub use application::service::PromptPayService;
pub use config::EncoderConfig;
pub use domain::payload::{DecodedPayload, PromptPayEncoder, decode, encode, verify_checksum};
pub use error::{DecodeError, PromptPayError, ValidationError};
