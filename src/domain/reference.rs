use crate::error::ValidationError;
use std::fmt;

/// EMV limit for the Reference Label sub-field of the additional data template.
pub const MAX_REFERENCE_LEN: usize = 25;

/// A caller-assigned transaction reference carried under tag 62, sub-tag 05.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference(String);

impl Reference {
    pub fn new(value: &str) -> Result<Self, ValidationError> {
        if value.is_empty() {
            return Err(ValidationError::EmptyReference);
        }
        if value.len() > MAX_REFERENCE_LEN {
            return Err(ValidationError::ReferenceTooLong {
                len: value.len(),
                max: MAX_REFERENCE_LEN,
            });
        }
        if !value.bytes().all(|b| b.is_ascii_graphic() || b == b' ') {
            return Err(ValidationError::NonPrintableReference);
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
