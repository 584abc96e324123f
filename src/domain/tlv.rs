use crate::error::{DecodeError, ValidationError};

/// Largest value a 2-digit length header can describe.
pub const MAX_VALUE_LEN: usize = 99;

/// A single Tag-Length-Value field borrowed from a payload string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlvField<'a> {
    pub tag: u8,
    pub value: &'a str,
}

/// Serializes one field as `<tag:02><len:02><value>`.
pub fn encode_field(tag: u8, value: &str) -> Result<String, ValidationError> {
    let len = value.len();
    if len > MAX_VALUE_LEN {
        return Err(ValidationError::FieldTooLong { tag, len });
    }
    Ok(format!("{tag:02}{len:02}{value}"))
}

/// Appends one field to `out`.
pub fn push_field(out: &mut String, tag: u8, value: &str) -> Result<(), ValidationError> {
    out.push_str(&encode_field(tag, value)?);
    Ok(())
}

/// Parses `input` as a flat sequence of TLV fields starting at position 0.
///
/// The whole string must be consumed. Nested templates are parsed by calling
/// this again on the field value.
pub fn parse(input: &str) -> Result<Vec<TlvField<'_>>, DecodeError> {
    if !input.is_ascii() {
        return Err(DecodeError::NonAscii);
    }

    let mut fields = Vec::new();
    let mut offset = 0;
    while offset < input.len() {
        let header = input
            .get(offset..offset + 4)
            .ok_or(DecodeError::Truncated(offset))?;
        let tag = parse_two_digits(&header[..2]).ok_or(DecodeError::MalformedHeader(offset))?;
        let len = parse_two_digits(&header[2..]).ok_or(DecodeError::MalformedHeader(offset))?;

        let start = offset + 4;
        let end = start + usize::from(len);
        let value = input.get(start..end).ok_or(DecodeError::Truncated(offset))?;
        fields.push(TlvField { tag, value });
        offset = end;
    }
    Ok(fields)
}

fn parse_two_digits(digits: &str) -> Option<u8> {
    if digits.len() == 2 && digits.bytes().all(|b| b.is_ascii_digit()) {
        digits.parse().ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_field_pads_tag_and_length() {
        assert_eq!(encode_field(0, "01").unwrap(), "000201");
        assert_eq!(encode_field(58, "TH").unwrap(), "5802TH");
        assert_eq!(encode_field(62, "").unwrap(), "6200");
    }

    #[test]
    fn test_encode_field_rejects_three_digit_length() {
        let value = "x".repeat(100);
        assert_eq!(
            encode_field(62, &value),
            Err(ValidationError::FieldTooLong { tag: 62, len: 100 })
        );
        assert!(encode_field(62, &"x".repeat(99)).is_ok());
    }

    #[test]
    fn test_parse_consumes_sequence() {
        let fields = parse("0002015303764").unwrap();
        assert_eq!(
            fields,
            vec![
                TlvField { tag: 0, value: "01" },
                TlvField { tag: 53, value: "764" },
            ]
        );
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_truncated_value() {
        assert_eq!(parse("000201530576"), Err(DecodeError::Truncated(6)));
    }

    #[test]
    fn test_parse_trailing_garbage() {
        assert_eq!(parse("00020153"), Err(DecodeError::Truncated(6)));
    }

    #[test]
    fn test_parse_malformed_header() {
        assert_eq!(parse("0A0201"), Err(DecodeError::MalformedHeader(0)));
        assert_eq!(parse("00+101"), Err(DecodeError::MalformedHeader(0)));
    }

    #[test]
    fn test_parse_rejects_non_ascii() {
        assert_eq!(parse("0002฿1"), Err(DecodeError::NonAscii));
    }
}
