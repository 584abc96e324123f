use crate::error::{PromptPayError, Result};
use serde::Deserialize;
use std::io::Read;

/// One row of a batch issuing file: `recipient,amount,reference`.
///
/// Values are kept as raw strings so the encoder performs all validation.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone)]
pub struct BatchRequest {
    pub recipient: String,
    pub amount: String,
    pub reference: String,
}

/// Reads payment requests from a CSV source.
///
/// Wraps `csv::Reader`, trimming whitespace around every field.
pub struct RequestReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> RequestReader<R> {
    /// Wraps a batch source with a `recipient,amount,reference` header row.
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes rows.
    pub fn requests(self) -> impl Iterator<Item = Result<BatchRequest>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(PromptPayError::from))
    }
}
