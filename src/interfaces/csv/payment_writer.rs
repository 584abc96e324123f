use crate::domain::payment::{PaymentRequest, PaymentStatus};
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct IssuedRow<'a> {
    reference: &'a str,
    recipient: &'a str,
    amount: Decimal,
    status: PaymentStatus,
    payload: &'a str,
}

/// Writes issued payment requests as CSV with the columns
/// `reference,recipient,amount,status,payload`.
pub struct PaymentWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> PaymentWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_requests<I>(&mut self, requests: I) -> Result<()>
    where
        I: IntoIterator<Item = PaymentRequest>,
    {
        for request in requests {
            let mut amount = request.amount;
            amount.rescale(2);
            self.writer.serialize(IssuedRow {
                reference: &request.reference,
                recipient: &request.recipient,
                amount,
                status: request.status,
                payload: &request.payload,
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
