use std::io::{Error, Write};
use std::path::Path;

/// Writes a batch file with a header and the given `(recipient, amount, reference)` rows.
pub fn write_batch_csv(path: &Path, rows: &[(&str, &str, &str)]) -> Result<(), Error> {
    let file = std::fs::File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);

    wtr.write_record(["recipient", "amount", "reference"])?;
    for (recipient, amount, reference) in rows {
        wtr.write_record([recipient, amount, reference])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Writes `rows` generated top-up requests with unique references.
pub fn write_generated_batch(mut sink: impl Write, rows: usize) -> Result<(), Error> {
    writeln!(sink, "recipient,amount,reference")?;
    for i in 1..=rows {
        writeln!(sink, "08{:08},{}.{:02},GEN_{i}", i, i, i % 100)?;
    }
    Ok(())
}

/// Table-driven CRC16 (poly 0x1021, init 0xFFFF), independent of the crate's bitwise one.
pub fn reference_crc16(data: &[u8]) -> u16 {
    let mut table = [0u16; 256];
    for (i, slot) in table.iter_mut().enumerate() {
        let mut crc = (i as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
        *slot = crc;
    }

    data.iter().fold(0xFFFF, |crc: u16, &b| {
        (crc << 8) ^ table[usize::from((crc >> 8) as u8 ^ b)]
    })
}

/// Splits a payload into `(tag, value)` pairs, failing on any leftover bytes.
pub fn split_tlv(payload: &str) -> Option<Vec<(String, String)>> {
    let mut out = Vec::new();
    let mut rest = payload;
    while !rest.is_empty() {
        let tag = rest.get(..2)?;
        let len: usize = rest.get(2..4)?.parse().ok()?;
        let value = rest.get(4..4 + len)?;
        out.push((tag.to_string(), value.to_string()));
        rest = &rest[4 + len..];
    }
    Some(out)
}

/// True when the last 4 characters are the checksum of everything before them.
pub fn checksum_is_valid(payload: &str) -> bool {
    if payload.len() < 8 || !payload.is_ascii() {
        return false;
    }
    let (body, crc) = payload.split_at(payload.len() - 4);
    body.ends_with("6304") && format!("{:04X}", reference_crc16(body.as_bytes())) == crc
}
