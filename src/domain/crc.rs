//! CRC16 as validated by PromptPay scanners: polynomial `0x1021`, initial
//! register `0xFFFF`, no reflection and no final XOR.

const POLYNOMIAL: u16 = 0x1021;
const INITIAL: u16 = 0xFFFF;

/// Computes the checksum over the raw bytes of `data`.
pub fn crc16(data: &[u8]) -> u16 {
    data.iter().fold(INITIAL, |crc, &byte| {
        let mut crc = crc ^ (u16::from(byte) << 8);
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ POLYNOMIAL
            } else {
                crc << 1
            };
        }
        crc
    })
}

/// Renders the checksum of `data` as 4 uppercase, zero-padded hex digits.
pub fn crc16_hex(data: &str) -> String {
    format!("{:04X}", crc16(data.as_bytes()))
}
