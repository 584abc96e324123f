pub mod amount;
pub mod crc;
pub mod payload;
pub mod payment;
pub mod ports;
pub mod recipient;
pub mod reference;
pub mod tlv;
