//! Application layer orchestrating encoding and the payment request lifecycle.
//!
//! `PromptPayService` is the entry point: it validates and encodes requests
//! through the domain encoder and persists their state through the store port.

pub mod service;
