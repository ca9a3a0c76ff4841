// Copyright (c) 2022-2023 The TurtleCoin Developers

//! CryptoNote hardware wallet client library
//!
//! Drives a CryptoNote application on a Ledger device over an opaque byte
//! transport: APDU command protocol, wallet key session, output scanning and
//! the multi-phase transaction construction state machine. The private spend
//! key never leaves the device.
//!
//! The embedding application supplies the transport ([transport::Exchange]),
//! the host cryptography ([provider::CryptoProvider]), the address codec
//! ([provider::AddressCodec]) and the transaction binary decoder
//! ([provider::TransactionDecoder]).

/// Re-export `ledger-cn-apdu` for consumers
pub use ledger_cn_apdu::{self as apdu};

pub mod transport;
pub use transport::{Exchange, TransportError};

mod device;
pub use device::{DeviceEvent, DeviceHandle};

mod error;
pub use error::Error;

mod config;
pub use config::Config;

pub mod offsets;
pub mod provider;
pub mod types;

mod wallet;
pub use wallet::LedgerWallet;

pub mod tx;
pub use tx::TransactionParams;
