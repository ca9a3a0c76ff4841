// Copyright (c) 2022-2023 The TurtleCoin Developers

use ledger_cn_apdu::{ApduError, DeviceError, TxState};

use crate::transport::TransportError;

/// CryptoNote Ledger API error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed hex, out-of-range integer, wrong ring size or oversized
    /// payload; raised locally before any transport I/O
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation is deliberately not implemented by this core
    #[error("operation not supported: {0}")]
    NotSupported(&'static str),

    /// Scanned output does not belong to this wallet
    #[error("output does not belong to this wallet")]
    NotOurOutput,

    /// Wallet keys have not been fetched yet
    #[error("wallet keys have not been fetched")]
    NotReady,

    /// Input money, fee or fusion preconditions unmet
    #[error("{0}")]
    Insufficient(String),

    /// Conflicting payment ids across destinations or supplied value
    #[error("{0}")]
    PaymentIdConflict(String),

    /// Device transaction state did not match the expected phase
    #[error("invalid transaction state (actual: {actual}, expected: {expected})")]
    InvalidState { actual: TxState, expected: TxState },

    /// Device signalled an error status word or body error code
    #[error("device error: {0}")]
    Device(DeviceError),

    /// Response body could not be decoded or failed consistency checks
    #[error("unexpected device response: {0}")]
    UnexpectedResponse(String),

    /// Retrieved transaction disagrees with the device signing result
    #[error("retrieved transaction mismatch: {0}")]
    TransactionMismatch(String),

    /// Transport failure
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Crypto provider, address codec or transaction decoder failure
    #[error("provider error: {0}")]
    Provider(#[from] anyhow::Error),
}

impl From<ApduError> for Error {
    fn from(e: ApduError) -> Self {
        match e {
            ApduError::InvalidHex { .. }
            | ApduError::InvalidLength { .. }
            | ApduError::PayloadTooLarge(_) => Error::InvalidArgument(e.to_string()),
            ApduError::Truncated | ApduError::InvalidEncoding => {
                Error::UnexpectedResponse(e.to_string())
            }
            ApduError::Device(d) => Error::Device(d),
        }
    }
}
