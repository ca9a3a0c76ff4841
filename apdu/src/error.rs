// Copyright (c) 2022-2023 The TurtleCoin Developers

//! Protocol error types

use num_enum::TryFromPrimitive;
use strum::Display;

/// APDU encode / decode error type
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ApduError {
    /// Supplied string is not hex of the expected width
    #[error("malformed hex value (expected {expected} hexadecimal characters)")]
    InvalidHex {
        /// Expected number of hex characters
        expected: usize,
    },

    /// Field length out of range
    #[error("invalid length (expected {expected}, found {actual})")]
    InvalidLength { expected: usize, actual: usize },

    /// Request data section exceeds the maximum APDU size
    #[error("request payload of {0} bytes exceeds maximum APDU size")]
    PayloadTooLarge(usize),

    /// Response body ended before the expected field
    #[error("truncated response body")]
    Truncated,

    /// Response body could not be decoded
    #[error("malformed response body")]
    InvalidEncoding,

    /// Device signalled an error status
    #[error("device reported {0}")]
    Device(DeviceError),
}

/// Device error codes
///
/// Returned in place of a success status word, either as the status word
/// itself or as a `u16` error code in the first two bytes of the response
/// body (the body code supersedes the status word when present).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Display, TryFromPrimitive)]
#[repr(u16)]
pub enum DeviceError {
    /// Operation not permitted in the current device state
    OpNotPermitted = 0x4000,
    /// Operation requires on-device user approval
    OpUserRequired = 0x4001,
    /// Unrecognised device failure
    UnknownError = 0x4444,
    /// Varint value out of range
    VarintDataRange = 0x6000,
    /// Private spend key operation failed
    PrivateSpend = 0x9400,
    /// Private view key operation failed
    PrivateView = 0x9401,
    /// Key reset failed
    ResetKeys = 0x9402,
    /// Address generation failed
    Address = 0x9450,
    /// Key derivation failed
    KeyDerivation = 0x9500,
    /// Public ephemeral derivation failed
    DerivePubkey = 0x9501,
    /// Derived public key did not match
    PubkeyMismatch = 0x9502,
    /// Secret ephemeral derivation failed
    DeriveSeckey = 0x9503,
    /// Keccak hashing failed
    Keccak = 0x9504,
    /// Ring signature completion failed
    CompleteRingSig = 0x9505,
    /// Key image generation failed
    GenerateKeyImage = 0x9506,
    /// Secret to public key conversion failed
    SecretToPublic = 0x9507,
}

impl DeviceError {
    /// Map a raw device code (status word or body error code) to an error.
    ///
    /// The standard "conditions not satisfied" status words indicate a
    /// missing user approval; anything else unrecognised is surfaced as
    /// [DeviceError::UnknownError].
    pub fn from_code(code: u16) -> Self {
        match Self::try_from(code) {
            Ok(v) => v,
            Err(_) => match code {
                0x6985 | 0x6986 => Self::OpUserRequired,
                _ => Self::UnknownError,
            },
        }
    }
}
