// Copyright (c) 2022-2023 The TurtleCoin Developers

//! Protocol / APDU definitions for CryptoNote hardware wallet communication
//!
//! This crate provides a protocol specification and reference implementation
//! for communication with CryptoNote wallet applications running on Ledger
//! hardware.
//!
//! APDUs use a primitive binary encoding to simplify implementation across
//! languages and platforms: single-byte fields are raw, multi-byte integers
//! are big-endian, keys and hashes are 32 raw bytes, signatures 64 raw bytes.
//! Hex strings are rendered to raw bytes at this boundary.

pub mod app;
pub mod derive;
pub mod error;
pub mod frame;
pub mod key_image;
pub mod keys;
pub mod ring;
pub mod sign;
pub mod state;
pub mod tx;
pub mod types;

pub use error::{ApduError, DeviceError};
pub use frame::{frame_request, parse_response, Reader, Writer};
pub use state::TxState;
pub use types::{Derivation, Hash, Key, KeyImage, PublicKey, SecretKey, Signature};

/// CryptoNote APDU class
pub const CN_APDU_CLA: u8 = 0xe0;

/// `P1` value requesting on-device user confirmation
pub const P1_CONFIRM: u8 = 0x01;

/// `P1` value skipping user confirmation (honoured by DEBUG builds only)
pub const P1_NON_CONFIRM: u8 = 0x00;

/// `P2` is unused by this protocol
pub const P2_UNUSED: u8 = 0x00;

/// CryptoNote APDU instruction codes
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Instruction {
    // General instructions
    /// Fetch application version
    Version = 0x01,
    /// Check whether the app is a DEBUG build
    Debug = 0x02,
    /// Fetch device identification bytes
    Ident = 0x05,

    // Key instructions
    /// Fetch public spend and view keys
    PublicKeys = 0x10,
    /// Export the private view key
    ViewSecretKey = 0x11,
    /// Export the private spend key (sensitive)
    SpendESecretKey = 0x12,
    /// Check a value is a valid public key
    CheckKey = 0x16,
    /// Check a value is a valid scalar
    CheckScalar = 0x17,
    /// Compute the public key for a private key
    PrivateToPublic = 0x18,
    /// Generate a random key pair on-device
    RandomKeyPair = 0x19,

    /// Fetch the wallet public address
    Address = 0x30,

    /// Generate a key image for an output
    GenerateKeyImage = 0x40,

    // Signature instructions
    /// Generate ring signatures for an input
    GenerateRingSignatures = 0x50,
    /// Complete a partially prepared ring signature
    CompleteRingSignature = 0x51,
    /// Check a set of ring signatures
    CheckRingSignatures = 0x52,
    /// Sign a message digest
    GenerateSignature = 0x55,
    /// Check a signature over a message digest
    CheckSignature = 0x56,

    // Derivation instructions
    /// Generate a key derivation from a transaction public key
    GenerateKeyDerivation = 0x60,
    /// Derive a public ephemeral from a derivation
    DerivePublicKey = 0x61,
    /// Derive a secret ephemeral from a derivation
    DeriveSecretKey = 0x62,

    // Transaction construction instructions
    /// Fetch transaction construction state
    TxState = 0x70,
    /// Begin transaction construction
    TxStart = 0x71,
    /// Begin the input loading phase
    TxStartInputLoad = 0x72,
    /// Load a single transaction input
    TxLoadInput = 0x73,
    /// Begin the output loading phase
    TxStartOutputLoad = 0x74,
    /// Load a single transaction output
    TxLoadOutput = 0x75,
    /// Finalise the transaction prefix
    TxFinalizeTxPrefix = 0x76,
    /// Sign the constructed transaction
    TxSign = 0x77,
    /// Fetch a chunk of the constructed transaction
    TxDump = 0x78,
    /// Reset the transaction construction state machine
    TxReset = 0x79,

    /// Reset cached wallet keys
    ResetKeys = 0xff,
}

/// Request APDU, encoded into the data section of a framed command
///
/// Implementations provide the instruction code and, for non-empty requests,
/// a body encoder. See [frame_request] for the outer framing.
pub trait ApduRequest {
    /// Instruction code for this request
    const INS: Instruction;

    /// Encode the request data payload
    fn encode(&self, w: &mut Writer) -> Result<(), ApduError> {
        let _ = w;
        Ok(())
    }
}

/// Response APDU, decoded from the body of a parsed response
pub trait ApduResponse: Sized {
    /// Decode a response object from the provided reader
    fn decode(r: &mut Reader<'_>) -> Result<Self, ApduError>;
}

/// Empty response body for commands that return only a status word
impl ApduResponse for () {
    fn decode(_r: &mut Reader<'_>) -> Result<Self, ApduError> {
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    /// Helper for APDU framing tests, returns the framed data section
    pub fn frame_and_check<R: ApduRequest>(req: &R, confirm: bool) -> Vec<u8> {
        let framed = frame_request(req, confirm).expect("framing failed");

        // Check fixed header fields
        assert_eq!(framed[0], CN_APDU_CLA);
        assert_eq!(framed[1], R::INS as u8);
        assert_eq!(framed[2], if confirm { P1_CONFIRM } else { P1_NON_CONFIRM });
        assert_eq!(framed[3], P2_UNUSED);

        // Check encoded length matches the data section
        let len = u16::from_be_bytes([framed[4], framed[5]]) as usize;
        assert_eq!(len, framed.len() - 6, "length field mismatch");

        framed[6..].to_vec()
    }
}
