// Copyright (c) 2022-2023 The TurtleCoin Developers

//! Host-side data model for scanning and transaction construction

use ledger_cn_apdu::{Derivation, Hash, KeyImage, PublicKey, SecretKey};

/// Public key with an optional private counterpart
///
/// When the private half is present it must satisfy
/// `public == secret_key_to_public_key(private)`; the wallet checks this on
/// session population.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct KeyPair {
    pub public: PublicKey,
    pub private: Option<SecretKey>,
}

/// Decoded wallet address
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Address {
    /// Base58 varint prefix
    pub prefix: u64,
    /// Public spend key
    pub spend: PublicKey,
    /// Public view key
    pub view: PublicKey,
    /// Payment id for integrated addresses
    pub payment_id: Option<Hash>,
}

/// Transaction key context recovered for an owned output
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct TransactionKeys {
    /// Transaction public key of the funding transaction
    pub public_key: PublicKey,
    /// Key derivation shared with the funding transaction
    pub derivation: Derivation,
    /// Index of the output within the funding transaction
    pub output_index: u32,
}

/// Recovery data attached to an output once ownership is established
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct OutputRecovery {
    /// Derived one-time public key, equal to the output key
    pub public_ephemeral: PublicKey,
    /// Derivation context for on-device secret operations
    pub transaction_keys: TransactionKeys,
    /// One-time secret; never populated by this core, the device holds it
    pub private_ephemeral: Option<SecretKey>,
}

/// Output observed in a scanned transaction
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TransactionOutput {
    /// Index of the output within its transaction
    pub index: u32,
    /// One-time output key
    pub key: PublicKey,
    /// Global chain index of the output
    pub global_index: u64,
    /// Amount carried by the output
    pub amount: u64,
    /// Recovery data, populated after an ownership match
    pub input: Option<OutputRecovery>,
    /// Key image, populated after an ownership match
    pub key_image: Option<KeyImage>,
}

/// Destination output requested for a new transaction
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct GeneratedOutput {
    pub amount: u64,
    pub destination: Address,
}

/// Decoy output drawn from the chain for ring assembly
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct RandomOutput {
    pub key: PublicKey,
    pub global_index: u64,
}

/// Single member of an assembled mix ring
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct RingMember {
    /// One-time output key
    pub key: PublicKey,
    /// Absolute global chain index
    pub index: u64,
}

/// Fully assembled transaction input, ready for device loading
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PreparedInput {
    pub amount: u64,
    pub key_image: KeyImage,
    /// Derivation context of the real output being spent
    pub transaction_keys: TransactionKeys,
    /// Ring members sorted ascending by global index
    pub outputs: Vec<RingMember>,
    /// Position of the real output within `outputs`
    pub real_output_index: usize,
}

/// Stealth output ready for device loading
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct PreparedOutput {
    pub amount: u64,
    /// One-time destination key `P = H_s(rA, i)G + B`
    pub key: PublicKey,
}

/// Transaction metadata recovered by the external decoder
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct DecodedTransaction {
    /// Transaction hash
    pub hash: Hash,
    /// Serialised size in bytes
    pub size: usize,
}

/// Result of a completed device transaction construction
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CreatedTransaction {
    /// Raw transaction blob retrieved from the device
    pub raw: Vec<u8>,
    /// Transaction hash, verified against the device signing result
    pub hash: Hash,
    /// Transaction size, verified against the device signing result
    pub size: usize,
}
