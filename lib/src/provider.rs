// Copyright (c) 2022-2023 The TurtleCoin Developers

//! Collaborator traits implemented by the embedding application
//!
//! The core performs no cryptography, address encoding or transaction
//! parsing of its own; it drives these seams and the device.

use ledger_cn_apdu::{Derivation, Hash, PublicKey, SecretKey, Signature};

use crate::types::{Address, DecodedTransaction};

/// Host-side CryptoNote cryptography primitives
pub trait CryptoProvider: Send + Sync {
    /// Generate a key derivation `D = H_s(r·A)·G` from a public key and a
    /// secret key
    fn generate_key_derivation(
        &self,
        public: &PublicKey,
        secret: &SecretKey,
    ) -> anyhow::Result<Derivation>;

    /// Derive a one-time public key `P = H_s(D, i)·G + B`
    fn derive_public_key(
        &self,
        derivation: &Derivation,
        output_index: u32,
        public: &PublicKey,
    ) -> anyhow::Result<PublicKey>;

    /// Compute the public key for a secret key
    fn secret_key_to_public_key(&self, secret: &SecretKey) -> anyhow::Result<PublicKey>;

    /// Keccak-based fast hash over arbitrary bytes
    fn cn_fast_hash(&self, data: &[u8]) -> anyhow::Result<Hash>;

    /// Check a signature over a digest
    fn check_signature(&self, digest: &Hash, public: &PublicKey, signature: &Signature) -> bool;
}

/// Base58 address codec with payment-id embedding
pub trait AddressCodec: Send + Sync {
    /// Parse a Base58 address string
    fn decode(&self, address: &str) -> anyhow::Result<Address>;

    /// Render an address to its Base58 form
    fn encode(&self, address: &Address) -> anyhow::Result<String>;
}

/// Binary decoder for device-returned transaction blobs
pub trait TransactionDecoder: Send + Sync {
    /// Parse a raw transaction, returning its hash and serialised size
    fn decode(&self, bytes: &[u8]) -> anyhow::Result<DecodedTransaction>;
}
