// Copyright (c) 2022-2023 The TurtleCoin Developers

//! Ring signature APDUs
//!
//! Ring signatures hide the real input among decoys drawn from the chain's
//! existing outputs; the device holds the one-time secret and completes the
//! real member's signature internally.

use crate::{
    ApduError, ApduRequest, ApduResponse, Hash, Instruction, KeyImage, PublicKey, Reader,
    SecretKey, Signature, Writer,
};

/// Generate ring signatures APDU
///
/// ## Encoding:
/// ```text
/// +----------------+----------+----------------+----------------+
/// |  TX_PUBLIC_KEY | OUT_IDX  |   OUTPUT_KEY   |  PREFIX_HASH   |
/// |   (32 bytes)   |  u32be   |   (32 bytes)   |   (32 bytes)   |
/// +----------------+----------+----------------+----------------+
/// |                      INPUT_KEYS (32 x N)                    |
/// +----------------+---------------------------------------------+
/// | REAL_IDX u32be |
/// +----------------+
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct GenerateRingSignaturesReq {
    /// Transaction public key of the funding transaction
    pub tx_public_key: PublicKey,
    /// Index of the real output in the funding transaction
    pub output_index: u32,
    /// One-time output key of the real output
    pub output_key: PublicKey,
    /// Transaction prefix hash being signed
    pub prefix_hash: Hash,
    /// Ring member keys, real key included
    pub input_keys: Vec<PublicKey>,
    /// Position of the real key within `input_keys`
    pub real_output_index: u32,
}

impl GenerateRingSignaturesReq {
    pub fn new(
        tx_public_key: PublicKey,
        output_index: u32,
        output_key: PublicKey,
        prefix_hash: Hash,
        input_keys: Vec<PublicKey>,
        real_output_index: u32,
    ) -> Self {
        Self {
            tx_public_key,
            output_index,
            output_key,
            prefix_hash,
            input_keys,
            real_output_index,
        }
    }
}

impl ApduRequest for GenerateRingSignaturesReq {
    const INS: Instruction = Instruction::GenerateRingSignatures;

    fn encode(&self, w: &mut Writer) -> Result<(), ApduError> {
        w.write_key(&self.tx_public_key)
            .write_u32(self.output_index)
            .write_key(&self.output_key)
            .write_key(&self.prefix_hash);

        for key in &self.input_keys {
            w.write_key(key);
        }

        w.write_u32(self.real_output_index);
        Ok(())
    }
}

/// Ring signatures response APDU, a contiguous run of 64-byte signatures
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RingSignaturesResp {
    pub signatures: Vec<Signature>,
}

impl ApduResponse for RingSignaturesResp {
    fn decode(r: &mut Reader<'_>) -> Result<Self, ApduError> {
        if r.remaining() % Signature::SIZE != 0 {
            return Err(ApduError::InvalidEncoding);
        }

        let mut signatures = Vec::with_capacity(r.remaining() / Signature::SIZE);
        while !r.is_empty() {
            signatures.push(r.read_signature()?);
        }

        Ok(Self { signatures })
    }
}

/// Complete ring signature APDU
///
/// Finishes a partially prepared real-member signature using the on-device
/// one-time secret.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct CompleteRingSignatureReq {
    pub tx_public_key: PublicKey,
    pub output_index: u32,
    pub output_key: PublicKey,
    /// Random scalar `k` from the prepared signature
    pub k: SecretKey,
    /// Partial signature to complete
    pub signature: Signature,
}

impl CompleteRingSignatureReq {
    pub fn new(
        tx_public_key: PublicKey,
        output_index: u32,
        output_key: PublicKey,
        k: SecretKey,
        signature: Signature,
    ) -> Self {
        Self {
            tx_public_key,
            output_index,
            output_key,
            k,
            signature,
        }
    }
}

impl ApduRequest for CompleteRingSignatureReq {
    const INS: Instruction = Instruction::CompleteRingSignature;

    fn encode(&self, w: &mut Writer) -> Result<(), ApduError> {
        w.write_key(&self.tx_public_key)
            .write_u32(self.output_index)
            .write_key(&self.output_key)
            .write_key(&self.k)
            .write_signature(&self.signature);
        Ok(())
    }
}

/// Check ring signatures APDU
///
/// Verifies a full ring of signatures against its member keys and key image.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CheckRingSignaturesReq {
    pub prefix_hash: Hash,
    pub key_image: KeyImage,
    pub public_keys: Vec<PublicKey>,
    pub signatures: Vec<Signature>,
}

impl CheckRingSignaturesReq {
    pub fn new(
        prefix_hash: Hash,
        key_image: KeyImage,
        public_keys: Vec<PublicKey>,
        signatures: Vec<Signature>,
    ) -> Self {
        Self {
            prefix_hash,
            key_image,
            public_keys,
            signatures,
        }
    }
}

impl ApduRequest for CheckRingSignaturesReq {
    const INS: Instruction = Instruction::CheckRingSignatures;

    fn encode(&self, w: &mut Writer) -> Result<(), ApduError> {
        w.write_key(&self.prefix_hash).write_key(&self.key_image);

        for key in &self.public_keys {
            w.write_key(key);
        }

        for signature in &self.signatures {
            w.write_signature(signature);
        }

        Ok(())
    }
}
