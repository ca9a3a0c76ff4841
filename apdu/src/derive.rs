// Copyright (c) 2022-2023 The TurtleCoin Developers

//! Key derivation APDUs

use crate::{
    ApduError, ApduRequest, ApduResponse, Derivation, Instruction, PublicKey, Reader, Writer,
};

/// Generate key derivation APDU
///
/// Combines a transaction public key with the on-device private view key to
/// produce a shared-secret derivation.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct GenerateKeyDerivationReq {
    /// Transaction public key
    pub tx_public_key: PublicKey,
}

impl GenerateKeyDerivationReq {
    pub fn new(tx_public_key: PublicKey) -> Self {
        Self { tx_public_key }
    }
}

impl ApduRequest for GenerateKeyDerivationReq {
    const INS: Instruction = Instruction::GenerateKeyDerivation;

    fn encode(&self, w: &mut Writer) -> Result<(), ApduError> {
        w.write_key(&self.tx_public_key);
        Ok(())
    }
}

/// Key derivation response APDU, 32 raw bytes
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct DerivationResp {
    pub derivation: Derivation,
}

impl ApduResponse for DerivationResp {
    fn decode(r: &mut Reader<'_>) -> Result<Self, ApduError> {
        Ok(Self {
            derivation: r.read_key()?,
        })
    }
}

/// Derive public ephemeral APDU
///
/// ## Encoding:
/// ```text
/// +--------------------------------+----------+
/// |           DERIVATION           | OUT_IDX  |
/// |           (32 bytes)           |  u32be   |
/// +--------------------------------+----------+
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct DerivePublicKeyReq {
    pub derivation: Derivation,
    pub output_index: u32,
}

impl DerivePublicKeyReq {
    pub fn new(derivation: Derivation, output_index: u32) -> Self {
        Self {
            derivation,
            output_index,
        }
    }
}

impl ApduRequest for DerivePublicKeyReq {
    const INS: Instruction = Instruction::DerivePublicKey;

    fn encode(&self, w: &mut Writer) -> Result<(), ApduError> {
        w.write_key(&self.derivation).write_u32(self.output_index);
        Ok(())
    }
}

/// Derive secret ephemeral APDU, same layout as [DerivePublicKeyReq]
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct DeriveSecretKeyReq {
    pub derivation: Derivation,
    pub output_index: u32,
}

impl DeriveSecretKeyReq {
    pub fn new(derivation: Derivation, output_index: u32) -> Self {
        Self {
            derivation,
            output_index,
        }
    }
}

impl ApduRequest for DeriveSecretKeyReq {
    const INS: Instruction = Instruction::DeriveSecretKey;

    fn encode(&self, w: &mut Writer) -> Result<(), ApduError> {
        w.write_key(&self.derivation).write_u32(self.output_index);
        Ok(())
    }
}
