// Copyright (c) 2022-2023 The TurtleCoin Developers

//! Key image APDUs, used for spend detection

use crate::{
    ApduError, ApduRequest, ApduResponse, Instruction, KeyImage, PublicKey, Reader, Writer,
};

/// Generate key image APDU
///
/// The device re-derives the output's one-time secret internally; the host
/// supplies only public material.
///
/// ## Encoding:
/// ```text
/// +--------------------------------+----------+--------------------+
/// |          TX_PUBLIC_KEY         | OUT_IDX  |     OUTPUT_KEY     |
/// |           (32 bytes)           |  u32be   |     (32 bytes)     |
/// +--------------------------------+----------+--------------------+
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct GenerateKeyImageReq {
    /// Transaction public key of the funding transaction
    pub tx_public_key: PublicKey,
    /// Index of the output in the funding transaction
    pub output_index: u32,
    /// One-time output key
    pub output_key: PublicKey,
}

impl GenerateKeyImageReq {
    pub fn new(tx_public_key: PublicKey, output_index: u32, output_key: PublicKey) -> Self {
        Self {
            tx_public_key,
            output_index,
            output_key,
        }
    }
}

impl ApduRequest for GenerateKeyImageReq {
    const INS: Instruction = Instruction::GenerateKeyImage;

    fn encode(&self, w: &mut Writer) -> Result<(), ApduError> {
        w.write_key(&self.tx_public_key)
            .write_u32(self.output_index)
            .write_key(&self.output_key);
        Ok(())
    }
}

/// Key image response APDU, 32 raw bytes
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct KeyImageResp {
    pub key_image: KeyImage,
}

impl ApduResponse for KeyImageResp {
    fn decode(r: &mut Reader<'_>) -> Result<Self, ApduError> {
        Ok(Self {
            key_image: r.read_key()?,
        })
    }
}
