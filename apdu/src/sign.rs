// Copyright (c) 2022-2023 The TurtleCoin Developers

//! Message signature APDUs

use crate::{
    ApduError, ApduRequest, ApduResponse, Hash, Instruction, PublicKey, Reader, Signature, Writer,
};

/// Generate signature APDU, signs a 32-byte digest with the device spend key
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct GenerateSignatureReq {
    pub digest: Hash,
}

impl GenerateSignatureReq {
    pub fn new(digest: Hash) -> Self {
        Self { digest }
    }
}

impl ApduRequest for GenerateSignatureReq {
    const INS: Instruction = Instruction::GenerateSignature;

    fn encode(&self, w: &mut Writer) -> Result<(), ApduError> {
        w.write_key(&self.digest);
        Ok(())
    }
}

/// Signature response APDU, 64 raw bytes
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct SignatureResp {
    pub signature: Signature,
}

impl ApduResponse for SignatureResp {
    fn decode(r: &mut Reader<'_>) -> Result<Self, ApduError> {
        Ok(Self {
            signature: r.read_signature()?,
        })
    }
}

/// Check signature APDU
///
/// ## Encoding:
/// ```text
/// +----------------+----------------+--------------------------------+
/// |     DIGEST     |   PUBLIC_KEY   |           SIGNATURE            |
/// |   (32 bytes)   |   (32 bytes)   |           (64 bytes)           |
/// +----------------+----------------+--------------------------------+
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct CheckSignatureReq {
    pub digest: Hash,
    pub public_key: PublicKey,
    pub signature: Signature,
}

impl CheckSignatureReq {
    pub fn new(digest: Hash, public_key: PublicKey, signature: Signature) -> Self {
        Self {
            digest,
            public_key,
            signature,
        }
    }
}

impl ApduRequest for CheckSignatureReq {
    const INS: Instruction = Instruction::CheckSignature;

    fn encode(&self, w: &mut Writer) -> Result<(), ApduError> {
        w.write_key(&self.digest)
            .write_key(&self.public_key)
            .write_signature(&self.signature);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test::frame_and_check;
    use crate::Key;

    #[test]
    fn check_signature_apdu() {
        let digest = Key::from_bytes([0x0a; 32]);
        let public = Key::from_bytes([0x0b; 32]);
        let signature = Signature::from_bytes([0x0c; 64]);

        let data = frame_and_check(&CheckSignatureReq::new(digest, public, signature), false);
        assert_eq!(data.len(), 128);
        assert_eq!(&data[64..], signature.as_bytes());
    }

    #[test]
    fn signature_resp_decode() {
        let signature = Signature::from_bytes([0x42; 64]);

        let mut r = Reader::new(signature.as_bytes());
        assert_eq!(
            SignatureResp::decode(&mut r).unwrap().signature,
            signature
        );
    }
}
