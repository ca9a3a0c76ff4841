// Copyright (c) 2022-2023 The TurtleCoin Developers

//! Wallet key APDUs, for fetching and checking account keys

use crate::{
    ApduError, ApduRequest, ApduResponse, Instruction, Key, PublicKey, Reader, SecretKey, Writer,
};

/// Fetch wallet public keys APDU (0 length)
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct PublicKeysReq;

impl ApduRequest for PublicKeysReq {
    const INS: Instruction = Instruction::PublicKeys;
}

/// Wallet public keys response APDU
///
/// ## Encoding:
/// ```text
/// +--------------------------------+--------------------------------+
/// |        PUBLIC_SPEND_KEY        |         PUBLIC_VIEW_KEY        |
/// |           (32 bytes)           |           (32 bytes)           |
/// +--------------------------------+--------------------------------+
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct PublicKeysResp {
    /// Public spend key
    pub spend: PublicKey,
    /// Public view key
    pub view: PublicKey,
}

impl ApduResponse for PublicKeysResp {
    fn decode(r: &mut Reader<'_>) -> Result<Self, ApduError> {
        Ok(Self {
            spend: r.read_key()?,
            view: r.read_key()?,
        })
    }
}

/// Export private view key APDU (0 length)
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct ViewSecretKeyReq;

impl ApduRequest for ViewSecretKeyReq {
    const INS: Instruction = Instruction::ViewSecretKey;
}

/// Export private spend key APDU (0 length, sensitive)
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct SpendESecretKeyReq;

impl ApduRequest for SpendESecretKeyReq {
    const INS: Instruction = Instruction::SpendESecretKey;
}

/// Single secret key response APDU, 32 raw bytes
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct SecretKeyResp {
    pub key: SecretKey,
}

impl ApduResponse for SecretKeyResp {
    fn decode(r: &mut Reader<'_>) -> Result<Self, ApduError> {
        Ok(Self { key: r.read_key()? })
    }
}

/// Single public key response APDU, 32 raw bytes
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct PublicKeyResp {
    pub key: PublicKey,
}

impl ApduResponse for PublicKeyResp {
    fn decode(r: &mut Reader<'_>) -> Result<Self, ApduError> {
        Ok(Self { key: r.read_key()? })
    }
}

/// Check public key APDU
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct CheckKeyReq {
    pub key: PublicKey,
}

impl CheckKeyReq {
    pub fn new(key: PublicKey) -> Self {
        Self { key }
    }
}

impl ApduRequest for CheckKeyReq {
    const INS: Instruction = Instruction::CheckKey;

    fn encode(&self, w: &mut Writer) -> Result<(), ApduError> {
        w.write_key(&self.key);
        Ok(())
    }
}

/// Check scalar APDU
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct CheckScalarReq {
    pub scalar: Key,
}

impl CheckScalarReq {
    pub fn new(scalar: Key) -> Self {
        Self { scalar }
    }
}

impl ApduRequest for CheckScalarReq {
    const INS: Instruction = Instruction::CheckScalar;

    fn encode(&self, w: &mut Writer) -> Result<(), ApduError> {
        w.write_key(&self.scalar);
        Ok(())
    }
}

/// Validity response APDU, single flag byte
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct ValidResp {
    pub valid: bool,
}

impl ApduResponse for ValidResp {
    fn decode(r: &mut Reader<'_>) -> Result<Self, ApduError> {
        Ok(Self {
            valid: r.read_u8()? != 0,
        })
    }
}

/// Compute public key for a private key APDU
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct PrivateToPublicReq {
    pub key: SecretKey,
}

impl PrivateToPublicReq {
    pub fn new(key: SecretKey) -> Self {
        Self { key }
    }
}

impl ApduRequest for PrivateToPublicReq {
    const INS: Instruction = Instruction::PrivateToPublic;

    fn encode(&self, w: &mut Writer) -> Result<(), ApduError> {
        w.write_key(&self.key);
        Ok(())
    }
}

/// Generate random key pair APDU (0 length)
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct RandomKeyPairReq;

impl ApduRequest for RandomKeyPairReq {
    const INS: Instruction = Instruction::RandomKeyPair;
}

/// Random key pair response APDU
///
/// ## Encoding:
/// ```text
/// +--------------------------------+--------------------------------+
/// |           PUBLIC_KEY           |          PRIVATE_KEY           |
/// |           (32 bytes)           |           (32 bytes)           |
/// +--------------------------------+--------------------------------+
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct RandomKeyPairResp {
    pub public: PublicKey,
    pub private: SecretKey,
}

impl ApduResponse for RandomKeyPairResp {
    fn decode(r: &mut Reader<'_>) -> Result<Self, ApduError> {
        Ok(Self {
            public: r.read_key()?,
            private: r.read_key()?,
        })
    }
}

/// Reset cached wallet keys APDU (0 length)
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct ResetKeysReq;

impl ApduRequest for ResetKeysReq {
    const INS: Instruction = Instruction::ResetKeys;
}

#[cfg(test)]
mod test {
    use rand::RngCore;

    use super::*;
    use crate::test::frame_and_check;

    fn random_key() -> Key {
        let mut b = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut b);
        Key::from_bytes(b)
    }

    #[test]
    fn check_key_apdu() {
        let key = random_key();

        let data = frame_and_check(&CheckKeyReq::new(key), true);
        assert_eq!(&data, key.as_bytes());
    }

    #[test]
    fn public_keys_resp_decode() {
        let (spend, view) = (random_key(), random_key());

        let mut body = Vec::new();
        body.extend_from_slice(spend.as_bytes());
        body.extend_from_slice(view.as_bytes());

        let mut r = Reader::new(&body);
        let resp = PublicKeysResp::decode(&mut r).unwrap();
        assert_eq!(resp.spend, spend);
        assert_eq!(resp.view, view);
    }

    #[test]
    fn public_keys_resp_rejects_short_body() {
        let mut r = Reader::new(&[0u8; 48]);
        assert_eq!(PublicKeysResp::decode(&mut r), Err(ApduError::Truncated));
    }

    #[test]
    fn valid_resp_decode() {
        let mut r = Reader::new(&[0x01]);
        assert!(ValidResp::decode(&mut r).unwrap().valid);

        let mut r = Reader::new(&[0x00]);
        assert!(!ValidResp::decode(&mut r).unwrap().valid);
    }
}
