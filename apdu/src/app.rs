// Copyright (c) 2022-2023 The TurtleCoin Developers

//! Application information APDUs

use crate::{ApduError, ApduRequest, ApduResponse, Instruction, Reader};

/// Fetch application version APDU (0 length)
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct VersionReq;

impl ApduRequest for VersionReq {
    const INS: Instruction = Instruction::Version;
}

/// Application version response APDU
///
/// ## Encoding:
/// ```text
/// +--------+--------+--------+
/// | MAJOR  | MINOR  | PATCH  |
/// | u8     | u8     | u8     |
/// +--------+--------+--------+
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct VersionResp {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl ApduResponse for VersionResp {
    fn decode(r: &mut Reader<'_>) -> Result<Self, ApduError> {
        Ok(Self {
            major: r.read_u8()?,
            minor: r.read_u8()?,
            patch: r.read_u8()?,
        })
    }
}

impl core::fmt::Display for VersionResp {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Check for DEBUG application build APDU (0 length)
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct DebugReq;

impl ApduRequest for DebugReq {
    const INS: Instruction = Instruction::Debug;
}

/// DEBUG build response APDU, single flag byte
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct DebugResp {
    pub debug: bool,
}

impl ApduResponse for DebugResp {
    fn decode(r: &mut Reader<'_>) -> Result<Self, ApduError> {
        Ok(Self {
            debug: r.read_u8()? != 0,
        })
    }
}

/// Fetch device identification APDU (0 length)
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct IdentReq;

impl ApduRequest for IdentReq {
    const INS: Instruction = Instruction::Ident;
}

/// Device identification response APDU, opaque bytes
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct IdentResp {
    pub ident: Vec<u8>,
}

impl ApduResponse for IdentResp {
    fn decode(r: &mut Reader<'_>) -> Result<Self, ApduError> {
        Ok(Self {
            ident: r.rest().to_vec(),
        })
    }
}

/// Fetch wallet public address APDU (0 length)
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct AddressReq;

impl ApduRequest for AddressReq {
    const INS: Instruction = Instruction::Address;
}

/// Wallet address response APDU, UTF-8 Base58 address bytes
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AddressResp {
    pub address: String,
}

impl ApduResponse for AddressResp {
    fn decode(r: &mut Reader<'_>) -> Result<Self, ApduError> {
        let address = core::str::from_utf8(r.rest())
            .map_err(|_| ApduError::InvalidEncoding)?
            .to_string();

        Ok(Self { address })
    }
}
