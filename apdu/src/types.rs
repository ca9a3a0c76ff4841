// Copyright (c) 2022-2023 The TurtleCoin Developers

//! Primitive protocol value types
//!
//! Keys, scalars, points, hashes and derivations all travel as 32 raw bytes
//! on the wire and as 64 lowercase hex characters at the API boundary;
//! signatures are 64 bytes / 128 characters. Hex input is accepted in either
//! case and normalised on output.

use core::fmt;
use core::str::FromStr;

use crate::ApduError;

/// 32-byte protocol value (key, scalar, point, hash or derivation)
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Key([u8; 32]);

/// Public key alias for [Key]
pub type PublicKey = Key;

/// Secret key alias for [Key]
pub type SecretKey = Key;

/// Key image alias for [Key]
pub type KeyImage = Key;

/// Key derivation alias for [Key]
pub type Derivation = Key;

/// Hash alias for [Key]
pub type Hash = Key;

impl Key {
    /// Encoded size in bytes
    pub const SIZE: usize = 32;

    /// Parse a key from exactly 64 hex characters
    pub fn from_hex(s: &str) -> Result<Self, ApduError> {
        let mut b = [0u8; Self::SIZE];

        if s.len() != Self::SIZE * 2 {
            return Err(ApduError::InvalidHex {
                expected: Self::SIZE * 2,
            });
        }

        hex::decode_to_slice(s, &mut b).map_err(|_| ApduError::InvalidHex {
            expected: Self::SIZE * 2,
        })?;

        Ok(Self(b))
    }

    /// Construct a key from raw bytes
    pub const fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    /// Fetch the raw byte representation
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render as lowercase hex
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for Key {
    type Err = ApduError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0[..] {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<[u8; 32]> for Key {
    fn from(b: [u8; 32]) -> Self {
        Self(b)
    }
}

/// 64-byte signature value
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Signature([u8; 64]);

impl Signature {
    /// Encoded size in bytes
    pub const SIZE: usize = 64;

    /// Parse a signature from exactly 128 hex characters
    pub fn from_hex(s: &str) -> Result<Self, ApduError> {
        let mut b = [0u8; Self::SIZE];

        if s.len() != Self::SIZE * 2 {
            return Err(ApduError::InvalidHex {
                expected: Self::SIZE * 2,
            });
        }

        hex::decode_to_slice(s, &mut b).map_err(|_| ApduError::InvalidHex {
            expected: Self::SIZE * 2,
        })?;

        Ok(Self(b))
    }

    /// Construct a signature from raw bytes
    pub const fn from_bytes(b: [u8; 64]) -> Self {
        Self(b)
    }

    /// Fetch the raw byte representation
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Render as lowercase hex
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for Signature {
    type Err = ApduError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0[..] {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<[u8; 64]> for Signature {
    fn from(b: [u8; 64]) -> Self {
        Self(b)
    }
}
