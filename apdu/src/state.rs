// Copyright (c) 2022-2023 The TurtleCoin Developers

//! Transaction construction state machine states

use num_enum::TryFromPrimitive;
use strum::{Display, EnumIter};

use crate::ApduError;

/// Device transaction construction states
///
/// Construction progresses linearly from [TxState::Inactive] through to
/// [TxState::Complete]; the device refuses phase commands issued out of
/// order.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Display, EnumIter, TryFromPrimitive)]
#[repr(u8)]
pub enum TxState {
    /// No transaction in construction
    Inactive = 0x00,
    /// Transaction parameters accepted
    Ready = 0x01,
    /// Input loading phase active
    ReceivingInputs = 0x02,
    /// All declared inputs received
    InputsReceived = 0x03,
    /// Output loading phase active
    ReceivingOutputs = 0x04,
    /// All declared outputs received
    OutputsReceived = 0x05,
    /// Transaction prefix finalised
    PrefixReady = 0x06,
    /// Transaction signed and ready for retrieval
    Complete = 0x07,
}

impl TxState {
    /// Decode a state from its wire byte
    pub fn from_byte(b: u8) -> Result<Self, ApduError> {
        Self::try_from(b).map_err(|_| ApduError::InvalidEncoding)
    }
}
