// Copyright (c) 2022-2023 The TurtleCoin Developers

//! Transaction construction APDUs
//!
//! These drive the on-device transaction state machine; see
//! [crate::state::TxState] for the states observed between phases. Phase
//! commands return empty bodies — the host confirms progress by polling
//! [TxStateReq] after each phase.

use crate::{
    ApduError, ApduRequest, ApduResponse, Hash, Instruction, PublicKey, Reader, TxState, Writer,
};

/// Number of ring members the device accepts per input
pub const RING_PARTICIPANTS: usize = 4;

/// Maximum inputs or outputs per device transaction
pub const TX_MAX_PARTICIPANTS: usize = 90;

/// Fetch transaction construction state APDU (0 length)
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct TxStateReq;

impl ApduRequest for TxStateReq {
    const INS: Instruction = Instruction::TxState;
}

/// Transaction state response APDU, single state byte
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct TxStateResp {
    pub state: TxState,
}

impl ApduResponse for TxStateResp {
    fn decode(r: &mut Reader<'_>) -> Result<Self, ApduError> {
        Ok(Self {
            state: TxState::from_byte(r.read_u8()?)?,
        })
    }
}

/// Begin transaction construction APDU
///
/// ## Encoding:
/// ```text
/// +----------------+--------+--------+--------------------------------+
/// |  UNLOCK_TIME   | N_IN   | N_OUT  |          TX_PUBLIC_KEY         |
/// |     u64be      | u8     | u8     |           (32 bytes)           |
/// +----------------+--------+--------+--------------------------------+
/// | HAS_PID u8     |      PAYMENT_ID (32 bytes, when HAS_PID = 1)     |
/// +----------------+---------------------------------------------------+
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct TxStartReq {
    /// Block height or timestamp before which outputs stay locked
    pub unlock_time: u64,
    /// Number of inputs that will be loaded
    pub input_count: u8,
    /// Number of outputs that will be loaded
    pub output_count: u8,
    /// One-time transaction public key
    pub tx_public_key: PublicKey,
    /// Optional payment id carried in the transaction extra
    pub payment_id: Option<Hash>,
}

impl TxStartReq {
    pub fn new(
        unlock_time: u64,
        input_count: u8,
        output_count: u8,
        tx_public_key: PublicKey,
        payment_id: Option<Hash>,
    ) -> Self {
        Self {
            unlock_time,
            input_count,
            output_count,
            tx_public_key,
            payment_id,
        }
    }
}

impl ApduRequest for TxStartReq {
    const INS: Instruction = Instruction::TxStart;

    fn encode(&self, w: &mut Writer) -> Result<(), ApduError> {
        w.write_u64(self.unlock_time)
            .write_u8(self.input_count)
            .write_u8(self.output_count)
            .write_key(&self.tx_public_key);

        match &self.payment_id {
            Some(pid) => {
                w.write_u8(1).write_key(pid);
            }
            None => {
                w.write_u8(0);
            }
        }

        Ok(())
    }
}

/// Begin input loading phase APDU (0 length)
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct TxStartInputLoadReq;

impl ApduRequest for TxStartInputLoadReq {
    const INS: Instruction = Instruction::TxStartInputLoad;
}

/// Load transaction input APDU
///
/// Carries the full mix ring for one input: exactly [RING_PARTICIPANTS]
/// member keys with their relative global-index offsets, plus the position
/// of the real member.
///
/// ## Encoding:
/// ```text
/// +--------------------------------+--------+----------------+
/// |        INPUT_TX_PUB_KEY        | OUT_IDX|     AMOUNT     |
/// |           (32 bytes)           |   u8   |     u64be      |
/// +--------------------------------+--------+----------------+
/// |                   RING_KEYS (32 x 4)                     |
/// +----------------------------------------------------------+
/// |                RELATIVE_OFFSETS (u32be x 4)              |
/// +----------+-----------------------------------------------+
/// | REAL u8  |
/// +----------+
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TxLoadInputReq {
    /// Transaction public key of the funding transaction
    pub input_tx_public_key: PublicKey,
    /// Index of the real output in the funding transaction
    pub input_output_index: u8,
    /// Amount carried by the input
    pub amount: u64,
    /// Ring member one-time keys
    pub ring_keys: [PublicKey; RING_PARTICIPANTS],
    /// Ring member global-index offsets, relativized
    pub relative_offsets: [u32; RING_PARTICIPANTS],
    /// Position of the real member within the ring
    pub real_output_index: u8,
}

impl ApduRequest for TxLoadInputReq {
    const INS: Instruction = Instruction::TxLoadInput;

    fn encode(&self, w: &mut Writer) -> Result<(), ApduError> {
        w.write_key(&self.input_tx_public_key)
            .write_u8(self.input_output_index)
            .write_u64(self.amount);

        for key in &self.ring_keys {
            w.write_key(key);
        }

        for offset in &self.relative_offsets {
            w.write_u32(*offset);
        }

        w.write_u8(self.real_output_index);
        Ok(())
    }
}

/// Begin output loading phase APDU (0 length)
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct TxStartOutputLoadReq;

impl ApduRequest for TxStartOutputLoadReq {
    const INS: Instruction = Instruction::TxStartOutputLoad;
}

/// Load transaction output APDU
///
/// ## Encoding:
/// ```text
/// +----------------+--------------------------------+
/// |     AMOUNT     |           OUTPUT_KEY           |
/// |     u64be      |           (32 bytes)           |
/// +----------------+--------------------------------+
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct TxLoadOutputReq {
    /// Amount carried by the output
    pub amount: u64,
    /// One-time (stealth) output key
    pub output_key: PublicKey,
}

impl TxLoadOutputReq {
    pub fn new(amount: u64, output_key: PublicKey) -> Self {
        Self { amount, output_key }
    }
}

impl ApduRequest for TxLoadOutputReq {
    const INS: Instruction = Instruction::TxLoadOutput;

    fn encode(&self, w: &mut Writer) -> Result<(), ApduError> {
        w.write_u64(self.amount).write_key(&self.output_key);
        Ok(())
    }
}

/// Finalise transaction prefix APDU (0 length)
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct TxFinalizePrefixReq;

impl ApduRequest for TxFinalizePrefixReq {
    const INS: Instruction = Instruction::TxFinalizeTxPrefix;
}

/// Sign transaction APDU (0 length)
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct TxSignReq;

impl ApduRequest for TxSignReq {
    const INS: Instruction = Instruction::TxSign;
}

/// Transaction signing response APDU
///
/// ## Encoding:
/// ```text
/// +--------------------------------+----------+
/// |            TX_HASH             |  SIZE    |
/// |           (32 bytes)           |  u16be   |
/// +--------------------------------+----------+
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct TxSignResp {
    /// Hash of the signed transaction
    pub hash: Hash,
    /// Size of the signed transaction in bytes
    pub size: u16,
}

impl ApduResponse for TxSignResp {
    fn decode(r: &mut Reader<'_>) -> Result<Self, ApduError> {
        Ok(Self {
            hash: r.read_key()?,
            size: r.read_u16()?,
        })
    }
}

/// Fetch transaction chunk APDU
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct TxDumpReq {
    /// Byte offset to read from
    pub offset: u16,
}

impl TxDumpReq {
    pub fn new(offset: u16) -> Self {
        Self { offset }
    }
}

impl ApduRequest for TxDumpReq {
    const INS: Instruction = Instruction::TxDump;

    fn encode(&self, w: &mut Writer) -> Result<(), ApduError> {
        w.write_u16(self.offset);
        Ok(())
    }
}

/// Transaction chunk response APDU, possibly empty
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TxDumpResp {
    pub bytes: Vec<u8>,
}

impl ApduResponse for TxDumpResp {
    fn decode(r: &mut Reader<'_>) -> Result<Self, ApduError> {
        Ok(Self {
            bytes: r.rest().to_vec(),
        })
    }
}

/// Reset transaction construction APDU (0 length)
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct TxResetReq;

impl ApduRequest for TxResetReq {
    const INS: Instruction = Instruction::TxReset;
}
