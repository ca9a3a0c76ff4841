// Copyright (c) 2022-2023 The TurtleCoin Developers

//! Shared test fixtures: scripted and stateful mock devices plus
//! deterministic collaborator implementations
//!
//! The stateful [MockDevice] implements enough of the device protocol to
//! exercise the wallet and transaction builder end to end, including the
//! transaction state machine. Determinism comes from [mix], a toy byte
//! mixer standing in for real cryptography on both sides of the seam.

// Each test binary uses a subset of these fixtures
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use ledger_cn::{
    provider::{AddressCodec, CryptoProvider, TransactionDecoder},
    transport::{Exchange, TransportError},
    types::{Address, DecodedTransaction},
};
use ledger_cn_apdu::{Derivation, Hash, Instruction, Key, PublicKey, SecretKey, Signature, TxState};

/// Fixed device view private key
pub const VIEW_PRIV: [u8; 32] = [0xb2; 32];

/// Fixed device spend public key
pub const SPEND_PUB: [u8; 32] = [0xa1; 32];

/// Fixed device one-time transaction private key
pub const TX_PRIV: [u8; 32] = [0xc3; 32];

/// Dump chunk size served by the mock device
pub const DUMP_CHUNK: usize = 128;

#[allow(unused)]
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Deterministic byte mixer standing in for real hashing / derivation
pub fn mix(tag: u8, parts: &[&[u8]]) -> [u8; 32] {
    let mut out = [tag; 32];

    for (pi, part) in parts.iter().enumerate() {
        for (i, b) in part.iter().enumerate() {
            out[(i + pi) % 32] ^= b.rotate_left((pi % 8) as u32);
            out[(i * 7 + pi) % 32] = out[(i * 7 + pi) % 32].wrapping_add(*b);
        }
    }

    out
}

#[allow(unused)]
pub fn view_public() -> Key {
    Key::from_bytes(mix(0x50, &[&VIEW_PRIV]))
}

#[allow(unused)]
pub fn tx_public() -> Key {
    Key::from_bytes(mix(0x50, &[&TX_PRIV]))
}

/// Transport scripted with exact request / response pairs
pub struct ScriptedTransport {
    script: Mutex<VecDeque<(Vec<u8>, Vec<u8>)>>,
    requests: Arc<Mutex<Vec<Vec<u8>>>>,
}

#[allow(unused)]
impl ScriptedTransport {
    pub fn new(pairs: &[(&[u8], &[u8])]) -> (Self, Arc<Mutex<Vec<Vec<u8>>>>) {
        let requests = Arc::new(Mutex::new(Vec::new()));

        let t = Self {
            script: Mutex::new(
                pairs
                    .iter()
                    .map(|(req, resp)| (req.to_vec(), resp.to_vec()))
                    .collect(),
            ),
            requests: requests.clone(),
        };

        (t, requests)
    }
}

#[async_trait]
impl Exchange for ScriptedTransport {
    async fn exchange(&self, command: &[u8]) -> Result<Vec<u8>, TransportError> {
        self.requests.lock().unwrap().push(command.to_vec());

        let (expected, response) = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TransportError::new(anyhow::anyhow!("unscripted exchange")))?;

        assert_eq!(
            hex::encode(command),
            hex::encode(&expected),
            "request did not match script"
        );

        Ok(response)
    }
}

/// Observable state of the mock device
#[derive(Default)]
pub struct DeviceState {
    /// Transaction construction state
    pub tx_state: Option<TxState>,
    /// Instruction bytes in exchange order
    pub ins_log: Vec<u8>,
    /// Data sections of received TX_START frames
    pub start_frames: Vec<Vec<u8>>,
    /// Data sections of received TX_LOAD_INPUT frames
    pub input_frames: Vec<Vec<u8>>,
    /// Data sections of received TX_LOAD_OUTPUT frames
    pub output_frames: Vec<Vec<u8>>,
    /// Refuse TX_SIGN with a bare 0x6985 status word
    pub refuse_sign: bool,
    /// Ignore TX_START, leaving the state machine inactive
    pub wedge_start: bool,
    expected_inputs: u8,
    loaded_inputs: u8,
    expected_outputs: u8,
    loaded_outputs: u8,
}

impl DeviceState {
    pub fn state(&self) -> TxState {
        self.tx_state.unwrap_or(TxState::Inactive)
    }
}

/// Stateful in-process device implementing the transaction state machine
pub struct MockDevice {
    pub state: Arc<Mutex<DeviceState>>,
    blob: Vec<u8>,
}

#[allow(unused)]
impl MockDevice {
    pub fn new() -> (Self, Arc<Mutex<DeviceState>>) {
        let state = Arc::new(Mutex::new(DeviceState::default()));

        let d = Self {
            state: state.clone(),
            // Arbitrary deterministic transaction blob
            blob: (0..600u32).map(|i| (i % 251) as u8).collect(),
        };

        (d, state)
    }

    pub fn blob(&self) -> &[u8] {
        &self.blob
    }

    pub fn blob_hash(&self) -> Key {
        Key::from_bytes(mix(0x54, &[&self.blob]))
    }

    fn ok(body: &[u8]) -> Vec<u8> {
        let mut out = body.to_vec();
        out.extend_from_slice(&0x9000u16.to_be_bytes());
        out
    }

    fn fail(body: &[u8], sw: u16) -> Vec<u8> {
        let mut out = body.to_vec();
        out.extend_from_slice(&sw.to_be_bytes());
        out
    }
}

#[async_trait]
impl Exchange for MockDevice {
    async fn exchange(&self, command: &[u8]) -> Result<Vec<u8>, TransportError> {
        assert!(command.len() >= 6, "malformed request frame");
        assert_eq!(command[0], 0xe0, "wrong APDU class");

        let ins = command[1];
        let len = u16::from_be_bytes([command[4], command[5]]) as usize;
        assert_eq!(command.len(), 6 + len, "request length field mismatch");
        let data = &command[6..];

        let mut s = self.state.lock().unwrap();
        s.ins_log.push(ins);

        let resp = match ins {
            x if x == Instruction::Version as u8 => Self::ok(&[0x01, 0x02, 0x03]),
            x if x == Instruction::Debug as u8 => Self::ok(&[0x01]),
            x if x == Instruction::Ident as u8 => Self::ok(&[0xde, 0xad, 0xbe, 0xef]),

            x if x == Instruction::PublicKeys as u8 => {
                let mut body = SPEND_PUB.to_vec();
                body.extend_from_slice(&mix(0x50, &[&VIEW_PRIV]));
                Self::ok(&body)
            }
            x if x == Instruction::ViewSecretKey as u8 => Self::ok(&VIEW_PRIV),
            x if x == Instruction::SpendESecretKey as u8 => {
                // Export refused: body error code supersedes the status word
                Self::fail(&0x9400u16.to_be_bytes(), 0x6f00)
            }
            x if x == Instruction::CheckKey as u8 => Self::ok(&[0x01]),
            x if x == Instruction::CheckScalar as u8 => Self::ok(&[0x01]),
            x if x == Instruction::PrivateToPublic as u8 => {
                Self::ok(&mix(0x50, &[&data[..32]]))
            }
            x if x == Instruction::RandomKeyPair as u8 => {
                let mut body = mix(0x50, &[&TX_PRIV]).to_vec();
                body.extend_from_slice(&TX_PRIV);
                Self::ok(&body)
            }
            x if x == Instruction::Address as u8 => {
                Self::ok("TRTLmockdeviceaddress".as_bytes())
            }

            x if x == Instruction::GenerateKeyImage as u8 => Self::ok(&mix(0x49, &[data])),
            x if x == Instruction::GenerateSignature as u8 => {
                // Signature carries the digest in its first half
                let mut body = data[..32].to_vec();
                body.extend_from_slice(&[0x99; 32]);
                Self::ok(&body)
            }
            x if x == Instruction::CheckSignature as u8 => {
                let valid = data[64..96] == data[..32];
                Self::ok(&[valid as u8])
            }
            x if x == Instruction::GenerateKeyDerivation as u8 => {
                Self::ok(&mix(0x44, &[&data[..32], &VIEW_PRIV]))
            }
            x if x == Instruction::DerivePublicKey as u8 => {
                Self::ok(&mix(0x4b, &[&data[..32], &data[32..36], &SPEND_PUB]))
            }

            x if x == Instruction::TxState as u8 => Self::ok(&[s.state() as u8]),
            x if x == Instruction::TxStart as u8 => {
                s.start_frames.push(data.to_vec());
                if !s.wedge_start {
                    s.expected_inputs = data[8];
                    s.expected_outputs = data[9];
                    s.loaded_inputs = 0;
                    s.loaded_outputs = 0;
                    s.tx_state = Some(TxState::Ready);
                }
                Self::ok(&[])
            }
            x if x == Instruction::TxStartInputLoad as u8 => {
                s.tx_state = Some(TxState::ReceivingInputs);
                Self::ok(&[])
            }
            x if x == Instruction::TxLoadInput as u8 => {
                s.input_frames.push(data.to_vec());
                s.loaded_inputs += 1;
                if s.loaded_inputs == s.expected_inputs {
                    s.tx_state = Some(TxState::InputsReceived);
                }
                Self::ok(&[])
            }
            x if x == Instruction::TxStartOutputLoad as u8 => {
                s.tx_state = Some(TxState::ReceivingOutputs);
                Self::ok(&[])
            }
            x if x == Instruction::TxLoadOutput as u8 => {
                s.output_frames.push(data.to_vec());
                s.loaded_outputs += 1;
                if s.loaded_outputs == s.expected_outputs {
                    s.tx_state = Some(TxState::OutputsReceived);
                }
                Self::ok(&[])
            }
            x if x == Instruction::TxFinalizeTxPrefix as u8 => {
                s.tx_state = Some(TxState::PrefixReady);
                Self::ok(&[])
            }
            x if x == Instruction::TxSign as u8 => {
                if s.refuse_sign {
                    Self::fail(&[], 0x6985)
                } else {
                    s.tx_state = Some(TxState::Complete);
                    let mut body = mix(0x54, &[&self.blob]).to_vec();
                    body.extend_from_slice(&(self.blob.len() as u16).to_be_bytes());
                    Self::ok(&body)
                }
            }
            x if x == Instruction::TxDump as u8 => {
                let offset = u16::from_be_bytes([data[0], data[1]]) as usize;
                let end = usize::min(offset + DUMP_CHUNK, self.blob.len());
                match offset < self.blob.len() {
                    true => Self::ok(&self.blob[offset..end]),
                    false => Self::ok(&[]),
                }
            }
            x if x == Instruction::TxReset as u8 => {
                s.tx_state = Some(TxState::Inactive);
                s.loaded_inputs = 0;
                s.loaded_outputs = 0;
                Self::ok(&[])
            }
            x if x == Instruction::ResetKeys as u8 => Self::ok(&[]),

            _ => Self::fail(&[], 0x6d00),
        };

        Ok(resp)
    }
}

/// Deterministic crypto provider mirroring the mock device's arithmetic
pub struct MockCrypto;

impl CryptoProvider for MockCrypto {
    fn generate_key_derivation(
        &self,
        public: &PublicKey,
        secret: &SecretKey,
    ) -> anyhow::Result<Derivation> {
        Ok(Key::from_bytes(mix(
            0x44,
            &[public.as_bytes(), secret.as_bytes()],
        )))
    }

    fn derive_public_key(
        &self,
        derivation: &Derivation,
        output_index: u32,
        public: &PublicKey,
    ) -> anyhow::Result<PublicKey> {
        Ok(Key::from_bytes(mix(
            0x4b,
            &[
                derivation.as_bytes(),
                &output_index.to_be_bytes(),
                public.as_bytes(),
            ],
        )))
    }

    fn secret_key_to_public_key(&self, secret: &SecretKey) -> anyhow::Result<PublicKey> {
        Ok(Key::from_bytes(mix(0x50, &[secret.as_bytes()])))
    }

    fn cn_fast_hash(&self, data: &[u8]) -> anyhow::Result<Hash> {
        Ok(Key::from_bytes(mix(0x48, &[data])))
    }

    fn check_signature(&self, digest: &Hash, _public: &PublicKey, signature: &Signature) -> bool {
        signature.as_bytes()[..32] == digest.as_bytes()[..]
    }
}

/// Reversible text codec standing in for Base58 address encoding
pub struct MockCodec;

impl AddressCodec for MockCodec {
    fn decode(&self, address: &str) -> anyhow::Result<Address> {
        let mut parts = address.split(':');

        if parts.next() != Some("B58") {
            anyhow::bail!("unrecognised address format");
        }

        let prefix = parts
            .next()
            .ok_or_else(|| anyhow::anyhow!("missing prefix"))?
            .parse()?;
        let spend = Key::from_hex(parts.next().ok_or_else(|| anyhow::anyhow!("missing spend"))?)?;
        let view = Key::from_hex(parts.next().ok_or_else(|| anyhow::anyhow!("missing view"))?)?;
        let payment_id = match parts.next() {
            Some(p) if !p.is_empty() => Some(Key::from_hex(p)?),
            _ => None,
        };

        Ok(Address {
            prefix,
            spend,
            view,
            payment_id,
        })
    }

    fn encode(&self, address: &Address) -> anyhow::Result<String> {
        let pid = address
            .payment_id
            .as_ref()
            .map(|p| p.to_hex())
            .unwrap_or_default();

        Ok(format!(
            "B58:{}:{}:{}:{}",
            address.prefix, address.spend, address.view, pid
        ))
    }
}

/// Transaction decoder mirroring the mock device's blob hashing
pub struct MockDecoder;

impl TransactionDecoder for MockDecoder {
    fn decode(&self, bytes: &[u8]) -> anyhow::Result<DecodedTransaction> {
        Ok(DecodedTransaction {
            hash: Key::from_bytes(mix(0x54, &[bytes])),
            size: bytes.len(),
        })
    }
}
