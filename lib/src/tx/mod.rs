// Copyright (c) 2022-2023 The TurtleCoin Developers

//! Device transaction construction
//!
//! The builder validates the request, assembles mix rings and stealth
//! outputs, then drives the on-device state machine through its phases,
//! verifying the reported state after each one. The device is returned to
//! [TxState::Inactive] on every exit path.

use log::{debug, warn};

use ledger_cn_apdu::{
    keys::RandomKeyPairResp,
    tx::{RING_PARTICIPANTS, TX_MAX_PARTICIPANTS},
    Hash, PublicKey, TxState,
};

use crate::{
    config::Config,
    device::DeviceHandle,
    offsets,
    provider::{CryptoProvider, TransactionDecoder},
    transport::Exchange,
    types::{CreatedTransaction, GeneratedOutput, PreparedInput, PreparedOutput, RandomOutput,
        TransactionOutput},
    Error,
};

mod inputs;
mod outputs;

pub use inputs::prepare_inputs;
pub use outputs::prepare_outputs;

/// Parameters for a transaction construction request
#[derive(Clone, Debug, PartialEq)]
pub struct TransactionParams {
    /// Number of decoys per input ring
    pub mixin: usize,
    /// Network fee; falls back to the configured default when absent
    pub fee: Option<u64>,
    /// Explicit payment id, hex encoded
    pub payment_id: Option<String>,
    /// Unlock height or timestamp
    pub unlock_time: u64,
    /// Arbitrary transaction extra; refused by this core
    pub extra_data: Option<Vec<u8>>,
}

impl Default for TransactionParams {
    fn default() -> Self {
        Self {
            mixin: RING_PARTICIPANTS - 1,
            fee: None,
            payment_id: None,
            unlock_time: 0,
            extra_data: None,
        }
    }
}

/// Validated transaction parameters
struct Validated {
    fee: u64,
    payment_id: Option<Hash>,
    unlock_time: u64,
}

/// Transaction construction driver over a device handle
pub(crate) struct Builder<'a, T: Exchange> {
    device: &'a DeviceHandle<T>,
    crypto: &'a dyn CryptoProvider,
    decoder: &'a dyn TransactionDecoder,
    config: &'a Config,
}

impl<'a, T: Exchange> Builder<'a, T> {
    pub fn new(
        device: &'a DeviceHandle<T>,
        crypto: &'a dyn CryptoProvider,
        decoder: &'a dyn TransactionDecoder,
        config: &'a Config,
    ) -> Self {
        Self {
            device,
            crypto,
            decoder,
            config,
        }
    }

    /// Construct, sign and retrieve a transaction.
    ///
    /// All local validation happens before any device traffic; once the
    /// device phase begins, TX_RESET is issued on success and on every
    /// failure path.
    pub async fn build(
        &self,
        destinations: &[GeneratedOutput],
        inputs: &[TransactionOutput],
        random_outputs: &[Vec<RandomOutput>],
        params: TransactionParams,
    ) -> Result<CreatedTransaction, Error> {
        let validated = self.validate(destinations, inputs, random_outputs, &params)?;

        let prepared_inputs = prepare_inputs(inputs, random_outputs, params.mixin)?;

        let result = self.construct(destinations, &validated, prepared_inputs).await;

        // The device transaction slot is released on every exit path
        if let Err(e) = self.device.tx_reset().await {
            warn!("failed to reset device transaction state: {e}");
        }

        result
    }

    /// Device-facing half of the build: output preparation, input ordering
    /// and the state machine drive
    async fn construct(
        &self,
        destinations: &[GeneratedOutput],
        validated: &Validated,
        mut prepared_inputs: Vec<PreparedInput>,
    ) -> Result<CreatedTransaction, Error> {
        let (tx_keys, prepared_outputs) =
            prepare_outputs(self.device, self.crypto, destinations).await?;

        // Authoritative device-visible input order: key image descending
        prepared_inputs.sort_by(|a, b| b.key_image.cmp(&a.key_image));

        self.drive(&tx_keys, validated, &prepared_inputs, &prepared_outputs)
            .await
    }

    /// Validate the request without touching the device
    fn validate(
        &self,
        destinations: &[GeneratedOutput],
        inputs: &[TransactionOutput],
        random_outputs: &[Vec<RandomOutput>],
        params: &TransactionParams,
    ) -> Result<Validated, Error> {
        if params.extra_data.is_some() {
            return Err(Error::NotSupported("transaction extra data"));
        }

        if params.mixin + 1 != RING_PARTICIPANTS {
            return Err(Error::InvalidArgument(format!(
                "device rings require a mixin of {} ({} requested)",
                RING_PARTICIPANTS - 1,
                params.mixin
            )));
        }

        if destinations.is_empty() {
            return Err(Error::InvalidArgument(
                "at least one destination output is required".into(),
            ));
        }

        if inputs.is_empty() {
            return Err(Error::InvalidArgument(
                "at least one input is required".into(),
            ));
        }

        if destinations.len() > self.config.maximum_outputs_per_transaction
            || destinations.len() > TX_MAX_PARTICIPANTS
        {
            return Err(Error::InvalidArgument(format!(
                "transaction output count {} exceeds the permitted maximum",
                destinations.len()
            )));
        }

        if inputs.len() > TX_MAX_PARTICIPANTS {
            return Err(Error::InvalidArgument(format!(
                "transaction input count {} exceeds the permitted maximum",
                inputs.len()
            )));
        }

        for destination in destinations {
            if destination.amount == 0 {
                return Err(Error::InvalidArgument(
                    "destination amounts must be non-zero".into(),
                ));
            }

            if destination.amount > self.config.maximum_output_amount {
                return Err(Error::InvalidArgument(format!(
                    "destination amount {} exceeds the per-output maximum of {}",
                    destination.amount, self.config.maximum_output_amount
                )));
            }
        }

        for input in inputs {
            if input.input.is_none() || input.key_image.is_none() {
                return Err(Error::InvalidArgument(
                    "inputs must carry recovery data and a key image".into(),
                ));
            }
        }

        if params.mixin > 0 && random_outputs.len() != inputs.len() {
            return Err(Error::InvalidArgument(format!(
                "one decoy pool per input required ({} pools for {} inputs)",
                random_outputs.len(),
                inputs.len()
            )));
        }

        let payment_id = resolve_payment_id(destinations, params.payment_id.as_deref())?;

        let fee = params.fee.unwrap_or(self.config.default_network_fee);

        let input_total: u128 = inputs.iter().map(|i| i.amount as u128).sum();
        let output_total: u128 = destinations.iter().map(|d| d.amount as u128).sum();

        if fee == 0 {
            // Fusion: the literal threshold stays 12 while the message cites
            // the configured minimum
            if inputs.len() < 12 {
                return Err(Error::Insufficient(format!(
                    "fusion transactions require at least {} inputs",
                    self.config.fusion_min_input_count
                )));
            }

            if inputs.len() / destinations.len() < self.config.fusion_min_in_out_count_ratio {
                return Err(Error::Insufficient(format!(
                    "fusion transactions require an input to output ratio of at least {}",
                    self.config.fusion_min_in_out_count_ratio
                )));
            }

            if input_total != output_total {
                return Err(Error::Insufficient(
                    "fusion transaction inputs and outputs must balance".into(),
                ));
            }
        } else if !self.config.activate_fee_per_byte_transactions {
            // Skipped entirely when fee-per-byte mode is active
            if input_total < output_total + fee as u128 {
                return Err(Error::Insufficient(format!(
                    "not enough funds: {input_total} available, {} required",
                    output_total + fee as u128
                )));
            }
        }

        Ok(Validated {
            fee,
            payment_id,
            unlock_time: params.unlock_time,
        })
    }

    /// Drive the device state machine through construction, signing and
    /// retrieval, verifying the reported state after every phase
    async fn drive(
        &self,
        tx_keys: &RandomKeyPairResp,
        validated: &Validated,
        inputs: &[PreparedInput],
        outputs: &[PreparedOutput],
    ) -> Result<CreatedTransaction, Error> {
        let device = self.device;

        // Clear out any abandoned construction
        if device.tx_state().await? != TxState::Inactive {
            debug!("device transaction state dirty, resetting");
            device.tx_reset().await?;
        }

        debug!(
            "starting device transaction ({} inputs, {} outputs, fee {})",
            inputs.len(),
            outputs.len(),
            validated.fee
        );

        device
            .tx_start(
                validated.unlock_time,
                inputs.len(),
                outputs.len(),
                &tx_keys.public,
                validated.payment_id.as_ref(),
            )
            .await?;
        self.expect_state(TxState::Ready).await?;

        device.tx_start_input_load().await?;
        self.expect_state(TxState::ReceivingInputs).await?;

        for input in inputs {
            let (ring_keys, relative_offsets) = ring_arrays(input)?;

            device
                .tx_load_input(
                    &input.transaction_keys.public_key,
                    input.transaction_keys.output_index,
                    input.amount,
                    &ring_keys,
                    &relative_offsets,
                    input.real_output_index,
                )
                .await?;
        }
        self.expect_state(TxState::InputsReceived).await?;

        device.tx_start_output_load().await?;
        self.expect_state(TxState::ReceivingOutputs).await?;

        for output in outputs {
            device.tx_load_output(output.amount, &output.key).await?;
        }
        self.expect_state(TxState::OutputsReceived).await?;

        device.tx_finalize_tx_prefix().await?;
        self.expect_state(TxState::PrefixReady).await?;

        let signed = device.tx_sign(true).await?;
        self.expect_state(TxState::Complete).await?;

        debug!(
            "transaction signed (hash: {}, size: {})",
            signed.hash, signed.size
        );

        // Retrieve the raw transaction in chunks
        let mut raw = Vec::with_capacity(signed.size as usize);
        loop {
            let chunk = device.tx_dump(raw.len() as u16).await?;
            if chunk.is_empty() {
                break;
            }

            raw.extend_from_slice(&chunk);

            if raw.len() >= self.config.maximum_ledger_transaction_size {
                break;
            }
        }

        let decoded = self.decoder.decode(&raw)?;

        if decoded.hash != signed.hash {
            return Err(Error::TransactionMismatch(format!(
                "hash {} does not match signing result {}",
                decoded.hash, signed.hash
            )));
        }

        if decoded.size != signed.size as usize {
            return Err(Error::TransactionMismatch(format!(
                "size {} does not match signing result {}",
                decoded.size, signed.size
            )));
        }

        Ok(CreatedTransaction {
            raw,
            hash: decoded.hash,
            size: decoded.size,
        })
    }

    /// Read the device state and compare it to the expected phase result
    async fn expect_state(&self, expected: TxState) -> Result<(), Error> {
        let actual = self.device.tx_state().await?;

        if actual != expected {
            return Err(Error::InvalidState { actual, expected });
        }

        Ok(())
    }
}

/// Resolve the effective payment id across destinations and the explicit
/// parameter, rejecting conflicts
fn resolve_payment_id(
    destinations: &[GeneratedOutput],
    explicit: Option<&str>,
) -> Result<Option<Hash>, Error> {
    let mut payment_id = match explicit {
        Some(p) => Some(Hash::from_hex(p)?),
        None => None,
    };

    for destination in destinations {
        if let Some(embedded) = &destination.destination.payment_id {
            match &payment_id {
                None => payment_id = Some(*embedded),
                Some(existing) if existing == embedded => (),
                Some(_) => {
                    return Err(Error::PaymentIdConflict(
                        "multiple payment IDs found in the destinations and/orsupplied payment ID"
                            .to_string(),
                    ))
                }
            }
        }
    }

    Ok(payment_id)
}

/// Split a prepared input's ring into the fixed-arity key and offset arrays
/// expected by the device, relativizing the global indexes
fn ring_arrays(
    input: &PreparedInput,
) -> Result<(Vec<PublicKey>, Vec<u32>), Error> {
    if input.outputs.len() != RING_PARTICIPANTS {
        return Err(Error::InvalidArgument(format!(
            "assembled ring carries {} members, device requires {}",
            input.outputs.len(),
            RING_PARTICIPANTS
        )));
    }

    let absolute: Vec<u64> = input.outputs.iter().map(|m| m.index).collect();
    let relative = offsets::absolute_to_relative(&absolute);

    let mut ring_keys = Vec::with_capacity(RING_PARTICIPANTS);
    let mut relative_offsets = Vec::with_capacity(RING_PARTICIPANTS);

    for (member, offset) in input.outputs.iter().zip(relative.iter()) {
        ring_keys.push(member.key);
        relative_offsets.push(u32::try_from(*offset).map_err(|_| {
            Error::InvalidArgument(format!("global index offset {offset} exceeds 32 bits"))
        })?);
    }

    Ok((ring_keys, relative_offsets))
}

#[cfg(test)]
mod test {
    use ledger_cn_apdu::Key;

    use super::*;
    use crate::types::{Address, RingMember, TransactionKeys};

    fn address(payment_id: Option<Hash>) -> Address {
        Address {
            prefix: 3_914_525,
            spend: Key::from_bytes([0x01; 32]),
            view: Key::from_bytes([0x02; 32]),
            payment_id,
        }
    }

    #[test]
    fn payment_id_resolution() {
        let pid = Key::from_bytes([0xaa; 32]);

        // No ids anywhere
        let destinations = vec![GeneratedOutput {
            amount: 10,
            destination: address(None),
        }];
        assert_eq!(resolve_payment_id(&destinations, None).unwrap(), None);

        // Embedded id propagates
        let destinations = vec![GeneratedOutput {
            amount: 10,
            destination: address(Some(pid)),
        }];
        assert_eq!(resolve_payment_id(&destinations, None).unwrap(), Some(pid));

        // Explicit matches embedded
        assert_eq!(
            resolve_payment_id(&destinations, Some(&pid.to_hex())).unwrap(),
            Some(pid)
        );
    }

    #[test]
    fn payment_id_conflicts() {
        let a = Key::from_bytes([0xaa; 32]);
        let b = Key::from_bytes([0xbb; 32]);

        // Two destinations with differing embedded ids
        let destinations = vec![
            GeneratedOutput {
                amount: 10,
                destination: address(Some(a)),
            },
            GeneratedOutput {
                amount: 10,
                destination: address(Some(b)),
            },
        ];
        assert!(matches!(
            resolve_payment_id(&destinations, None),
            Err(Error::PaymentIdConflict(_))
        ));

        // Explicit id disagreeing with an embedded one
        let destinations = vec![GeneratedOutput {
            amount: 10,
            destination: address(Some(a)),
        }];
        assert!(matches!(
            resolve_payment_id(&destinations, Some(&b.to_hex())),
            Err(Error::PaymentIdConflict(_))
        ));
    }

    #[test]
    fn payment_id_rejects_bad_hex() {
        let destinations = vec![GeneratedOutput {
            amount: 10,
            destination: address(None),
        }];

        assert!(matches!(
            resolve_payment_id(&destinations, Some("zz")),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn ring_arrays_relativize_offsets() {
        let input = PreparedInput {
            amount: 100,
            key_image: Key::from_bytes([0x01; 32]),
            transaction_keys: TransactionKeys {
                public_key: Key::from_bytes([0x02; 32]),
                derivation: Key::from_bytes([0x03; 32]),
                output_index: 0,
            },
            outputs: vec![
                RingMember {
                    key: Key::from_bytes([0x10; 32]),
                    index: 5,
                },
                RingMember {
                    key: Key::from_bytes([0x11; 32]),
                    index: 9,
                },
                RingMember {
                    key: Key::from_bytes([0x12; 32]),
                    index: 14,
                },
                RingMember {
                    key: Key::from_bytes([0x13; 32]),
                    index: 20,
                },
            ],
            real_output_index: 2,
        };

        let (keys, offsets) = ring_arrays(&input).unwrap();
        assert_eq!(keys.len(), RING_PARTICIPANTS);
        assert_eq!(offsets, vec![5, 4, 5, 6]);
    }

    #[test]
    fn ring_arrays_reject_wrong_arity() {
        let input = PreparedInput {
            amount: 100,
            key_image: Key::from_bytes([0x01; 32]),
            transaction_keys: TransactionKeys {
                public_key: Key::from_bytes([0x02; 32]),
                derivation: Key::from_bytes([0x03; 32]),
                output_index: 0,
            },
            outputs: vec![RingMember {
                key: Key::from_bytes([0x10; 32]),
                index: 5,
            }],
            real_output_index: 0,
        };

        assert!(matches!(
            ring_arrays(&input),
            Err(Error::InvalidArgument(_))
        ));
    }
}
