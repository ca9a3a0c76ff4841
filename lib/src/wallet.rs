// Copyright (c) 2022-2023 The TurtleCoin Developers

//! Host-side CryptoNote wallet wrapper
//!
//! [LedgerWallet] combines a [DeviceHandle] with the host crypto provider
//! and address codec: it caches the wallet session keys, scans transaction
//! outputs for ownership, signs messages through the device and performs the
//! host-only arithmetic (amount decomposition, fees, offsets, money
//! formatting) around transaction construction.

use std::sync::Arc;

use log::debug;
use serde::Serialize;
use tokio::sync::OnceCell;

use ledger_cn_apdu::{Hash, KeyImage, PublicKey, Signature};

use crate::{
    config::Config,
    device::DeviceHandle,
    provider::{AddressCodec, CryptoProvider, TransactionDecoder},
    transport::Exchange,
    tx::{Builder, TransactionParams},
    types::{
        Address, CreatedTransaction, GeneratedOutput, KeyPair, OutputRecovery, RandomOutput,
        TransactionKeys, TransactionOutput,
    },
    Error,
};

/// Wallet session populated by the first key fetch
struct Session {
    spend: KeyPair,
    view: KeyPair,
    address: Address,
    encoded_address: String,
}

/// CryptoNote wallet backed by a Ledger device
///
/// The private spend key never leaves the device; the session holds only
/// public keys and the private view key required for output scanning.
pub struct LedgerWallet<T: Exchange> {
    device: DeviceHandle<T>,
    crypto: Arc<dyn CryptoProvider>,
    address_codec: Arc<dyn AddressCodec>,
    tx_decoder: Arc<dyn TransactionDecoder>,
    config: Config,
    session: OnceCell<Session>,
}

impl<T: Exchange> LedgerWallet<T> {
    /// Create a new wallet over a connected device
    pub fn new(
        device: DeviceHandle<T>,
        crypto: Arc<dyn CryptoProvider>,
        address_codec: Arc<dyn AddressCodec>,
        tx_decoder: Arc<dyn TransactionDecoder>,
        config: Config,
    ) -> Self {
        Self {
            device,
            crypto,
            address_codec,
            tx_decoder,
            config,
            session: OnceCell::new(),
        }
    }

    /// Access the underlying device handle
    pub fn device(&self) -> &DeviceHandle<T> {
        &self.device
    }

    /// Access the active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether wallet keys have been fetched
    pub fn ready(&self) -> bool {
        self.session.get().is_some()
    }

    /// Fetch and cache the wallet keys from the device.
    ///
    /// One-time operation: the session is populated once and immutable
    /// thereafter; concurrent and repeated calls share the first result.
    pub async fn fetch_keys(&self) -> Result<(), Error> {
        self.session
            .get_or_try_init(|| async {
                debug!("fetching wallet keys");

                let keys = self.device.public_keys(true).await?;
                let view_private = self.device.view_secret_key(true).await?;

                // The exported view key must match the advertised public key
                let view_public = self.crypto.secret_key_to_public_key(&view_private)?;
                if view_public != keys.view {
                    return Err(Error::UnexpectedResponse(
                        "exported view key does not match the wallet public view key".into(),
                    ));
                }

                let address = Address {
                    prefix: self.config.address_prefix,
                    spend: keys.spend,
                    view: keys.view,
                    payment_id: None,
                };
                let encoded_address = self.address_codec.encode(&address)?;

                debug!("wallet session ready ({encoded_address})");

                Ok::<_, Error>(Session {
                    spend: KeyPair {
                        public: keys.spend,
                        private: None,
                    },
                    view: KeyPair {
                        public: keys.view,
                        private: Some(view_private),
                    },
                    address,
                    encoded_address,
                })
            })
            .await?;

        Ok(())
    }

    fn session(&self) -> Result<&Session, Error> {
        self.session.get().ok_or(Error::NotReady)
    }

    /// Fetch the cached wallet address
    pub fn address(&self) -> Result<&Address, Error> {
        Ok(&self.session()?.address)
    }

    /// Fetch the cached wallet address in Base58 form
    pub fn address_string(&self) -> Result<&str, Error> {
        Ok(&self.session()?.encoded_address)
    }

    /// Fetch the cached spend key pair
    pub fn spend_keys(&self) -> Result<&KeyPair, Error> {
        Ok(&self.session()?.spend)
    }

    /// Fetch the cached view key pair
    pub fn view_keys(&self) -> Result<&KeyPair, Error> {
        Ok(&self.session()?.view)
    }

    /// Check whether a transaction output belongs to this wallet.
    ///
    /// On a match, returns the output with its recovery record and a
    /// device-generated key image attached; otherwise fails with
    /// [Error::NotOurOutput].
    pub async fn is_our_transaction_output(
        &self,
        tx_public_key: &PublicKey,
        output: TransactionOutput,
    ) -> Result<TransactionOutput, Error> {
        let session = self.session()?;

        let view_private = match &session.view.private {
            Some(k) => k,
            None => return Err(Error::NotReady),
        };

        let derivation = self
            .crypto
            .generate_key_derivation(tx_public_key, view_private)?;
        let public_ephemeral =
            self.crypto
                .derive_public_key(&derivation, output.index, &session.spend.public)?;

        if public_ephemeral != output.key {
            return Err(Error::NotOurOutput);
        }

        debug!(
            "output {} of {tx_public_key} belongs to this wallet",
            output.index
        );

        let mut output = output;
        output.input = Some(OutputRecovery {
            public_ephemeral,
            transaction_keys: TransactionKeys {
                public_key: *tx_public_key,
                derivation,
                output_index: output.index,
            },
            private_ephemeral: None,
        });

        let key_image = self
            .generate_key_image(tx_public_key, output.index, &public_ephemeral)
            .await?;
        output.key_image = Some(key_image);

        Ok(output)
    }

    /// Scan a transaction's outputs for ownership.
    ///
    /// Outputs are evaluated concurrently; the result preserves the input
    /// order and contains only the outputs belonging to this wallet.
    pub async fn scan_transaction_outputs(
        &self,
        tx_public_key: &PublicKey,
        outputs: Vec<TransactionOutput>,
    ) -> Result<Vec<TransactionOutput>, Error> {
        let checks = outputs
            .into_iter()
            .map(|o| self.is_our_transaction_output(tx_public_key, o));

        let results = futures::future::join_all(checks).await;

        let mut ours = Vec::new();
        for result in results {
            match result {
                Ok(output) => ours.push(output),
                Err(Error::NotOurOutput) => (),
                Err(e) => return Err(e),
            }
        }

        Ok(ours)
    }

    /// Generate the key image for an owned output.
    ///
    /// The device re-derives the one-time secret internally from the
    /// transaction public key and output index.
    pub async fn generate_key_image(
        &self,
        tx_public_key: &PublicKey,
        output_index: u32,
        output_key: &PublicKey,
    ) -> Result<KeyImage, Error> {
        self.device
            .generate_key_image(tx_public_key, output_index, output_key, true)
            .await
    }

    /// Sign a message with the device spend key.
    ///
    /// Non-string messages are JSON-stringified before hashing.
    pub async fn sign_message<M: Serialize>(
        &self,
        message: &M,
        confirm: bool,
    ) -> Result<Signature, Error> {
        let digest = self.message_digest(message)?;

        self.device.generate_signature(&digest, confirm).await
    }

    /// Verify a message signature against a public key
    pub fn verify_message<M: Serialize>(
        &self,
        message: &M,
        public_key: &PublicKey,
        signature: &Signature,
    ) -> Result<bool, Error> {
        let digest = self.message_digest(message)?;

        Ok(self.crypto.check_signature(&digest, public_key, signature))
    }

    fn message_digest<M: Serialize>(&self, message: &M) -> Result<Hash, Error> {
        let value = serde_json::to_value(message)
            .map_err(|e| Error::InvalidArgument(format!("unserialisable message: {e}")))?;

        let text = match value {
            serde_json::Value::String(s) => s,
            v => v.to_string(),
        };

        Ok(self.crypto.cn_fast_hash(text.as_bytes())?)
    }

    /// Decompose an amount into canonical destination outputs.
    ///
    /// Amounts split into `digit * 10^k` pieces (zero digits omitted); any
    /// piece above the per-output cap is further split into cap-sized chunks.
    pub fn generate_transaction_outputs(
        &self,
        destination: &Address,
        amount: u64,
    ) -> Result<Vec<GeneratedOutput>, Error> {
        if amount == 0 {
            return Err(Error::InvalidArgument(
                "cannot generate outputs for a zero amount".into(),
            ));
        }

        let amounts = decompose_amount(amount, self.config.maximum_output_amount);

        Ok(amounts
            .into_iter()
            .map(|amount| GeneratedOutput {
                amount,
                destination: destination.clone(),
            })
            .collect())
    }

    /// Calculate the minimum fee for a transaction of the given size
    pub fn calculate_minimum_transaction_fee(&self, size: usize) -> f64 {
        let chunk = self.config.fee_per_byte_chunk_size;

        (size as f64 / chunk).ceil() * chunk * self.config.fee_per_byte
    }

    /// Format an atomic amount as a decimal money string
    pub fn format_money(&self, amount: u64) -> String {
        let places = self.config.coin_unit_places;
        let divisor = 10u64.pow(places);

        format!(
            "{}.{:0width$}",
            amount / divisor,
            amount % divisor,
            width = places as usize
        )
    }

    /// Create an integrated address embedding a payment id.
    ///
    /// The optional prefix overrides the decoded address prefix.
    pub fn create_integrated_address(
        &self,
        address: &str,
        payment_id: &str,
        prefix: Option<u64>,
    ) -> Result<String, Error> {
        let payment_id = Hash::from_hex(payment_id)?;

        let mut decoded = self.address_codec.decode(address)?;
        decoded.payment_id = Some(payment_id);
        if let Some(prefix) = prefix {
            decoded.prefix = prefix;
        }

        Ok(self.address_codec.encode(&decoded)?)
    }

    /// Construct, sign and retrieve a transaction using the device.
    ///
    /// `random_outputs` carries one decoy pool per input. See
    /// [TransactionParams] for the remaining knobs.
    pub async fn create_transaction(
        &self,
        destinations: &[GeneratedOutput],
        inputs: &[TransactionOutput],
        random_outputs: &[Vec<RandomOutput>],
        params: TransactionParams,
    ) -> Result<CreatedTransaction, Error> {
        let builder = Builder::new(
            &self.device,
            self.crypto.as_ref(),
            self.tx_decoder.as_ref(),
            &self.config,
        );

        builder
            .build(destinations, inputs, random_outputs, params)
            .await
    }

    /// Building unsigned prepared structures is not supported by this core
    pub fn create_transaction_structure(&self) -> Result<(), Error> {
        Err(Error::NotSupported("create_transaction_structure"))
    }

    /// Preparing transactions for external completion is not supported
    pub fn prepare_transaction(&self) -> Result<(), Error> {
        Err(Error::NotSupported("prepare_transaction"))
    }

    /// Completing externally prepared transactions is not supported
    pub fn complete_transaction(&self) -> Result<(), Error> {
        Err(Error::NotSupported("complete_transaction"))
    }

    /// Partial key image generation is not supported by this core
    pub fn generate_key_image_primitive(&self) -> Result<(), Error> {
        Err(Error::NotSupported("generate_key_image_primitive"))
    }
}

/// Decompose an amount into canonical `digit * 10^k` pieces, splitting any
/// piece above `maximum` into `maximum`-sized chunks
fn decompose_amount(amount: u64, maximum: u64) -> Vec<u64> {
    let mut out = Vec::new();
    let mut remaining = amount;
    let mut magnitude = 1u64;

    while remaining > 0 {
        let digit = remaining % 10;
        remaining /= 10;

        if digit == 0 {
            magnitude *= 10;
            continue;
        }

        let piece = digit * magnitude;
        if piece > maximum {
            for _ in 0..piece / maximum {
                out.push(maximum);
            }
            if piece % maximum != 0 {
                out.push(piece % maximum);
            }
        } else {
            out.push(piece);
        }

        magnitude *= 10;
    }

    out
}
