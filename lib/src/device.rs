// Copyright (c) 2022-2023 The TurtleCoin Developers

//! Handle for connected Ledger devices
//!
//! [DeviceHandle] exposes one method per device command, validating inputs
//! locally, framing the APDU, exchanging it over the transport and decoding
//! the response. Exchanges are serialised behind an async lock; a new
//! request is never sent before the previous response is consumed.

use std::sync::RwLock;

use log::debug;
use tokio::sync::Mutex;

use ledger_cn_apdu::{
    app::{AddressReq, AddressResp, DebugReq, DebugResp, IdentReq, IdentResp, VersionReq, VersionResp},
    derive::{DerivationResp, DerivePublicKeyReq, DeriveSecretKeyReq, GenerateKeyDerivationReq},
    frame_request,
    key_image::{GenerateKeyImageReq, KeyImageResp},
    keys::{
        CheckKeyReq, CheckScalarReq, PrivateToPublicReq, PublicKeyResp, PublicKeysReq,
        PublicKeysResp, RandomKeyPairReq, RandomKeyPairResp, ResetKeysReq, SecretKeyResp,
        SpendESecretKeyReq, ValidResp, ViewSecretKeyReq,
    },
    parse_response,
    ring::{
        CheckRingSignaturesReq, CompleteRingSignatureReq, GenerateRingSignaturesReq,
        RingSignaturesResp,
    },
    sign::{CheckSignatureReq, GenerateSignatureReq, SignatureResp},
    tx::{
        TxDumpReq, TxDumpResp, TxFinalizePrefixReq, TxLoadInputReq, TxLoadOutputReq, TxResetReq,
        TxSignReq, TxSignResp, TxStartInputLoadReq, TxStartOutputLoadReq, TxStartReq, TxStateReq,
        TxStateResp, RING_PARTICIPANTS, TX_MAX_PARTICIPANTS,
    },
    ApduRequest, ApduResponse, Derivation, Hash, Key, KeyImage, PublicKey, Reader, SecretKey,
    Signature, TxState,
};

use crate::{transport::Exchange, Error};

/// Observer event published around every transport exchange
///
/// Events are informational; subscribers receive shared references and
/// cannot mutate the request or response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeviceEvent {
    /// Framed request bytes, hex encoded, published before the send
    Send(String),
    /// Raw response bytes, hex encoded, published on transport return
    Receive(String),
}

type Subscriber = Box<dyn Fn(&DeviceEvent) + Send + Sync>;

/// CryptoNote handle for a connected Ledger device.
///
/// Generic over [Exchange] to support different underlying transports.
pub struct DeviceHandle<T: Exchange> {
    /// Transport for communication, locked per exchange
    t: Mutex<T>,
    /// Default user-confirmation flag applied to framed commands
    confirm: bool,
    /// Observer callbacks for send / receive events
    subscribers: RwLock<Vec<Subscriber>>,
}

/// Create a [DeviceHandle] wrapper from a type implementing [Exchange]
impl<T: Exchange> From<T> for DeviceHandle<T> {
    fn from(t: T) -> Self {
        Self::new(t)
    }
}

impl<T: Exchange> DeviceHandle<T> {
    /// Create a new device handle over the provided transport
    pub fn new(t: T) -> Self {
        Self {
            t: Mutex::new(t),
            confirm: true,
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Set the default user-confirmation flag.
    ///
    /// Non-confirm requests are only honoured by DEBUG application builds.
    pub fn set_confirm(&mut self, confirm: bool) {
        self.confirm = confirm;
    }

    /// Register an observer for [DeviceEvent]s
    pub fn subscribe(&self, f: impl Fn(&DeviceEvent) + Send + Sync + 'static) {
        if let Ok(mut subscribers) = self.subscribers.write() {
            subscribers.push(Box::new(f));
        }
    }

    fn publish(&self, event: &DeviceEvent) {
        if let Ok(subscribers) = self.subscribers.read() {
            for s in subscribers.iter() {
                s(event);
            }
        }
    }

    /// Frame a request, exchange it and decode the response body.
    ///
    /// Holds the transport lock for the full round trip so concurrent
    /// callers are strictly serialised.
    async fn request<R: ApduRequest, A: ApduResponse>(
        &self,
        req: &R,
        confirm: bool,
    ) -> Result<A, Error> {
        let command = frame_request(req, confirm)?;

        let t = self.t.lock().await;

        self.publish(&DeviceEvent::Send(hex::encode(&command)));

        let raw = t.exchange(&command).await?;
        drop(t);

        self.publish(&DeviceEvent::Receive(hex::encode(&raw)));

        let body = parse_response(&raw)?;
        let resp = A::decode(&mut Reader::new(body))?;

        Ok(resp)
    }

    /// Fetch the application version
    pub async fn version(&self) -> Result<VersionResp, Error> {
        debug!("requesting application version");

        self.request(&VersionReq, self.confirm).await
    }

    /// Check whether the application is a DEBUG build
    pub async fn is_debug(&self) -> Result<bool, Error> {
        debug!("checking for debug build");

        let resp: DebugResp = self.request(&DebugReq, self.confirm).await?;
        Ok(resp.debug)
    }

    /// Fetch the device identification bytes, hex encoded
    pub async fn ident(&self) -> Result<String, Error> {
        debug!("requesting device ident");

        let resp: IdentResp = self.request(&IdentReq, self.confirm).await?;
        Ok(hex::encode(resp.ident))
    }

    /// Fetch the wallet public spend and view keys
    pub async fn public_keys(&self, confirm: bool) -> Result<PublicKeysResp, Error> {
        debug!("requesting wallet public keys");

        self.request(&PublicKeysReq, confirm).await
    }

    /// Export the private view key
    pub async fn view_secret_key(&self, confirm: bool) -> Result<SecretKey, Error> {
        debug!("requesting private view key");

        let resp: SecretKeyResp = self.request(&ViewSecretKeyReq, confirm).await?;
        Ok(resp.key)
    }

    /// Export the private spend key.
    ///
    /// Sensitive: the device will prompt regardless of the confirm flag on
    /// non-DEBUG builds.
    pub async fn spend_esecret_key(&self, confirm: bool) -> Result<SecretKey, Error> {
        debug!("requesting private spend key");

        let resp: SecretKeyResp = self.request(&SpendESecretKeyReq, confirm).await?;
        Ok(resp.key)
    }

    /// Check a value is a valid public key
    pub async fn check_key(&self, key: &PublicKey) -> Result<bool, Error> {
        debug!("checking key {key}");

        let resp: ValidResp = self.request(&CheckKeyReq::new(*key), self.confirm).await?;
        Ok(resp.valid)
    }

    /// Check a value is a valid scalar
    pub async fn check_scalar(&self, scalar: &Key) -> Result<bool, Error> {
        debug!("checking scalar");

        let resp: ValidResp = self
            .request(&CheckScalarReq::new(*scalar), self.confirm)
            .await?;
        Ok(resp.valid)
    }

    /// Compute the public key for a private key
    pub async fn private_to_public(&self, key: &SecretKey) -> Result<PublicKey, Error> {
        debug!("requesting private to public conversion");

        let resp: PublicKeyResp = self
            .request(&PrivateToPublicReq::new(*key), self.confirm)
            .await?;
        Ok(resp.key)
    }

    /// Generate a random key pair on-device
    pub async fn random_key_pair(&self) -> Result<RandomKeyPairResp, Error> {
        debug!("requesting random key pair");

        self.request(&RandomKeyPairReq, self.confirm).await
    }

    /// Fetch the wallet public address
    pub async fn address(&self, confirm: bool) -> Result<String, Error> {
        debug!("requesting wallet address");

        let resp: AddressResp = self.request(&AddressReq, confirm).await?;
        Ok(resp.address)
    }

    /// Generate the key image for an owned output
    pub async fn generate_key_image(
        &self,
        tx_public_key: &PublicKey,
        output_index: u32,
        output_key: &PublicKey,
        confirm: bool,
    ) -> Result<KeyImage, Error> {
        debug!("requesting key image for output {output_index} of {tx_public_key}");

        let req = GenerateKeyImageReq::new(*tx_public_key, output_index, *output_key);
        let resp: KeyImageResp = self.request(&req, confirm).await?;

        Ok(resp.key_image)
    }

    /// Generate ring signatures for an input.
    ///
    /// The returned signature count always equals the supplied key count.
    pub async fn generate_ring_signatures(
        &self,
        tx_public_key: &PublicKey,
        output_index: u32,
        output_key: &PublicKey,
        prefix_hash: &Hash,
        input_keys: &[PublicKey],
        real_output_index: u32,
        confirm: bool,
    ) -> Result<Vec<Signature>, Error> {
        if input_keys.is_empty() {
            return Err(Error::InvalidArgument(
                "ring signature generation requires at least one input key".into(),
            ));
        }

        if (real_output_index as usize) >= input_keys.len() {
            return Err(Error::InvalidArgument(format!(
                "real output index {} outside ring of {}",
                real_output_index,
                input_keys.len()
            )));
        }

        debug!("requesting {} ring signatures", input_keys.len());

        let req = GenerateRingSignaturesReq::new(
            *tx_public_key,
            output_index,
            *output_key,
            *prefix_hash,
            input_keys.to_vec(),
            real_output_index,
        );
        let resp: RingSignaturesResp = self.request(&req, confirm).await?;

        if resp.signatures.len() != input_keys.len() {
            return Err(Error::UnexpectedResponse(format!(
                "expected {} ring signatures, device returned {}",
                input_keys.len(),
                resp.signatures.len()
            )));
        }

        Ok(resp.signatures)
    }

    /// Complete a partially prepared ring signature
    pub async fn complete_ring_signature(
        &self,
        tx_public_key: &PublicKey,
        output_index: u32,
        output_key: &PublicKey,
        k: &SecretKey,
        signature: &Signature,
        confirm: bool,
    ) -> Result<Signature, Error> {
        debug!("requesting ring signature completion");

        let req =
            CompleteRingSignatureReq::new(*tx_public_key, output_index, *output_key, *k, *signature);
        let resp: SignatureResp = self.request(&req, confirm).await?;

        Ok(resp.signature)
    }

    /// Check a full set of ring signatures
    pub async fn check_ring_signatures(
        &self,
        prefix_hash: &Hash,
        key_image: &KeyImage,
        public_keys: &[PublicKey],
        signatures: &[Signature],
    ) -> Result<bool, Error> {
        if public_keys.is_empty() || public_keys.len() != signatures.len() {
            return Err(Error::InvalidArgument(format!(
                "ring signature check requires matching key and signature counts ({} vs {})",
                public_keys.len(),
                signatures.len()
            )));
        }

        debug!("checking {} ring signatures", signatures.len());

        let req = CheckRingSignaturesReq::new(
            *prefix_hash,
            *key_image,
            public_keys.to_vec(),
            signatures.to_vec(),
        );
        let resp: ValidResp = self.request(&req, self.confirm).await?;

        Ok(resp.valid)
    }

    /// Sign a 32-byte digest with the device spend key
    pub async fn generate_signature(
        &self,
        digest: &Hash,
        confirm: bool,
    ) -> Result<Signature, Error> {
        debug!("requesting signature over {digest}");

        let resp: SignatureResp = self
            .request(&GenerateSignatureReq::new(*digest), confirm)
            .await?;

        Ok(resp.signature)
    }

    /// Check a signature over a 32-byte digest
    pub async fn check_signature(
        &self,
        digest: &Hash,
        public_key: &PublicKey,
        signature: &Signature,
    ) -> Result<bool, Error> {
        debug!("checking signature over {digest}");

        let req = CheckSignatureReq::new(*digest, *public_key, *signature);
        let resp: ValidResp = self.request(&req, self.confirm).await?;

        Ok(resp.valid)
    }

    /// Generate a key derivation from a transaction public key
    pub async fn generate_key_derivation(
        &self,
        tx_public_key: &PublicKey,
    ) -> Result<Derivation, Error> {
        debug!("requesting key derivation for {tx_public_key}");

        let resp: DerivationResp = self
            .request(&GenerateKeyDerivationReq::new(*tx_public_key), self.confirm)
            .await?;

        Ok(resp.derivation)
    }

    /// Derive a public ephemeral from a derivation
    pub async fn derive_public_key(
        &self,
        derivation: &Derivation,
        output_index: u32,
    ) -> Result<PublicKey, Error> {
        debug!("requesting public ephemeral for output {output_index}");

        let resp: PublicKeyResp = self
            .request(
                &DerivePublicKeyReq::new(*derivation, output_index),
                self.confirm,
            )
            .await?;

        Ok(resp.key)
    }

    /// Derive a secret ephemeral from a derivation
    pub async fn derive_secret_key(
        &self,
        derivation: &Derivation,
        output_index: u32,
    ) -> Result<SecretKey, Error> {
        debug!("requesting secret ephemeral for output {output_index}");

        let resp: SecretKeyResp = self
            .request(
                &DeriveSecretKeyReq::new(*derivation, output_index),
                self.confirm,
            )
            .await?;

        Ok(resp.key)
    }

    /// Fetch the transaction construction state
    pub async fn tx_state(&self) -> Result<TxState, Error> {
        let resp: TxStateResp = self.request(&TxStateReq, self.confirm).await?;

        debug!("transaction state: {}", resp.state);

        Ok(resp.state)
    }

    /// Begin transaction construction
    pub async fn tx_start(
        &self,
        unlock_time: u64,
        input_count: usize,
        output_count: usize,
        tx_public_key: &PublicKey,
        payment_id: Option<&Hash>,
    ) -> Result<(), Error> {
        if input_count > TX_MAX_PARTICIPANTS || output_count > TX_MAX_PARTICIPANTS {
            return Err(Error::InvalidArgument(format!(
                "transaction participant counts limited to {TX_MAX_PARTICIPANTS} \
                 ({input_count} inputs, {output_count} outputs requested)"
            )));
        }

        debug!("starting transaction ({input_count} inputs, {output_count} outputs)");

        let req = TxStartReq::new(
            unlock_time,
            input_count as u8,
            output_count as u8,
            *tx_public_key,
            payment_id.copied(),
        );

        self.request(&req, self.confirm).await
    }

    /// Begin the input loading phase
    pub async fn tx_start_input_load(&self) -> Result<(), Error> {
        debug!("starting input load");

        self.request(&TxStartInputLoadReq, self.confirm).await
    }

    /// Load a single transaction input with its mix ring
    pub async fn tx_load_input(
        &self,
        input_tx_public_key: &PublicKey,
        input_output_index: u32,
        amount: u64,
        ring_keys: &[PublicKey],
        relative_offsets: &[u32],
        real_output_index: usize,
    ) -> Result<(), Error> {
        if input_output_index > u8::MAX as u32 {
            return Err(Error::InvalidArgument(format!(
                "input output index {input_output_index} exceeds device maximum of 255"
            )));
        }

        if ring_keys.len() != RING_PARTICIPANTS || relative_offsets.len() != RING_PARTICIPANTS {
            return Err(Error::InvalidArgument(format!(
                "device rings carry exactly {RING_PARTICIPANTS} keys and offsets \
                 ({} keys, {} offsets supplied)",
                ring_keys.len(),
                relative_offsets.len()
            )));
        }

        if real_output_index >= RING_PARTICIPANTS {
            return Err(Error::InvalidArgument(format!(
                "real output index {real_output_index} outside ring of {RING_PARTICIPANTS}"
            )));
        }

        debug!("loading input (amount: {amount})");

        let mut keys = [PublicKey::default(); RING_PARTICIPANTS];
        keys.copy_from_slice(ring_keys);

        let mut offsets = [0u32; RING_PARTICIPANTS];
        offsets.copy_from_slice(relative_offsets);

        let req = TxLoadInputReq {
            input_tx_public_key: *input_tx_public_key,
            input_output_index: input_output_index as u8,
            amount,
            ring_keys: keys,
            relative_offsets: offsets,
            real_output_index: real_output_index as u8,
        };

        self.request(&req, self.confirm).await
    }

    /// Begin the output loading phase
    pub async fn tx_start_output_load(&self) -> Result<(), Error> {
        debug!("starting output load");

        self.request(&TxStartOutputLoadReq, self.confirm).await
    }

    /// Load a single transaction output
    pub async fn tx_load_output(&self, amount: u64, output_key: &PublicKey) -> Result<(), Error> {
        debug!("loading output (amount: {amount})");

        self.request(&TxLoadOutputReq::new(amount, *output_key), self.confirm)
            .await
    }

    /// Finalise the transaction prefix
    pub async fn tx_finalize_tx_prefix(&self) -> Result<(), Error> {
        debug!("finalising transaction prefix");

        self.request(&TxFinalizePrefixReq, self.confirm).await
    }

    /// Sign the constructed transaction, returning its hash and size
    pub async fn tx_sign(&self, confirm: bool) -> Result<TxSignResp, Error> {
        debug!("requesting transaction signature");

        self.request(&TxSignReq, confirm).await
    }

    /// Fetch a chunk of the constructed transaction from the given offset
    pub async fn tx_dump(&self, offset: u16) -> Result<Vec<u8>, Error> {
        debug!("dumping transaction from offset {offset}");

        let resp: TxDumpResp = self.request(&TxDumpReq::new(offset), self.confirm).await?;
        Ok(resp.bytes)
    }

    /// Reset the transaction construction state machine
    pub async fn tx_reset(&self) -> Result<(), Error> {
        debug!("resetting transaction state");

        self.request(&TxResetReq, self.confirm).await
    }

    /// Reset cached wallet keys on the device
    pub async fn reset_keys(&self, confirm: bool) -> Result<(), Error> {
        debug!("resetting wallet keys");

        self.request(&ResetKeysReq, confirm).await
    }
}
