// Copyright (c) 2022-2023 The TurtleCoin Developers

//! Transaction output preparation
//!
//! Fetches fresh one-time transaction keys from the device and derives a
//! stealth output key for each destination.

use log::debug;

use ledger_cn_apdu::keys::RandomKeyPairResp;

use crate::{
    device::DeviceHandle,
    provider::CryptoProvider,
    transport::Exchange,
    types::{GeneratedOutput, PreparedOutput},
    Error,
};

/// Prepare stealth outputs for a set of destinations.
///
/// Destinations are sorted ascending by amount; output `i` receives the
/// one-time key `P = H_s(r·A, i)·G + B` where `r` is the fresh transaction
/// private key and `A`/`B` the destination view/spend keys.
pub async fn prepare_outputs<T: Exchange>(
    device: &DeviceHandle<T>,
    crypto: &dyn CryptoProvider,
    destinations: &[GeneratedOutput],
) -> Result<(RandomKeyPairResp, Vec<PreparedOutput>), Error> {
    let tx_keys = device.random_key_pair().await?;

    debug!(
        "preparing {} outputs for transaction key {}",
        destinations.len(),
        tx_keys.public
    );

    let mut sorted: Vec<&GeneratedOutput> = destinations.iter().collect();
    sorted.sort_by_key(|d| d.amount);

    let mut prepared = Vec::with_capacity(sorted.len());

    for (i, destination) in sorted.iter().enumerate() {
        let derivation = crypto
            .generate_key_derivation(&destination.destination.view, &tx_keys.private)?;
        let key = crypto.derive_public_key(
            &derivation,
            i as u32,
            &destination.destination.spend,
        )?;

        prepared.push(PreparedOutput {
            amount: destination.amount,
            key,
        });
    }

    Ok((tx_keys, prepared))
}
