// Copyright (c) 2022-2023 The TurtleCoin Developers

//! Network and wallet configuration
//!
//! All values are read at construction time. Deserialisation ignores
//! unrecognised keys and falls back to mainnet defaults for omitted ones.

use serde::{Deserialize, Serialize};

/// Client configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Decimal places in formatted money values
    pub coin_unit_places: u32,

    /// Base58 varint prefix for wallet addresses
    pub address_prefix: u64,

    /// Keccak iterations used by the crypto provider
    pub keccak_iterations: usize,

    /// Fallback network fee when none is supplied
    pub default_network_fee: u64,

    /// Minimum input count for zero-fee (fusion) transactions
    pub fusion_min_input_count: usize,

    /// Minimum input / output count ratio for fusion transactions
    pub fusion_min_in_out_count_ratio: usize,

    /// Per-output amount cap
    pub maximum_output_amount: u64,

    /// Per-transaction output count cap
    pub maximum_outputs_per_transaction: usize,

    /// Maximum permitted transaction extra size
    pub maximum_extra_size: usize,

    /// Whether fee-per-byte validation applies instead of the change check
    pub activate_fee_per_byte_transactions: bool,

    /// Fee charged per byte in fee-per-byte mode
    pub fee_per_byte: f64,

    /// Rounding chunk size for the fee-per-byte formula
    pub fee_per_byte_chunk_size: f64,

    /// Upper bound on the transaction size retrievable from the device
    pub maximum_ledger_transaction_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            coin_unit_places: 2,
            address_prefix: 3_914_525,
            keccak_iterations: 1,
            default_network_fee: 10,
            fusion_min_input_count: 12,
            fusion_min_in_out_count_ratio: 4,
            maximum_output_amount: 100_000_000_000,
            maximum_outputs_per_transaction: 90,
            maximum_extra_size: 1024,
            activate_fee_per_byte_transactions: false,
            fee_per_byte: 1.953_125,
            fee_per_byte_chunk_size: 256.0,
            maximum_ledger_transaction_size: 38_400,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_are_mainnet() {
        let c = Config::default();
        assert_eq!(c.coin_unit_places, 2);
        assert_eq!(c.address_prefix, 3_914_525);
        assert_eq!(c.fusion_min_input_count, 12);
    }

    #[test]
    fn deserialise_ignores_unknown_keys() {
        let c: Config = serde_json::from_str(
            r#"{"coinUnitPlaces": 8, "someFutureKey": true, "feePerByte": 1.9}"#,
        )
        .unwrap();

        assert_eq!(c.coin_unit_places, 8);
        assert_eq!(c.fee_per_byte, 1.9);
        // Omitted keys take defaults
        assert_eq!(c.default_network_fee, 10);
    }
}
