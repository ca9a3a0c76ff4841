// Copyright (c) 2022-2023 The TurtleCoin Developers

//! Transaction input preparation
//!
//! Assembles the mix ring for each real input: decoys drawn from the
//! supplied pool, the real member inserted, members sorted ascending by
//! global index.

use std::collections::HashSet;

use crate::{
    types::{PreparedInput, RandomOutput, RingMember, TransactionOutput},
    Error,
};

/// Assemble mix rings for a set of owned inputs.
///
/// For each input the first `mixin` pool members with a global index
/// distinct from the real output (and from each other) become decoys; the
/// real member is appended and the ring sorted ascending by global index.
pub fn prepare_inputs(
    inputs: &[TransactionOutput],
    random_outputs: &[Vec<RandomOutput>],
    mixin: usize,
) -> Result<Vec<PreparedInput>, Error> {
    let mut prepared = Vec::with_capacity(inputs.len());

    for (i, input) in inputs.iter().enumerate() {
        let recovery = input.input.as_ref().ok_or_else(|| {
            Error::InvalidArgument("input is missing its recovery data".into())
        })?;
        let key_image = input.key_image.ok_or_else(|| {
            Error::InvalidArgument("input is missing its key image".into())
        })?;

        let pool = random_outputs.get(i).map(Vec::as_slice).unwrap_or(&[]);

        let mut members = Vec::with_capacity(mixin + 1);
        let mut seen = HashSet::new();
        seen.insert(input.global_index);

        for candidate in pool {
            if members.len() == mixin {
                break;
            }

            if !seen.insert(candidate.global_index) {
                continue;
            }

            members.push(RingMember {
                key: candidate.key,
                index: candidate.global_index,
            });
        }

        if members.len() < mixin {
            return Err(Error::InvalidArgument(format!(
                "not enough random outputs to complete the ring ({} usable, {mixin} required)",
                members.len()
            )));
        }

        members.push(RingMember {
            key: input.key,
            index: input.global_index,
        });

        members.sort_by_key(|m| m.index);

        let real_output_index = match members.iter().position(|m| m.index == input.global_index) {
            Some(position) => position,
            None => {
                return Err(Error::InvalidArgument(
                    "real output missing from the assembled ring".into(),
                ))
            }
        };

        prepared.push(PreparedInput {
            amount: input.amount,
            key_image,
            transaction_keys: recovery.transaction_keys,
            outputs: members,
            real_output_index,
        });
    }

    Ok(prepared)
}
