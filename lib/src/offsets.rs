// Copyright (c) 2022-2023 The TurtleCoin Developers

//! Global output index offset arithmetic
//!
//! On-chain ring members are referenced by relative offsets: the first entry
//! is absolute, each subsequent entry is the delta from its predecessor.
//! Inputs are expected sorted ascending.

/// Convert absolute offsets to relative form
pub fn absolute_to_relative(offsets: &[u64]) -> Vec<u64> {
    let mut out = Vec::with_capacity(offsets.len());
    let mut last = 0u64;

    for (i, &offset) in offsets.iter().enumerate() {
        match i {
            0 => out.push(offset),
            _ => out.push(offset - last),
        }
        last = offset;
    }

    out
}

/// Convert relative offsets back to absolute form
pub fn relative_to_absolute(offsets: &[u64]) -> Vec<u64> {
    let mut out = Vec::with_capacity(offsets.len());
    let mut sum = 0u64;

    for &offset in offsets {
        sum += offset;
        out.push(sum);
    }

    out
}

#[cfg(test)]
mod test {
    use rand::Rng;

    use super::*;

    #[test]
    fn known_vector() {
        let absolute = [5, 9, 14, 14, 20];
        let relative = absolute_to_relative(&absolute);

        assert_eq!(relative, vec![5, 4, 5, 0, 6]);
        assert_eq!(relative_to_absolute(&relative), absolute);
    }

    #[test]
    fn empty_and_single() {
        assert!(absolute_to_relative(&[]).is_empty());
        assert_eq!(absolute_to_relative(&[42]), vec![42]);
        assert_eq!(relative_to_absolute(&[42]), vec![42]);
    }

    #[test]
    fn random_round_trip() {
        let mut rng = rand::thread_rng();

        for _ in 0..100 {
            let mut absolute: Vec<u64> = (0..rng.gen_range(1..32))
                .map(|_| rng.gen_range(0..1_000_000))
                .collect();
            absolute.sort_unstable();

            let relative = absolute_to_relative(&absolute);
            assert_eq!(relative_to_absolute(&relative), absolute);
        }
    }
}
