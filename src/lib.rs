//! Cauchy-matrix RAID erasure coding
//!
//! A stripe of `num_data` data blocks (up to 128) is protected by
//! `num_parity` parity blocks (up to 128). Parity comes from a generalized
//! Cauchy generator matrix over GF(2^8) whose first row and column are all
//! ones: parity 0 is plain XOR parity (RAID5), the first two parity blocks
//! together behave like RAID6, and any `num_parity` lost blocks can be
//! rebuilt from the survivors.
//!
//! # Example
//!
//! ```
//! use cauchy_raid::{StripeLayout, BLOCK_SIZE};
//!
//! // 4 data + 2 parity
//! let layout = StripeLayout::new(4, 2).unwrap();
//! let data: Vec<Vec<u8>> = (0..4).map(|i| vec![i as u8 + 1; BLOCK_SIZE]).collect();
//! let mut parity = vec![vec![0u8; BLOCK_SIZE]; 2];
//! {
//!     let data_refs: Vec<Option<&[u8]>> = data.iter().map(|d| Some(d.as_slice())).collect();
//!     let mut parity_refs: Vec<&mut [u8]> = parity.iter_mut().map(|p| p.as_mut_slice()).collect();
//!     layout.encode(&data_refs, &mut parity_refs).unwrap();
//! }
//!
//! // Lose data blocks 1 and 3
//! let pattern = layout.loss_pattern(&[1, 3], &[]).unwrap();
//! let sizes = pattern.sizes();
//! let mut storage = vec![0u8; sizes.matrix_storage];
//! let mut scratch = vec![0u8; sizes.scratch_space];
//! let decoder = layout.decoder(&pattern, &mut storage, &mut scratch).unwrap();
//!
//! // Survivors: data in ascending order, then parity in ascending order
//! let remaining: Vec<&[u8]> = vec![
//!     data[0].as_slice(),
//!     data[2].as_slice(),
//!     parity[0].as_slice(),
//!     parity[1].as_slice(),
//! ];
//! let mut recovered = vec![vec![0u8; BLOCK_SIZE]; 2];
//! let mut lost: Vec<&mut [u8]> = recovered.iter_mut().map(|r| r.as_mut_slice()).collect();
//! layout.decode(&decoder, &mut lost, &remaining).unwrap();
//! assert_eq!(recovered[0], data[1]);
//! assert_eq!(recovered[1], data[3]);
//! ```
//!
//! # Modules
//!
//! - `gf256`: GF(2^8) arithmetic
//! - `cauchy`: generator matrix coefficients
//! - `xorgf`: block multiply-accumulate backends
//! - `matrix`: Gauss-Jordan inversion
//! - `encode`: parity computation and incremental update
//! - `decode`: loss patterns and lost-block recovery
//!
//! The module-level functions and [`Decoder::decode`] are unchecked hot
//! paths. [`StripeLayout`] wraps them with count and size validation.

pub mod cauchy;
mod decode;
mod encode;
mod error;
pub mod gf256;
pub mod matrix;
pub mod xorgf;

pub use decode::{Decoder, DecoderMode, DecoderSizes, LossPattern};
pub use encode::{encode, encode_modify, encode_modify_with, encode_with};
pub use error::RaidError;
pub use xorgf::{BitSliced, ByteWise, MulAcc};

/// Default block size in bytes
pub const BLOCK_SIZE: usize = 4096;

/// Block lengths must be a multiple of this for the bit-sliced backend:
/// 8 bit-planes of one 64-bit word each
pub const BLOCK_ALIGN: usize = 64;

/// Upper bound on both data and parity block counts
pub const MAX_BLOCKS: usize = 128;

/// Stripe geometry with checked encode/decode entry points
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StripeLayout {
    /// Number of data blocks
    pub num_data: usize,
    /// Number of parity blocks
    pub num_parity: usize,
}

impl StripeLayout {
    /// Create a layout with `num_data` data and `num_parity` parity blocks
    ///
    /// # Parameters
    /// - `num_data`: 1 to 128
    /// - `num_parity`: 1 to 128
    pub fn new(num_data: usize, num_parity: usize) -> Result<Self, RaidError> {
        if num_data < 1 || num_data > MAX_BLOCKS {
            return Err(RaidError::InvalidParameters(format!(
                "num_data must be in range [1, {}], got {}",
                MAX_BLOCKS, num_data
            )));
        }
        if num_parity < 1 || num_parity > MAX_BLOCKS {
            return Err(RaidError::InvalidParameters(format!(
                "num_parity must be in range [1, {}], got {}",
                MAX_BLOCKS, num_parity
            )));
        }
        Ok(StripeLayout {
            num_data,
            num_parity,
        })
    }

    /// Total blocks in a stripe
    pub fn num_blocks(&self) -> usize {
        self.num_data + self.num_parity
    }

    /// Compute parity for a full stripe
    ///
    /// # Parameters
    /// - `data_blocks`: exactly `num_data` entries; `None` is an all-zero block
    /// - `parity_blocks`: exactly `num_parity` output blocks
    ///
    /// Every present block must have the same length, a non-zero multiple
    /// of [`BLOCK_ALIGN`].
    pub fn encode(
        &self,
        data_blocks: &[Option<&[u8]>],
        parity_blocks: &mut [&mut [u8]],
    ) -> Result<(), RaidError> {
        self.encode_with(&BitSliced, data_blocks, parity_blocks)
    }

    /// [`encode`](Self::encode) with an explicit multiply-accumulate backend
    pub fn encode_with<M: MulAcc + ?Sized>(
        &self,
        mul_acc: &M,
        data_blocks: &[Option<&[u8]>],
        parity_blocks: &mut [&mut [u8]],
    ) -> Result<(), RaidError> {
        check_count(self.num_data, data_blocks.len())?;
        check_count(self.num_parity, parity_blocks.len())?;
        check_block_sizes(
            data_blocks
                .iter()
                .copied()
                .chain(parity_blocks.iter().map(|p| Some(&**p))),
        )?;
        encode::encode_with(mul_acc, data_blocks, parity_blocks);
        Ok(())
    }

    /// Fold a change of one data block into existing parity
    ///
    /// # Parameters
    /// - `delta`: old contents XOR new contents of the data block
    /// - `data_idx`: which data block changed
    /// - `parity_blocks`: exactly `num_parity` blocks, updated in place
    pub fn encode_modify(
        &self,
        delta: &[u8],
        data_idx: usize,
        parity_blocks: &mut [&mut [u8]],
    ) -> Result<(), RaidError> {
        self.encode_modify_with(&BitSliced, delta, data_idx, parity_blocks)
    }

    /// [`encode_modify`](Self::encode_modify) with an explicit multiply-accumulate backend
    pub fn encode_modify_with<M: MulAcc + ?Sized>(
        &self,
        mul_acc: &M,
        delta: &[u8],
        data_idx: usize,
        parity_blocks: &mut [&mut [u8]],
    ) -> Result<(), RaidError> {
        if data_idx >= self.num_data {
            return Err(RaidError::InvalidParameters(format!(
                "data index {} out of range [0, {})",
                data_idx, self.num_data
            )));
        }
        check_count(self.num_parity, parity_blocks.len())?;
        check_block_sizes(
            std::iter::once(Some(delta)).chain(parity_blocks.iter().map(|p| Some(&**p))),
        )?;
        encode::encode_modify_with(mul_acc, delta, data_idx, parity_blocks);
        Ok(())
    }

    /// Validate a loss pattern against this layout
    ///
    /// Both index lists must be strictly ascending. At least one data block
    /// must be lost, and no more than `num_parity` blocks in total.
    pub fn loss_pattern<'p>(
        &self,
        lost_data: &'p [usize],
        lost_parity: &'p [usize],
    ) -> Result<LossPattern<'p>, RaidError> {
        LossPattern::new(self.num_data, self.num_parity, lost_data, lost_parity)
    }

    /// Build a decoder for `pattern`
    ///
    /// Size `matrix_storage` and `scratch_space` from
    /// [`LossPattern::sizes`]. The decoder borrows `matrix_storage` for as
    /// long as it lives; `scratch_space` is free again once this returns.
    pub fn decoder<'a>(
        &self,
        pattern: &LossPattern<'_>,
        matrix_storage: &'a mut [u8],
        scratch_space: &mut [u8],
    ) -> Result<Decoder<'a>, RaidError> {
        if pattern.num_data() != self.num_data || pattern.num_parity() != self.num_parity {
            return Err(RaidError::InvalidLossPattern(format!(
                "pattern is for {} data + {} parity, layout is {} + {}",
                pattern.num_data(),
                pattern.num_parity(),
                self.num_data,
                self.num_parity
            )));
        }
        Decoder::new(pattern, matrix_storage, scratch_space)
    }

    /// Rebuild lost data blocks with a decoder from [`decoder`](Self::decoder)
    ///
    /// # Parameters
    /// - `lost_data_blocks`: one output per lost data block, ascending index
    /// - `remaining_blocks`: surviving data blocks (ascending), then
    ///   surviving parity blocks (ascending); at least
    ///   [`Decoder::num_remaining`] of them
    pub fn decode(
        &self,
        decoder: &Decoder<'_>,
        lost_data_blocks: &mut [&mut [u8]],
        remaining_blocks: &[&[u8]],
    ) -> Result<(), RaidError> {
        self.decode_with(&BitSliced, decoder, lost_data_blocks, remaining_blocks)
    }

    /// [`decode`](Self::decode) with an explicit multiply-accumulate backend
    pub fn decode_with<M: MulAcc + ?Sized>(
        &self,
        mul_acc: &M,
        decoder: &Decoder<'_>,
        lost_data_blocks: &mut [&mut [u8]],
        remaining_blocks: &[&[u8]],
    ) -> Result<(), RaidError> {
        if decoder.num_data() != self.num_data || decoder.num_parity() != self.num_parity {
            return Err(RaidError::InvalidParameters(format!(
                "decoder is for {} data + {} parity, layout is {} + {}",
                decoder.num_data(),
                decoder.num_parity(),
                self.num_data,
                self.num_parity
            )));
        }
        check_count(decoder.num_lost_data(), lost_data_blocks.len())?;
        if remaining_blocks.len() < decoder.num_remaining() {
            return Err(RaidError::BlockCountMismatch {
                expected: decoder.num_remaining(),
                actual: remaining_blocks.len(),
            });
        }
        check_block_sizes(
            remaining_blocks[..decoder.num_remaining()]
                .iter()
                .map(|r| Some(*r))
                .chain(lost_data_blocks.iter().map(|l| Some(&**l))),
        )?;
        decoder.decode_with(mul_acc, lost_data_blocks, remaining_blocks);
        Ok(())
    }
}

fn check_count(expected: usize, actual: usize) -> Result<(), RaidError> {
    if expected != actual {
        return Err(RaidError::BlockCountMismatch { expected, actual });
    }
    Ok(())
}

/// All present blocks share one length, a non-zero multiple of [`BLOCK_ALIGN`].
/// Indices in errors count absent blocks too.
fn check_block_sizes<'b>(blocks: impl IntoIterator<Item = Option<&'b [u8]>>) -> Result<(), RaidError> {
    let mut first_size = None;
    for (idx, block) in blocks.into_iter().enumerate() {
        let Some(block) = block else { continue };
        match first_size {
            None => {
                if block.is_empty() || block.len() % BLOCK_ALIGN != 0 {
                    return Err(RaidError::InvalidBlockSize {
                        expected: BLOCK_ALIGN,
                        actual: block.len(),
                    });
                }
                first_size = Some(block.len());
            }
            Some(first) if block.len() != first => {
                return Err(RaidError::InconsistentBlockSizes {
                    first_size: first,
                    mismatched_idx: idx,
                    mismatched_size: block.len(),
                });
            }
            Some(_) => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_blocks(count: usize, len: usize, seed: u64) -> Vec<Vec<u8>> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count).map(|_| (0..len).map(|_| rng.gen()).collect()).collect()
    }

    fn encode_stripe(layout: &StripeLayout, data: &[Vec<u8>]) -> Vec<Vec<u8>> {
        let len = data[0].len();
        let data_refs: Vec<Option<&[u8]>> = data.iter().map(|d| Some(d.as_slice())).collect();
        let mut parity = vec![vec![0u8; len]; layout.num_parity];
        let mut parity_refs: Vec<&mut [u8]> = parity.iter_mut().map(|p| p.as_mut_slice()).collect();
        layout.encode(&data_refs, &mut parity_refs).unwrap();
        parity
    }

    #[test]
    fn test_basic_encode_decode() {
        let layout = StripeLayout::new(4, 2).unwrap();
        let data = random_blocks(4, BLOCK_SIZE, 1);
        let parity = encode_stripe(&layout, &data);
        assert_eq!(parity.len(), 2);

        let pattern = layout.loss_pattern(&[0], &[]).unwrap();
        let mut storage = vec![0u8; pattern.sizes().matrix_storage];
        let mut scratch = vec![0u8; pattern.sizes().scratch_space];
        let decoder = layout.decoder(&pattern, &mut storage, &mut scratch).unwrap();
        assert_eq!(decoder.mode(), DecoderMode::ParityXor);

        let remaining: Vec<&[u8]> = vec![
            data[1].as_slice(),
            data[2].as_slice(),
            data[3].as_slice(),
            parity[0].as_slice(),
            parity[1].as_slice(),
        ];
        let mut recovered = vec![0u8; BLOCK_SIZE];
        layout
            .decode(&decoder, &mut [recovered.as_mut_slice()], &remaining)
            .unwrap();
        assert_eq!(recovered, data[0]);
    }

    #[test]
    fn test_decode_with_erasures() {
        let layout = StripeLayout::new(5, 3).unwrap();
        let data = random_blocks(5, BLOCK_ALIGN * 4, 2);
        let parity = encode_stripe(&layout, &data);

        let patterns: Vec<(Vec<usize>, Vec<usize>)> = vec![
            (vec![4], vec![0]),
            (vec![0, 1], vec![]),
            (vec![0, 2, 4], vec![]),
            (vec![3], vec![0, 1]),
            (vec![1, 2], vec![2]),
        ];
        for (lost_data, lost_parity) in patterns {
            let pattern = layout.loss_pattern(&lost_data, &lost_parity).unwrap();
            let mut storage = vec![0u8; pattern.sizes().matrix_storage];
            let mut scratch = vec![0u8; pattern.sizes().scratch_space];
            let decoder = layout.decoder(&pattern, &mut storage, &mut scratch).unwrap();

            let remaining: Vec<&[u8]> = (0..5)
                .filter(|i| !lost_data.contains(i))
                .map(|i| data[i].as_slice())
                .chain(
                    (0..3)
                        .filter(|j| !lost_parity.contains(j))
                        .map(|j| parity[j].as_slice()),
                )
                .collect();
            let mut recovered = vec![vec![0u8; BLOCK_ALIGN * 4]; lost_data.len()];
            let mut lost: Vec<&mut [u8]> = recovered.iter_mut().map(|r| r.as_mut_slice()).collect();
            layout.decode(&decoder, &mut lost, &remaining).unwrap();

            for (k, &idx) in lost_data.iter().enumerate() {
                assert_eq!(
                    recovered[k], data[idx],
                    "Failed for lost data {:?}, lost parity {:?}",
                    lost_data, lost_parity
                );
            }
        }
    }

    #[test]
    fn test_parameters() {
        let layout = StripeLayout::new(10, 4).unwrap();
        assert_eq!(layout.num_data, 10);
        assert_eq!(layout.num_parity, 4);
        assert_eq!(layout.num_blocks(), 14);

        let widest = StripeLayout::new(MAX_BLOCKS, MAX_BLOCKS).unwrap();
        assert_eq!(widest.num_blocks(), 256);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(StripeLayout::new(0, 2).is_err());
        assert!(StripeLayout::new(4, 0).is_err());
        assert!(StripeLayout::new(129, 2).is_err());
        assert!(StripeLayout::new(4, 129).is_err());
        assert!(matches!(
            StripeLayout::new(0, 2),
            Err(RaidError::InvalidParameters(ref msg)) if msg.contains("num_data")
        ));
    }

    #[test]
    fn test_encode_modify() {
        let layout = StripeLayout::new(6, 3).unwrap();
        let mut data = random_blocks(6, BLOCK_ALIGN, 3);
        let mut parity = encode_stripe(&layout, &data);

        let new_block = random_blocks(1, BLOCK_ALIGN, 4).remove(0);
        let delta: Vec<u8> = data[2].iter().zip(&new_block).map(|(a, b)| a ^ b).collect();
        data[2] = new_block;
        {
            let mut parity_refs: Vec<&mut [u8]> = parity.iter_mut().map(|p| p.as_mut_slice()).collect();
            layout.encode_modify(&delta, 2, &mut parity_refs).unwrap();
        }
        assert_eq!(parity, encode_stripe(&layout, &data));
    }

    #[test]
    fn test_encode_wrong_block_count() {
        let layout = StripeLayout::new(4, 2).unwrap();
        let data = random_blocks(3, BLOCK_ALIGN, 5);
        let data_refs: Vec<Option<&[u8]>> = data.iter().map(|d| Some(d.as_slice())).collect();
        let mut parity = vec![vec![0u8; BLOCK_ALIGN]; 2];
        let mut parity_refs: Vec<&mut [u8]> = parity.iter_mut().map(|p| p.as_mut_slice()).collect();
        let result = layout.encode(&data_refs, &mut parity_refs);
        assert!(
            matches!(result, Err(RaidError::BlockCountMismatch { expected: 4, actual: 3 })),
            "Expected BlockCountMismatch, got {:?}",
            result
        );
    }

    #[test]
    fn test_encode_unaligned_block() {
        let layout = StripeLayout::new(2, 1).unwrap();
        let data = random_blocks(2, BLOCK_ALIGN + 1, 6);
        let data_refs: Vec<Option<&[u8]>> = data.iter().map(|d| Some(d.as_slice())).collect();
        let mut parity = vec![0u8; BLOCK_ALIGN + 1];
        let result = layout.encode(&data_refs, &mut [parity.as_mut_slice()]);
        assert!(
            matches!(result, Err(RaidError::InvalidBlockSize { expected: BLOCK_ALIGN, actual: 65 })),
            "Expected InvalidBlockSize, got {:?}",
            result
        );

        let empty_block: &[u8] = &[];
        let mut empty_parity: Vec<u8> = Vec::new();
        let result = layout.encode(&[Some(empty_block), Some(empty_block)], &mut [empty_parity.as_mut_slice()]);
        assert!(matches!(result, Err(RaidError::InvalidBlockSize { actual: 0, .. })));
    }

    #[test]
    fn test_encode_inconsistent_block_sizes() {
        let layout = StripeLayout::new(3, 1).unwrap();
        let mut data = random_blocks(3, BLOCK_ALIGN, 7);
        data[2] = vec![0u8; BLOCK_ALIGN * 2];
        let data_refs: Vec<Option<&[u8]>> = vec![None, Some(data[1].as_slice()), Some(data[2].as_slice())];
        let mut parity = vec![0u8; BLOCK_ALIGN];
        let result = layout.encode(&data_refs, &mut [parity.as_mut_slice()]);
        assert_eq!(
            result,
            Err(RaidError::InconsistentBlockSizes {
                first_size: BLOCK_ALIGN,
                mismatched_idx: 2,
                mismatched_size: BLOCK_ALIGN * 2,
            })
        );
    }

    #[test]
    fn test_encode_modify_invalid_index() {
        let layout = StripeLayout::new(4, 2).unwrap();
        let delta = vec![1u8; BLOCK_ALIGN];
        let mut parity = vec![vec![0u8; BLOCK_ALIGN]; 2];
        let mut parity_refs: Vec<&mut [u8]> = parity.iter_mut().map(|p| p.as_mut_slice()).collect();
        let result = layout.encode_modify(&delta, 4, &mut parity_refs);
        assert!(matches!(result, Err(RaidError::InvalidParameters(ref msg)) if msg.contains("out of range")));
    }

    #[test]
    fn test_decode_too_many_erasures() {
        let layout = StripeLayout::new(4, 2).unwrap();
        let result = layout.loss_pattern(&[0, 1, 2], &[]);
        assert!(
            matches!(result, Err(RaidError::TooManyErasures { max: 2, actual: 3 })),
            "Expected TooManyErasures error, got {:?}",
            result
        );
    }

    #[test]
    fn test_decoder_pattern_from_other_layout() {
        let layout = StripeLayout::new(4, 2).unwrap();
        let other = StripeLayout::new(5, 2).unwrap();
        let pattern = other.loss_pattern(&[0, 1], &[]).unwrap();
        let mut storage = vec![0u8; pattern.sizes().matrix_storage];
        let mut scratch = vec![0u8; pattern.sizes().scratch_space];
        let result = layout.decoder(&pattern, &mut storage, &mut scratch);
        assert!(matches!(result, Err(RaidError::InvalidLossPattern(_))));
    }

    #[test]
    fn test_decode_wrong_remaining_count() {
        let layout = StripeLayout::new(4, 2).unwrap();
        let data = random_blocks(4, BLOCK_ALIGN, 8);
        let parity = encode_stripe(&layout, &data);

        let pattern = layout.loss_pattern(&[0, 1], &[]).unwrap();
        let mut storage = vec![0u8; pattern.sizes().matrix_storage];
        let mut scratch = vec![0u8; pattern.sizes().scratch_space];
        let decoder = layout.decoder(&pattern, &mut storage, &mut scratch).unwrap();

        // One survivor short
        let remaining: Vec<&[u8]> = vec![data[2].as_slice(), data[3].as_slice(), parity[0].as_slice()];
        let mut recovered = vec![vec![0u8; BLOCK_ALIGN]; 2];
        let mut lost: Vec<&mut [u8]> = recovered.iter_mut().map(|r| r.as_mut_slice()).collect();
        let result = layout.decode(&decoder, &mut lost, &remaining);
        assert!(matches!(result, Err(RaidError::BlockCountMismatch { expected: 4, actual: 3 })));

        // One output short
        let remaining: Vec<&[u8]> = vec![
            data[2].as_slice(),
            data[3].as_slice(),
            parity[0].as_slice(),
            parity[1].as_slice(),
        ];
        let result = layout.decode(&decoder, &mut lost[..1], &remaining);
        assert!(matches!(result, Err(RaidError::BlockCountMismatch { expected: 2, actual: 1 })));
    }

    #[test]
    fn test_decode_extra_survivors_ignored() {
        let layout = StripeLayout::new(3, 3).unwrap();
        let data = random_blocks(3, BLOCK_ALIGN, 9);
        let parity = encode_stripe(&layout, &data);

        let pattern = layout.loss_pattern(&[1], &[]).unwrap();
        let mut storage: Vec<u8> = Vec::new();
        let mut scratch: Vec<u8> = Vec::new();
        let decoder = layout.decoder(&pattern, &mut storage, &mut scratch).unwrap();
        assert_eq!(decoder.num_remaining(), 3);

        // All survivors handed over, including one with a bogus length past
        // the ones the decoder reads
        let bogus = vec![0u8; 7];
        let remaining: Vec<&[u8]> = vec![
            data[0].as_slice(),
            data[2].as_slice(),
            parity[0].as_slice(),
            bogus.as_slice(),
        ];
        let mut recovered = vec![0u8; BLOCK_ALIGN];
        layout
            .decode(&decoder, &mut [recovered.as_mut_slice()], &remaining)
            .unwrap();
        assert_eq!(recovered, data[1]);
    }

    #[test]
    fn test_random_data() {
        let mut rng = StdRng::seed_from_u64(10);
        for _ in 0..20 {
            let num_data = rng.gen_range(1..=24);
            let num_parity = rng.gen_range(1..=8);
            let layout = StripeLayout::new(num_data, num_parity).unwrap();
            let data = random_blocks(num_data, BLOCK_ALIGN * 2, rng.gen());
            let parity = encode_stripe(&layout, &data);

            // Random losses: at least one data block, within the parity budget
            let total_lost = rng.gen_range(1..=num_parity);
            let mut blocks: Vec<usize> = (0..num_data + num_parity).collect();
            let first = rng.gen_range(0..num_data);
            blocks.retain(|&b| b != first);
            let mut lost = vec![first];
            for _ in 1..total_lost {
                let pick = rng.gen_range(0..blocks.len());
                lost.push(blocks.swap_remove(pick));
            }
            let mut lost_data: Vec<usize> = lost.iter().copied().filter(|&b| b < num_data).collect();
            let mut lost_parity: Vec<usize> =
                lost.iter().filter(|&&b| b >= num_data).map(|&b| b - num_data).collect();
            lost_data.sort_unstable();
            lost_parity.sort_unstable();

            let pattern = layout.loss_pattern(&lost_data, &lost_parity).unwrap();
            let mut storage = vec![0u8; pattern.sizes().matrix_storage];
            let mut scratch = vec![0u8; pattern.sizes().scratch_space];
            let decoder = layout.decoder(&pattern, &mut storage, &mut scratch).unwrap();

            let remaining: Vec<&[u8]> = (0..num_data)
                .filter(|i| lost_data.binary_search(i).is_err())
                .map(|i| data[i].as_slice())
                .chain(
                    (0..num_parity)
                        .filter(|j| lost_parity.binary_search(j).is_err())
                        .map(|j| parity[j].as_slice()),
                )
                .collect();
            let mut recovered = vec![vec![0u8; BLOCK_ALIGN * 2]; lost_data.len()];
            let mut outs: Vec<&mut [u8]> = recovered.iter_mut().map(|r| r.as_mut_slice()).collect();
            layout.decode(&decoder, &mut outs, &remaining).unwrap();

            for (k, &idx) in lost_data.iter().enumerate() {
                assert_eq!(
                    recovered[k], data[idx],
                    "{}+{} lost data {:?} lost parity {:?}",
                    num_data, num_parity, lost_data, lost_parity
                );
            }
        }
    }

    #[test]
    fn test_bytewise_round_trip() {
        let layout = StripeLayout::new(6, 3).unwrap();
        let mut data = random_blocks(6, BLOCK_ALIGN * 2, 11);
        let mut parity = vec![vec![0u8; BLOCK_ALIGN * 2]; 3];
        {
            let data_refs: Vec<Option<&[u8]>> = data.iter().map(|d| Some(d.as_slice())).collect();
            let mut parity_refs: Vec<&mut [u8]> = parity.iter_mut().map(|p| p.as_mut_slice()).collect();
            layout.encode_with(&ByteWise, &data_refs, &mut parity_refs).unwrap();
        }

        // Byte-wise parity 1 is the plain field sum, byte by byte
        for byte in 0..BLOCK_ALIGN * 2 {
            let mut expected = 0u8;
            for (i, d) in data.iter().enumerate() {
                expected ^= gf256::mul(cauchy::coefficient(i, 1), d[byte]);
            }
            assert_eq!(parity[1][byte], expected);
        }

        let new_block = random_blocks(1, BLOCK_ALIGN * 2, 12).remove(0);
        let delta: Vec<u8> = data[5].iter().zip(&new_block).map(|(a, b)| a ^ b).collect();
        data[5] = new_block;
        {
            let mut parity_refs: Vec<&mut [u8]> = parity.iter_mut().map(|p| p.as_mut_slice()).collect();
            layout
                .encode_modify_with(&ByteWise, &delta, 5, &mut parity_refs)
                .unwrap();
        }

        let pattern = layout.loss_pattern(&[2, 5], &[0]).unwrap();
        let mut storage = vec![0u8; pattern.sizes().matrix_storage];
        let mut scratch = vec![0u8; pattern.sizes().scratch_space];
        let decoder = layout.decoder(&pattern, &mut storage, &mut scratch).unwrap();
        let remaining: Vec<&[u8]> = vec![
            data[0].as_slice(),
            data[1].as_slice(),
            data[3].as_slice(),
            data[4].as_slice(),
            parity[1].as_slice(),
            parity[2].as_slice(),
        ];
        let mut recovered = vec![vec![0u8; BLOCK_ALIGN * 2]; 2];
        let mut outs: Vec<&mut [u8]> = recovered.iter_mut().map(|r| r.as_mut_slice()).collect();
        layout
            .decode_with(&ByteWise, &decoder, &mut outs, &remaining)
            .unwrap();
        assert_eq!(recovered[0], data[2]);
        assert_eq!(recovered[1], data[5]);
    }

    #[test]
    fn test_decode_with_decoder_from_other_layout() {
        let layout = StripeLayout::new(4, 2).unwrap();
        let other = StripeLayout::new(4, 3).unwrap();
        let pattern = other.loss_pattern(&[0, 1], &[]).unwrap();
        let mut storage = vec![0u8; pattern.sizes().matrix_storage];
        let mut scratch = vec![0u8; pattern.sizes().scratch_space];
        let decoder = other.decoder(&pattern, &mut storage, &mut scratch).unwrap();

        // Counts and sizes would all pass; only the geometry is wrong
        let survivors = random_blocks(4, BLOCK_ALIGN, 13);
        let remaining: Vec<&[u8]> = survivors.iter().map(|s| s.as_slice()).collect();
        let mut recovered = vec![vec![0u8; BLOCK_ALIGN]; 2];
        let mut outs: Vec<&mut [u8]> = recovered.iter_mut().map(|r| r.as_mut_slice()).collect();
        let result = layout.decode(&decoder, &mut outs, &remaining);
        assert!(
            matches!(result, Err(RaidError::InvalidParameters(ref msg)) if msg.contains("decoder is for 4 data + 3 parity")),
            "Expected InvalidParameters for a foreign decoder, got {:?}",
            result
        );
        assert!(recovered.iter().all(|r| r.iter().all(|&b| b == 0)));
    }

    #[test]
    fn test_clone_and_debug() {
        let layout = StripeLayout::new(4, 2).unwrap();
        let copy = layout;
        assert_eq!(copy, layout);
        let debug_str = format!("{:?}", layout);
        assert!(debug_str.contains("StripeLayout"));
    }
}
