//! Recovery of lost data blocks
//!
//! A [`Decoder`] is built once for a particular loss pattern and can then
//! rebuild the lost data blocks of any number of stripes that share that
//! pattern. Three strategies exist, picked at setup:
//!
//! - **Mirror**: the stripe has a single data block, so every parity block
//!   is a copy of it.
//! - **ParityXor**: one data block lost and parity 0 (plain XOR parity)
//!   survived. XOR of all survivors gives the lost block back.
//! - **General**: anything else. The generator matrix restricted to the
//!   surviving rows is inverted once; decoding multiplies the survivors by
//!   the rows of the inverse that belong to the lost blocks.
//!
//! Survivors are always presented data first (ascending index), then
//! parity (ascending index).

use log::debug;

use crate::cauchy::coefficient;
use crate::error::RaidError;
use crate::matrix;
use crate::xorgf::{BitSliced, MulAcc};
use crate::MAX_BLOCKS;

/// Recovery strategy chosen from the loss pattern
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecoderMode {
    /// Single data block: copy any surviving parity block
    Mirror,
    /// One data block lost, parity 0 intact: XOR of the survivors
    ParityXor,
    /// Multiply survivors by an inverted generator submatrix
    General,
}

/// Buffer sizes a decoder needs for a given loss pattern
///
/// `matrix_storage` must outlive the decoder; `scratch_space` is only
/// used during setup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecoderSizes {
    pub matrix_storage: usize,
    pub scratch_space: usize,
}

/// Which blocks of a stripe are gone
///
/// Validated on construction: indices strictly ascending and in range, at
/// least one data block lost, and few enough losses that the surviving
/// parity can cover them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LossPattern<'p> {
    num_data: usize,
    num_parity: usize,
    lost_data: &'p [usize],
    lost_parity: &'p [usize],
}

impl<'p> LossPattern<'p> {
    pub fn new(
        num_data: usize,
        num_parity: usize,
        lost_data: &'p [usize],
        lost_parity: &'p [usize],
    ) -> Result<Self, RaidError> {
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
        if lost_data.is_empty() {
            return Err(RaidError::InvalidLossPattern(
                "at least one data block must be lost".into(),
            ));
        }
        check_indices("data", lost_data, num_data)?;
        check_indices("parity", lost_parity, num_parity)?;

        let lost = lost_data.len() + lost_parity.len();
        if lost > num_parity {
            return Err(RaidError::TooManyErasures {
                max: num_parity,
                actual: lost,
            });
        }

        Ok(LossPattern {
            num_data,
            num_parity,
            lost_data,
            lost_parity,
        })
    }

    pub fn num_data(&self) -> usize {
        self.num_data
    }

    pub fn num_parity(&self) -> usize {
        self.num_parity
    }

    pub fn lost_data(&self) -> &'p [usize] {
        self.lost_data
    }

    pub fn lost_parity(&self) -> &'p [usize] {
        self.lost_parity
    }

    /// Recovery strategy for this pattern
    pub fn mode(&self) -> DecoderMode {
        if self.num_data == 1 {
            return DecoderMode::Mirror;
        }
        // A single lost data block is plain RAID5 recovery as long as
        // parity 0 is still around.
        if self.lost_data.len() == 1 && self.lost_parity.first() != Some(&0) {
            return DecoderMode::ParityXor;
        }
        DecoderMode::General
    }

    /// Buffer sizes for [`Decoder::new`]
    pub fn sizes(&self) -> DecoderSizes {
        match self.mode() {
            DecoderMode::Mirror | DecoderMode::ParityXor => DecoderSizes::default(),
            DecoderMode::General => DecoderSizes {
                matrix_storage: self.num_data * self.num_data,
                scratch_space: matrix::scratch_space_size(self.num_data),
            },
        }
    }

    /// Number of surviving blocks `decode` reads
    pub fn num_remaining(&self) -> usize {
        match self.mode() {
            DecoderMode::Mirror => 1,
            DecoderMode::ParityXor | DecoderMode::General => self.num_data,
        }
    }
}

fn check_indices(kind: &str, indices: &[usize], count: usize) -> Result<(), RaidError> {
    if let Some(&idx) = indices.iter().find(|&&idx| idx >= count) {
        return Err(RaidError::InvalidLossPattern(format!(
            "lost {} index {} out of range [0, {})",
            kind, idx, count
        )));
    }
    if let Some(pair) = indices.windows(2).find(|pair| pair[0] >= pair[1]) {
        return Err(RaidError::InvalidLossPattern(format!(
            "lost {} indices must be strictly ascending, found {} before {}",
            kind, pair[0], pair[1]
        )));
    }
    Ok(())
}

/// Rebuilds lost data blocks for one loss pattern
///
/// Immutable once built. In General mode it borrows the caller's matrix
/// storage for its whole lifetime.
#[derive(Clone, Copy, Debug)]
pub struct Decoder<'a> {
    num_data: usize,
    num_parity: usize,
    mode: DecoderMode,
    num_remaining: usize,
    num_lost_data: usize,
    matrix: &'a [u8],
}

impl<'a> Decoder<'a> {
    /// Set up a decoder, building the recovery matrix if the pattern needs one
    ///
    /// Buffer sizes come from [`LossPattern::sizes`]; longer buffers are
    /// fine, shorter ones are rejected.
    pub fn new(
        pattern: &LossPattern<'_>,
        matrix_storage: &'a mut [u8],
        scratch_space: &mut [u8],
    ) -> Result<Self, RaidError> {
        let sizes = pattern.sizes();
        if matrix_storage.len() < sizes.matrix_storage {
            return Err(RaidError::BufferTooSmall {
                buffer: "matrix storage",
                needed: sizes.matrix_storage,
                actual: matrix_storage.len(),
            });
        }
        if scratch_space.len() < sizes.scratch_space {
            return Err(RaidError::BufferTooSmall {
                buffer: "scratch space",
                needed: sizes.scratch_space,
                actual: scratch_space.len(),
            });
        }

        let mode = pattern.mode();
        debug!(
            "decoder setup: {:?} for {} data + {} parity, lost data {:?}, lost parity {:?}",
            mode, pattern.num_data, pattern.num_parity, pattern.lost_data, pattern.lost_parity
        );

        let matrix: &'a [u8] = match mode {
            DecoderMode::Mirror | DecoderMode::ParityXor => &[],
            DecoderMode::General => {
                let storage = &mut matrix_storage[..sizes.matrix_storage];
                build_recovery_matrix(pattern, storage, scratch_space);
                &matrix_storage[..sizes.matrix_storage]
            }
        };

        Ok(Decoder {
            num_data: pattern.num_data,
            num_parity: pattern.num_parity,
            mode,
            num_remaining: pattern.num_remaining(),
            num_lost_data: pattern.lost_data.len(),
            matrix,
        })
    }

    /// Stripe geometry the decoder was built for
    pub fn num_data(&self) -> usize {
        self.num_data
    }

    pub fn num_parity(&self) -> usize {
        self.num_parity
    }

    pub fn mode(&self) -> DecoderMode {
        self.mode
    }

    /// Surviving blocks read by each `decode` call
    pub fn num_remaining(&self) -> usize {
        self.num_remaining
    }

    /// Data blocks written by each `decode` call
    pub fn num_lost_data(&self) -> usize {
        self.num_lost_data
    }

    /// Recovery rows, one per lost data block, each `num_remaining` wide.
    /// Empty outside General mode.
    pub fn recovery_matrix(&self) -> &'a [u8] {
        self.matrix
    }

    /// Rebuild the lost data blocks (ascending index order) from the
    /// surviving blocks, bit-sliced layout
    ///
    /// `remaining_blocks` holds surviving data blocks in ascending order,
    /// then surviving parity blocks in ascending order; only the first
    /// [`num_remaining`](Self::num_remaining) are read.
    pub fn decode(&self, lost_data_blocks: &mut [&mut [u8]], remaining_blocks: &[&[u8]]) {
        self.decode_with(&BitSliced, lost_data_blocks, remaining_blocks)
    }

    /// [`decode`](Self::decode) with an explicit multiply-accumulate backend
    pub fn decode_with<M: MulAcc + ?Sized>(
        &self,
        mul_acc: &M,
        lost_data_blocks: &mut [&mut [u8]],
        remaining_blocks: &[&[u8]],
    ) {
        debug_assert!(lost_data_blocks.len() >= self.num_lost_data);
        debug_assert!(remaining_blocks.len() >= self.num_remaining);

        let remaining = &remaining_blocks[..self.num_remaining];
        match self.mode {
            DecoderMode::Mirror => {
                lost_data_blocks[0].copy_from_slice(remaining[0]);
            }
            DecoderMode::ParityXor => {
                let out = &mut *lost_data_blocks[0];
                out.copy_from_slice(remaining[0]);
                for block in &remaining[1..] {
                    mul_acc.mul_acc(out, 1, block);
                }
            }
            DecoderMode::General => {
                let lost = &mut lost_data_blocks[..self.num_lost_data];
                for out in lost.iter_mut() {
                    out.fill(0);
                }
                for (i, block) in remaining.iter().enumerate() {
                    for (j, out) in lost.iter_mut().enumerate() {
                        let factor = self.matrix[i + j * self.num_remaining];
                        mul_acc.mul_acc(out, factor, block);
                    }
                }
            }
        }
    }
}

/// Fill `storage` with the recovery rows for `pattern`
///
/// Builds the `w x w` generator submatrix for the survivors (identity rows
/// for surviving data, then Cauchy rows for surviving parity until `w`
/// rows exist), inverts it, and moves the inverse rows of the lost data
/// blocks to the front.
fn build_recovery_matrix(pattern: &LossPattern<'_>, storage: &mut [u8], scratch: &mut [u8]) {
    let w = pattern.num_data;
    storage.fill(0);

    let mut rows = storage.chunks_exact_mut(w);
    let surviving_data = (0..w).filter(|idx| pattern.lost_data.binary_search(idx).is_err());
    for (data_idx, row) in surviving_data.zip(rows.by_ref()) {
        row[data_idx] = 1;
    }
    let surviving_parity =
        (0..pattern.num_parity).filter(|idx| pattern.lost_parity.binary_search(idx).is_err());
    for (parity_idx, row) in surviving_parity.zip(rows.by_ref()) {
        for (data_idx, entry) in row.iter_mut().enumerate() {
            *entry = coefficient(data_idx, parity_idx);
        }
    }
    debug_assert!(rows.next().is_none(), "not enough survivors to fill the recovery matrix");

    matrix::invert_in_place(w, scratch, storage);

    // lost >= j for ascending indices, so no source row is overwritten
    // before it is copied
    for (j, &lost) in pattern.lost_data.iter().enumerate() {
        if j != lost {
            storage.copy_within(lost * w..(lost + 1) * w, j * w);
        }
    }
}
