//! Parity computation
//!
//! Parity block `j` is `sum_i coefficient(i, j) * data[i]`. Column 0 of
//! the generator matrix is all ones, so every parity block starts as a
//! straight copy of data block 0; row 0 is all ones, so parity 0 is plain
//! XOR parity (RAID5). Only the remaining entries need a real field
//! multiply.

use crate::cauchy::coefficient;
use crate::xorgf::{BitSliced, MulAcc};
use crate::MAX_BLOCKS;

/// Compute all parity blocks from the data blocks, bit-sliced layout
///
/// A `None` data block stands for a block of zeros. All blocks have the
/// same length.
pub fn encode(data_blocks: &[Option<&[u8]>], parity_blocks: &mut [&mut [u8]]) {
    encode_with(&BitSliced, data_blocks, parity_blocks)
}

/// [`encode`] with an explicit multiply-accumulate backend
pub fn encode_with<M: MulAcc + ?Sized>(
    mul_acc: &M,
    data_blocks: &[Option<&[u8]>],
    parity_blocks: &mut [&mut [u8]],
) {
    debug_assert!(data_blocks.len() <= MAX_BLOCKS);
    debug_assert!(parity_blocks.len() <= MAX_BLOCKS);

    if parity_blocks.is_empty() {
        return;
    }

    // coefficient(0, j) == 1 for every j
    match data_blocks.first() {
        Some(Some(first)) => {
            for parity in parity_blocks.iter_mut() {
                parity.copy_from_slice(first);
            }
        }
        _ => {
            for parity in parity_blocks.iter_mut() {
                parity.fill(0);
            }
        }
    }

    for (i, block) in data_blocks.iter().enumerate().skip(1) {
        let Some(block) = block else { continue };
        for (j, parity) in parity_blocks.iter_mut().enumerate() {
            let factor = if j == 0 { 1 } else { coefficient(i, j) };
            mul_acc.mul_acc(parity, factor, block);
        }
    }
}

/// Fold a change of data block `data_idx` into existing parity
///
/// `delta` is `old ^ new` for that data block. Costs one accumulate per
/// parity block regardless of stripe width.
pub fn encode_modify(delta: &[u8], data_idx: usize, parity_blocks: &mut [&mut [u8]]) {
    encode_modify_with(&BitSliced, delta, data_idx, parity_blocks)
}

/// [`encode_modify`] with an explicit multiply-accumulate backend
pub fn encode_modify_with<M: MulAcc + ?Sized>(
    mul_acc: &M,
    delta: &[u8],
    data_idx: usize,
    parity_blocks: &mut [&mut [u8]],
) {
    debug_assert!(data_idx < MAX_BLOCKS);
    debug_assert!(parity_blocks.len() <= MAX_BLOCKS);

    for (j, parity) in parity_blocks.iter_mut().enumerate() {
        let factor = if j == 0 { 1 } else { coefficient(data_idx, j) };
        mul_acc.mul_acc(parity, factor, delta);
    }
}
