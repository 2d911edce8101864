//! Block multiply-accumulate: `acc ^= factor * src`
//!
//! Encoding and decoding only ever combine blocks through this one
//! operation, so the block layout is decided here. Two backends exist:
//!
//! - [`BitSliced`]: a block is 8 equal bit-planes, plane `i` holding bit
//!   `i` of every field element. Multiplying by a constant is then an
//!   8x8 bit-matrix product done entirely with word XORs. This is the
//!   default layout.
//! - [`ByteWise`]: one byte per field element, multiplied through
//!   `reed-solomon-erasure`'s table/SIMD kernels.
//!
//! A stripe must be encoded and decoded with the same backend; the parity
//! bytes differ between layouts.

use reed_solomon_erasure::galois_8;

use crate::gf256;
use crate::BLOCK_ALIGN;

/// `acc ^= factor * src` over whole blocks
///
/// Implementations must treat factor 0 as a no-op and factor 1 as a plain
/// XOR. `acc` and `src` have the same length.
pub trait MulAcc {
    fn mul_acc(&self, acc: &mut [u8], factor: u8, src: &[u8]);
}

/// Bit-plane layout, XOR-only multiplication
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BitSliced;

/// Byte-per-element layout, backed by `reed_solomon_erasure::galois_8`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ByteWise;

/// `PLANE_MASKS[f][j]` has bit `i` set when input plane `i` feeds output
/// plane `j` in a multiplication by `f`.
static PLANE_MASKS: [[u8; 8]; 256] = build_plane_masks();

const fn build_plane_masks() -> [[u8; 8]; 256] {
    let mut table = [[0u8; 8]; 256];
    let mut f = 0;
    while f < 256 {
        let mut i = 0;
        while i < 8 {
            // Image of the basis element x^i
            let column = gf256::mul_const(f as u8, 1u8 << i);
            let mut j = 0;
            while j < 8 {
                if column & (1u8 << j) != 0 {
                    table[f][j] |= 1u8 << i;
                }
                j += 1;
            }
            i += 1;
        }
        f += 1;
    }
    table
}

/// `acc ^= src`
#[inline]
pub(crate) fn xor_into(acc: &mut [u8], src: &[u8]) {
    debug_assert_eq!(acc.len(), src.len());
    for (a, s) in acc.iter_mut().zip(src) {
        *a ^= *s;
    }
}

impl MulAcc for BitSliced {
    fn mul_acc(&self, acc: &mut [u8], factor: u8, src: &[u8]) {
        debug_assert_eq!(acc.len(), src.len());
        debug_assert_eq!(src.len() % BLOCK_ALIGN, 0, "block length not a multiple of {}", BLOCK_ALIGN);
        if src.is_empty() {
            return;
        }
        match factor {
            0 => {}
            1 => xor_into(acc, src),
            _ => {
                let span = src.len() / 8;
                let masks = &PLANE_MASKS[factor as usize];
                for (acc_plane, &mask) in acc.chunks_exact_mut(span).zip(masks.iter()) {
                    for (i, src_plane) in src.chunks_exact(span).enumerate() {
                        if mask & (1u8 << i) != 0 {
                            xor_into(acc_plane, src_plane);
                        }
                    }
                }
            }
        }
    }
}

impl MulAcc for ByteWise {
    fn mul_acc(&self, acc: &mut [u8], factor: u8, src: &[u8]) {
        debug_assert_eq!(acc.len(), src.len());
        match factor {
            0 => {}
            1 => xor_into(acc, src),
            _ => galois_8::mul_slice_xor(factor, src, acc),
        }
    }
}

/// Convert byte-per-element data into the bit-plane layout
///
/// Element `k` of `elements` becomes bit `k % 8` of byte `k / 8` in each
/// of the 8 planes of `planes`. Both slices have the same length, a
/// multiple of 8.
pub fn bitslice(elements: &[u8], planes: &mut [u8]) {
    debug_assert_eq!(elements.len(), planes.len());
    debug_assert_eq!(elements.len() % 8, 0);
    let span = planes.len() / 8;
    planes.fill(0);
    for (k, &e) in elements.iter().enumerate() {
        for i in 0..8 {
            if e & (1u8 << i) != 0 {
                planes[i * span + k / 8] |= 1u8 << (k % 8);
            }
        }
    }
}

/// Inverse of [`bitslice`]
pub fn unbitslice(planes: &[u8], elements: &mut [u8]) {
    debug_assert_eq!(elements.len(), planes.len());
    debug_assert_eq!(planes.len() % 8, 0);
    let span = planes.len() / 8;
    for (k, e) in elements.iter_mut().enumerate() {
        let mut value = 0u8;
        for i in 0..8 {
            if planes[i * span + k / 8] & (1u8 << (k % 8)) != 0 {
                value |= 1u8 << i;
            }
        }
        *e = value;
    }
}
