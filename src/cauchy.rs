//! Generalized Cauchy generator matrix
//!
//! Entry `(data_idx, parity_idx)` of the generator matrix is
//!
//! ```text
//! C[data_idx] * D[parity_idx] / (X[data_idx] - Y[parity_idx])
//! ```
//!
//! The four sequences were produced offline. X and Y together cover all
//! 256 field elements exactly once, so no denominator is zero and every
//! square submatrix is invertible (the code is MDS). C and D are scaled
//! so that parity row 0 and data column 0 are all ones: parity 0 is plain
//! XOR parity, and data block 0 can be copied straight into every parity
//! block. The columns of row 1 are ordered so the cheapest multipliers
//! (fewest ones in their bit matrix) land on the lowest data indices.
//!
//! Entries are computed on demand; the full matrix is never stored.

use crate::gf256;
use crate::MAX_BLOCKS;

const SEQ_C: [u8; MAX_BLOCKS] = [
    0x01, 0xD2, 0x02, 0x39, 0x69, 0x61, 0x99, 0x2D,
    0x8F, 0xD0, 0xBB, 0xF0, 0xBF, 0xB3, 0xFF, 0x70,
    0x59, 0xEE, 0x83, 0xCE, 0x06, 0xB0, 0x68, 0x79,
    0x58, 0x2A, 0x33, 0xC0, 0xCA, 0x19, 0xCB, 0x32,
    0x64, 0x0D, 0xEA, 0xA2, 0x23, 0x8B, 0xDB, 0x93,
    0x9E, 0x14, 0x40, 0xA3, 0x30, 0x0E, 0xE5, 0x29,
    0xE2, 0x50, 0xFD, 0x18, 0x5D, 0x3C, 0x89, 0xA0,
    0xF1, 0xB7, 0x9B, 0x5F, 0x09, 0x84, 0x41, 0xB8,
    0xB2, 0x7F, 0x6F, 0x7B, 0xD6, 0x56, 0xC3, 0xFA,
    0xE4, 0xEB, 0xD7, 0xC8, 0x6A, 0xC6, 0x62, 0xAF,
    0x51, 0x8D, 0xFB, 0x3D, 0xBC, 0xE9, 0x80, 0xE1,
    0x67, 0xB5, 0x6E, 0x4A, 0x3A, 0x17, 0xD4, 0x73,
    0xA7, 0x9F, 0x43, 0x76, 0x91, 0x36, 0xDC, 0x0B,
    0x05, 0x1B, 0xA1, 0xB9, 0x21, 0x4C, 0x94, 0x66,
    0xDF, 0x35, 0x34, 0x4E, 0x0A, 0x7C, 0xF7, 0xDD,
    0x0C, 0x96, 0x7A, 0x82, 0xF4, 0x37, 0x5B, 0x1E,
];

const SEQ_D: [u8; MAX_BLOCKS] = [
    0x8C, 0x8F, 0x8D, 0x8E, 0x8B, 0x86, 0x87, 0x80,
    0x82, 0x9F, 0x98, 0x9A, 0x95, 0x90, 0x91, 0xAF,
    0xA8, 0xAA, 0xAB, 0xA4, 0xA6, 0xA1, 0xA2, 0xA3,
    0xBE, 0xB8, 0xBA, 0xBB, 0xB4, 0xB5, 0xB6, 0xB1,
    0xB2, 0xB3, 0xCF, 0xC8, 0xCA, 0xC5, 0xC6, 0xC7,
    0xC0, 0xC1, 0xC2, 0xDC, 0xDE, 0xDF, 0xD8, 0xD9,
    0xD5, 0xD6, 0xD7, 0xD0, 0xD2, 0xD3, 0xED, 0xEE,
    0xEF, 0xE8, 0xE9, 0xE6, 0xE7, 0xE0, 0xE1, 0xE3,
    0xFC, 0xFD, 0xF9, 0xFA, 0xF5, 0xF7, 0xF2, 0x0C,
    0x0E, 0x0F, 0x05, 0x06, 0x07, 0x01, 0x1C, 0x1D,
    0x1F, 0x19, 0x1A, 0x1B, 0x15, 0x17, 0x12, 0x13,
    0x2D, 0x2E, 0x28, 0x29, 0x25, 0x26, 0x21, 0x22,
    0x23, 0x3F, 0x38, 0x3B, 0x35, 0x36, 0x33, 0x4D,
    0x4F, 0x48, 0x4B, 0x40, 0x41, 0x42, 0x5D, 0x5E,
    0x5F, 0x5A, 0x57, 0x51, 0x52, 0x6F, 0x69, 0x6B,
    0x62, 0x63, 0x7C, 0x7F, 0x78, 0x7A, 0x7B, 0x74,
];

const SEQ_X: [u8; MAX_BLOCKS] = [
    0x8C, 0xD0, 0x05, 0xE0, 0x68, 0x7C, 0xED, 0xC2,
    0xCA, 0xD5, 0xB8, 0x85, 0xB2, 0xAC, 0x12, 0xD8,
    0x10, 0xB6, 0xD4, 0xE6, 0x0F, 0x25, 0xE4, 0x40,
    0x9C, 0x41, 0xF1, 0xFD, 0xEC, 0xB0, 0x60, 0x7D,
    0xFA, 0x92, 0xBC, 0x08, 0xD9, 0xC0, 0x48, 0xFC,
    0x6E, 0x22, 0xA0, 0x84, 0x78, 0x1B, 0x2B, 0xC8,
    0xA8, 0x88, 0x17, 0x3C, 0x1A, 0x66, 0xC5, 0x0D,
    0x09, 0xA6, 0xE8, 0x1F, 0x98, 0x57, 0x2C, 0x31,
    0x20, 0x4F, 0x67, 0x45, 0xDA, 0x87, 0x74, 0x94,
    0xA7, 0x30, 0x56, 0xE9, 0xE1, 0xF2, 0xF5, 0x9A,
    0x04, 0xCF, 0x18, 0xEA, 0x3B, 0x35, 0x5D, 0x21,
    0x73, 0xA3, 0xEB, 0xB1, 0x69, 0xAB, 0xDF, 0x51,
    0x8E, 0xE2, 0x29, 0xD7, 0xF9, 0x77, 0xCB, 0x9D,
    0x86, 0xB5, 0x81, 0xBD, 0xDC, 0xBE, 0x7F, 0xFF,
    0x42, 0xFE, 0x72, 0xBB, 0x11, 0xC6, 0x06, 0x47,
    0x1E, 0x7A, 0xC9, 0x58, 0x8F, 0xFB, 0x15, 0x33,
];

const SEQ_Y: [u8; MAX_BLOCKS] = [
    0x00, 0x03, 0x01, 0x02, 0x07, 0x0A, 0x0B, 0x0C,
    0x0E, 0x13, 0x14, 0x16, 0x19, 0x1C, 0x1D, 0x23,
    0x24, 0x26, 0x27, 0x28, 0x2A, 0x2D, 0x2E, 0x2F,
    0x32, 0x34, 0x36, 0x37, 0x38, 0x39, 0x3A, 0x3D,
    0x3E, 0x3F, 0x43, 0x44, 0x46, 0x49, 0x4A, 0x4B,
    0x4C, 0x4D, 0x4E, 0x50, 0x52, 0x53, 0x54, 0x55,
    0x59, 0x5A, 0x5B, 0x5C, 0x5E, 0x5F, 0x61, 0x62,
    0x63, 0x64, 0x65, 0x6A, 0x6B, 0x6C, 0x6D, 0x6F,
    0x70, 0x71, 0x75, 0x76, 0x79, 0x7B, 0x7E, 0x80,
    0x82, 0x83, 0x89, 0x8A, 0x8B, 0x8D, 0x90, 0x91,
    0x93, 0x95, 0x96, 0x97, 0x99, 0x9B, 0x9E, 0x9F,
    0xA1, 0xA2, 0xA4, 0xA5, 0xA9, 0xAA, 0xAD, 0xAE,
    0xAF, 0xB3, 0xB4, 0xB7, 0xB9, 0xBA, 0xBF, 0xC1,
    0xC3, 0xC4, 0xC7, 0xCC, 0xCD, 0xCE, 0xD1, 0xD2,
    0xD3, 0xD6, 0xDB, 0xDD, 0xDE, 0xE3, 0xE5, 0xE7,
    0xEE, 0xEF, 0xF0, 0xF3, 0xF4, 0xF6, 0xF7, 0xF8,
];

/// Generator matrix entry for data block `data_idx` in parity block `parity_idx`
///
/// Both indices must be below [`MAX_BLOCKS`]. Returns 1 whenever either
/// index is 0.
#[inline]
pub fn coefficient(data_idx: usize, parity_idx: usize) -> u8 {
    debug_assert!(data_idx < MAX_BLOCKS, "data index {} out of range", data_idx);
    debug_assert!(parity_idx < MAX_BLOCKS, "parity index {} out of range", parity_idx);
    let c = SEQ_C[data_idx];
    let d = SEQ_D[parity_idx];
    let x = SEQ_X[data_idx];
    let y = SEQ_Y[parity_idx];
    gf256::mul(c, gf256::mul(d, gf256::reciprocal(gf256::sub(x, y))))
}
