//! Matrix inversion over GF(2^8)
//!
//! Gauss-Jordan elimination on an augmented `[A | I]` matrix held in
//! caller-supplied scratch space. Row `r` of the augmented matrix occupies
//! `scratch[r * 2w .. (r + 1) * 2w]`; the left `w` bytes are the working
//! copy of `A`, the right `w` bytes end up as `A^-1`.
//!
//! The input must be invertible. There is no failure path: a singular
//! matrix produces garbage, not an error. The decoder only ever inverts
//! submatrices of the MDS generator matrix, which are invertible by
//! construction.

use log::trace;

use crate::gf256;

/// Bytes of scratch space needed to invert a `w x w` matrix
pub fn scratch_space_size(w: usize) -> usize {
    2 * w * w
}

/// Load `matrix` (row-major, `w x w`) into the left half of the
/// augmented scratch matrix and the identity into the right half.
pub fn init(w: usize, scratch: &mut [u8], matrix: &[u8]) {
    debug_assert!(scratch.len() >= scratch_space_size(w));
    debug_assert!(matrix.len() >= w * w);
    let stride = 2 * w;
    for (j, row) in scratch.chunks_exact_mut(stride).take(w).enumerate() {
        let (left, right) = row.split_at_mut(w);
        left.copy_from_slice(&matrix[j * w..(j + 1) * w]);
        right.fill(0);
        right[j] = 1;
    }
}

/// Borrow row `dst` mutably and row `src` immutably at the same time
fn row_pair(mat: &mut [u8], stride: usize, dst: usize, src: usize) -> (&mut [u8], &[u8]) {
    debug_assert_ne!(dst, src);
    if dst < src {
        let (lo, hi) = mat.split_at_mut(src * stride);
        (&mut lo[dst * stride..(dst + 1) * stride], &hi[..stride])
    } else {
        let (lo, hi) = mat.split_at_mut(dst * stride);
        (&mut hi[..stride], &lo[src * stride..(src + 1) * stride])
    }
}

/// `dst ^= factor * src`, element-wise
fn row_mul_add(dst: &mut [u8], factor: u8, src: &[u8]) {
    match factor {
        0 => {}
        1 => {
            for (d, s) in dst.iter_mut().zip(src) {
                *d ^= *s;
            }
        }
        _ => {
            for (d, s) in dst.iter_mut().zip(src) {
                *d ^= gf256::mul(factor, *s);
            }
        }
    }
}

/// Invert the matrix loaded by [`init`], in place
///
/// For each pivot column `j`: a zero diagonal is repaired by adding in a
/// row below it that has a non-zero entry in column `j`, searching from
/// the bottom of the matrix upward (the top parity row of the generator
/// matrix is all ones, so the bottom rows are the better donors). Rows
/// below `j` are zero in every column already reduced, so the donor never
/// disturbs them. The pivot row is then normalized to a diagonal of 1 and
/// column `j` is cleared from every other row.
pub fn invert(w: usize, scratch: &mut [u8]) {
    debug_assert!(scratch.len() >= scratch_space_size(w));
    let stride = 2 * w;
    let mat = &mut scratch[..w * stride];

    for j in 0..w {
        if mat[j * stride + j] == 0 {
            let donor = (j + 1..w).rev().find(|&jj| mat[jj * stride + j] != 0);
            debug_assert!(donor.is_some(), "singular matrix: no pivot for column {}", j);
            let Some(donor) = donor else { continue };
            trace!("zero pivot in column {}, adding row {}", j, donor);
            let (row_j, row_donor) = row_pair(mat, stride, j, donor);
            row_mul_add(row_j, 1, row_donor);

            // Rows below j were already cleared in every reduced column, so
            // the donor leaves those columns of row j at zero
            debug_assert!(
                mat[j * stride..j * stride + j].iter().all(|&v| v == 0),
                "row {} picked up a reduced column from row {}",
                j,
                donor
            );
        }

        let e = mat[j * stride + j];
        if e != 1 {
            let one_over_e = gf256::reciprocal(e);
            for v in &mut mat[j * stride..(j + 1) * stride] {
                *v = gf256::mul(one_over_e, *v);
            }
        }

        for jj in 0..w {
            if jj == j {
                continue;
            }
            let factor = mat[jj * stride + j];
            if factor == 0 {
                continue;
            }
            let (row_jj, row_j) = row_pair(mat, stride, jj, j);
            row_mul_add(row_jj, factor, row_j);
        }
    }
}

/// Copy the inverse (right half of the scratch matrix) into `matrix`,
/// row-major `w x w`.
pub fn get(w: usize, scratch: &[u8], matrix: &mut [u8]) {
    debug_assert!(scratch.len() >= scratch_space_size(w));
    debug_assert!(matrix.len() >= w * w);
    let stride = 2 * w;
    for (j, out) in matrix.chunks_exact_mut(w).take(w).enumerate() {
        out.copy_from_slice(&scratch[j * stride + w..(j + 1) * stride]);
    }
}

/// Replace `matrix` with its inverse, using `scratch` as working space
pub fn invert_in_place(w: usize, scratch: &mut [u8], matrix: &mut [u8]) {
    init(w, scratch, matrix);
    invert(w, scratch);
    get(w, scratch, matrix);
}
