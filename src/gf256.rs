//! GF(2^8) arithmetic
//!
//! Field elements are bytes; the field is generated by the polynomial
//! `x^8 + x^4 + x^3 + x^2 + 1` (0x11D) with 2 as the primitive element.
//! Multiplication goes through log/antilog tables built at compile time.
//!
//! Nothing here is constant-time. This module is for coefficient math in
//! the erasure code and must not be used for cryptography.

/// Reduction polynomial, including the implied x^8 term
pub const POLYNOMIAL: u16 = 0x11D;

/// Powers of 2: `EXP[i] = 2^i`. `EXP[255]` wraps back to 1 so that
/// `255 - log(1)` indexes cleanly.
pub(crate) static EXP: [u8; 256] = build_exp();

/// Discrete logarithms base 2. `LOG[0]` is meaningless and left at 0xFF.
pub(crate) static LOG: [u8; 256] = build_log();

const fn build_exp() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut value: u16 = 1;
    let mut i = 0;
    while i < 255 {
        table[i] = value as u8;
        value <<= 1;
        if value & 0x100 != 0 {
            value ^= POLYNOMIAL;
        }
        i += 1;
    }
    table[255] = table[0];
    table
}

const fn build_log() -> [u8; 256] {
    let exp = build_exp();
    let mut table = [0u8; 256];
    table[0] = 0xFF;
    let mut i = 0;
    while i < 255 {
        table[exp[i] as usize] = i as u8;
        i += 1;
    }
    table
}

/// Field addition (XOR). Also subtraction.
#[inline]
pub const fn add(a: u8, b: u8) -> u8 {
    a ^ b
}

/// Field subtraction; identical to [`add`] in characteristic 2.
#[inline]
pub const fn sub(a: u8, b: u8) -> u8 {
    a ^ b
}

/// Field multiplication
#[inline]
pub fn mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    let log_ab = (LOG[a as usize] as usize + LOG[b as usize] as usize) % 255;
    EXP[log_ab]
}

/// Multiplicative inverse. `a` must be non-zero.
#[inline]
pub fn reciprocal(a: u8) -> u8 {
    debug_assert_ne!(a, 0, "zero has no reciprocal in GF(2^8)");
    EXP[255 - LOG[a as usize] as usize]
}

/// Field division `a / b`. `b` must be non-zero.
#[inline]
pub fn div(a: u8, b: u8) -> u8 {
    mul(a, reciprocal(b))
}

/// Compile-time multiplication by shift-and-reduce, for building other
/// constant tables.
pub(crate) const fn mul_const(a: u8, b: u8) -> u8 {
    let mut acc: u16 = 0;
    let mut aa = a as u16;
    let mut bb = b;
    while bb != 0 {
        if bb & 1 != 0 {
            acc ^= aa;
        }
        aa <<= 1;
        if aa & 0x100 != 0 {
            aa ^= POLYNOMIAL;
        }
        bb >>= 1;
    }
    acc as u8
}
