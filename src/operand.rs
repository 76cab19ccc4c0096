use bitvec::prelude::*;

use crate::error::ErrorKind;
use crate::parser::is_label_char;

pub const REGISTER_COUNT: u32 = 16;

/// Value of an immediate operand: either known now or deferred to pass 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Immediate<'a> {
    Value(u32),
    Label(&'a str),
}

fn is_decimal(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// `r0`..`r15` to its 4-bit index.
pub fn register_index(token: &str) -> Result<u32, ErrorKind> {
    token
        .strip_prefix('r')
        .filter(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|n| n.parse::<u32>().ok())
        .filter(|&n| n < REGISTER_COUNT)
        .ok_or_else(|| ErrorKind::RegisterRange { token: token.to_string() })
}

/// Two's-complement encoding of `value` in `bits` bits, if it fits.
///
/// The accepted range is exactly `-2^(bits-1) ..= 2^(bits-1) - 1`.
pub fn fit_signed(value: i64, bits: u32) -> Option<u32> {
    debug_assert!((1..=32).contains(&bits));
    let half = 1i64 << (bits - 1);
    (-half..half)
        .contains(&value)
        .then(|| patch_bits(0, value, bits))
}

/// Parses a decimal literal into a signed `bits`-wide field.
pub fn signed_field(token: &str, bits: u32) -> Result<u32, ErrorKind> {
    let out_of_range = || ErrorKind::ImmediateRange { token: token.to_string(), bits };
    let value: i64 = token.parse().map_err(|_| out_of_range())?;
    fit_signed(value, bits).ok_or_else(out_of_range)
}

/// Classifies an immediate operand: decimal literal, label reference, or neither.
pub fn immediate(token: &str, bits: u32) -> Result<Immediate<'_>, ErrorKind> {
    if is_decimal(token) {
        signed_field(token, bits).map(Immediate::Value)
    } else if !token.is_empty() && token.chars().all(is_label_char) {
        Ok(Immediate::Label(token))
    } else {
        Err(ErrorKind::InvalidImmediate { token: token.to_string() })
    }
}

/// Writes the low `len` bits of `value` into `word` starting at bit `lsb`.
pub fn put_field(mut word: u32, lsb: u32, len: u32, value: u32) -> u32 {
    let (lo, hi) = (lsb as usize, (lsb + len) as usize);
    word.view_bits_mut::<Lsb0>()[lo..hi].store_le(value);
    word
}

/// Replaces the low `bits` bits of `word` with `value` (two's complement),
/// keeping everything above.
pub fn patch_bits(word: u32, value: i64, bits: u32) -> u32 {
    put_field(word, 0, bits, value as u32)
}
