/*!

Binary-to-decimal and decimal-to-binary conversion via the double-dabble
algorithm (and its inverse), operating directly on the limb kernel so that
decimal formatting never needs a float intermediate.

Digits are stored least-significant-first throughout this module: index `0`
of a digit vector is the ones place. This is the opposite convention from
some textbook presentations of double-dabble (which shift a BCD register
from the top), but it matches how the rest of this crate keeps limbs
little-endian, and it lets [`bcd_mul2`]/[`bcd_div2`] share one layout instead
of each wanting its own.

 */

use crate::limb::{significant_limbs, Limb, LIMB_BITS};
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

/// Converts an unsigned magnitude to a little-endian list of decimal digits
/// (`0..=9`) via double-dabble: repeatedly shift the binary value left by
/// one bit, add 3 to any BCD digit that has reached 5 or more before the
/// shift, so it stays a valid BCD digit after doubling.
pub fn binary_to_bcd(limbs: &[Limb]) -> Vec<u8> {
    let n = significant_limbs(limbs).max(1);
    let total_bits = n as u32 * LIMB_BITS;
    let mut digits: Vec<u8> = vec![0];
    for bit_index in (0..total_bits).rev() {
        let limb = bit_index / LIMB_BITS;
        let bit = bit_index % LIMB_BITS;
        let in_bit = (limbs[limb as usize] >> bit) & 1 != 0;

        let mut carry = in_bit as u8;
        for d in digits.iter_mut() {
            if *d >= 5 {
                *d += 3;
            }
            *d = (*d << 1) | carry;
            carry = *d >> 4;
            *d &= 0xF;
        }
        if carry != 0 {
            digits.push(carry);
        }
    }
    while digits.len() > 1 && *digits.last().unwrap() == 0 {
        digits.pop();
    }
    digits
}

/// Converts a little-endian BCD digit list back to an unsigned magnitude,
/// written into `out` (zeroed first). This is double-dabble run backwards:
/// shift the decimal digits right by one (halving), and shift the
/// complementary bit into the top of the binary accumulator.
pub fn bcd_to_binary(digits: &[u8], out: &mut [Limb]) {
    for l in out.iter_mut() {
        *l = 0;
    }
    let mut digits = digits.to_vec();
    let total_bits = out.len() as u32 * LIMB_BITS;
    for bit_index in 0..total_bits {
        let out_bit = bcd_shr1(&mut digits);
        if out_bit {
            let limb = bit_index / LIMB_BITS;
            let bit = bit_index % LIMB_BITS;
            out[limb as usize] |= 1 << bit;
        }
    }
}

/// Halves a little-endian BCD digit list in place, returning the bit shifted
/// out of the ones place. Inverse step of the doubling inside
/// [`binary_to_bcd`]: undo the `+3` correction on any digit that shows it
/// was applied (everything from 8 upward after un-halving falls back through
/// `-3`).
fn bcd_shr1(digits: &mut Vec<u8>) -> bool {
    let mut borrow = 0u8;
    for d in digits.iter_mut().rev() {
        let v = *d | (borrow << 4);
        *d = v >> 1;
        borrow = v & 1;
        if *d >= 8 {
            *d -= 3;
        }
    }
    while digits.len() > 1 && *digits.last().unwrap() == 0 {
        digits.pop();
    }
    borrow != 0
}

/// Doubles a little-endian BCD digit list in place (used to scale a parsed
/// decimal fraction up by powers of two while staying in decimal digits).
pub fn bcd_mul2(digits: &mut Vec<u8>) {
    let mut carry = 0u8;
    for d in digits.iter_mut() {
        if *d >= 5 {
            *d += 3;
        }
        *d = (*d << 1) | carry;
        carry = *d >> 4;
        *d &= 0xF;
    }
    if carry != 0 {
        digits.push(carry);
    }
}

/// Renders an unsigned magnitude and a (possibly negative) binary point
/// position as a decimal string. `frac_bits` may be negative, meaning the
/// stored bit pattern is implicitly scaled up by `2^-frac_bits`.
///
/// `limbs` must carry at least one guard bit above the value's true
/// magnitude (callers negating a two's-complement value should widen by one
/// bit first) so its sign bit is always clear; this module's helpers use
/// [`crate::limb::is_negative`] internally and would otherwise misread a
/// magnitude whose top bit happens to be set.
pub fn magnitude_to_decimal_string(limbs: &[Limb], frac_bits: i64) -> String {
    let mut digits = binary_to_bcd(limbs);

    let mut point = 0usize;
    if frac_bits > 0 {
        for _ in 0..frac_bits {
            let had = digits.len();
            bcd_div2_grow(&mut digits);
            if digits.len() > had {
                point += 1;
            }
        }
    } else {
        for _ in 0..(-frac_bits) {
            bcd_mul2(&mut digits);
        }
    }

    let mut s = String::new();
    for (i, &d) in digits.iter().enumerate().rev() {
        s.push((b'0' + d) as char);
        if point > 0 && i == point {
            s.push('.');
        }
    }
    if point >= digits.len() {
        // point falls at or beyond the most significant digit produced: pad
        // with the leading zeros a plain digit dump would have dropped.
        let mut prefix = String::from("0.");
        for _ in 0..(point - digits.len()) {
            prefix.push('0');
        }
        prefix.push_str(&s);
        return prefix;
    }
    s
}

/// Halves a BCD digit list, but unlike [`bcd_shr1`] grows the digit list
/// when halving produces a new fractional digit below the ones place
/// instead of discarding it — used when tracking a decimal point that
/// moves right as more fractional bits are folded in.
fn bcd_div2_grow(digits: &mut Vec<u8>) {
    let mut carry = 0u8;
    for d in digits.iter_mut().rev() {
        let v = *d | (carry << 4);
        *d = v >> 1;
        carry = v & 1;
        if *d >= 8 {
            *d -= 3;
        }
    }
    if carry != 0 {
        digits.insert(0, 5);
    }
}

/// Parses a decimal string (optionally signed, optionally containing one
/// `.`) into a sign flag and a binary magnitude scaled to `frac_bits`
/// fractional bits, rounded to nearest with ties rounded toward `+∞` (an
/// extra scaling bit is folded in and then removed by rounding, matching the
/// construction used by [`magnitude_to_decimal_string`] in reverse). Ties are
/// detected on the unsigned magnitude, but the round-up-or-truncate decision
/// is made on the *signed* value: a positive tie rounds its magnitude up
/// (away from zero, i.e. toward `+∞`), a negative tie rounds its magnitude
/// down (toward zero, which is again toward `+∞`).
pub fn parse_decimal(s: &str, limb_count: usize, frac_bits: i64) -> Result<(bool, Vec<Limb>), crate::Error> {
    let s = s.trim();
    if s.is_empty() {
        return Err(crate::Error::ParseError("empty string".into()));
    }
    let (negative, rest) = match s.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    if rest.is_empty() || !rest.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(crate::Error::ParseError(alloc::format!(
            "not a valid decimal numeric string: {s}"
        )));
    }

    let (int_part, frac_part) = match rest.split_once('.') {
        Some((i, f)) => (i, f),
        None => (rest, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(crate::Error::ParseError("no digits".into()));
    }
    if int_part.contains('.') || frac_part.contains('.') {
        return Err(crate::Error::ParseError("multiple decimal points".into()));
    }

    // digits, most-significant decimal digit first, across both halves
    let combined: Vec<u8> = int_part
        .chars()
        .chain(frac_part.chars())
        .map(|c| c as u8 - b'0')
        .collect();
    // little-endian digit list: reverse, so index 0 is the ones place of
    // `int_part . frac_part` read as one integer (i.e. scaled by 10^len(frac_part))
    let mut digits: Vec<u8> = combined.into_iter().rev().collect();
    if digits.is_empty() {
        digits.push(0);
    }

    // Scale by 2^(frac_bits + 1): the bits requested, plus one rounding bit.
    // Then divide out the decimal scaling (10^len(frac_part)) that parsing
    // the fractional digits as an integer introduced, by repeated BCD
    // halving paired with a compensating doubling — simplest to implement as
    // a direct power-of-two scale of the *binary* result instead, done below
    // after the BCD -> binary conversion.
    let extra_bits = frac_bits + 1;
    if extra_bits > 0 {
        for _ in 0..extra_bits {
            bcd_mul2(&mut digits);
        }
    }

    let bits_needed = (digits.len() as u32 * 4 + 8) as i64;
    let mut raw = vec![0 as Limb; crate::limb::limb_count(bits_needed)];
    bcd_to_binary(&digits, &mut raw);

    // raw now holds round(value * 10^frac_part_len * 2^(frac_bits+1)); divide
    // out the decimal scale with ordinary integer division by a power of ten.
    if !frac_part.is_empty() {
        let ten_pow = pow10_limbs(frac_part.len(), raw.len());
        let mut q = vec![0 as Limb; raw.len()];
        let mut r = vec![0 as Limb; ten_pow.len()];
        crate::limb::unsigned_div(&mut q, &mut r, &raw, &ten_pow);
        raw = q;
    }

    if extra_bits > 0 {
        // `raw` holds the exact magnitude scaled by one extra bit, so its
        // LSB is the tie bit: set iff the true value sits exactly halfway
        // between two representable outputs. Truncate first (floor), then
        // round the magnitude up only when that tie (or any coarser
        // remainder, which also sets this bit) should push the *signed*
        // value toward +∞ — which for a negative value means leaving the
        // magnitude truncated, not rounding it up.
        let tie = raw[0] & 1 != 0;
        let scratch = raw.clone();
        crate::limb::shr_limbs(&mut raw, &scratch, 1);
        if tie && !negative {
            let carry = crate::limb::inplace_add_single(&mut raw, 1);
            debug_assert_eq!(carry, 0, "rounding overflowed scratch width");
        }
    }

    let out_len = limb_count;
    let out = crate::limb::resize_signed(&raw, out_len);
    Ok((negative, out))
}

fn pow10_limbs(exp: usize, min_len: usize) -> Vec<Limb> {
    let mut v = vec![0 as Limb; min_len.max(1)];
    v[0] = 1;
    for _ in 0..exp {
        let scratch = v.clone();
        let carry = crate::limb::mul_by_limb(&mut v, &scratch, 10);
        debug_assert_eq!(carry, 0, "power of ten overflowed scratch width");
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_to_bcd_small() {
        let limbs = [123 as Limb];
        let digits = binary_to_bcd(&limbs);
        assert_eq!(digits, vec![3, 2, 1]);
    }

    #[test]
    fn bcd_to_binary_round_trip() {
        let limbs = [987654 as Limb];
        let digits = binary_to_bcd(&limbs);
        let mut back = [0 as Limb; 1];
        bcd_to_binary(&digits, &mut back);
        assert_eq!(back[0], 987654);
    }

    #[test]
    fn magnitude_to_decimal_string_integer() {
        let limbs = [42 as Limb];
        assert_eq!(magnitude_to_decimal_string(&limbs, 0), "42");
    }

    #[test]
    fn parse_decimal_ties_round_toward_positive_infinity() {
        let (pos_negative, pos_limbs) = parse_decimal("0.5", 1, 0).unwrap();
        assert!(!pos_negative);
        assert_eq!(pos_limbs[0], 1); // +0.5 rounds up, toward +inf

        let (neg_negative, neg_limbs) = parse_decimal("-0.5", 1, 0).unwrap();
        assert!(neg_negative);
        assert_eq!(neg_limbs[0], 0); // -0.5 rounds toward zero, toward +inf
    }
}
