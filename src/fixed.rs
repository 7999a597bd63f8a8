/*!

Arbitrary-width two's-complement fixed-point values.

A [`Fixed`] is a triple `(bits, int_bits, limbs)`: `bits` is the total
stored width, `int_bits` is how many of those bits sit above the binary
point (it may be negative, or exceed `bits`, pushing the whole value below
or above the point respectively), and `limbs` is the two's-complement
magnitude, little-endian, sign-extended per [`crate::limb::sign_extend`].
The real value represented is `v · 2^(int_bits - bits)`.

Arithmetic never rounds or overflows silently: every operator grows the
result to a width that can hold any possible result exactly (see the
per-operation table in [`Fixed::checked_div`] and friends), and it is the
caller's job to [`Fixed::cast`] back down to a working width, choosing how
that narrowing rounds and whether it saturates.

 */

use crate::cast::{self, NeverRng, OverflowMode, QuantMode};
use crate::ieee754::{self, EXPONENT_BIAS};
use crate::limb::{self, Limb, LIMB_BITS};
use crate::{bcd, Error, Result};
use alloc::format;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::ops::{Add, Div, Mul, Neg, Shl, Shr, Sub};
use rand::RngCore;

/// An arbitrary-width two's-complement fixed-point number.
#[derive(Debug, Clone)]
pub struct Fixed {
    bits: i64,
    int_bits: i64,
    limbs: Vec<Limb>,
}

fn validate_bits(bits: i64) -> Result<()> {
    if bits < 1 {
        return Err(Error::InvalidSize(format!("bits must be >= 1, got {bits}")));
    }
    Ok(())
}

/// Reads the low `width` (`<= 64`) bits of `limbs` as a native integer.
fn read_low_bits(limbs: &[Limb], width: u32) -> u64 {
    let mut out = 0u64;
    for i in 0..width.min(64) {
        if limb::test_bit(limbs, i as i64) {
            out |= 1u64 << i;
        }
    }
    out
}

/// A limb vector of `len` limbs with only bit `pos` set.
fn single_bit_vec(pos: i64, len: usize) -> Vec<Limb> {
    let mut v = vec![0 as Limb; len];
    let idx = (pos / LIMB_BITS as i64) as usize;
    let bit = (pos % LIMB_BITS as i64) as u32;
    if idx < len {
        v[idx] = (1 as Limb) << bit;
    }
    v
}

impl Fixed {
    /// Total stored width.
    pub fn bits(&self) -> i64 {
        self.bits
    }

    /// Width of the integer part; may be negative or exceed [`Fixed::bits`].
    pub fn int_bits(&self) -> i64 {
        self.int_bits
    }

    /// Width of the fractional part (`bits - int_bits`); may be negative.
    pub fn frac_bits(&self) -> i64 {
        self.bits - self.int_bits
    }

    /// Raw two's-complement limb storage, little-endian.
    pub fn limbs(&self) -> &[Limb] {
        &self.limbs
    }

    /// The stored `(bits, int_bits, limbs)` triple, for callers that need to
    /// serialize or otherwise inspect the exact bit pattern rather than the
    /// represented value.
    pub fn to_bit_pattern(&self) -> (i64, i64, &[Limb]) {
        (self.bits, self.int_bits, &self.limbs)
    }

    /// Whether `self` and `other` share both layout and value — stricter
    /// than [`PartialEq`], which (via [`Fixed::compare`]) considers two
    /// differently-laid-out values equal if they represent the same number.
    pub fn is_identical(&self, other: &Fixed) -> bool {
        self.bits == other.bits && self.int_bits == other.int_bits && self.limbs == other.limbs
    }

    pub fn is_negative(&self) -> bool {
        limb::is_negative(&self.limbs)
    }

    pub fn is_zero(&self) -> bool {
        limb::is_zero(&self.limbs)
    }

    /// Reads the low 64 bits of the stored magnitude as a native integer.
    /// Only meaningful when the caller knows the value is non-negative and
    /// fits in 64 bits (used by [`crate::float`] to strip a rounded
    /// mantissa out of its `Fixed` scratch representation).
    pub(crate) fn low_u64(&self) -> u64 {
        read_low_bits(&self.limbs, 64)
    }

    /// Builds a value directly from its limb storage. `limbs.len()` must
    /// equal `limb_count(bits)`; the limbs need not already be
    /// sign-extended, [`Fixed::new`] re-establishes the invariant.
    pub fn new(bits: i64, int_bits: i64, mut limbs: Vec<Limb>) -> Result<Self> {
        validate_bits(bits)?;
        let expected = limb::limb_count(bits);
        if limbs.len() != expected {
            return Err(Error::InvalidSize(format!(
                "expected {expected} limbs for {bits} bits, got {}",
                limbs.len()
            )));
        }
        limb::sign_extend(&mut limbs, bits);
        Ok(Fixed { bits, int_bits, limbs })
    }

    /// Builds a value of the given format holding exactly `value`, wrapping
    /// two's-complement style if `value` does not fit (mirroring `as`
    /// conversions between native integer types).
    pub fn from_i64(value: i64, bits: i64, int_bits: i64) -> Result<Self> {
        validate_bits(bits)?;
        let wide_bits = 66i64;
        let raw = Fixed {
            bits: wide_bits,
            int_bits: wide_bits,
            limbs: limb::from_i64(value, limb::limb_count(wide_bits)),
        };
        raw.cast_with(bits, int_bits, QuantMode::Trn, OverflowMode::Wrap, &mut NeverRng)
    }

    /// Builds a value from a finite `f64`, rounding ties toward `+infinity`
    /// (see [`QuantMode::Rnd`]) if it does not fit the target's fractional
    /// width, and wrapping if it does not fit the integer width.
    pub fn from_f64(value: f64, bits: i64, int_bits: i64) -> Result<Self> {
        validate_bits(bits)?;
        if !value.is_finite() {
            return Err(Error::InvalidValue(format!("non-finite double: {value}")));
        }
        let frac_bits = bits - int_bits;
        if value == 0.0 {
            return Fixed::new(bits, int_bits, vec![0 as Limb; limb::limb_count(bits)]);
        }

        let sign = ieee754::sign_of_double(value);
        let biased_exp = ieee754::biased_exp_of_double(value);
        let mantissa = ieee754::mantissa_of_double(value);
        let (exp, man) = if biased_exp == 0 {
            (1 - EXPONENT_BIAS, mantissa)
        } else {
            (biased_exp - EXPONENT_BIAS, mantissa | (1u64 << 52))
        };

        let shift = exp + frac_bits - 52;
        let needed_bits = bits.max(64) + shift.unsigned_abs() as i64 + 8;
        let scratch_len = limb::limb_count(needed_bits);
        let mut scratch = limb::from_u64(man, scratch_len);

        if shift >= 0 {
            limb::shl_logical(&mut scratch, shift.min(u32::MAX as i64) as u32);
        } else {
            let s = (-shift) as u32;
            let add = single_bit_vec((s - 1) as i64, scratch.len());
            limb::inplace_add_same_length(&mut scratch, &add);
            limb::shr_arithmetic(&mut scratch, s);
        }

        if sign {
            limb::negate_inplace(&mut scratch);
        }
        let limbs = limb::resize_signed(&scratch, limb::limb_count(bits));
        Fixed::new(bits, int_bits, limbs)
    }

    /// Converts to an `f64` by keeping the top 53 bits of magnitude and
    /// truncating the rest (the shift is arithmetic, not rounding) when the
    /// value carries more precision than a double can hold.
    pub fn to_f64(&self) -> f64 {
        if limb::is_zero(&self.limbs) {
            return if limb::is_negative(&self.limbs) { -0.0 } else { 0.0 };
        }
        let negative = limb::is_negative(&self.limbs);
        let mut mag = limb::resize_signed(&self.limbs, self.limbs.len() + 1);
        if negative {
            limb::negate_inplace(&mut mag);
        }

        let total_bits = mag.len() as u32 * LIMB_BITS;
        let lz = limb::leading_zeros(&mag);
        let msb_pos = (total_bits - lz - 1) as i64;
        let shift = 52 - msb_pos;
        if shift > 0 {
            limb::shl_logical(&mut mag, shift as u32);
        } else if shift < 0 {
            limb::shr_arithmetic(&mut mag, (-shift) as u32);
        }

        let mut exp = EXPONENT_BIAS + 52 - shift - self.frac_bits();
        if exp < 1 {
            let extra = (1 - exp) as u32;
            limb::shr_arithmetic(&mut mag, extra);
            exp = 0;
        }
        if exp >= 2047 {
            return if negative { f64::NEG_INFINITY } else { f64::INFINITY };
        }

        let mantissa = read_low_bits(&mag, 52);
        ieee754::double_from_parts(negative, exp, mantissa)
    }

    /// Renders the value as a decimal string (e.g. `"-12.375"`).
    pub fn to_decimal_string(&self) -> String {
        let negative = limb::is_negative(&self.limbs);
        let mut mag = limb::resize_signed(&self.limbs, self.limbs.len() + 1);
        if negative {
            limb::negate_inplace(&mut mag);
        }
        let digits = bcd::magnitude_to_decimal_string(&mag, self.frac_bits());
        if negative {
            format!("-{digits}")
        } else {
            digits
        }
    }

    /// Parses a decimal string (optionally signed, with an optional `.`)
    /// into the given format, rounding ties toward `+∞`.
    pub fn from_decimal_str(s: &str, bits: i64, int_bits: i64) -> Result<Self> {
        validate_bits(bits)?;
        let (negative, mut limbs) = bcd::parse_decimal(s, limb::limb_count(bits), bits - int_bits)?;
        if negative {
            limb::negate_inplace(&mut limbs);
        }
        Fixed::new(bits, int_bits, limbs)
    }

    /// Quantizes and overflow-adjusts this value into a new `(bits,
    /// int_bits)` format, drawing randomness from `rng` for the stochastic
    /// quantization modes (ignored by every other mode).
    pub fn cast_with(
        &self,
        new_bits: i64,
        new_int_bits: i64,
        q_mode: QuantMode,
        v_mode: OverflowMode,
        rng: &mut dyn RngCore,
    ) -> Result<Self> {
        validate_bits(new_bits)?;
        let new_frac = new_bits - new_int_bits;
        let delta = new_frac - self.frac_bits();
        let scratch_bits = self.bits.max(new_bits) + delta.max(0);
        let mut scratch = limb::resize_signed(&self.limbs, limb::limb_count(scratch_bits));
        cast::quantize(&mut scratch, delta, q_mode, rng);
        cast::overflow(&mut scratch, new_bits, v_mode);
        let limbs = limb::resize_signed(&scratch, limb::limb_count(new_bits));
        Fixed::new(new_bits, new_int_bits, limbs)
    }

    /// Like [`Fixed::cast_with`], drawing randomness from the process-wide
    /// shared generator. Requires the `std` feature.
    #[cfg(feature = "std")]
    pub fn cast(&self, new_bits: i64, new_int_bits: i64, q_mode: QuantMode, v_mode: OverflowMode) -> Result<Self> {
        crate::context::FloatContext::with_rng(|rng| self.cast_with(new_bits, new_int_bits, q_mode, v_mode, rng))
    }

    /// Like [`Fixed::cast`], using the process-wide default quantization and
    /// overflow mode instead of explicit ones. Requires the `std` feature.
    #[cfg(feature = "std")]
    pub fn cast_default(&self, new_bits: i64, new_int_bits: i64) -> Result<Self> {
        let (q, v) = crate::context::FixedContext::current();
        self.cast(new_bits, new_int_bits, q, v)
    }

    fn add_or_sub(a: &Fixed, b: &Fixed, subtract: bool) -> Fixed {
        let res_int = a.int_bits.max(b.int_bits) + 1;
        let res_frac = a.frac_bits().max(b.frac_bits());
        let res_bits = res_int + res_frac;
        let len = limb::limb_count(res_bits);

        let mut la = limb::resize_signed(&a.limbs, len);
        limb::shl_logical(&mut la, (res_frac - a.frac_bits()) as u32);
        limb::sign_extend(&mut la, res_bits);

        let mut lb = limb::resize_signed(&b.limbs, len);
        limb::shl_logical(&mut lb, (res_frac - b.frac_bits()) as u32);
        limb::sign_extend(&mut lb, res_bits);

        if subtract {
            limb::inplace_sub_same_length(&mut la, &lb);
        } else {
            limb::inplace_add_same_length(&mut la, &lb);
        }
        limb::sign_extend(&mut la, res_bits);
        Fixed { bits: res_bits, int_bits: res_int, limbs: la }
    }

    fn multiply(a: &Fixed, b: &Fixed) -> Fixed {
        let res_int = a.int_bits + b.int_bits;
        let res_frac = a.frac_bits() + b.frac_bits();
        let res_bits = res_int + res_frac;

        let mut la = a.limbs.clone();
        let mut lb = b.limbs.clone();
        let neg_a = limb::is_negative(&la);
        let neg_b = limb::is_negative(&lb);
        if neg_a {
            limb::negate_inplace(&mut la);
        }
        if neg_b {
            limb::negate_inplace(&mut lb);
        }

        let (long, short) = if la.len() >= lb.len() { (&la, &lb) } else { (&lb, &la) };
        let mut product = vec![0 as Limb; long.len() + short.len()];
        limb::unsigned_mul(&mut product, long, short);
        if neg_a != neg_b {
            limb::negate_inplace(&mut product);
        }

        let limbs = limb::resize_signed(&product, limb::limb_count(res_bits));
        Fixed { bits: res_bits, int_bits: res_int, limbs }
    }

    /// Divides `self` by `other`, growing to a width that holds the exact
    /// integer-divided result; fails only if `other` is zero.
    pub fn checked_div(&self, other: &Fixed) -> Result<Fixed> {
        if limb::is_zero(&other.limbs) {
            return Err(Error::DivisionByZero);
        }
        let res_int = self.int_bits + other.frac_bits() + 1;
        let res_frac = self.frac_bits() + other.int_bits;
        let res_bits = res_int + res_frac;

        let neg_a = limb::is_negative(&self.limbs);
        let neg_b = limb::is_negative(&other.limbs);
        let mut num_mag = self.limbs.clone();
        if neg_a {
            limb::negate_inplace(&mut num_mag);
        }
        let mut den_mag = other.limbs.clone();
        if neg_b {
            limb::negate_inplace(&mut den_mag);
        }

        // Scaling the numerator by `2^bits(other)` before dividing (rather
        // than just `2^frac_bits(other)`) is what lines the integer quotient
        // up with `res_frac_bits = frac_bits(self) + int_bits(other)` from
        // the result-width table: `frac_bits(other) + int_bits(other) ==
        // bits(other)`, so this is the same shift, just derived from the
        // final format instead of restated in terms of a partial width.
        let shift = other.bits;
        let num_len = limb::limb_count(self.bits + shift + 8);
        let mut numerator = limb::resize_signed(&num_mag, num_len);
        limb::shl_logical(&mut numerator, shift.min(u32::MAX as i64) as u32);

        let mut quotient = vec![0 as Limb; numerator.len()];
        let mut remainder = vec![0 as Limb; den_mag.len()];
        limb::unsigned_div(&mut quotient, &mut remainder, &numerator, &den_mag);

        if neg_a != neg_b {
            limb::negate_inplace(&mut quotient);
        }
        let limbs = limb::resize_signed(&quotient, limb::limb_count(res_bits));
        Ok(Fixed { bits: res_bits, int_bits: res_int, limbs })
    }

    /// Absolute value, growing the integer part by one bit like negation.
    pub fn abs(&self) -> Fixed {
        if limb::is_negative(&self.limbs) {
            -self.clone()
        } else {
            let res_bits = self.bits + 1;
            let limbs = limb::resize_signed(&self.limbs, limb::limb_count(res_bits));
            Fixed { bits: res_bits, int_bits: self.int_bits + 1, limbs }
        }
    }

    fn compare(&self, other: &Fixed) -> Ordering {
        let diff = Fixed::add_or_sub(self, other, true);
        if limb::is_zero(&diff.limbs) {
            Ordering::Equal
        } else if limb::is_negative(&diff.limbs) {
            Ordering::Less
        } else {
            Ordering::Greater
        }
    }
}

impl Add for Fixed {
    type Output = Fixed;
    fn add(self, rhs: Fixed) -> Fixed {
        Fixed::add_or_sub(&self, &rhs, false)
    }
}

impl Sub for Fixed {
    type Output = Fixed;
    fn sub(self, rhs: Fixed) -> Fixed {
        Fixed::add_or_sub(&self, &rhs, true)
    }
}

impl Mul for Fixed {
    type Output = Fixed;
    fn mul(self, rhs: Fixed) -> Fixed {
        Fixed::multiply(&self, &rhs)
    }
}

impl Div for Fixed {
    type Output = Fixed;
    /// Panics if `rhs` is zero; use [`Fixed::checked_div`] to handle that
    /// case without panicking.
    fn div(self, rhs: Fixed) -> Fixed {
        self.checked_div(&rhs).expect("division by zero")
    }
}

impl Neg for Fixed {
    type Output = Fixed;
    fn neg(self) -> Fixed {
        let res_bits = self.bits + 1;
        let mut limbs = limb::resize_signed(&self.limbs, limb::limb_count(res_bits));
        limb::negate_inplace(&mut limbs);
        limb::sign_extend(&mut limbs, res_bits);
        Fixed { bits: res_bits, int_bits: self.int_bits + 1, limbs }
    }
}

/// Binary-point-relative left shift: multiplies by `2^s` at zero cost by
/// adjusting `int_bits` without touching the stored limbs.
impl Shl<i64> for Fixed {
    type Output = Fixed;
    fn shl(self, s: i64) -> Fixed {
        Fixed { bits: self.bits, int_bits: self.int_bits + s, limbs: self.limbs }
    }
}

/// Binary-point-relative right shift, the inverse of [`Shl`].
impl Shr<i64> for Fixed {
    type Output = Fixed;
    fn shr(self, s: i64) -> Fixed {
        Fixed { bits: self.bits, int_bits: self.int_bits - s, limbs: self.limbs }
    }
}

impl PartialEq for Fixed {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Eq for Fixed {}

impl PartialOrd for Fixed {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

impl Ord for Fixed {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    #[test]
    fn roundtrips_through_i64() {
        let v = Fixed::from_i64(-42, 16, 16).unwrap();
        assert_eq!(v.to_f64(), -42.0);
    }

    #[test]
    fn add_grows_int_bits_by_one() {
        let a = Fixed::from_i64(3, 8, 8).unwrap();
        let b = Fixed::from_i64(4, 8, 8).unwrap();
        let sum = a + b;
        assert_eq!(sum.int_bits(), 9);
        assert_eq!(sum.to_f64(), 7.0);
    }

    #[test]
    fn multiply_widens_to_product() {
        let a = Fixed::from_f64(1.5, 8, 4).unwrap();
        let b = Fixed::from_f64(2.0, 8, 4).unwrap();
        let product = a * b;
        assert_eq!(product.bits(), 16);
        assert_eq!(product.to_f64(), 3.0);
    }

    #[test]
    fn divide_by_zero_fails() {
        let a = Fixed::from_i64(1, 8, 8).unwrap();
        let z = Fixed::from_i64(0, 8, 8).unwrap();
        assert!(matches!(a.checked_div(&z), Err(Error::DivisionByZero)));
    }

    #[test]
    fn divide_recovers_quotient() {
        let a = Fixed::from_f64(6.0, 16, 8).unwrap();
        let b = Fixed::from_f64(2.0, 16, 8).unwrap();
        let q = a.checked_div(&b).unwrap();
        assert_eq!(q.to_f64(), 3.0);
    }

    #[test]
    fn ordering_across_differing_formats() {
        let a = Fixed::from_f64(1.5, 16, 8).unwrap();
        let b = Fixed::from_f64(1.25, 20, 4).unwrap();
        assert!(a > b);
        assert!(b < a);
    }

    #[test]
    fn shift_moves_binary_point_without_touching_limbs() {
        let a = Fixed::from_i64(3, 8, 8).unwrap();
        let shifted = a.clone() << 2;
        assert_eq!(shifted.limbs(), a.limbs());
        assert_eq!(shifted.int_bits(), 10);
        assert_eq!(shifted.to_f64(), 12.0);
    }

    #[test]
    fn cast_saturates_on_overflow() {
        let a = Fixed::from_i64(200, 16, 16).unwrap();
        let narrowed = a
            .cast_with(8, 8, QuantMode::Trn, OverflowMode::Sat, &mut NeverRng)
            .unwrap();
        assert_eq!(narrowed.to_f64(), 127.0);
    }

    #[test]
    fn decimal_string_roundtrip() {
        let a = Fixed::from_decimal_str("-12.375", 32, 16).unwrap();
        assert_eq!(a.to_decimal_string(), "-12.375");
    }

    #[quickcheck]
    fn identity_cast_is_a_no_op(v: i32) -> bool {
        let x = Fixed::from_i64(v as i64, 40, 20).unwrap();
        let cast = x.clone().cast_with(40, 20, QuantMode::Trn, OverflowMode::Wrap, &mut NeverRng).unwrap();
        x.is_identical(&cast)
    }

    #[quickcheck]
    fn double_negation_recovers_original_value(v: i32) -> bool {
        let x = Fixed::from_i64(v as i64, 40, 20).unwrap();
        -(-x.clone()) == x
    }

    #[quickcheck]
    fn add_then_subtract_recovers_original(a: i16, b: i16) -> bool {
        let x = Fixed::from_i64(a as i64, 24, 16).unwrap();
        let y = Fixed::from_i64(b as i64, 24, 16).unwrap();
        let recovered = (x.clone() + y.clone() - y)
            .cast_with(24, 16, QuantMode::Trn, OverflowMode::Wrap, &mut NeverRng)
            .unwrap();
        recovered == x
    }

    #[quickcheck]
    fn multiplication_is_commutative(a: i16, b: i16) -> bool {
        let x = Fixed::from_i64(a as i64, 20, 12).unwrap();
        let y = Fixed::from_i64(b as i64, 20, 12).unwrap();
        x.clone() * y.clone() == y * x
    }

    #[quickcheck]
    fn double_round_trip(v: i32) -> bool {
        let d = v as f64 / 256.0;
        let x = Fixed::from_f64(d, 64, 32).unwrap();
        x.to_f64() == d
    }
}
