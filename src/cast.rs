/*!

The quantization and overflow policies applied whenever a fixed-point or
floating-point value changes word length: [`QuantMode`] controls how bits
are discarded when the binary point moves left, [`OverflowMode`] controls
what happens when the integer part no longer fits.

Every mode except the jam/stochastic families is expressed as one 0/1
rounding-increment function over three booleans describing the discarded
bits — `guard` (the most significant discarded bit), `sticky` (OR of every
bit below that), and `lsb` (the bit that stays, needed by the
ties-to-even/odd modes) — plus the sign of the value being rounded. This
mirrors the guard/round/sticky terminology a hardware rounder is built
from.

 */

use crate::limb::{self, Limb, LIMB_BITS};
use rand::RngCore;

/// How a fixed-point or floating-point cast rounds away discarded
/// fractional bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuantMode {
    /// Floor: arithmetic right shift, no correction.
    Trn,
    /// Round toward `+∞` (ceiling).
    TrnInf,
    /// Truncate toward zero.
    TrnZero,
    /// Magnitude truncation: toward zero for positives, away for negatives.
    /// Bit-identical to [`QuantMode::Trn`] in two's complement.
    TrnMag,
    /// Round away from zero.
    TrnAway,
    /// Round to nearest, ties toward `+∞`.
    Rnd,
    /// Round to nearest, ties toward zero.
    RndZero,
    /// Round to nearest, ties away from zero.
    RndInf,
    /// Round to nearest, ties toward `-∞`.
    RndMinInf,
    /// Round to nearest, ties to even (banker's rounding).
    RndConv,
    /// Round to nearest, ties to odd.
    RndConvOdd,
    /// Arithmetic shift, then force the kept LSB to 1.
    Jam,
    /// Arithmetic shift, then force the kept LSB to 1 only if any discarded
    /// bit was set.
    JamUnbiased,
    /// Add a uniformly-random value spanning the discarded bits, then
    /// shift (stochastic rounding).
    StochWeighted,
    /// Flip a fair coin to decide whether to round up, only when some
    /// discarded bit was set.
    StochEqual,
}

/// How a cast handles a value whose integer part no longer fits the
/// target width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverflowMode {
    /// Two's-complement wraparound: keep the low `new_bits` bits.
    Wrap,
    /// Clamp to the representable minimum/maximum.
    Sat,
    /// Like [`OverflowMode::Wrap`] on well-formed input, but forces every
    /// bit above the sign to match the sign bit rather than truncating
    /// blindly — the "numeric_std"-style resize discipline.
    NumericStd,
}

/// `B`, the 0/1 correction added to the floor-shifted result, for every
/// mode except the jam/stochastic families (handled directly in
/// [`quantize`]).
fn rounding_increment(mode: QuantMode, guard: bool, sticky: bool, lsb: bool, sign: bool) -> bool {
    match mode {
        QuantMode::Trn | QuantMode::TrnMag | QuantMode::Jam | QuantMode::JamUnbiased => false,
        QuantMode::TrnInf => guard || sticky,
        QuantMode::TrnZero => sign && (guard || sticky),
        QuantMode::TrnAway => !sign && (guard || sticky),
        QuantMode::Rnd => guard,
        QuantMode::RndZero => guard && (sticky || sign),
        QuantMode::RndInf => guard && (sticky || !sign),
        QuantMode::RndMinInf => guard && sticky,
        QuantMode::RndConv => guard && (sticky || lsb),
        QuantMode::RndConvOdd => guard && (sticky || !lsb),
        QuantMode::StochEqual | QuantMode::StochWeighted => {
            unreachable!("stochastic modes are handled directly in quantize()")
        }
    }
}

/// Quantizes `limbs` (a sign-extended two's-complement scratch buffer) by
/// `delta` bits: `delta >= 0` left-shifts losslessly, `delta < 0`
/// right-shifts by `|delta|` with the rounding `mode` dictates. `limbs` is
/// modified in place; its length does not change.
pub fn quantize(limbs: &mut [Limb], delta: i64, mode: QuantMode, rng: &mut dyn RngCore) {
    if delta >= 0 {
        if delta > 0 {
            limb::shl_logical(limbs, delta as u32);
        }
        return;
    }
    let n = -delta;
    let sign = limb::is_negative(limbs);
    let guard = limb::test_bit(limbs, n - 1);
    let sticky = limb::any_bit_set_below(limbs, n - 1);
    // Stochastic modes need the actual discarded-bit pattern, not just its
    // guard/sticky summary; capture up to 128 low bits before shifting.
    let frac = low_bits_as_u128(limbs, n);

    limb::shr_arithmetic(limbs, n.min(u32::MAX as i64) as u32);

    let increment = match mode {
        QuantMode::Jam => {
            limbs[0] |= 1;
            false
        }
        QuantMode::JamUnbiased => {
            if guard || sticky {
                limbs[0] |= 1;
            }
            false
        }
        QuantMode::StochWeighted => {
            let width = n.clamp(0, 128) as u32;
            let random = draw_u128(rng, width);
            width > 0 && frac.checked_add(random).map(|v| v >> width != 0).unwrap_or(true)
        }
        QuantMode::StochEqual => (guard || sticky) && rng.next_u32() & 1 != 0,
        _ => {
            let lsb = limbs[0] & 1 != 0;
            rounding_increment(mode, guard, sticky, lsb, sign)
        }
    };
    if increment {
        limb::inplace_add_single(limbs, 1);
    }
}

/// Overflow policy applied after quantization: resizes/wraps/saturates
/// `limbs` (already sized to the final limb count) to fit `new_bits`.
/// Returns `true` if the value did not fit and was adjusted.
pub fn overflow(limbs: &mut [Limb], new_bits: i64, mode: OverflowMode) -> bool {
    if fits_in_bits(limbs, new_bits) {
        limb::sign_extend(limbs, new_bits);
        return false;
    }
    match mode {
        OverflowMode::Wrap | OverflowMode::NumericStd => {
            limb::sign_extend(limbs, new_bits);
        }
        OverflowMode::Sat => {
            set_saturated(limbs, new_bits, limb::is_negative(limbs));
        }
    }
    true
}

fn fits_in_bits(limbs: &[Limb], bits: i64) -> bool {
    let sign = limb::is_negative(limbs);
    let top_bit = bits - 1;
    for pos in top_bit..(limbs.len() as i64 * LIMB_BITS as i64) {
        if limb::test_bit(limbs, pos) != sign {
            return false;
        }
    }
    true
}

/// Sets `limbs` to the representable extreme (`2^(bits-1) - 1` or
/// `-2^(bits-1)`) of a `bits`-wide two's-complement value, sign-extended to
/// `limbs.len()`.
fn set_saturated(limbs: &mut [Limb], bits: i64, negative: bool) {
    let top_bit = bits - 1;
    let top_limb = (top_bit / LIMB_BITS as i64) as usize;
    let top_bit_in_limb = (top_bit % LIMB_BITS as i64) as u32;
    for (i, l) in limbs.iter_mut().enumerate() {
        *l = match (i.cmp(&top_limb), negative) {
            (core::cmp::Ordering::Less, _) => {
                if negative {
                    0
                } else {
                    Limb::MAX
                }
            }
            (core::cmp::Ordering::Equal, false) => ((1 as Limb) << top_bit_in_limb) - 1,
            (core::cmp::Ordering::Equal, true) => (1 as Limb) << top_bit_in_limb,
            (core::cmp::Ordering::Greater, _) => {
                if negative {
                    Limb::MAX
                } else {
                    0
                }
            }
        };
    }
}

/// An `RngCore` that panics if drawn from, for callers that can prove
/// statically that the chosen quantization mode never touches the PRNG (e.g.
/// the exact-width conversions `Fixed::from_i64` builds on `TRN`/`WRAP`).
pub(crate) struct NeverRng;

impl RngCore for NeverRng {
    fn next_u32(&mut self) -> u32 {
        unreachable!("quantization mode does not draw randomness")
    }
    fn next_u64(&mut self) -> u64 {
        unreachable!("quantization mode does not draw randomness")
    }
    fn fill_bytes(&mut self, _dest: &mut [u8]) {
        unreachable!("quantization mode does not draw randomness")
    }
    fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
        unreachable!("quantization mode does not draw randomness")
    }
}

fn draw_u128(rng: &mut dyn RngCore, width: u32) -> u128 {
    if width == 0 {
        return 0;
    }
    let full = ((rng.next_u64() as u128) << 64) | rng.next_u64() as u128;
    if width >= 128 {
        full
    } else {
        full & ((1u128 << width) - 1)
    }
}

/// Reads up to the low 128 bits of the (sign-extended) value as an unsigned
/// integer, capped to `n` bits (bits beyond `n` are masked off).
fn low_bits_as_u128(limbs: &[Limb], n: i64) -> u128 {
    let width = n.clamp(0, 128) as u32;
    let mut out = 0u128;
    for i in 0..width {
        if limb::test_bit(limbs, i as i64) {
            out |= 1u128 << i;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    fn rng() -> StepRng {
        StepRng::new(0, 1)
    }

    #[test]
    fn trn_floors_negative() {
        let mut limbs = [(-5i64) as u64 as Limb];
        quantize(&mut limbs, -1, QuantMode::Trn, &mut rng());
        assert_eq!(limbs[0] as i64, -3); // floor(-5/2) = -3
    }

    #[test]
    fn rnd_ties_to_positive_infinity() {
        let mut limbs = [(-3i64) as u64 as Limb];
        quantize(&mut limbs, -1, QuantMode::Rnd, &mut rng());
        assert_eq!(limbs[0] as i64, -1);
    }

    #[test]
    fn rnd_conv_ties_to_even() {
        let mut a = [2i64 as u64 as Limb]; // no tie: frac=0
        quantize(&mut a, -1, QuantMode::RndConv, &mut rng());
        assert_eq!(a[0] as i64, 1);

        let mut b = [3i64 as u64 as Limb]; // tie: 3/2 -> round to even -> 2
        quantize(&mut b, -1, QuantMode::RndConv, &mut rng());
        assert_eq!(b[0] as i64, 2);

        let mut c = [5i64 as u64 as Limb]; // tie: 5/2 -> floor 2 is even -> stays 2
        quantize(&mut c, -1, QuantMode::RndConv, &mut rng());
        assert_eq!(c[0] as i64, 2);
    }

    #[test]
    fn jam_forces_lsb() {
        let mut limbs = [4 as Limb];
        quantize(&mut limbs, -1, QuantMode::Jam, &mut rng());
        assert_eq!(limbs[0] & 1, 1);
    }

    #[test]
    fn overflow_saturates_positive() {
        let mut limbs = [0xFF as Limb];
        let did = overflow(&mut limbs, 4, OverflowMode::Sat);
        assert!(did);
        assert_eq!(limbs[0] as i64, 0b0111);
    }

    #[test]
    fn overflow_wraps() {
        let mut limbs = [0xFF as Limb];
        overflow(&mut limbs, 4, OverflowMode::Wrap);
        assert_eq!(limbs[0] & 0xF, 0xF);
    }

    #[test]
    fn overflow_fits_leaves_value_alone() {
        let mut limbs = [5 as Limb];
        let did = overflow(&mut limbs, 8, OverflowMode::Wrap);
        assert!(!did);
        assert_eq!(limbs[0], 5);
    }
}
