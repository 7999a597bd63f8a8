/*!

The inner-product contract an N-dimensional array layer would build on:
given two equal-length sequences, produce their sum-of-products either at
full precision (fixed-point only) or quantized to an accumulator format
after every multiply and every running-sum update.

 */

use crate::cast::{OverflowMode, QuantMode};
use crate::{Error, Fixed, Float, Result};
use rand::RngCore;

/// `(bits, int_bits, quantization, overflow)` accumulator format, mirroring
/// [`crate::context::FixedAccumulatorFormat`] without requiring the `std`
/// feature this module doesn't need.
pub type FixedAccumulatorFormat = (i64, i64, QuantMode, OverflowMode);
/// `(exp_bits, man_bits, bias, quantization)` accumulator format, mirroring
/// [`crate::context::FloatAccumulatorFormat`].
pub type FloatAccumulatorFormat = (i64, i64, i64, QuantMode);

fn check_equal_length<T>(a: &[T], b: &[T]) -> Result<()> {
    if a.len() != b.len() {
        return Err(Error::InvalidSize(alloc::format!(
            "inner product operands must have equal length: {} vs {}",
            a.len(),
            b.len()
        )));
    }
    Ok(())
}

/// Sum of products of two equal-length `Fixed` sequences. With `accumulator
/// = None`, every product and partial sum keeps its full, naturally-growing
/// width; with `Some(format)`, every product and every running-sum update is
/// quantized to `format` before the next step.
pub fn fixed_inner_product_with(
    a: &[Fixed],
    b: &[Fixed],
    accumulator: Option<FixedAccumulatorFormat>,
    rng: &mut dyn RngCore,
) -> Result<Fixed> {
    check_equal_length(a, b)?;
    let mut acc: Option<Fixed> = None;
    for (x, y) in a.iter().zip(b.iter()) {
        let mut product = x.clone() * y.clone();
        if let Some((bits, int_bits, q, v)) = accumulator {
            product = product.cast_with(bits, int_bits, q, v, rng)?;
        }
        acc = Some(match acc {
            None => product,
            Some(prev) => {
                let mut sum = prev + product;
                if let Some((bits, int_bits, q, v)) = accumulator {
                    sum = sum.cast_with(bits, int_bits, q, v, rng)?;
                }
                sum
            }
        });
    }
    acc.ok_or_else(|| Error::InvalidValue("inner product of empty sequences is undefined".into()))
}

/// Sum of products of two equal-length `Float` sequences. Every product and
/// every running-sum update rounds once with `q_mode`; if `accumulator` is
/// given, each of those steps is additionally cast to its format.
pub fn float_inner_product_with(
    a: &[Float],
    b: &[Float],
    q_mode: QuantMode,
    accumulator: Option<FloatAccumulatorFormat>,
    rng: &mut dyn RngCore,
) -> Result<Float> {
    check_equal_length(a, b)?;
    let mut acc: Option<Float> = None;
    for (x, y) in a.iter().zip(b.iter()) {
        let mut product = x.mul_with(y, q_mode, rng);
        if let Some((eb, mb, bi, qm)) = accumulator {
            product = product.cast_with(eb, mb, bi, qm, rng)?;
        }
        acc = Some(match acc {
            None => product,
            Some(prev) => {
                let mut sum = prev.add_with(&product, q_mode, rng);
                if let Some((eb, mb, bi, qm)) = accumulator {
                    sum = sum.cast_with(eb, mb, bi, qm, rng)?;
                }
                sum
            }
        });
    }
    acc.ok_or_else(|| Error::InvalidValue("inner product of empty sequences is undefined".into()))
}

#[cfg(feature = "std")]
pub fn fixed_inner_product(a: &[Fixed], b: &[Fixed]) -> Result<Fixed> {
    let accumulator = crate::context::FixedAccumulatorOverride::current();
    crate::context::FloatContext::with_rng(|rng| fixed_inner_product_with(a, b, accumulator, rng))
}

#[cfg(feature = "std")]
pub fn float_inner_product(a: &[Float], b: &[Float]) -> Result<Float> {
    let accumulator = crate::context::FloatAccumulatorOverride::current();
    let q_mode = crate::context::FloatContext::current_quant_mode();
    crate::context::FloatContext::with_rng(|rng| float_inner_product_with(a, b, q_mode, accumulator, rng))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fx(v: f64) -> Fixed {
        Fixed::from_f64(v, 16, 8).unwrap()
    }

    fn flt(v: f64) -> Float {
        Float::from_f64(v, 11, 52, 1023).unwrap()
    }

    #[test]
    fn fixed_inner_product_full_precision() {
        let a = [fx(1.0), fx(2.0), fx(3.0)];
        let b = [fx(4.0), fx(5.0), fx(6.0)];
        let mut rng = crate::cast::NeverRng;
        let dot = fixed_inner_product_with(&a, &b, None, &mut rng).unwrap();
        assert_eq!(dot.to_f64(), 1.0 * 4.0 + 2.0 * 5.0 + 3.0 * 6.0);
    }

    #[test]
    fn fixed_inner_product_rejects_mismatched_length() {
        let a = [fx(1.0), fx(2.0)];
        let b = [fx(1.0)];
        let mut rng = crate::cast::NeverRng;
        assert!(fixed_inner_product_with(&a, &b, None, &mut rng).is_err());
    }

    #[test]
    fn fixed_inner_product_quantizes_with_accumulator_format() {
        let a = [fx(1.5), fx(2.5)];
        let b = [fx(2.0), fx(2.0)];
        let mut rng = crate::cast::NeverRng;
        let dot = fixed_inner_product_with(
            &a,
            &b,
            Some((16, 8, QuantMode::Trn, OverflowMode::Wrap)),
            &mut rng,
        )
        .unwrap();
        assert_eq!(dot.bits(), 16);
        assert_eq!(dot.int_bits(), 8);
        assert_eq!(dot.to_f64(), 8.0);
    }

    #[test]
    fn float_inner_product_matches_native_arithmetic() {
        let a = [flt(1.0), flt(2.0), flt(3.0)];
        let b = [flt(4.0), flt(5.0), flt(6.0)];
        let mut rng = crate::cast::NeverRng;
        let dot = float_inner_product_with(&a, &b, QuantMode::RndConv, None, &mut rng).unwrap();
        assert_eq!(dot.to_f64(), 32.0);
    }
}
