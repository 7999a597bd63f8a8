//! Unsigned multi-limb division (Knuth's Algorithm D): normalize the
//! divisor so its top limb has its MSB set, estimate each quotient digit
//! from the top two-or-three limbs of the running remainder using native
//! `Wide` hardware division, then correct the estimate with at most two
//! subtract-and-add-back steps.

use super::mul::submul_by_limb;
use super::shift::{shl_limbs, shr_limbs};
use super::{Limb, Wide, LIMB_BITS};
use alloc::vec;
use alloc::vec::Vec;

/// `quotient, remainder = numerator / divisor`, unsigned magnitudes.
///
/// - `divisor` must not be all-zero.
/// - `quotient.len() == numerator.len()` (the caller sizes it to the widest
///   plausible quotient; leading limbs beyond the true quotient are zero).
/// - `remainder.len() == divisor.len()`.
pub fn unsigned_div(quotient: &mut [Limb], remainder: &mut [Limb], numerator: &[Limb], divisor: &[Limb]) {
    let dn = super::highest_nonzero_limb(divisor).map(|i| i + 1).unwrap_or(0);
    debug_assert!(dn > 0, "division by zero");
    let nn = super::highest_nonzero_limb(numerator).map(|i| i + 1).unwrap_or(0);

    for q in quotient.iter_mut() {
        *q = 0;
    }
    for r in remainder.iter_mut() {
        *r = 0;
    }

    if nn < dn {
        remainder[..nn].copy_from_slice(&numerator[..nn]);
        return;
    }

    if dn == 1 {
        let d = divisor[0];
        let mut rem = 0 as Wide;
        for i in (0..nn).rev() {
            let cur = (rem << LIMB_BITS) | numerator[i] as Wide;
            quotient[i] = (cur / d as Wide) as Limb;
            rem = cur % d as Wide;
        }
        remainder[0] = rem as Limb;
        return;
    }

    // Normalize: shift both operands left so divisor's top limb has its MSB
    // set. This bounds each qhat estimate's error to at most 2 over the true
    // digit (Knuth TAOCP vol 2, 4.3.1).
    let shift = divisor[dn - 1].leading_zeros();
    let mut d: Vec<Limb> = vec![0; dn];
    if shift == 0 {
        d.copy_from_slice(&divisor[..dn]);
    } else {
        shl_limbs(&mut d, &divisor[..dn], shift);
    }

    let mut u: Vec<Limb> = vec![0; nn + 1];
    if shift == 0 {
        u[..nn].copy_from_slice(&numerator[..nn]);
    } else {
        let carry = shl_limbs(&mut u[..nn], &numerator[..nn], shift);
        u[nn] = carry;
    }

    let qn = nn - dn;
    for j in (0..=qn).rev() {
        let top = ((u[j + dn] as Wide) << LIMB_BITS) | u[j + dn - 1] as Wide;
        let mut qhat = top / d[dn - 1] as Wide;
        let mut rhat = top % d[dn - 1] as Wide;

        while qhat > Limb::MAX as Wide
            || qhat * d[dn - 2] as Wide > (rhat << LIMB_BITS) + u[j + dn - 2] as Wide
        {
            qhat -= 1;
            rhat += d[dn - 1] as Wide;
            if rhat > Limb::MAX as Wide {
                break;
            }
        }

        let mut qhat_limb = qhat as Limb;
        let borrow = submul_by_limb(&mut u[j..j + dn], &d, qhat_limb);
        let (new_top, underflow) = u[j + dn].overflowing_sub(borrow);
        if underflow {
            // qhat was one too large: add the divisor back and step down.
            qhat_limb -= 1;
            let carry = super::add::inplace_add_same_length(&mut u[j..j + dn], &d);
            u[j + dn] = new_top.wrapping_add(carry);
        } else {
            u[j + dn] = new_top;
        }
        quotient[j] = qhat_limb;
    }

    if shift == 0 {
        remainder[..dn].copy_from_slice(&u[..dn]);
    } else {
        shr_limbs(&mut remainder[..dn], &u[..dn], shift);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_limb_divisor() {
        let num = [100 as Limb, 0];
        let div = [7 as Limb];
        let mut q = [0 as Limb; 2];
        let mut r = [0 as Limb; 1];
        unsigned_div(&mut q, &mut r, &num, &div);
        assert_eq!(q, [14, 0]);
        assert_eq!(r, [2]);
    }

    #[test]
    fn multi_limb_exact() {
        // divisor = 2^64 + 3 (two significant limbs); numerator = 2 * divisor,
        // so the quotient is exactly 2 with no remainder.
        let num = [6 as Limb, 2];
        let div = [3 as Limb, 1];
        let mut q = [0 as Limb; 2];
        let mut r = [0 as Limb; 2];
        unsigned_div(&mut q, &mut r, &num, &div);
        assert_eq!(q, [2, 0]);
        assert_eq!(r, [0, 0]);
    }

    #[test]
    fn multi_limb_with_remainder() {
        let num = [5 as Limb, 7];
        let div = [3 as Limb, 1];
        let mut q = [0 as Limb; 2];
        let mut r = [0 as Limb; 2];
        unsigned_div(&mut q, &mut r, &num, &div);
        // cross-check against wide native arithmetic via u128 composition
        let n = (num[1] as u128) << 64 | num[0] as u128;
        let d = (div[1] as u128) << 64 | div[0] as u128;
        let expect_q = n / d;
        let expect_r = n % d;
        let got_q = (q[1] as u128) << 64 | q[0] as u128;
        let got_r = (r[1] as u128) << 64 | r[0] as u128;
        assert_eq!(got_q, expect_q);
        assert_eq!(got_r, expect_r);
    }

    #[test]
    fn numerator_smaller_than_divisor() {
        let num = [5 as Limb, 0];
        let div = [3 as Limb, 1];
        let mut q = [0 as Limb; 2];
        let mut r = [0 as Limb; 2];
        unsigned_div(&mut q, &mut r, &num, &div);
        assert_eq!(q, [0, 0]);
        assert_eq!(r, [5, 0]);
    }
}
