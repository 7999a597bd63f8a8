//! Schoolbook multiplication on limb slices, built on a `W×W -> 2W`
//! primitive (native on every target Rust runs on: `u128`/`u64` hardware
//! multiplication, or `u64`/`u32` when the `limb32` feature is enabled).

use super::{Limb, Wide, LIMB_BITS};

#[inline]
fn widen(a: Limb, b: Limb) -> Wide {
    a as Wide * b as Wide
}

/// `dst = src * k` over `n = src.len() = dst.len()` limbs, returning the
/// carry out of the top limb.
pub fn mul_by_limb(dst: &mut [Limb], src: &[Limb], k: Limb) -> Limb {
    let mut carry = 0 as Wide;
    for i in 0..dst.len() {
        let p = widen(src[i], k) + carry;
        dst[i] = p as Limb;
        carry = p >> LIMB_BITS;
    }
    carry as Limb
}

/// `dst += src * k` over `n = src.len() = dst.len()` limbs, returning the
/// carry out of the top limb.
pub fn addmul_by_limb(dst: &mut [Limb], src: &[Limb], k: Limb) -> Limb {
    let mut carry = 0 as Wide;
    for i in 0..dst.len() {
        let p = widen(src[i], k) + carry + dst[i] as Wide;
        dst[i] = p as Limb;
        carry = p >> LIMB_BITS;
    }
    carry as Limb
}

/// `dst -= src * k` over `n = src.len() = dst.len()` limbs, returning the
/// borrow out of the top limb (as a `Limb` to be subtracted from whatever
/// sits above `dst`).
pub fn submul_by_limb(dst: &mut [Limb], src: &[Limb], k: Limb) -> Limb {
    let mut borrow = 0 as Wide;
    for i in 0..dst.len() {
        let p = widen(src[i], k) + borrow;
        let p_lo = p as Limb;
        let (d, b) = dst[i].overflowing_sub(p_lo);
        dst[i] = d;
        borrow = (p >> LIMB_BITS) + b as Wide;
    }
    borrow as Limb
}

/// `dst = a * b`, unsigned magnitudes, `a.len() >= b.len()`,
/// `dst.len() == a.len() + b.len()`. Outer loop over limbs of `b`: the
/// first pass writes `dst` directly, subsequent passes accumulate with
/// [`addmul_by_limb`].
pub fn unsigned_mul(dst: &mut [Limb], a: &[Limb], b: &[Limb]) {
    debug_assert!(a.len() >= b.len());
    debug_assert_eq!(dst.len(), a.len() + b.len());
    for d in dst.iter_mut() {
        *d = 0;
    }
    if b.is_empty() || a.is_empty() {
        return;
    }
    dst[a.len()] = mul_by_limb(&mut dst[..a.len()], a, b[0]);
    for (j, &bj) in b.iter().enumerate().skip(1) {
        let carry = addmul_by_limb(&mut dst[j..j + a.len()], a, bj);
        dst[j + a.len()] = carry;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned_mul_small() {
        let a = [6 as Limb];
        let b = [7 as Limb];
        let mut dst = [0 as Limb; 2];
        unsigned_mul(&mut dst, &a, &b);
        assert_eq!(dst, [42, 0]);
    }

    #[test]
    fn unsigned_mul_with_carry_chain() {
        let a = [Limb::MAX, Limb::MAX];
        let b = [2 as Limb];
        let mut dst = [0 as Limb; 3];
        unsigned_mul(&mut dst, &a, &b);
        // (2^128 - 1) * 2 = 2^129 - 2
        assert_eq!(dst, [Limb::MAX - 1, Limb::MAX, 1]);
    }
}
