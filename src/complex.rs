/*!

A complex number built from two [`Fixed`] values sharing one `(bits,
int_bits)` layout.

The multi-limb kernel already gives [`Fixed`] correctly-growing,
sign-aware add/sub/mul/div; this type just applies the usual complex
arithmetic identities on top of those instead of re-deriving a raw-limb
scratch layout, so its result widths fall out of [`Fixed`]'s own growth
rules for free.

 */

use crate::{Error, Fixed, Result};

/// A complex fixed-point value: real and imaginary parts stored as
/// independent [`Fixed`]s that share one layout.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexFixed {
    re: Fixed,
    im: Fixed,
}

impl ComplexFixed {
    /// Builds a complex value from its real and imaginary parts, which must
    /// share the same `(bits, int_bits)` layout.
    pub fn new(re: Fixed, im: Fixed) -> Result<Self> {
        if re.bits() != im.bits() || re.int_bits() != im.int_bits() {
            return Err(Error::InvalidSize(alloc::format!(
                "real and imaginary parts must share one layout: re is ({}, {}), im is ({}, {})",
                re.bits(),
                re.int_bits(),
                im.bits(),
                im.int_bits(),
            )));
        }
        Ok(ComplexFixed { re, im })
    }

    pub fn re(&self) -> &Fixed {
        &self.re
    }

    pub fn im(&self) -> &Fixed {
        &self.im
    }

    pub fn is_zero(&self) -> bool {
        self.re.is_zero() && self.im.is_zero()
    }

    /// Complex conjugate, same layout as `self`.
    pub fn conj(&self) -> ComplexFixed {
        ComplexFixed { re: self.re.clone(), im: -self.im.clone() }
    }

    /// `(a+bi)(c+di) = (ac-bd) + (bc+ad)i`, growing to `1 + bits(a) +
    /// bits(c)` like a scalar [`Fixed`] multiply followed by an add.
    pub fn mul(&self, other: &ComplexFixed) -> ComplexFixed {
        let ac = self.re.clone() * other.re.clone();
        let bd = self.im.clone() * other.im.clone();
        let bc = self.im.clone() * other.re.clone();
        let ad = self.re.clone() * other.im.clone();
        ComplexFixed { re: ac - bd, im: bc + ad }
    }

    /// `(a+bi)/(c+di) = ((ac+bd) + (bc-ad)i) / (c^2+d^2)`. Fails if `other`
    /// is zero.
    pub fn checked_div(&self, other: &ComplexFixed) -> Result<ComplexFixed> {
        if other.is_zero() {
            return Err(Error::DivisionByZero);
        }
        let c2 = other.re.clone() * other.re.clone();
        let d2 = other.im.clone() * other.im.clone();
        let den = c2 + d2;

        let ac = self.re.clone() * other.re.clone();
        let bd = self.im.clone() * other.im.clone();
        let num_re = ac + bd;

        let bc = self.im.clone() * other.re.clone();
        let ad = self.re.clone() * other.im.clone();
        let num_im = bc - ad;

        let re = num_re.checked_div(&den)?;
        let im = num_im.checked_div(&den)?;
        Ok(ComplexFixed { re, im })
    }
}

impl core::ops::Add for ComplexFixed {
    type Output = ComplexFixed;
    fn add(self, rhs: ComplexFixed) -> ComplexFixed {
        ComplexFixed { re: self.re + rhs.re, im: self.im + rhs.im }
    }
}

impl core::ops::Sub for ComplexFixed {
    type Output = ComplexFixed;
    fn sub(self, rhs: ComplexFixed) -> ComplexFixed {
        ComplexFixed { re: self.re - rhs.re, im: self.im - rhs.im }
    }
}

impl core::ops::Neg for ComplexFixed {
    type Output = ComplexFixed;
    fn neg(self) -> ComplexFixed {
        ComplexFixed { re: -self.re, im: -self.im }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(re: f64, im: f64, bits: i64, int_bits: i64) -> ComplexFixed {
        ComplexFixed::new(
            Fixed::from_f64(re, bits, int_bits).unwrap(),
            Fixed::from_f64(im, bits, int_bits).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn multiply_matches_scenario() {
        // (1+2i) * (3-i) in (bits=8, int_bits=4) -> (5+5i) in (bits=17, int_bits=9)
        let a = c(1.0, 2.0, 8, 4);
        let b = c(3.0, -1.0, 8, 4);
        let product = a.mul(&b);
        assert_eq!(product.re().bits(), 17);
        assert_eq!(product.re().int_bits(), 9);
        assert_eq!(product.re().to_f64(), 5.0);
        assert_eq!(product.im().to_f64(), 5.0);
    }

    #[test]
    fn divide_by_zero_fails() {
        let a = c(1.0, 1.0, 8, 4);
        let z = c(0.0, 0.0, 8, 4);
        assert!(matches!(a.checked_div(&z), Err(Error::DivisionByZero)));
    }

    #[test]
    fn divide_recovers_value() {
        let a = c(4.0, 2.0, 16, 8);
        let b = c(2.0, 0.0, 16, 8);
        let q = a.checked_div(&b).unwrap();
        assert_eq!(q.re().to_f64(), 2.0);
        assert_eq!(q.im().to_f64(), 1.0);
    }

    #[test]
    fn mismatched_layout_rejected() {
        let re = Fixed::from_f64(1.0, 8, 4).unwrap();
        let im = Fixed::from_f64(1.0, 16, 8).unwrap();
        assert!(ComplexFixed::new(re, im).is_err());
    }
}
