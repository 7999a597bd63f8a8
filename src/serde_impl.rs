/*!

`serde` support, gated behind the `serde` feature: a [`Fixed`] or [`Float`]
serializes as its bit pattern plus layout (not as the represented decimal
value), since a runtime-chosen width has no fixed wire shape a reader could
assume ahead of time the way a compile-time-sized type would.

*/

use crate::limb::Limb;
use crate::{Fixed, Float};
use alloc::vec::Vec;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Serialize, Deserialize)]
struct FixedLayout {
    bits: i64,
    int_bits: i64,
    limbs: Vec<Limb>,
}

impl Serialize for Fixed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (bits, int_bits, limbs) = self.to_bit_pattern();
        FixedLayout { bits, int_bits, limbs: limbs.to_vec() }.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Fixed {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let layout = FixedLayout::deserialize(deserializer)?;
        Fixed::new(layout.bits, layout.int_bits, layout.limbs).map_err(DeError::custom)
    }
}

#[derive(Serialize, Deserialize)]
struct FloatLayout {
    sign: bool,
    exp: i64,
    man: u64,
    exp_bits: i64,
    man_bits: i64,
    bias: i64,
}

impl Serialize for Float {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        FloatLayout {
            sign: self.sign(),
            exp: self.exp(),
            man: self.man(),
            exp_bits: self.exp_bits(),
            man_bits: self.man_bits(),
            bias: self.bias(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Float {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let layout = FloatLayout::deserialize(deserializer)?;
        Float::new(layout.sign, layout.exp, layout.man, layout.exp_bits, layout.man_bits, layout.bias)
            .map_err(DeError::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_round_trips_through_json() {
        let v = Fixed::from_f64(-12.375, 32, 16).unwrap();
        let json = serde_json::to_string(&v).unwrap();
        let back: Fixed = serde_json::from_str(&json).unwrap();
        assert!(v.is_identical(&back));
    }

    #[test]
    fn float_round_trips_through_json() {
        let v = Float::from_f64(3.5, 11, 52, 1023).unwrap();
        let json = serde_json::to_string(&v).unwrap();
        let back: Float = serde_json::from_str(&json).unwrap();
        assert_eq!(back.to_f64(), 3.5);
    }
}
