/*!

Safe POD-casting of raw limb buffers, gated behind the `bytemuck` feature.

`Limb` (`u64`, or `u32` under the `limb32` feature) is already `Pod` and
`Zeroable` via bytemuck's blanket impls for primitive integers — there is
nothing to unsafely implement here. What's missing without this module is a
safe way to reinterpret a limb buffer as raw bytes for memory-mapped or
hardware-register interop, which is what `fxcore`'s "digital-hardware
modelling" purpose calls for; [`bytemuck::cast_slice`] provides exactly that,
entirely through its own safe API.

*/

use crate::limb::Limb;
use crate::Fixed;

impl Fixed {
    /// This value's raw two's-complement limb storage, reinterpreted as
    /// native-endian bytes.
    pub fn limbs_as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.limbs())
    }
}

/// Reinterprets a limb buffer as native-endian bytes.
pub fn limbs_to_bytes(limbs: &[Limb]) -> &[u8] {
    bytemuck::cast_slice(limbs)
}

/// Reinterprets a byte buffer as limbs. `bytes.len()` must be a multiple of
/// `size_of::<Limb>()`.
pub fn bytes_to_limbs(bytes: &[u8]) -> &[Limb] {
    bytemuck::cast_slice(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_bytes() {
        let limbs: Vec<Limb> = Fixed::from_i64(-42, 128, 64).unwrap().limbs().to_vec();
        let bytes = limbs_to_bytes(&limbs);
        let back = bytes_to_limbs(bytes);
        assert_eq!(back, limbs.as_slice());
    }

    #[test]
    fn fixed_exposes_its_limbs_as_bytes() {
        let v = Fixed::from_i64(7, 64, 32).unwrap();
        assert_eq!(v.limbs_as_bytes().len(), v.limbs().len() * core::mem::size_of::<Limb>());
    }
}
