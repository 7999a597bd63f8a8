/*!

Arbitrary-precision fixed-point and custom-format floating-point arithmetic.

This crate models digital-hardware number representations: the caller picks
an exact bit layout (integer and fractional bits for fixed-point, or
exponent/mantissa bits and a bias for floating-point) and the arithmetic
faithfully emulates that representation, including the rounding and
overflow behavior a hardware designer would specify.

# Layout

- [`limb_kernel`] — the multi-limb integer kernel (add/sub/shift/mul/div) all
  other types are built from.
- [`Fixed`] — an arbitrary-width two's-complement fixed-point value.
- [`ComplexFixed`] — a pair of [`Fixed`] values sharing one layout.
- [`Float`] — an IEEE-754-shaped floating-point value with configurable
  exponent/mantissa widths and bias.
- [`QuantMode`]/[`OverflowMode`] — the rounding and overflow policies the
  cast pipeline applies.
- `context` — process-wide (thread-local) default policies, overridable
  in a scoped, nestable fashion. Requires the `std` feature.

# `no_std`

This crate is `no_std` when the `std` feature (on by default) is disabled.
Disabling `std` also disables the scoped context overrides, since those are
implemented with thread-local storage.

 */
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

mod bcd;
#[cfg(feature = "bytemuck")]
mod bytemuck_impl;
mod cast;
mod complex;
#[cfg(feature = "std")]
mod context;
mod error;
mod fixed;
mod float;
mod ieee754;
mod inner_product;
mod limb;
#[cfg(feature = "serde")]
mod serde_impl;

pub use cast::{OverflowMode, QuantMode};
pub use complex::ComplexFixed;
#[cfg(feature = "std")]
pub use context::{
    FixedAccumulatorOverride, FixedContext, FloatAccumulatorOverride, FloatContext,
};
pub use error::{Error, Result};
pub use fixed::Fixed;
pub use float::Float;
#[cfg(feature = "std")]
pub use inner_product::{fixed_inner_product, float_inner_product};
pub use inner_product::{fixed_inner_product_with, float_inner_product_with};

/// Limits and leaf helpers on the raw limb array, exposed for advanced callers
/// (e.g. an array/container layer) that need to build values directly from
/// limb storage instead of going through [`Fixed`]/[`Float`] constructors.
pub mod limb_kernel {
    pub use crate::limb::{limb_count, Limb, Wide, LIMB_BITS};
}
