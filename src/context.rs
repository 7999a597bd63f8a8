/*!

Process-wide (thread-local) default policies for quantization, overflow,
and accumulator formats, each overridable in a scoped, nestable fashion —
the Rust rendition of "mutable global configuration ... revised to
context-passing or thread-local slots".

Each of the four settings lives in its own `thread_local!` stack. Entering
a scope pushes a new value and returns a `Guard`; dropping the guard pops
it, restoring whatever was active before. Guards nest to arbitrary depth
and must be dropped in reverse acquisition order — ordinary lexical
scoping (or an explicit `drop(guard)`) already gives you this, so there is
no separate "exit" call to forget.

Unavailable without the `std` feature: without thread-local storage,
callers pass quantization/overflow modes explicitly to every cast instead.

 */

use crate::cast::{OverflowMode, QuantMode};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::cell::RefCell;

/// `(bits, int_bits, quantization, overflow)` accumulator format override
/// for fixed-point inner products.
pub type FixedAccumulatorFormat = (i64, i64, QuantMode, OverflowMode);
/// `(exp_bits, man_bits, bias, quantization)` accumulator format override
/// for floating-point inner products.
pub type FloatAccumulatorFormat = (i64, i64, i64, QuantMode);

thread_local! {
    static FIXED_CAST: RefCell<Vec<(QuantMode, OverflowMode)>> =
        RefCell::new(vec![(QuantMode::Rnd, OverflowMode::Wrap)]);
    static FLOAT_QUANT: RefCell<Vec<QuantMode>> = RefCell::new(vec![QuantMode::RndConv]);
    static FIXED_ACCUMULATOR: RefCell<Vec<Option<FixedAccumulatorFormat>>> =
        RefCell::new(vec![None]);
    static FLOAT_ACCUMULATOR: RefCell<Vec<Option<FloatAccumulatorFormat>>> =
        RefCell::new(vec![None]);
    static RNG: RefCell<SmallRng> = RefCell::new(SmallRng::from_entropy());
}

/// Process-wide default quantization and overflow mode used by `Fixed`
/// casts that don't specify one explicitly.
pub struct FixedContext;

impl FixedContext {
    /// The quantization and overflow mode currently in effect.
    pub fn current() -> (QuantMode, OverflowMode) {
        FIXED_CAST.with(|stack| *stack.borrow().last().expect("context stack never empty"))
    }

    /// Pushes `(quant, overflow)` as the new default; the previous default
    /// is restored when the returned guard is dropped.
    #[must_use = "the override is only active while this guard is alive"]
    pub fn enter(quant: QuantMode, overflow: OverflowMode) -> FixedContextGuard {
        FIXED_CAST.with(|stack| stack.borrow_mut().push((quant, overflow)));
        FixedContextGuard { _private: () }
    }
}

/// RAII guard returned by [`FixedContext::enter`]; pops the override stack
/// on drop.
pub struct FixedContextGuard {
    _private: (),
}

impl Drop for FixedContextGuard {
    fn drop(&mut self) {
        FIXED_CAST.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.len() > 1 {
                stack.pop();
            }
        });
    }
}

/// Process-wide default quantization mode used by `Float` arithmetic, and
/// the shared PRNG consumed by the stochastic modes.
pub struct FloatContext;

impl FloatContext {
    /// The quantization mode currently in effect.
    pub fn current_quant_mode() -> QuantMode {
        FLOAT_QUANT.with(|stack| *stack.borrow().last().expect("context stack never empty"))
    }

    /// Pushes `quant` as the new default; restored when the guard drops.
    #[must_use = "the override is only active while this guard is alive"]
    pub fn enter(quant: QuantMode) -> FloatContextGuard {
        FLOAT_QUANT.with(|stack| stack.borrow_mut().push(quant));
        FloatContextGuard { _private: () }
    }

    /// Re-seeds the process-wide PRNG used by the stochastic quantization
    /// modes; the previous generator state is not restored on drop (the
    /// spec calls this an override of the seed, not a scoped stack).
    pub fn seed_rng(seed: u64) {
        RNG.with(|rng| *rng.borrow_mut() = SmallRng::seed_from_u64(seed));
    }

    /// Runs `f` with mutable access to the process-wide PRNG.
    pub fn with_rng<R>(f: impl FnOnce(&mut dyn rand::RngCore) -> R) -> R {
        RNG.with(|rng| f(&mut *rng.borrow_mut()))
    }
}

/// RAII guard returned by [`FloatContext::enter`].
pub struct FloatContextGuard {
    _private: (),
}

impl Drop for FloatContextGuard {
    fn drop(&mut self) {
        FLOAT_QUANT.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.len() > 1 {
                stack.pop();
            }
        });
    }
}

/// Optional fixed-point accumulator format applied by the inner-product
/// contract after every multiply-accumulate step; `None` means full
/// precision (no intermediate rounding).
pub struct FixedAccumulatorOverride;

impl FixedAccumulatorOverride {
    pub fn current() -> Option<FixedAccumulatorFormat> {
        FIXED_ACCUMULATOR.with(|stack| *stack.borrow().last().expect("context stack never empty"))
    }

    #[must_use = "the override is only active while this guard is alive"]
    pub fn enter(format: Option<FixedAccumulatorFormat>) -> FixedAccumulatorGuard {
        FIXED_ACCUMULATOR.with(|stack| stack.borrow_mut().push(format));
        FixedAccumulatorGuard { _private: () }
    }
}

/// RAII guard returned by [`FixedAccumulatorOverride::enter`].
pub struct FixedAccumulatorGuard {
    _private: (),
}

impl Drop for FixedAccumulatorGuard {
    fn drop(&mut self) {
        FIXED_ACCUMULATOR.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.len() > 1 {
                stack.pop();
            }
        });
    }
}

/// Optional floating-point accumulator format, analogous to
/// [`FixedAccumulatorOverride`].
pub struct FloatAccumulatorOverride;

impl FloatAccumulatorOverride {
    pub fn current() -> Option<FloatAccumulatorFormat> {
        FLOAT_ACCUMULATOR.with(|stack| *stack.borrow().last().expect("context stack never empty"))
    }

    #[must_use = "the override is only active while this guard is alive"]
    pub fn enter(format: Option<FloatAccumulatorFormat>) -> FloatAccumulatorGuard {
        FLOAT_ACCUMULATOR.with(|stack| stack.borrow_mut().push(format));
        FloatAccumulatorGuard { _private: () }
    }
}

/// RAII guard returned by [`FloatAccumulatorOverride::enter`].
pub struct FloatAccumulatorGuard {
    _private: (),
}

impl Drop for FloatAccumulatorGuard {
    fn drop(&mut self) {
        FLOAT_ACCUMULATOR.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.len() > 1 {
                stack.pop();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_context_nests_and_restores() {
        assert_eq!(FixedContext::current(), (QuantMode::Rnd, OverflowMode::Wrap));
        {
            let _g1 = FixedContext::enter(QuantMode::Trn, OverflowMode::Sat);
            assert_eq!(FixedContext::current(), (QuantMode::Trn, OverflowMode::Sat));
            {
                let _g2 = FixedContext::enter(QuantMode::Jam, OverflowMode::Wrap);
                assert_eq!(FixedContext::current(), (QuantMode::Jam, OverflowMode::Wrap));
            }
            assert_eq!(FixedContext::current(), (QuantMode::Trn, OverflowMode::Sat));
        }
        assert_eq!(FixedContext::current(), (QuantMode::Rnd, OverflowMode::Wrap));
    }

    #[test]
    fn float_accumulator_override_defaults_to_none() {
        assert_eq!(FloatAccumulatorOverride::current(), None);
        let _g = FloatAccumulatorOverride::enter(Some((8, 23, 127, QuantMode::Rnd)));
        assert_eq!(
            FloatAccumulatorOverride::current(),
            Some((8, 23, 127, QuantMode::Rnd))
        );
    }

    #[test]
    fn rng_is_reachable() {
        FloatContext::seed_rng(42);
        let v = FloatContext::with_rng(|rng| rand::RngCore::next_u32(rng));
        let v2 = FloatContext::with_rng(|rng| rand::RngCore::next_u32(rng));
        assert_ne!(v, v2); // subsequent draws advance state
    }
}
