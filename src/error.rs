use alloc::string::String;
use thiserror::Error;

/// Everything that can go wrong constructing or operating on a value in this
/// crate. Every fallible entry point returns one of these instead of
/// panicking; no operation ever mutates caller-visible state before failing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A bit-width specifier was out of range: `bits < 1`, `exp_bits` outside
    /// `[1, EXP_LIMIT]`, `man_bits` above `MAN_LIMIT`, or a cast requested a
    /// `(bits, int_bits)` pair that contradicts itself.
    #[error("invalid bit specifier: {0}")]
    InvalidSize(String),

    /// A value could not be represented in the target format: NaN/±infinity
    /// handed to a fixed-point constructor, or a non-finite/non-integer
    /// element in a tuple initializer.
    #[error("invalid value for conversion: {0}")]
    InvalidValue(String),

    /// Division where the divisor (or, for complex values, both real and
    /// imaginary parts of the divisor) is zero.
    #[error("division by zero")]
    DivisionByZero,

    /// The requested quantization or overflow mode is not implemented on
    /// this code path.
    #[error("unsupported mode: {0}")]
    Unsupported(String),

    /// A decimal string failed to parse.
    #[error("could not parse decimal string: {0}")]
    ParseError(String),
}

/// Result type used throughout this crate.
pub type Result<T> = core::result::Result<T, Error>;
