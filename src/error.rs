use std::fmt;

/// Errors that can occur when generating, encoding or decoding ULIDs.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Error {
    /// A required destination was absent (null pointer through the C interface).
    InvalidArgument,
    /// The destination buffer cannot hold the fixed-width output.
    BufferTooSmall {
        /// Number of bytes the output needs.
        required: usize,
        /// Number of bytes the destination offers.
        actual: usize,
    },
    /// The ULID string is not exactly 26 characters long.
    InvalidLength,
    /// The ULID string contains a character outside the Crockford Base32 alphabet,
    /// or its first character overflows 128 bits.
    InvalidCharacter {
        /// Byte offset of the first offending character.
        index: usize,
    },
    /// The given timestamp for the ULID is too large.
    TimestampOutOfRange,
    /// The given randomness for the ULID is too large.
    RandomnessOutOfRange,
    /// The clock is unavailable or its reading does not fit into 48 bits.
    Clock,
    /// The random number source failed to deliver a value.
    Rng,
}

impl Error {
    /// Returns the stable, negative error code used by the C interface.
    ///
    /// # Example
    ///
    /// ```
    /// use ulid_lite::Error;
    ///
    /// assert_eq!(Error::InvalidLength.code(), -3);
    /// ```
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::InvalidArgument => -1,
            Self::BufferTooSmall { .. } => -2,
            Self::InvalidLength => -3,
            Self::InvalidCharacter { .. } => -4,
            Self::TimestampOutOfRange => -5,
            Self::RandomnessOutOfRange => -6,
            Self::Clock => -7,
            Self::Rng => -8,
        }
    }
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::InvalidArgument => f.write_str("required destination is missing"),
            Self::BufferTooSmall { required, actual } => {
                write!(f, "buffer is too small: {required} bytes required, {actual} given")
            }
            Self::InvalidLength => f.write_str("string must be exactly 26 characters long"),
            Self::InvalidCharacter { index } => write!(f, "string contains an invalid character at index {index}"),
            Self::TimestampOutOfRange => f.write_str("timestamp is too large"),
            Self::RandomnessOutOfRange => f.write_str("randomness is too large"),
            Self::Clock => f.write_str("system clock is unavailable or out of range"),
            Self::Rng => f.write_str("random number source failed"),
        }
    }
}
