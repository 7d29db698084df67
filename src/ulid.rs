use std::{
    fmt,
    str::FromStr,
    time::{Duration, SystemTime},
};

use crate::{
    base32, generator, util, DecodeMode, EncodedUlid, EntropySource, Error, GenerationOrder, RANDOM_BITS, RANDOM_MASK,
    ULID_BINARY_LEN,
};

/// A ULID: a 48-bit millisecond timestamp followed by 80 bits of randomness.
///
/// The binary form is 16 bytes in network byte order (big endian), the text form
/// 26 characters of Crockford Base32. Ordering of `Ulid` values, of their bytes and
/// of their text form are all the same.
///
/// Every 128-bit value is a valid `Ulid`, including zero ([`Ulid::nil()`]).
///
/// # Example
///
/// ```
/// use ulid_lite::Ulid;
///
/// let u: Ulid = "01JB05JV6H9ZA2YQ6X3K1DAGVA".parse()?; // cspell:disable-line
///
/// assert_eq!(u.timestamp(), 1_729_803_939_025);
/// assert_eq!(u.to_string(), "01JB05JV6H9ZA2YQ6X3K1DAGVA"); // cspell:disable-line
/// # Ok::<(), ulid_lite::Error>(())
/// ```
#[derive(Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Ulid(u128);

impl Ulid {
    /// Minimum [`Ulid`], the same as [`Ulid::nil()`].
    pub const MIN: Self = Self(0);

    /// Maximum [`Ulid`], encoded as `"7ZZZZZZZZZZZZZZZZZZZZZZZZZ"`.
    pub const MAX: Self = Self(u128::MAX);

    /// Returns the `Ulid` with value zero.
    ///
    /// # Example
    ///
    /// ```
    /// use ulid_lite::Ulid;
    ///
    /// assert_eq!(Ulid::nil().to_string(), "00000000000000000000000000");
    /// ```
    #[must_use]
    pub const fn nil() -> Self {
        Self(0)
    }

    /// Tests if a `Ulid` is zero.
    #[must_use]
    pub const fn is_nil(self) -> bool {
        self.0 == 0
    }

    /// Generates a new `Ulid` using the process-wide context.
    ///
    /// The process-wide context is created on first use, seeded from the operating system,
    /// and uses [`GenerationOrder::Monotonic`]: ULIDs from this method are strictly
    /// monotonically increasing, across all threads. Access is serialized by a mutex.
    ///
    /// # Panics
    ///
    /// Panics if the system date is after the year 10889 or before the Unix epoch (year 1970).
    /// See [`Ulid::try_generate()`] for a variant returning errors.
    ///
    /// # Example
    ///
    /// ```
    /// use ulid_lite::Ulid;
    ///
    /// let u1 = Ulid::generate();
    /// let u2 = Ulid::generate();
    ///
    /// assert!(u1 < u2);
    /// ```
    #[must_use]
    pub fn generate() -> Self {
        match Self::try_generate() {
            Ok(ulid) => ulid,
            Err(error) => panic!("cannot generate ULID: {error}"),
        }
    }

    /// Generates a new `Ulid` using the process-wide context and never panics.
    ///
    /// # Errors
    ///
    /// [`Error::Clock`] if the system clock cannot be read or is out of range.
    pub fn try_generate() -> Result<Self, Error> {
        generator::generate().map(Self)
    }

    /// Generates a new `Ulid` from any [`EntropySource`].
    ///
    /// Every call draws fresh randomness ([`GenerationOrder::Random`]). Monotonic
    /// generation needs state between calls, which [`RngContext`](crate::RngContext) keeps.
    ///
    /// # Errors
    ///
    /// [`Error::Clock`] if the source delivers no timestamp or one exceeding 48 bits,
    /// [`Error::Rng`] if it delivers no random number or one outside the requested range.
    pub fn generate_from<S: EntropySource + ?Sized>(source: &mut S) -> Result<Self, Error> {
        generator::Sequence::new(GenerationOrder::Random).generate(source).map(Self)
    }

    /// Returns the timestamp part of a `Ulid`.
    ///
    /// The timestamp is measured in milliseconds since the Unix epoch (1. January 1970).
    /// ULID timestamps are limited to 48 bits.
    #[must_use]
    pub const fn timestamp(self) -> u64 {
        (self.0 >> RANDOM_BITS) as u64
    }

    /// Returns the random part of a `Ulid`, limited to 80 bits.
    #[must_use]
    pub const fn randomness(self) -> u128 {
        self.0 & RANDOM_MASK
    }

    /// Returns the timestamp part of a `Ulid` as a `SystemTime`.
    ///
    /// # Panics
    ///
    /// May panic if the timestamp cannot be represented by [`SystemTime`] on this platform.
    /// For a variant which never panics, see [`Ulid::try_datetime`].
    #[must_use]
    pub fn datetime(self) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_millis(self.timestamp())
    }

    /// Returns the timestamp part of a `Ulid` as a [`SystemTime`] and never panics.
    #[must_use]
    pub fn try_datetime(self) -> Option<SystemTime> {
        SystemTime::UNIX_EPOCH.checked_add(Duration::from_millis(self.timestamp()))
    }

    /// Returns the timestamp and randomness parts of a `Ulid` as a pair.
    #[must_use]
    pub const fn to_parts(self) -> (u64, u128) {
        (self.timestamp(), self.randomness())
    }

    /// Creates a `Ulid` from a timestamp and randomness parts.
    ///
    /// # Errors
    ///
    /// Will fail if the timestamp (48 bits) or randomness (80 bits) are out of range.
    ///
    /// # Example
    ///
    /// ```
    /// use ulid_lite::{Error, Ulid};
    ///
    /// let u = Ulid::from_parts(1_702_672_283_828, 42)?;
    /// assert_eq!(u.to_parts(), (1_702_672_283_828, 42));
    ///
    /// assert_eq!(Ulid::from_parts(1 << 48, 0), Err(Error::TimestampOutOfRange));
    /// assert_eq!(Ulid::from_parts(0, 1 << 80), Err(Error::RandomnessOutOfRange));
    /// # Ok::<(), Error>(())
    /// ```
    pub const fn from_parts(timestamp: u64, randomness: u128) -> Result<Self, Error> {
        match util::from_parts(timestamp, randomness) {
            Ok(n) => Ok(Self(n)),
            Err(error) => Err(error),
        }
    }

    /// Converts a `Ulid` into binary bytes in network byte order (big endian).
    ///
    /// # Example
    ///
    /// ```
    /// use ulid_lite::Ulid;
    ///
    /// let ulid: Ulid = "01JB05JV6H9ZA2YQ6X3K1DAGVA".parse()?; // cspell:disable-line
    ///
    /// assert_eq!(ulid.to_bytes(), [1, 146, 192, 89, 108, 209, 79, 212, 47, 92, 221, 28, 194, 213, 67, 106]);
    /// # Ok::<(), ulid_lite::Error>(())
    /// ```
    #[must_use]
    pub const fn to_bytes(self) -> [u8; ULID_BINARY_LEN] {
        self.0.to_be_bytes()
    }

    /// Creates a `Ulid` from binary bytes in network byte order (big endian).
    #[must_use]
    pub const fn from_bytes(bytes: [u8; ULID_BINARY_LEN]) -> Self {
        Self(u128::from_be_bytes(bytes))
    }

    /// Converts a `Ulid` into a `u128` integer.
    #[must_use]
    pub const fn to_u128(self) -> u128 {
        self.0
    }

    /// Creates a `Ulid` from a `u128` integer.
    #[must_use]
    pub const fn from_u128(n: u128) -> Self {
        Self(n)
    }

    /// Encodes a `Ulid` as Crockford Base32 text, without allocating.
    ///
    /// # Example
    ///
    /// ```
    /// use ulid_lite::Ulid;
    ///
    /// let e = Ulid::MAX.encode();
    ///
    /// assert_eq!(e, "7ZZZZZZZZZZZZZZZZZZZZZZZZZ");
    /// ```
    #[must_use]
    pub fn encode(self) -> EncodedUlid {
        EncodedUlid::new(self)
    }

    /// Returns the string representation of a `Ulid` and never panics.
    ///
    /// Unlike the blanket [`ToString`] implementation, this returns `None`
    /// when the memory for the string cannot be allocated.
    #[must_use]
    pub fn try_to_string(self) -> Option<String> {
        util::try_to_string(self.0)
    }
}

impl fmt::Debug for Ulid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        util::debug_ulid("Ulid", self.0, f)
    }
}

impl fmt::Display for Ulid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buffer = [0; crate::ULID_LEN];
        f.write_str(base32::encode(self.0, &mut buffer))
    }
}

impl FromStr for Ulid {
    type Err = Error;

    /// Parses a ULID string in [`DecodeMode::Strict`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::decode_with(s, DecodeMode::Strict)
    }
}

impl From<Ulid> for u128 {
    fn from(ulid: Ulid) -> Self {
        ulid.to_u128()
    }
}

impl From<u128> for Ulid {
    fn from(n: u128) -> Self {
        Self::from_u128(n)
    }
}

impl From<Ulid> for [u8; ULID_BINARY_LEN] {
    fn from(ulid: Ulid) -> Self {
        ulid.to_bytes()
    }
}

impl From<[u8; ULID_BINARY_LEN]> for Ulid {
    fn from(bytes: [u8; ULID_BINARY_LEN]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<&[u8; ULID_BINARY_LEN]> for Ulid {
    fn from(bytes: &[u8; ULID_BINARY_LEN]) -> Self {
        Self::from_bytes(*bytes)
    }
}

impl TryFrom<&[u8]> for Ulid {
    type Error = Error;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Ok(Self::from_bytes(*util::as_array(bytes)?))
    }
}
