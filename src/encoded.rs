use std::{fmt, ops::Deref, str::FromStr, str::from_utf8_unchecked};

use crate::{base32, DecodeMode, Error, Ulid, ULID_LEN, ULID_TERMINATED_LEN};

/// The 26-character Crockford Base32 text of a [`Ulid`], stored inline without allocation.
///
/// An `EncodedUlid` is always in canonical form: exactly 26 upper case symbols of the
/// alphabet `0123456789ABCDEFGHJKMNPQRSTVWXYZ`, with the first symbol in `0`-`7`.
/// It dereferences to [`str`], and keeps the [`Ulid`] it was encoded from.
/// Ordering follows the [`Ulid`], which is the same as ordering the text.
///
/// # Example
///
/// ```
/// use ulid_lite::{EncodedUlid, Ulid};
///
/// let u = Ulid::from_bytes([0, 0, 1, 140, 111, 45, 56, 180, 0, 0, 0, 0, 0, 0, 0, 0]);
/// let e = EncodedUlid::new(u);
///
/// assert_eq!(e, "00000RRVSD72T0000000000000");
/// assert_eq!(e.to_ulid(), u);
/// assert!(e.starts_with("00000"));
/// ```
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct EncodedUlid {
    ulid: Ulid,
    text: [u8; ULID_LEN],
}

impl EncodedUlid {
    /// Encodes a [`Ulid`].
    #[must_use]
    pub fn new(ulid: Ulid) -> Self {
        let mut text = [0; ULID_LEN];
        base32::encode(ulid.to_u128(), &mut text);
        Self { ulid, text }
    }

    /// Returns the text as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        // Safety: Only alphabet symbols are ever stored
        unsafe { from_utf8_unchecked(&self.text) }
    }

    /// Returns the text as ASCII bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; ULID_LEN] {
        &self.text
    }

    /// Returns the text followed by a terminating NUL byte.
    ///
    /// # Example
    ///
    /// ```
    /// use ulid_lite::Ulid;
    ///
    /// let t = Ulid::nil().encode().to_terminated();
    ///
    /// assert_eq!(&t[..26], b"00000000000000000000000000");
    /// assert_eq!(t[26], 0);
    /// ```
    #[must_use]
    pub fn to_terminated(&self) -> [u8; ULID_TERMINATED_LEN] {
        let mut buffer = [0; ULID_TERMINATED_LEN];
        buffer[..ULID_LEN].copy_from_slice(&self.text);
        buffer
    }

    /// Returns the [`Ulid`] this text was encoded from.
    #[must_use]
    pub const fn to_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl Deref for EncodedUlid {
    type Target = str;

    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<str> for EncodedUlid {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<[u8]> for EncodedUlid {
    fn as_ref(&self) -> &[u8] {
        &self.text
    }
}

impl fmt::Display for EncodedUlid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for EncodedUlid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EncodedUlid").field(&self.as_str()).finish()
    }
}

impl FromStr for EncodedUlid {
    type Err = Error;

    /// Validates a ULID string in [`DecodeMode::Strict`] and stores it in canonical (upper) case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::decode_with(s, DecodeMode::Strict).map(Self::new)
    }
}

impl From<Ulid> for EncodedUlid {
    fn from(ulid: Ulid) -> Self {
        Self::new(ulid)
    }
}

impl From<EncodedUlid> for Ulid {
    fn from(encoded: EncodedUlid) -> Self {
        encoded.to_ulid()
    }
}

impl From<EncodedUlid> for String {
    fn from(encoded: EncodedUlid) -> Self {
        encoded.as_str().to_owned()
    }
}

impl PartialEq<str> for EncodedUlid {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for EncodedUlid {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl PartialEq<EncodedUlid> for str {
    fn eq(&self, other: &EncodedUlid) -> bool {
        self == other.as_str()
    }
}
