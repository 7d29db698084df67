//! # Lightweight ULIDs with explicit RNG contexts
//!
//! This crate generates ULIDs (Universally Unique Lexicographically Sortable Identifiers):
//! 128-bit values made of a 48-bit millisecond timestamp and 80 bits of randomness,
//! written as 26 characters of Crockford Base32.
//!
//! The random numbers come from an [`RngContext`] which the caller creates, seeds and drops.
//! With a fixed seed and a fixed clock, generation is fully reproducible. For convenience,
//! a process-wide context is available too.
//!
//! ## Generating ULIDs
//!
//! With an explicit context:
//!
//! ```
//! use ulid_lite::{init_context, new_id, new_id_string};
//!
//! let mut ctx = init_context(0); // zero seeds from the system clock
//!
//! let id = new_id(Some(&mut ctx))?;
//! let text = new_id_string(Some(&mut ctx))?;
//!
//! assert_eq!(text.len(), 26);
//! # Ok::<(), ulid_lite::Error>(())
//! ```
//!
//! With the process-wide context, which hands out strictly increasing ULIDs:
//!
//! ```
//! use ulid_lite::Ulid;
//!
//! let u = Ulid::generate();
//!
//! println!("Generated ULID: {u}");
//! ```
//!
//! ## Encoding and decoding
//!
//! The binary form is 16 bytes in big endian order, the text form 26 characters.
//! Encoding never fails and never allocates:
//!
//! ```
//! use ulid_lite::{decode, encode, Ulid};
//!
//! let u = Ulid::from_bytes([0, 0, 1, 140, 111, 45, 56, 180, 0, 0, 0, 0, 0, 0, 0, 0]);
//! let e = encode(u);
//!
//! assert_eq!(e, "00000RRVSD72T0000000000000");
//! assert_eq!(decode(&e)?, u);
//! # Ok::<(), ulid_lite::Error>(())
//! ```
//!
//! Decoding is case-insensitive, but strict otherwise: the letters `I`, `L`, `O` and `U`
//! are rejected. Crockford's normalization of `I`/`L` to `1` and `O` to `0` is available
//! through [`DecodeMode::Crockford`].
//!
//! ## Caller-owned buffers
//!
//! All text output can be written into a caller supplied buffer, with or without a
//! terminating NUL byte:
//!
//! ```
//! use ulid_lite::{encode_into, encode_into_terminated, Error, Ulid};
//!
//! let mut buffer = [0u8; 27];
//!
//! assert_eq!(encode_into(Ulid::MAX, &mut buffer)?, "7ZZZZZZZZZZZZZZZZZZZZZZZZZ");
//! assert_eq!(encode_into_terminated(Ulid::MAX, &mut buffer)?.to_bytes().len(), 26);
//!
//! let mut short = [0u8; 26];
//! assert_eq!(
//!     encode_into_terminated(Ulid::MAX, &mut short),
//!     Err(Error::BufferTooSmall { required: 27, actual: 26 })
//! );
//! # Ok::<(), Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - **`serde`**: Serialization and deserialization via `Serde`, as ULID strings.
//! - **`ffi`**: C ABI functions (`ulid_init`, `ulid_new`, `ulid_write`, ...).
//!

mod base32;
mod context;
mod encoded;
mod error;
#[cfg(feature = "ffi")]
pub mod ffi;
mod generator;
#[cfg(feature = "serde")]
mod serde;
mod ulid;
mod util;

use std::{borrow::Cow, ffi::CStr};

pub use context::{system_clock, Clock, RngContext};
pub use encoded::EncodedUlid;
pub use error::Error;
pub use generator::{set_global_context, EntropySource, GenerationOrder};
pub use ulid::Ulid;

/// Number of characters of the text representation of a ULID.
pub const ULID_LEN: usize = 26;

/// Number of bytes of the text representation of a ULID, including a terminating NUL byte.
pub const ULID_TERMINATED_LEN: usize = ULID_LEN + 1;

/// Number of bytes of the binary representation of a ULID.
pub const ULID_BINARY_LEN: usize = 16;

const RESERVED: u128 = 10_000_000_000;

const RANDOM_BITS: u32 = 80;
const RANDOM_MASK: u128 = (1 << RANDOM_BITS) - 1;
const RANDOM_GEN_MAX: u128 = RANDOM_MASK - RESERVED;

const TIMESTAMP_BITS: u32 = 48;
const TIMESTAMP_MAX: u64 = (1 << TIMESTAMP_BITS) - 1;
const TIMESTAMP_MASK: u128 = ((1 << TIMESTAMP_BITS) - 1) << RANDOM_BITS;

/// How strictly ULID strings are decoded.
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq)]
pub enum DecodeMode {
    /// Only the 32 symbols of the alphabet are accepted, in upper or lower case.
    #[default]
    Strict,
    /// Additionally accepts `I` and `L` as `1`, and `O` as `0`, in upper or lower case.
    Crockford,
}

/// Creates a new [`RngContext`].
///
/// A `seed` of zero derives the seed from the system clock. See [`RngContext::new`].
#[must_use]
pub fn init_context(seed: u64) -> RngContext {
    RngContext::new(seed)
}

/// Generates a new ULID.
///
/// If `context` is `None`, an ephemeral context is seeded from the system clock for this
/// single call only. That is still relying on low-quality entropy if invoked at high
/// frequency without an explicit seeded context: calls within the same clock tick yield
/// the same ULID. Pass a context, or use [`Ulid::generate()`], when generating many ULIDs.
///
/// # Errors
///
/// [`Error::Clock`] if the clock is unavailable or out of range.
///
/// # Example
///
/// ```
/// use ulid_lite::{new_id, RngContext};
///
/// fn frozen_clock() -> Option<u64> {
///     Some(1_702_672_283_828)
/// }
///
/// let mut a = RngContext::new(1234).with_clock(frozen_clock);
/// let mut b = RngContext::new(1234).with_clock(frozen_clock);
///
/// assert_eq!(new_id(Some(&mut a))?, new_id(Some(&mut b))?);
///
/// let ephemeral = new_id(None)?;
/// assert!(ephemeral.timestamp() > 1_702_672_283_828);
/// # Ok::<(), ulid_lite::Error>(())
/// ```
pub fn new_id(context: Option<&mut RngContext>) -> Result<Ulid, Error> {
    match context {
        Some(context) => context.generate(),
        None => RngContext::new(0).generate(),
    }
}

/// Generates a new ULID and encodes it as text.
///
/// Exactly one ULID is generated and encoded. See [`new_id`] for the meaning of `context`.
///
/// # Errors
///
/// Same as [`new_id`].
pub fn new_id_string(context: Option<&mut RngContext>) -> Result<EncodedUlid, Error> {
    new_id(context).map(EncodedUlid::new)
}

/// Generates a new ULID and writes its text into the first 26 bytes of `dest`.
///
/// The capacity of `dest` is checked before anything is generated.
///
/// # Errors
///
/// [`Error::BufferTooSmall`] if `dest` is shorter than 26 bytes, otherwise same as [`new_id`].
pub fn write_new<'a>(context: Option<&mut RngContext>, dest: &'a mut [u8]) -> Result<&'a str, Error> {
    let buffer = util::destination::<ULID_LEN>(dest)?;
    let ulid = new_id(context)?;
    Ok(base32::encode(ulid.to_u128(), buffer))
}

/// Generates a new ULID and writes its text, followed by a NUL byte, into the first 27 bytes of `dest`.
///
/// # Errors
///
/// [`Error::BufferTooSmall`] if `dest` is shorter than 27 bytes, otherwise same as [`new_id`].
pub fn write_new_terminated<'a>(context: Option<&mut RngContext>, dest: &'a mut [u8]) -> Result<&'a CStr, Error> {
    let buffer = util::destination::<ULID_TERMINATED_LEN>(dest)?;
    let ulid = new_id(context)?;
    Ok(base32::encode_terminated(ulid.to_u128(), buffer))
}

/// Encodes a ULID as text.
#[must_use]
pub fn encode(ulid: Ulid) -> EncodedUlid {
    EncodedUlid::new(ulid)
}

/// Encodes a ULID into the first 26 bytes of `dest`.
///
/// # Errors
///
/// [`Error::BufferTooSmall`] if `dest` is shorter than 26 bytes. Nothing is written then.
pub fn encode_into(ulid: Ulid, dest: &mut [u8]) -> Result<&str, Error> {
    let buffer = util::destination::<ULID_LEN>(dest)?;
    Ok(base32::encode(ulid.to_u128(), buffer))
}

/// Encodes a ULID followed by a NUL byte into the first 27 bytes of `dest`.
///
/// # Errors
///
/// [`Error::BufferTooSmall`] if `dest` is shorter than 27 bytes. Nothing is written then.
pub fn encode_into_terminated(ulid: Ulid, dest: &mut [u8]) -> Result<&CStr, Error> {
    let buffer = util::destination::<ULID_TERMINATED_LEN>(dest)?;
    Ok(base32::encode_terminated(ulid.to_u128(), buffer))
}

/// Decodes a ULID string in [`DecodeMode::Strict`].
///
/// # Errors
///
/// [`Error::InvalidLength`] if the string is not 26 characters long,
/// [`Error::InvalidCharacter`] with the (character) position of the first invalid character otherwise.
///
/// # Example
///
/// ```
/// use ulid_lite::{decode, Error, Ulid};
///
/// assert_eq!(decode("00000000000000000000000000"), Ok(Ulid::nil()));
/// assert_eq!(decode("0000000000000000000000000"), Err(Error::InvalidLength));
/// assert_eq!(decode("00000000000000000000000O00"), Err(Error::InvalidCharacter { index: 23 }));
/// assert_eq!(decode("80000000000000000000000000"), Err(Error::InvalidCharacter { index: 0 }));
/// ```
pub fn decode(ulid: &str) -> Result<Ulid, Error> {
    decode_with(ulid, DecodeMode::Strict)
}

/// Decodes a ULID string in the given [`DecodeMode`].
///
/// # Errors
///
/// Same as [`decode`].
///
/// # Example
///
/// ```
/// use ulid_lite::{decode_with, DecodeMode, Error, Ulid};
///
/// let s = "0000000000000000000000000L";
///
/// assert_eq!(decode_with(s, DecodeMode::Crockford), Ok(Ulid::from_u128(1)));
/// assert_eq!(decode_with(s, DecodeMode::Strict), Err(Error::InvalidCharacter { index: 25 }));
/// ```
pub fn decode_with(ulid: &str, mode: DecodeMode) -> Result<Ulid, Error> {
    let buffer = util::text_array(ulid)?;
    base32::decode(&buffer, mode).map(Ulid::from_u128)
}

/// Canonicalizes a ULID string.
///
/// Letters 'i', 'l', and 'o' are replaced by their corresponding digits '1' and `0`,
/// and all characters are converted into uppercase.
///
/// If the input is already in canonical form, it returns a borrowed version of the input string
/// without allocating a new `String`.
///
/// # Errors
///
/// The string must be a valid ULID in [`DecodeMode::Crockford`]. If not, an error is returned.
///
/// # Example
///
/// ```
// cspell:disable-next-line
/// let s = "olixjazthsfjzt7wd6j8ir92vn";
///
// cspell:disable-next-line
/// assert_eq!(ulid_lite::canonicalize(s), Ok("011XJAZTHSFJZT7WD6J81R92VN".into()));
/// ```
pub fn canonicalize(ulid: &str) -> Result<Cow<'_, str>, Error> {
    let mut buffer = util::text_array(ulid)?;
    let cleaned = base32::canonicalize(&mut buffer)?;

    if cleaned == ulid {
        Ok(ulid.into())
    } else {
        Ok(cleaned.to_string().into())
    }
}

/// Checks a ULID string for validity in the given [`DecodeMode`].
///
/// # Errors
///
/// If the ULID string is not valid, an appropriate error is returned.
///
/// # Example
///
/// ```
/// use ulid_lite::{validate, DecodeMode, Error};
///
// cspell:disable-next-line
/// assert!(validate("olixjazthsfjzt7wd6j8ir92vn", DecodeMode::Crockford).is_ok());
// cspell:disable-next-line
/// assert!(validate("011XJAZTHSFJZT7WD6J81R92VN", DecodeMode::Strict).is_ok());
///
/// assert_eq!(validate("0000000000000000000000u89$", DecodeMode::Crockford), Err(Error::InvalidCharacter { index: 22 }));
/// assert_eq!(validate("xxxxxxxxxxxxxxxxxxxxxx", DecodeMode::Strict), Err(Error::InvalidLength));
/// ```
pub fn validate(ulid: &str, mode: DecodeMode) -> Result<(), Error> {
    let buffer = util::text_array(ulid)?;
    base32::validate(&buffer, mode)
}
