use std::fmt::Formatter;

use crate::{base32, Error, RANDOM_BITS, RANDOM_MASK, TIMESTAMP_MAX, ULID_LEN};

pub fn as_array<const N: usize>(bytes: &[u8]) -> Result<&[u8; N], Error> {
    bytes.try_into().or(Err(Error::InvalidLength))
}

/// Copies ULID text into a fixed buffer, measuring its length in characters.
///
/// Characters outside of ASCII keep their position as a byte no decoder accepts,
/// so errors report the index of the offending character.
pub fn text_array(text: &str) -> Result<[u8; ULID_LEN], Error> {
    if text.chars().count() != ULID_LEN {
        return Err(Error::InvalidLength);
    }

    let mut buffer = [0; ULID_LEN];
    for (byte, c) in buffer.iter_mut().zip(text.chars()) {
        *byte = u8::try_from(c).unwrap_or(u8::MAX);
    }

    Ok(buffer)
}

/// Returns the leading `N` bytes of a destination buffer, or reports how short it is.
pub fn destination<const N: usize>(buffer: &mut [u8]) -> Result<&mut [u8; N], Error> {
    let actual = buffer.len();

    buffer
        .get_mut(..N)
        .and_then(|head| head.try_into().ok())
        .ok_or(Error::BufferTooSmall { required: N, actual })
}

pub const fn from_parts(timestamp: u64, randomness: u128) -> Result<u128, Error> {
    if timestamp > TIMESTAMP_MAX {
        Err(Error::TimestampOutOfRange)
    } else if randomness > RANDOM_MASK {
        Err(Error::RandomnessOutOfRange)
    } else {
        Ok(((timestamp as u128) << RANDOM_BITS) | randomness)
    }
}

pub fn try_to_string(ulid: u128) -> Option<String> {
    let mut s = String::new();
    s.try_reserve_exact(ULID_LEN).ok()?;

    let mut buffer = [0; ULID_LEN];
    s.push_str(base32::encode(ulid, &mut buffer));

    Some(s)
}

pub fn debug_ulid(name: &str, ulid: u128, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
    struct Timestamp(u64);
    impl std::fmt::Debug for Timestamp {
        fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
            write!(f, "\"{ts}\"", ts = timestamp_to_string(self.0))
        }
    }

    struct Randomness(u128);
    impl std::fmt::Debug for Randomness {
        fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
            write!(f, "\"{:020X}\"", self.0)
        }
    }

    let mut buffer = [0; ULID_LEN];

    let string = base32::encode(ulid, &mut buffer);
    let timestamp = Timestamp((ulid >> RANDOM_BITS) as u64);
    let randomness = Randomness(ulid & RANDOM_MASK);

    f.debug_struct(name)
        .field("string", &string)
        .field("timestamp", &timestamp)
        .field("randomness", &randomness)
        .finish()
}

/// Formats milliseconds since the Unix epoch as an ISO 8601 UTC timestamp.
fn timestamp_to_string(millis: u64) -> String {
    const DAYS_PER_ERA: u64 = 146_097;
    const DAYS_0000_03_01_TO_1970: u64 = 719_468;

    let (seconds, millis) = (millis / 1000, millis % 1000);
    let (days, second_of_day) = (seconds / 86_400, seconds % 86_400);
    let (hours, minutes, seconds) = (second_of_day / 3600, second_of_day / 60 % 60, second_of_day % 60);

    // Civil calendar from day count, with years starting on 1st March.
    let days = days + DAYS_0000_03_01_TO_1970;
    let (era, day_of_era) = (days / DAYS_PER_ERA, days % DAYS_PER_ERA);
    let year_of_era =
        (day_of_era - day_of_era / 1460 + day_of_era / 36_524 - day_of_era / (DAYS_PER_ERA - 1)) / 365;
    let day_of_year = day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
    let shifted_month = (5 * day_of_year + 2) / 153;

    let day = day_of_year - (153 * shifted_month + 2) / 5 + 1;
    let month = if shifted_month < 10 { shifted_month + 3 } else { shifted_month - 9 };
    let year = era * 400 + year_of_era + u64::from(month <= 2);

    format!("{year:04}-{month:02}-{day:02}T{hours:02}:{minutes:02}:{seconds:02}.{millis:03}Z")
}
