use std::{
    ops::RangeInclusive,
    sync::{Mutex, MutexGuard},
};

use crate::{Error, RngContext, RANDOM_BITS, RANDOM_GEN_MAX, RANDOM_MASK, TIMESTAMP_MASK, TIMESTAMP_MAX};

/// Trait for entropy sources.
///
/// An entropy source delivers the two ingredients of a ULID: the current time and random bits.
/// [`RngContext`] is the standard implementation. Implement this trait to plug in another clock
/// or random number generator and pass it to [`Ulid::generate_from`](crate::Ulid::generate_from).
///
/// # Example
///
/// ```
/// use std::ops::RangeInclusive;
/// use ulid_lite::{EntropySource, Ulid};
///
/// struct Frozen;
///
/// impl EntropySource for Frozen {
///     fn timestamp(&mut self) -> Option<u64> {
///         Some(1_700_000_000_000)
///     }
///     fn random(&mut self, range: RangeInclusive<u128>) -> Option<u128> {
///         Some(*range.start())
///     }
/// }
///
/// let u = Ulid::generate_from(&mut Frozen)?;
///
/// assert_eq!(u.timestamp(), 1_700_000_000_000);
/// assert_eq!(u.randomness(), 0);
/// # Ok::<(), ulid_lite::Error>(())
/// ```
pub trait EntropySource {
    /// Returns the current timestamp in milliseconds since the Unix epoch.
    fn timestamp(&mut self) -> Option<u64>;

    /// Returns a random number in the given range.
    fn random(&mut self, range: RangeInclusive<u128>) -> Option<u128>;
}

/// How ULIDs generated within the same millisecond relate to each other.
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq)]
pub enum GenerationOrder {
    /// Each ULID gets 80 fresh random bits.
    ///
    /// ULIDs of the same millisecond are unordered among each other.
    /// Uniqueness rests solely on the entropy of the random bits.
    #[default]
    Random,

    /// ULIDs are strictly monotonically increasing.
    ///
    /// The first ULID of a millisecond gets fresh random bits, drawn from a range slightly
    /// reduced by 10<sup>10</sup> values. Every further ULID of that millisecond (or of a
    /// millisecond lying in the past, when the clock went backwards) is the previous ULID
    /// plus one. Running out of the reserve spills over into the next millisecond.
    ///
    /// The very last millisecond representable in 48 bits is reserved for that spill-over
    /// and reported as [`Error::Clock`].
    Monotonic,
}

/// Carries the ordering policy and the state it needs from one generation to the next.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Sequence {
    order: GenerationOrder,
    last_ulid: u128,
}

impl Sequence {
    pub const fn new(order: GenerationOrder) -> Self {
        Self { order, last_ulid: 0 }
    }

    pub const fn order(&self) -> GenerationOrder {
        self.order
    }

    pub fn generate<S: EntropySource + ?Sized>(&mut self, source: &mut S) -> Result<u128, Error> {
        let Some(now) = source.timestamp() else {
            tracing::warn!("entropy source delivered no timestamp");
            return Err(Error::Clock);
        };

        match self.order {
            GenerationOrder::Random => {
                if now > TIMESTAMP_MAX {
                    tracing::warn!(now, "timestamp does not fit into 48 bits");
                    return Err(Error::Clock);
                }

                let random = draw(source, 0..=RANDOM_MASK)?;
                Ok((u128::from(now) << RANDOM_BITS) | random)
            }

            GenerationOrder::Monotonic => {
                // Smaller, *not* smaller or equal: the last millisecond is reserved.
                if now >= TIMESTAMP_MAX {
                    tracing::warn!(now, "timestamp does not fit into 48 bits");
                    return Err(Error::Clock);
                }

                let timestamp = u128::from(now) << RANDOM_BITS;

                let ulid = if timestamp > self.last_ulid & TIMESTAMP_MASK {
                    timestamp | draw(source, 0..=RANDOM_GEN_MAX)?
                } else {
                    self.last_ulid.checked_add(1).ok_or(Error::RandomnessOutOfRange)?
                };

                debug_assert!(ulid > self.last_ulid);

                self.last_ulid = ulid;

                Ok(ulid)
            }
        }
    }
}

fn draw<S: EntropySource + ?Sized>(source: &mut S, range: RangeInclusive<u128>) -> Result<u128, Error> {
    let Some(candidate) = source.random(range.clone()) else {
        tracing::warn!("entropy source delivered no random number");
        return Err(Error::Rng);
    };

    // A misbehaving source must never leak bits into the timestamp.
    if range.contains(&candidate) {
        Ok(candidate)
    } else {
        tracing::warn!(candidate = %candidate, "entropy source delivered a random number out of range");
        Err(Error::Rng)
    }
}

static GLOBAL_CONTEXT: Mutex<Option<RngContext>> = Mutex::new(None);

fn lock_global_context() -> MutexGuard<'static, Option<RngContext>> {
    GLOBAL_CONTEXT.lock().unwrap_or_else(|poisoned| {
        GLOBAL_CONTEXT.clear_poison();
        poisoned.into_inner()
    })
}

/// Generates a ULID from the process-wide context, creating that context on first use.
pub fn generate() -> Result<u128, Error> {
    let mut global = lock_global_context();

    let context = global.get_or_insert_with(|| {
        tracing::debug!("creating process-wide ULID context");
        RngContext::from_entropy().monotonic()
    });

    context.next_raw()
}

/// Replaces the process-wide context used by [`Ulid::generate()`](crate::Ulid::generate).
///
/// Returns the previously installed context, or `None` if none was created yet.
/// Normally there is no need to call this function. It is useful to make the
/// process-wide generation reproducible, or to install a custom clock.
///
/// # Example
///
/// ```
/// use ulid_lite::{set_global_context, RngContext, Ulid};
///
/// fn frozen_clock() -> Option<u64> {
///     Some(1_700_000_000_000)
/// }
///
/// set_global_context(RngContext::new(42).with_clock(frozen_clock).monotonic());
///
/// let u1 = Ulid::generate();
/// let u2 = Ulid::generate();
///
/// assert_eq!(u1.timestamp(), 1_700_000_000_000);
/// assert_eq!(u2.to_u128(), u1.to_u128() + 1);
/// ```
pub fn set_global_context(context: RngContext) -> Option<RngContext> {
    tracing::debug!(seed = ?context.seed(), order = ?context.order(), "replacing process-wide ULID context");
    lock_global_context().replace(context)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedEntropySource {
        timestamp: Option<u64>,
        random: Option<u128>,
    }
    impl FixedEntropySource {
        #[must_use]
        const fn new(timestamp: u64, random: u128) -> Self {
            Self {
                timestamp: Some(timestamp),
                random: Some(random),
            }
        }
    }
    impl EntropySource for FixedEntropySource {
        fn timestamp(&mut self) -> Option<u64> {
            self.timestamp
        }
        fn random(&mut self, _range: RangeInclusive<u128>) -> Option<u128> {
            self.random
        }
    }

    #[test]
    fn test_random_layout() {
        let mut source = FixedEntropySource::new(0x0123_4567_89AB, 0xFEDC_BA98_7654_3210_1234);
        let mut sequence = Sequence::new(GenerationOrder::Random);

        let ulid = sequence.generate(&mut source).unwrap();
        assert_eq!(ulid, 0x0123_4567_89AB_FEDC_BA98_7654_3210_1234);

        // Random order keeps no memory of previous ULIDs.
        assert_eq!(sequence.generate(&mut source), Ok(ulid));
    }

    #[test]
    fn test_random_accepts_last_millisecond() {
        let mut source = FixedEntropySource::new(TIMESTAMP_MAX, RANDOM_MASK);
        let mut sequence = Sequence::new(GenerationOrder::Random);

        assert_eq!(sequence.generate(&mut source), Ok(u128::MAX));
    }

    #[test]
    fn test_clock_errors() {
        for order in [GenerationOrder::Random, GenerationOrder::Monotonic] {
            let mut sequence = Sequence::new(order);

            let mut source = FixedEntropySource::new(TIMESTAMP_MAX + 1, 1);
            assert_eq!(sequence.generate(&mut source), Err(Error::Clock));

            let mut source = FixedEntropySource::new(u64::MAX, 1);
            assert_eq!(sequence.generate(&mut source), Err(Error::Clock));

            source.timestamp = None;
            assert_eq!(sequence.generate(&mut source), Err(Error::Clock));
        }

        let mut source = FixedEntropySource::new(TIMESTAMP_MAX, 1);
        let mut sequence = Sequence::new(GenerationOrder::Monotonic);
        assert_eq!(sequence.generate(&mut source), Err(Error::Clock));
    }

    #[test]
    fn test_rng_errors() {
        let mut sequence = Sequence::new(GenerationOrder::Random);

        let mut source = FixedEntropySource::new(1, RANDOM_MASK + 1);
        assert_eq!(sequence.generate(&mut source), Err(Error::Rng));

        source.random = None;
        assert_eq!(sequence.generate(&mut source), Err(Error::Rng));

        let mut sequence = Sequence::new(GenerationOrder::Monotonic);
        let mut source = FixedEntropySource::new(1, RANDOM_GEN_MAX + 1);
        assert_eq!(sequence.generate(&mut source), Err(Error::Rng));
    }

    #[test]
    fn test_monotonic_overflow() {
        let mut source = FixedEntropySource::new(1, 1);
        let mut sequence = Sequence::new(GenerationOrder::Monotonic);

        let u1 = sequence.generate(&mut source).unwrap();
        assert_eq!(u1, (1 << RANDOM_BITS) | 1);

        let u2 = sequence.generate(&mut source).unwrap();
        assert_eq!(u2, (1 << RANDOM_BITS) | 2);

        sequence.last_ulid = (1 << RANDOM_BITS) | (RANDOM_MASK - 1);

        let u3 = sequence.generate(&mut source).unwrap();
        assert_eq!(u3 >> RANDOM_BITS, 1);
        assert_eq!(u3 & RANDOM_MASK, RANDOM_MASK);

        let u4 = sequence.generate(&mut source).unwrap();
        assert_eq!(u4 >> RANDOM_BITS, 2);
        assert_eq!(u4 & RANDOM_MASK, 0);

        let u5 = sequence.generate(&mut source).unwrap();
        assert_eq!(u5 >> RANDOM_BITS, 2);
        assert_eq!(u5 & RANDOM_MASK, 1);

        sequence.last_ulid = u128::MAX;
        assert_eq!(sequence.generate(&mut source), Err(Error::RandomnessOutOfRange));
    }

    #[test]
    fn test_monotonic_clock_going_backwards() {
        let mut source = FixedEntropySource::new(10, 5);
        let mut sequence = Sequence::new(GenerationOrder::Monotonic);

        let u1 = sequence.generate(&mut source).unwrap();

        source.timestamp = Some(9);
        let u2 = sequence.generate(&mut source).unwrap();

        assert_eq!(u2, u1 + 1);
        assert_eq!(u2 >> RANDOM_BITS, 10);

        source.timestamp = Some(11);
        let u3 = sequence.generate(&mut source).unwrap();
        assert_eq!(u3, (11 << RANDOM_BITS) | 5);
    }
}
