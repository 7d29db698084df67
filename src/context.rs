use std::{
    fmt,
    ops::RangeInclusive,
    time::{SystemTime, UNIX_EPOCH},
};

use rand::{rngs::StdRng, Rng as _, SeedableRng as _}; // cspell:disable-line

use crate::{
    generator::{EntropySource, GenerationOrder, Sequence},
    EncodedUlid, Error, Ulid,
};

/// A clock returning milliseconds since the Unix epoch, or `None` when unavailable.
pub type Clock = fn() -> Option<u64>;

/// Reads the system clock with millisecond resolution.
///
/// Returns `None` if the system time lies before the Unix epoch.
#[must_use]
pub fn system_clock() -> Option<u64> {
    let since_epoch = SystemTime::now().duration_since(UNIX_EPOCH).ok()?;
    u64::try_from(since_epoch.as_millis()).ok()
}

/// Derives a non-zero seed from the nanoseconds of the system clock.
#[allow(clippy::cast_possible_truncation)]
fn clock_seed() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |since_epoch| since_epoch.as_nanos());

    // Fold the high bits in, so seeds keep changing beyond the year 2554.
    let folded = (nanos as u64) ^ ((nanos >> 64) as u64);

    folded.max(1)
}

/// The state of a pseudo random number generator, used to generate ULIDs.
///
/// A context owns a seeded [`StdRng`], the [`Clock`] to read timestamps from,
/// and the [`GenerationOrder`] policy (including the state that policy needs).
///
/// Contexts are single-owner: generating takes `&mut self`. To share one context
/// between threads, wrap it in a [`Mutex`](std::sync::Mutex), or simply create one
/// context per thread. Contexts do not implement `Clone`: two
/// copies would produce the very same ULIDs.
///
/// # Example
///
/// ```
/// use ulid_lite::RngContext;
///
/// let mut ctx = RngContext::new(0); // zero seeds from the system clock
///
/// let u1 = ctx.generate()?;
/// let u2 = ctx.generate()?;
///
/// assert_ne!(u1, u2);
/// # Ok::<(), ulid_lite::Error>(())
/// ```
pub struct RngContext {
    entropy: Entropy,
    seed: Option<u64>,
    sequence: Sequence,
}

struct Entropy {
    rng: StdRng,
    clock: Clock,
}

impl EntropySource for Entropy {
    fn timestamp(&mut self) -> Option<u64> {
        (self.clock)()
    }

    fn random(&mut self, range: RangeInclusive<u128>) -> Option<u128> {
        Some(self.rng.gen_range(range))
    }
}

impl RngContext {
    /// Creates a context seeded with `seed`.
    ///
    /// A seed of zero is a sentinel: the seed is then derived from the system clock, making
    /// the output unpredictable. Any other seed makes the random part of all ULIDs a pure
    /// function of the seed and the sequence of calls.
    ///
    /// The context reads the [`system_clock`] and uses [`GenerationOrder::Random`].
    ///
    /// # Example
    ///
    /// ```
    /// use ulid_lite::RngContext;
    ///
    /// let mut a = RngContext::new(7);
    /// let mut b = RngContext::new(7);
    ///
    /// assert_eq!(a.generate()?.randomness(), b.generate()?.randomness());
    /// # Ok::<(), ulid_lite::Error>(())
    /// ```
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let seed = Self::effective_seed(seed);

        Self {
            entropy: Entropy {
                rng: StdRng::seed_from_u64(seed),
                clock: system_clock,
            },
            seed: Some(seed),
            sequence: Sequence::new(GenerationOrder::Random),
        }
    }

    /// Creates a context seeded from the operating system's entropy source.
    ///
    /// This gives the best randomness, but the output cannot be reproduced:
    /// [`seed()`](Self::seed) returns `None`.
    #[must_use]
    pub fn from_entropy() -> Self {
        tracing::debug!("seeding ULID context from operating system entropy");

        Self {
            entropy: Entropy {
                rng: StdRng::from_entropy(),
                clock: system_clock,
            },
            seed: None,
            sequence: Sequence::new(GenerationOrder::Random),
        }
    }

    /// Replaces the clock of this context.
    ///
    /// Mostly useful in tests, to generate ULIDs at fixed points in time.
    ///
    /// # Example
    ///
    /// ```
    /// use ulid_lite::RngContext;
    ///
    /// let mut ctx = RngContext::new(1).with_clock(|| Some(1_700_000_000_000));
    ///
    /// assert_eq!(ctx.generate()?.timestamp(), 1_700_000_000_000);
    /// # Ok::<(), ulid_lite::Error>(())
    /// ```
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.entropy.clock = clock;
        self
    }

    /// Switches this context to [`GenerationOrder::Monotonic`].
    ///
    /// # Example
    ///
    /// ```
    /// use ulid_lite::RngContext;
    ///
    /// let mut ctx = RngContext::new(0).monotonic();
    ///
    /// let u1 = ctx.generate()?;
    /// let u2 = ctx.generate()?;
    ///
    /// assert!(u1 < u2);
    /// # Ok::<(), ulid_lite::Error>(())
    /// ```
    #[must_use]
    pub fn monotonic(mut self) -> Self {
        self.sequence = Sequence::new(GenerationOrder::Monotonic);
        self
    }

    /// Re-initializes the random number generator with a new seed.
    ///
    /// The same rules as for [`RngContext::new`] apply, including the zero sentinel.
    /// The state of a monotonic sequence is reset as well, so a re-seeded context
    /// behaves exactly like a freshly created one.
    pub fn reseed(&mut self, seed: u64) {
        let seed = Self::effective_seed(seed);

        self.entropy.rng = StdRng::seed_from_u64(seed);
        self.seed = Some(seed);
        self.sequence = Sequence::new(self.sequence.order());
    }

    /// Returns the seed in use.
    ///
    /// For contexts created with the zero sentinel, this is the seed derived from the clock,
    /// which allows reproducing the output later. `None` for [`RngContext::from_entropy`].
    #[must_use]
    pub const fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Returns the ordering policy of this context.
    #[must_use]
    pub const fn order(&self) -> GenerationOrder {
        self.sequence.order()
    }

    /// Generates a new ULID.
    ///
    /// # Errors
    ///
    /// [`Error::Clock`] if the clock is unavailable or out of the 48-bit range,
    /// [`Error::RandomnessOutOfRange`] if a monotonic sequence is exhausted.
    pub fn generate(&mut self) -> Result<Ulid, Error> {
        self.next_raw().map(Ulid::from_u128)
    }

    /// Generates a new ULID and encodes it as text.
    ///
    /// # Errors
    ///
    /// Same as [`RngContext::generate`].
    pub fn generate_string(&mut self) -> Result<EncodedUlid, Error> {
        self.generate().map(EncodedUlid::new)
    }

    pub(crate) fn next_raw(&mut self) -> Result<u128, Error> {
        self.sequence.generate(&mut self.entropy)
    }

    fn effective_seed(seed: u64) -> u64 {
        if seed == 0 {
            let seed = clock_seed();
            tracing::debug!(seed, "seeding ULID context from system clock");
            seed
        } else {
            seed
        }
    }
}

impl EntropySource for RngContext {
    fn timestamp(&mut self) -> Option<u64> {
        self.entropy.timestamp()
    }

    fn random(&mut self, range: RangeInclusive<u128>) -> Option<u128> {
        self.entropy.random(range)
    }
}

impl Default for RngContext {
    /// Same as [`RngContext::from_entropy`].
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl fmt::Debug for RngContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RngContext")
            .field("seed", &self.seed)
            .field("order", &self.order())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RANDOM_MASK, TIMESTAMP_MAX};

    const FROZEN: u64 = 1_702_672_283_828;

    fn frozen_clock() -> Option<u64> {
        Some(FROZEN)
    }

    fn broken_clock() -> Option<u64> {
        None
    }

    fn future_clock() -> Option<u64> {
        Some(TIMESTAMP_MAX + 1)
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = RngContext::new(0xDEAD_BEEF).with_clock(frozen_clock);
        let mut b = RngContext::new(0xDEAD_BEEF).with_clock(frozen_clock);

        for _ in 0..100 {
            assert_eq!(a.generate(), b.generate());
        }
    }

    #[test]
    fn test_different_seed_different_sequence() {
        let mut a = RngContext::new(1).with_clock(frozen_clock);
        let mut b = RngContext::new(2).with_clock(frozen_clock);

        assert_ne!(a.generate(), b.generate());
    }

    #[test]
    fn test_reseed_restarts_sequence() {
        let mut ctx = RngContext::new(99).with_clock(frozen_clock);
        let first: Vec<_> = (0..5).map(|_| ctx.generate()).collect();

        ctx.reseed(99);
        let second: Vec<_> = (0..5).map(|_| ctx.generate()).collect();

        assert_eq!(first, second);
    }

    #[test]
    fn test_zero_seed_is_replaced() {
        let ctx = RngContext::new(0);
        assert_ne!(ctx.seed(), Some(0));
        assert!(ctx.seed().is_some());

        let ctx = RngContext::from_entropy();
        assert_eq!(ctx.seed(), None);
    }

    #[test]
    fn test_clock_seeded_output_is_reproducible() {
        let mut original = RngContext::new(0).with_clock(frozen_clock);
        let mut replay = RngContext::new(original.seed().unwrap()).with_clock(frozen_clock);

        assert_eq!(original.generate(), replay.generate());
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn test_zero_seed_follows_wall_clock() {
        let mut ctx = RngContext::new(0);

        let u1 = ctx.generate().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let u2 = ctx.generate().unwrap();

        assert!(u1.timestamp() < u2.timestamp());
        assert!(u1.timestamp() > 1_704_067_200_000); // 1st January 2024
    }

    #[test]
    fn test_timestamp_and_randomness() {
        let mut ctx = RngContext::new(5).with_clock(frozen_clock);

        for _ in 0..100 {
            let u = ctx.generate().unwrap();
            assert_eq!(u.timestamp(), FROZEN);
            assert!(u.randomness() <= RANDOM_MASK);
        }
    }

    #[test]
    fn test_monotonic_within_frozen_millisecond() {
        let mut ctx = RngContext::new(3).with_clock(frozen_clock).monotonic();
        assert_eq!(ctx.order(), GenerationOrder::Monotonic);

        let mut last = ctx.generate().unwrap();
        for _ in 0..1000 {
            let next = ctx.generate().unwrap();
            assert_eq!(next.to_u128(), last.to_u128() + 1);
            last = next;
        }
    }

    #[test]
    fn test_reseed_keeps_order() {
        let mut ctx = RngContext::new(3).monotonic();
        ctx.reseed(4);

        assert_eq!(ctx.order(), GenerationOrder::Monotonic);
        assert_eq!(ctx.seed(), Some(4));
    }

    #[test]
    fn test_clock_failures() {
        let mut ctx = RngContext::new(1).with_clock(broken_clock);
        assert_eq!(ctx.generate(), Err(Error::Clock));

        let mut ctx = RngContext::new(1).with_clock(future_clock);
        assert_eq!(ctx.generate_string(), Err(Error::Clock));
    }

    #[test]
    fn test_generate_string() {
        let mut a = RngContext::new(11).with_clock(frozen_clock);
        let mut b = RngContext::new(11).with_clock(frozen_clock);

        let s = a.generate_string().unwrap();
        let u = b.generate().unwrap();

        assert_eq!(s.len(), 26);
        assert_eq!(s.to_ulid(), u);
    }

    #[test]
    fn test_debug_hides_rng_state() {
        let ctx = RngContext::new(8);
        assert_eq!(format!("{ctx:?}"), "RngContext { seed: Some(8), order: Random, .. }");
    }
}
