use std::sync::{Mutex, PoisonError};

use rand::{rngs::StdRng, Rng, SeedableRng};

use super::{Error, RewardDefinition};

/// Source of uniform samples for draws
///
/// Every call must return a fresh sample in `[0, 1)`. Sources shared between concurrent requests
/// must be safe to sample from several tasks at once.
#[mockall::automock]
pub trait RandomSource {
    fn next_unit(&self) -> f64;
}

/// Samples from the calling thread's generator
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_unit(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Reproducible source backed by a seeded generator
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_unit(&self) -> f64 {
        // The generator state stays valid even if another holder panicked
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen::<f64>()
    }
}

/// Weighted selection over `items`
///
/// Walks the items in order and returns the first one whose cumulative probability exceeds the
/// sample. If floating point drift leaves the sample above the final cumulative value, the last
/// item is returned.
pub fn draw<'a, R>(items: &'a [RewardDefinition], random: &R) -> Result<&'a RewardDefinition, Error>
where
    R: RandomSource + ?Sized,
{
    let last = items.last().ok_or(Error::NoItemsAvailable)?;
    let sample = random.next_unit();

    let mut cumulative = 0.0;
    for item in items {
        cumulative += item.draw_probability;
        if sample < cumulative {
            return Ok(item);
        }
    }

    Ok(last)
}
