use rand::{rngs::StdRng, seq::SliceRandom, Rng, RngCore, SeedableRng};

/// The single random source a session threads through composition and actions.
#[derive(Debug, Clone)]
pub struct RngState {
    seed: u64,
    rng: StdRng,
}

impl RngState {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Fresh seed from the thread RNG; the seed is kept so a run can be replayed.
    pub fn from_entropy() -> Self {
        Self::from_seed(rand::thread_rng().next_u64())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform Fisher-Yates shuffle in place.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }

    /// Uniform index in `low..=high`. Callers guarantee `low <= high`.
    pub fn index_between(&mut self, low: usize, high: usize) -> usize {
        self.rng.gen_range(low..=high)
    }

    pub fn index_below(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            None
        } else {
            Some(self.rng.gen_range(0..len))
        }
    }

    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_shuffle() {
        let mut a = RngState::from_seed(11);
        let mut b = RngState::from_seed(11);
        let mut left: Vec<u32> = (0..20).collect();
        let mut right = left.clone();
        a.shuffle(&mut left);
        b.shuffle(&mut right);
        assert_eq!(left, right);
    }

    #[test]
    fn index_helpers_stay_in_range() {
        let mut rng = RngState::from_seed(3);
        for _ in 0..200 {
            let idx = rng.index_between(2, 5);
            assert!((2..=5).contains(&idx));
        }
        assert_eq!(rng.index_below(0), None);
        assert_eq!(rng.index_between(4, 4), 4);
        assert!(rng.choose::<u8>(&[]).is_none());
    }
}
