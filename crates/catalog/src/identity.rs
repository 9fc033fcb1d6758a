//! Product id drawing.
//!
//! This module only *proposes* candidates. Uniqueness is decided by the store's
//! unique constraint; callers insert the candidate and come back for another
//! one on conflict, up to [`IdentityGenerator::max_attempts`] times.

use std::collections::HashSet;
use std::sync::Arc;

use rand::Rng;
use shopfront_core::ProductId;

/// Source of raw numeric codes.
pub trait IdSource: Send + Sync {
    fn draw_code(&self) -> u32;
}

/// Uniform draw over `ProductId::MIN_CODE..=ProductId::MAX_CODE`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdSource;

impl IdSource for RandomIdSource {
    fn draw_code(&self) -> u32 {
        rand::rng().random_range(ProductId::MIN_CODE..=ProductId::MAX_CODE)
    }
}

/// Draws candidate product ids that avoid a known-taken set.
#[derive(Clone)]
pub struct IdentityGenerator {
    source: Arc<dyn IdSource>,
    max_attempts: u32,
}

impl core::fmt::Debug for IdentityGenerator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IdentityGenerator")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

impl IdentityGenerator {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

    /// Draws per candidate before giving up on finding one outside `taken`.
    const DRAWS_PER_CANDIDATE: u32 = 64;

    pub fn new(max_attempts: u32) -> Self {
        Self::with_source(Arc::new(RandomIdSource), max_attempts)
    }

    pub fn with_source(source: Arc<dyn IdSource>, max_attempts: u32) -> Self {
        Self {
            source,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Upper bound on insert attempts for one id assignment.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Propose an id that is not in `taken`.
    ///
    /// Returns `None` when the source keeps producing taken or out-of-range
    /// codes, which callers report as exhaustion.
    pub fn candidate(&self, taken: &HashSet<ProductId>) -> Option<ProductId> {
        (0..Self::DRAWS_PER_CANDIDATE)
            .filter_map(|_| ProductId::from_code(self.source.draw_code()))
            .find(|id| !taken.contains(id))
    }
}

impl Default for IdentityGenerator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Replays a fixed sequence of codes, repeating the last one.
    struct Scripted(Mutex<Vec<u32>>);

    impl IdSource for Scripted {
        fn draw_code(&self) -> u32 {
            let mut codes = self.0.lock().unwrap();
            if codes.len() > 1 { codes.remove(0) } else { codes[0] }
        }
    }

    fn scripted(codes: &[u32]) -> IdentityGenerator {
        IdentityGenerator::with_source(Arc::new(Scripted(Mutex::new(codes.to_vec()))), 3)
    }

    #[test]
    fn random_codes_are_six_digits() {
        let source = RandomIdSource;
        for _ in 0..1_000 {
            let id = ProductId::from_code(source.draw_code()).unwrap();
            assert!(id.is_generated_code());
        }
    }

    #[test]
    fn candidate_skips_taken_ids() {
        let generator = scripted(&[111111, 222222, 333333]);
        let taken: HashSet<_> = [ProductId::parse("111111").unwrap()].into_iter().collect();
        assert_eq!(generator.candidate(&taken).unwrap().as_str(), "222222");
    }

    #[test]
    fn candidate_skips_out_of_range_codes() {
        let generator = scripted(&[42, 7, 444444]);
        assert_eq!(generator.candidate(&HashSet::new()).unwrap().as_str(), "444444");
    }

    #[test]
    fn candidate_gives_up_when_everything_is_taken() {
        let generator = scripted(&[555555]);
        let taken: HashSet<_> = [ProductId::parse("555555").unwrap()].into_iter().collect();
        assert!(generator.candidate(&taken).is_none());
    }

    #[test]
    fn max_attempts_is_at_least_one() {
        assert_eq!(IdentityGenerator::new(0).max_attempts(), 1);
        assert_eq!(IdentityGenerator::default().max_attempts(), 5);
    }
}
