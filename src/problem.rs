use rand::{rngs::StdRng, seq::IteratorRandom, Rng, SeedableRng};
use std::{collections::BTreeSet, fmt, ops::RangeInclusive};

/// Tables a session can draw from
pub const TABLE_RANGE: RangeInclusive<u32> = 1..=12;

/// Smallest right-hand operand a problem can use
pub const MIN_FACTOR: u32 = 2;
/// Largest right-hand operand a problem can use
pub const MAX_FACTOR: u32 = 10;

/// Identifies a problem by its ordered operand pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProblemKey(pub u32, pub u32);

impl fmt::Display for ProblemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} × {}", self.0, self.1)
    }
}

/// A single multiplication question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Problem {
    pub left: u32,
    pub right: u32,
    pub answer: u32,
}

impl Problem {
    pub fn new(left: u32, right: u32) -> Self {
        Self {
            left,
            right,
            answer: left * right,
        }
    }

    pub fn key(&self) -> ProblemKey {
        ProblemKey(self.left, self.right)
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.key().fmt(f)
    }
}

/// Draws problems from the selected tables
#[derive(Debug)]
pub struct ProblemGenerator {
    rng: StdRng,
}

impl ProblemGenerator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic generator for tests and replays
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Tables outside `TABLE_RANGE` are skipped. `None` when nothing is left to draw from.
    pub fn generate(&mut self, tables: &BTreeSet<u32>) -> Option<Problem> {
        let left = *tables
            .iter()
            .filter(|t| TABLE_RANGE.contains(t))
            .choose(&mut self.rng)?;
        let right = self.rng.gen_range(MIN_FACTOR..=MAX_FACTOR);
        Some(Problem::new(left, right))
    }
}

impl Default for ProblemGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_problem_answer() {
        let p = Problem::new(7, 8);
        assert_eq!(p.answer, 56);
        assert_eq!(p.key(), ProblemKey(7, 8));
    }

    #[test]
    fn test_problem_display() {
        assert_eq!(Problem::new(3, 7).to_string(), "3 × 7");
        assert_eq!(ProblemKey(12, 10).to_string(), "12 × 10");
    }

    #[test]
    fn test_key_is_ordered_pair() {
        assert_ne!(ProblemKey(3, 7), ProblemKey(7, 3));
    }

    #[test]
    fn test_generate_empty_tables() {
        let mut generator = ProblemGenerator::seeded(1);
        assert_eq!(generator.generate(&BTreeSet::new()), None);
    }

    #[test]
    fn test_generate_skips_tables_out_of_range() {
        let mut generator = ProblemGenerator::seeded(5);
        let huge: BTreeSet<u32> = [u32::MAX / 2].into_iter().collect();
        assert_eq!(generator.generate(&huge), None);

        let mixed: BTreeSet<u32> = [0, 6, 13, u32::MAX].into_iter().collect();
        for _ in 0..200 {
            assert_eq!(generator.generate(&mixed).unwrap().left, 6);
        }
    }

    #[test]
    fn test_generate_stays_in_range() {
        let mut generator = ProblemGenerator::seeded(42);
        let tables: BTreeSet<u32> = [2, 5, 9, 12].into_iter().collect();

        for _ in 0..10_000 {
            let p = generator.generate(&tables).unwrap();
            assert!(tables.contains(&p.left));
            assert!((MIN_FACTOR..=MAX_FACTOR).contains(&p.right));
            assert_eq!(p.answer, p.left * p.right);
        }
    }

    #[test]
    fn test_generate_covers_every_factor_and_table() {
        let mut generator = ProblemGenerator::seeded(7);
        let tables: BTreeSet<u32> = [3, 4].into_iter().collect();
        let mut seen_right = BTreeSet::new();
        let mut seen_left = BTreeSet::new();

        for _ in 0..1_000 {
            let p = generator.generate(&tables).unwrap();
            seen_left.insert(p.left);
            seen_right.insert(p.right);
        }

        assert_eq!(seen_left, tables);
        assert_eq!(seen_right, (MIN_FACTOR..=MAX_FACTOR).collect::<BTreeSet<u32>>());
    }

    #[test]
    fn test_seeded_generators_agree() {
        let tables: BTreeSet<u32> = (1..=12).collect();
        let mut a = ProblemGenerator::seeded(99);
        let mut b = ProblemGenerator::seeded(99);
        for _ in 0..50 {
            assert_eq!(a.generate(&tables), b.generate(&tables));
        }
    }
}
