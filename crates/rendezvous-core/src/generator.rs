//! Collision-free random identifiers with bounded retry.

use std::hash::Hash;

use dashmap::DashSet;
use rand::distributions::Alphanumeric;
use rand::Rng;

/// Candidates drawn before `Generator::generate` gives up.
pub const MAX_TRIALS: usize = 1000;

/// Source of candidate identifiers.
pub trait IdStrategy {
    type Id: Eq + Hash + Clone;

    fn generate(&self) -> Self::Id;

    /// Sentinel that is never handed out.
    fn invalid(&self) -> Self::Id;
}

/// Tracks identifiers in use and hands out fresh ones.
pub struct Generator<S: IdStrategy> {
    strategy: S,
    in_use: DashSet<S::Id>,
    trials: usize,
}

impl<S: IdStrategy> Generator<S> {
    pub fn new(strategy: S) -> Self {
        Self::with_trials(strategy, MAX_TRIALS)
    }

    pub fn with_trials(strategy: S, trials: usize) -> Self {
        Self {
            strategy,
            in_use: DashSet::new(),
            trials,
        }
    }

    /// Reserve a fresh identifier, or `None` if every trial collided.
    pub fn generate(&self) -> Option<S::Id> {
        let invalid = self.strategy.invalid();
        for _ in 0..self.trials {
            let candidate = self.strategy.generate();
            if candidate == invalid {
                continue;
            }
            if self.in_use.insert(candidate.clone()) {
                return Some(candidate);
            }
        }
        None
    }

    /// Reserve a caller-chosen identifier. Returns false if it is already taken
    /// or is the sentinel.
    pub fn add(&self, id: S::Id) -> bool {
        if id == self.strategy.invalid() {
            return false;
        }
        self.in_use.insert(id)
    }

    pub fn contains(&self, id: &S::Id) -> bool {
        self.in_use.contains(id)
    }

    /// Return an identifier to the pool.
    pub fn release(&self, id: &S::Id) -> bool {
        self.in_use.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.in_use.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_use.is_empty()
    }
}

// ── Strategies ────────────────────────────────────────────────────────────────

pub const NAME_LEN: usize = 12;

/// Twelve characters from `[a-zA-Z0-9]`. The empty string is invalid.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomName;

impl IdStrategy for RandomName {
    type Id = String;

    fn generate(&self) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(NAME_LEN)
            .map(char::from)
            .collect()
    }

    fn invalid(&self) -> String {
        String::new()
    }
}

/// Uniform `u32`. `u32::MAX` is invalid.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomU32;

impl IdStrategy for RandomU32 {
    type Id = u32;

    fn generate(&self) -> u32 {
        rand::thread_rng().gen()
    }

    fn invalid(&self) -> u32 {
        u32::MAX
    }
}

/// Unprivileged port in `[1024, 65535]`. 0 is invalid.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomPort;

impl IdStrategy for RandomPort {
    type Id = u16;

    fn generate(&self) -> u16 {
        rand::thread_rng().gen_range(1024..=u16::MAX)
    }

    fn invalid(&self) -> u16 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_are_distinct_and_well_formed() {
        let generator = Generator::new(RandomName);
        let mut seen = HashSet::new();
        for _ in 0..500 {
            let name = generator.generate().unwrap();
            assert_eq!(name.len(), NAME_LEN);
            assert!(name.chars().all(|c| c.is_ascii_alphanumeric()));
            assert!(seen.insert(name));
        }
        assert_eq!(generator.len(), 500);
    }

    #[test]
    fn release_returns_id_to_pool() {
        let generator = Generator::new(RandomU32);
        let id = generator.generate().unwrap();
        assert!(generator.contains(&id));
        assert!(!generator.add(id));
        assert!(generator.release(&id));
        assert!(!generator.contains(&id));
        assert!(generator.add(id));
    }

    #[test]
    fn sentinel_is_never_reserved() {
        let generator = Generator::new(RandomU32);
        assert!(!generator.add(u32::MAX));
        let names = Generator::new(RandomName);
        assert!(!names.add(String::new()));
    }

    struct Constant;

    impl IdStrategy for Constant {
        type Id = u8;
        fn generate(&self) -> u8 {
            7
        }
        fn invalid(&self) -> u8 {
            0
        }
    }

    #[test]
    fn gives_up_after_trials() {
        let generator = Generator::new(Constant);
        assert_eq!(generator.generate(), Some(7));
        assert_eq!(generator.generate(), None);
    }

    #[test]
    fn ports_are_unprivileged() {
        for _ in 0..200 {
            assert!(RandomPort.generate() >= 1024);
        }
    }
}
