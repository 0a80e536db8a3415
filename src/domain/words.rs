/// Word bank: dictionary filtering, random draw, likeness scoring.
///
/// A bank is the solvable core of one hacking session: up to twelve
/// distinct candidate words of a single fixed length, one of which is
/// the secret access code. All randomness flows through the caller's
/// `Rng` so sessions can be reproduced from a seed.

use std::collections::HashSet;
use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;

/// Maximum number of candidate words drawn into one session.
pub const BANK_SIZE: usize = 12;

#[derive(Clone, Debug)]
pub struct WordBank {
    /// Distinct candidates, all of the configured length.
    pub words: Vec<String>,
    /// The access code. Always a member of `words`.
    pub secret: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectError {
    /// The dictionary has no entry of the configured length.
    /// The puzzle cannot open; the host must surface this instead of starting.
    NoWords { length: usize },
}

impl fmt::Display for SelectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectError::NoWords { length } => {
                write!(f, "no dictionary entries of length {length}")
            }
        }
    }
}

impl std::error::Error for SelectError {}

// ── Selection ──

/// Filter the dictionary to `length`, shuffle, take up to `count` words,
/// and pick one of them as the secret.
pub fn select_words(
    dictionary: &[String],
    length: usize,
    count: usize,
    rng: &mut impl Rng,
) -> Result<WordBank, SelectError> {
    let mut seen = HashSet::new();
    let mut pool: Vec<String> = dictionary
        .iter()
        .map(|w| w.trim().to_uppercase())
        .filter(|w| w.chars().count() == length)
        .filter(|w| seen.insert(w.clone()))
        .collect();

    if pool.is_empty() {
        return Err(SelectError::NoWords { length });
    }

    pool.shuffle(rng);
    pool.truncate(count.min(pool.len()));

    let secret = pool[rng.gen_range(0..pool.len())].clone();
    Ok(WordBank { words: pool, secret })
}

/// Positional character-match count between two words.
///
/// This is the player feedback score: how many characters of the guess
/// sit in the same position as in the secret. Not an edit distance.
/// Both words come from the same length-filtered bank, so the zip never
/// truncates in practice.
pub fn likeness(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).filter(|(x, y)| x == y).count()
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn dict(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn five_letter_dict() -> Vec<String> {
        dict(&[
            "vault", "steam", "pipes", "cargo", "alarm", "guard", "power",
            "relay", "siren", "crane", "track", "lever", "panel", "valve",
        ])
    }

    #[test]
    fn secret_is_member_and_lengths_match() {
        for seed in 0..40 {
            let mut rng = StdRng::seed_from_u64(seed);
            let bank = select_words(&five_letter_dict(), 5, BANK_SIZE, &mut rng).unwrap();
            assert!(bank.words.contains(&bank.secret));
            assert!(bank.words.len() <= BANK_SIZE);
            assert!(bank.words.iter().all(|w| w.chars().count() == 5));
        }
    }

    #[test]
    fn draw_is_capped_at_count() {
        let mut rng = StdRng::seed_from_u64(7);
        let bank = select_words(&five_letter_dict(), 5, 4, &mut rng).unwrap();
        assert_eq!(bank.words.len(), 4);
    }

    #[test]
    fn short_pool_yields_short_bank() {
        let mut rng = StdRng::seed_from_u64(7);
        let bank = select_words(&dict(&["vault", "steam"]), 5, BANK_SIZE, &mut rng).unwrap();
        assert_eq!(bank.words.len(), 2);
    }

    #[test]
    fn duplicates_are_collapsed() {
        let mut rng = StdRng::seed_from_u64(1);
        let bank =
            select_words(&dict(&["vault", "VAULT", "Vault", "steam"]), 5, BANK_SIZE, &mut rng)
                .unwrap();
        assert_eq!(bank.words.len(), 2);
    }

    #[test]
    fn empty_filter_is_a_config_error() {
        let mut rng = StdRng::seed_from_u64(3);
        let err = select_words(&five_letter_dict(), 9, BANK_SIZE, &mut rng).unwrap_err();
        assert_eq!(err, SelectError::NoWords { length: 9 });
    }

    #[test]
    fn words_are_uppercased() {
        let mut rng = StdRng::seed_from_u64(5);
        let bank = select_words(&dict(&["vault"]), 5, BANK_SIZE, &mut rng).unwrap();
        assert_eq!(bank.words[0], "VAULT");
        assert_eq!(bank.secret, "VAULT");
    }

    // ── Likeness ──

    #[test]
    fn likeness_identity_is_full_length() {
        assert_eq!(likeness("REACTOR", "REACTOR"), 7);
    }

    #[test]
    fn likeness_is_symmetric() {
        assert_eq!(likeness("VAULT", "VALVE"), likeness("VALVE", "VAULT"));
        assert_eq!(likeness("CRANE", "TRACK"), likeness("TRACK", "CRANE"));
    }

    #[test]
    fn likeness_counts_positional_matches_only() {
        // V.A.. match at positions 0 and 1 only
        assert_eq!(likeness("VAULT", "VALVE"), 2);
        // No positions agree even though letters overlap
        assert_eq!(likeness("ALARM", "RELAY"), 0);
    }
}
