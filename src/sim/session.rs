/// The puzzle state machine: one breach session against one terminal.
///
/// Lifecycle: created idle, `start` arms the timer, `guess` spends
/// attempts until the secret is found (win) or the budget runs out
/// (lockout), `tick` enforces the deadline, `reset` redraws the whole
/// board within its quota. Win and lockout are terminal: every further
/// transition is a no-op.
///
/// All transitions return the events the presentation layer reacts to;
/// the transcript `log` is the player-visible record of the same.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;

use crate::domain::grid::{TerminalGrid, GRID_COLS, GRID_ROWS};
use crate::domain::words::{self, SelectError, WordBank, BANK_SIZE};
use super::event::{LockReason, PuzzleEvent, RefuseReason};

/// Immutable per-session settings, fixed once the session is created.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub word_length: usize,
    pub attempts: u32,
    /// 0 disables the deadline.
    pub timer_seconds: u64,
    /// None = unlimited resets.
    pub max_resets: Option<u32>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            word_length: 7,
            attempts: 4,
            timer_seconds: 0,
            max_resets: None,
        }
    }
}

pub struct Session {
    pub config: SessionConfig,
    pub bank: WordBank,
    pub grid: TerminalGrid,
    pub remaining: u32,
    pub resets_used: u32,
    pub log: Vec<String>,
    pub disabled: HashSet<String>,
    pub started: bool,
    pub over: bool,
    pub locked: bool,
    /// Absolute deadline. Survives resets so redraws cannot stall the clock.
    pub timer_end: Option<Instant>,

    dictionary: Vec<String>,
    rng: StdRng,
}

impl Session {
    /// Draw a word bank and grid from the dictionary. Fails only when the
    /// dictionary holds no word of the configured length.
    pub fn new(
        config: SessionConfig,
        dictionary: Vec<String>,
        mut rng: StdRng,
    ) -> Result<Session, SelectError> {
        let bank = words::select_words(&dictionary, config.word_length, BANK_SIZE, &mut rng)?;
        let grid = TerminalGrid::generate(&bank.words, &bank.secret, GRID_COLS, GRID_ROWS, &mut rng);
        let remaining = config.attempts;
        Ok(Session {
            config,
            bank,
            grid,
            remaining,
            resets_used: 0,
            log: Vec::new(),
            disabled: HashSet::new(),
            started: false,
            over: false,
            locked: false,
            timer_end: None,
            dictionary,
            rng,
        })
    }

    // ── Transitions ──

    /// Leave idle: arm the deadline and log the boot banner.
    /// No-op when already started.
    pub fn start(&mut self, now: Instant) -> Vec<PuzzleEvent> {
        if self.started {
            return vec![];
        }
        self.started = true;
        if self.config.timer_seconds > 0 {
            self.timer_end = Some(now + Duration::from_secs(self.config.timer_seconds));
        }
        self.log.push("> BREACH INTERFACE 2.1".to_string());
        self.log.push("> ENTER ACCESS CODE".to_string());
        vec![PuzzleEvent::Booted]
    }

    /// Spend one attempt on `word`. No-op before start, after the session
    /// is over, or on an already-guessed word.
    pub fn guess(&mut self, word: &str) -> Vec<PuzzleEvent> {
        if !self.started || self.over || self.disabled.contains(word) {
            return vec![];
        }
        let score = words::likeness(word, &self.bank.secret);
        self.disabled.insert(word.to_string());
        self.log.push(format!(">{word}"));
        self.log.push(format!("Likeness={score}/{}", self.config.word_length));

        let mut events = vec![PuzzleEvent::GuessScored {
            word: word.to_string(),
            likeness: score,
        }];

        if word == self.bank.secret {
            self.over = true;
            self.locked = false;
            self.log.push("ACCESS GRANTED".to_string());
            events.push(PuzzleEvent::AccessGranted);
        } else {
            self.remaining = self.remaining.saturating_sub(1);
            if self.remaining == 0 {
                self.over = true;
                self.locked = true;
                self.log.push("LOCKOUT ENGAGED".to_string());
                events.push(PuzzleEvent::TerminalLocked {
                    reason: LockReason::AttemptsExhausted,
                });
            }
        }
        events
    }

    /// Enforce the deadline. Idempotent once the session is over.
    pub fn tick(&mut self, now: Instant) -> Vec<PuzzleEvent> {
        if !self.started || self.over {
            return vec![];
        }
        let end = match self.timer_end {
            Some(end) => end,
            None => return vec![],
        };
        if now < end {
            return vec![];
        }
        self.over = true;
        self.locked = true;
        self.log.push("TIME EXPIRED. LOCKOUT ENGAGED".to_string());
        vec![PuzzleEvent::TerminalLocked {
            reason: LockReason::TimerExpired,
        }]
    }

    /// Redraw words, secret, and grid. Refused (one log line, nothing else)
    /// when locked out or when the reset quota is spent. The deadline and
    /// the reset counter survive the redraw.
    pub fn reset(&mut self) -> Vec<PuzzleEvent> {
        if self.locked {
            self.log.push("RESET DENIED. LOCKOUT ACTIVE".to_string());
            return vec![PuzzleEvent::ResetRefused {
                reason: RefuseReason::Lockout,
            }];
        }
        if let Some(max) = self.config.max_resets {
            if self.resets_used >= max {
                self.log.push("RESET DENIED. QUOTA SPENT".to_string());
                return vec![PuzzleEvent::ResetRefused {
                    reason: RefuseReason::QuotaSpent,
                }];
            }
        }

        let bank = match words::select_words(
            &self.dictionary,
            self.config.word_length,
            BANK_SIZE,
            &mut self.rng,
        ) {
            Ok(bank) => bank,
            Err(e) => {
                // Unreachable in practice: the same dictionary produced the
                // current bank. Refuse rather than corrupt the session.
                self.log.push(format!("RESET FAULT: {e}"));
                return vec![];
            }
        };
        self.grid =
            TerminalGrid::generate(&bank.words, &bank.secret, GRID_COLS, GRID_ROWS, &mut self.rng);
        self.bank = bank;

        if self.started {
            self.resets_used += 1;
        }
        self.remaining = self.config.attempts;
        self.disabled.clear();
        self.log.clear();
        self.over = false;
        self.locked = false;
        self.log.push("SYSTEM REINITIALIZED".to_string());
        vec![PuzzleEvent::ResetApplied]
    }

    // ── Queries ──

    /// Seconds until lockout, recomputed from the absolute deadline.
    pub fn countdown(&self, now: Instant) -> Option<u64> {
        self.timer_end
            .map(|end| end.saturating_duration_since(now).as_secs())
    }

    /// Resets still available, when a quota is configured.
    pub fn resets_left(&self) -> Option<u32> {
        self.config
            .max_resets
            .map(|max| max.saturating_sub(self.resets_used))
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn dict5() -> Vec<String> {
        [
            "vault", "steam", "pipes", "cargo", "alarm", "guard", "power",
            "relay", "siren", "crane", "track", "lever", "panel", "valve",
        ]
        .iter()
        .map(|w| w.to_string())
        .collect()
    }

    fn cfg(attempts: u32, timer_seconds: u64, max_resets: Option<u32>) -> SessionConfig {
        SessionConfig {
            word_length: 5,
            attempts,
            timer_seconds,
            max_resets,
        }
    }

    fn session(config: SessionConfig) -> Session {
        Session::new(config, dict5(), StdRng::seed_from_u64(42)).unwrap()
    }

    fn wrong_words(s: &Session) -> Vec<String> {
        s.bank
            .words
            .iter()
            .filter(|w| **w != s.bank.secret)
            .cloned()
            .collect()
    }

    #[test]
    fn no_words_of_length_fails_construction() {
        let err = Session::new(
            SessionConfig { word_length: 9, ..SessionConfig::default() },
            dict5(),
            StdRng::seed_from_u64(1),
        )
        .err()
        .unwrap();
        assert_eq!(err, SelectError::NoWords { length: 9 });
    }

    #[test]
    fn start_arms_timer_and_is_idempotent() {
        let mut s = session(cfg(3, 30, None));
        let t0 = Instant::now();
        assert_eq!(s.start(t0), vec![PuzzleEvent::Booted]);
        assert_eq!(s.timer_end, Some(t0 + Duration::from_secs(30)));

        // Second start: no event, deadline untouched.
        assert!(s.start(t0 + Duration::from_secs(5)).is_empty());
        assert_eq!(s.timer_end, Some(t0 + Duration::from_secs(30)));
    }

    #[test]
    fn no_timer_means_no_deadline() {
        let mut s = session(cfg(3, 0, None));
        s.start(Instant::now());
        assert_eq!(s.timer_end, None);
        assert!(s.tick(Instant::now() + Duration::from_secs(3600)).is_empty());
        assert!(!s.over);
    }

    #[test]
    fn guess_before_start_is_a_noop() {
        let mut s = session(cfg(3, 0, None));
        let word = s.bank.secret.clone();
        assert!(s.guess(&word).is_empty());
        assert!(!s.over);
        assert_eq!(s.remaining, 3);
    }

    #[test]
    fn guessing_the_secret_wins() {
        let mut s = session(cfg(3, 0, None));
        s.start(Instant::now());
        let secret = s.bank.secret.clone();
        let events = s.guess(&secret);
        assert!(events.contains(&PuzzleEvent::AccessGranted));
        assert!(s.over);
        assert!(!s.locked);

        // Terminal state: further guesses change nothing.
        let log_len = s.log.len();
        let other = wrong_words(&s).remove(0);
        assert!(s.guess(&other).is_empty());
        assert_eq!(s.log.len(), log_len);
    }

    #[test]
    fn exhausting_attempts_locks_out() {
        let mut s = session(cfg(3, 0, None));
        s.start(Instant::now());
        let wrong = wrong_words(&s);
        assert!(s.guess(&wrong[0]).len() == 1);
        assert!(s.guess(&wrong[1]).len() == 1);
        let events = s.guess(&wrong[2]);
        assert!(events.contains(&PuzzleEvent::TerminalLocked {
            reason: LockReason::AttemptsExhausted
        }));
        assert!(s.over);
        assert!(s.locked);
        assert_eq!(s.remaining, 0);
    }

    #[test]
    fn repeated_guess_spends_nothing() {
        let mut s = session(cfg(3, 0, None));
        s.start(Instant::now());
        let wrong = wrong_words(&s).remove(0);
        s.guess(&wrong);
        assert_eq!(s.remaining, 2);
        assert!(s.guess(&wrong).is_empty());
        assert_eq!(s.remaining, 2);
    }

    #[test]
    fn likeness_is_reported_against_the_secret() {
        let mut s = session(cfg(5, 0, None));
        s.start(Instant::now());
        let secret = s.bank.secret.clone();
        let wrong = wrong_words(&s).remove(0);
        let expected = words::likeness(&wrong, &secret);
        let events = s.guess(&wrong);
        assert_eq!(
            events[0],
            PuzzleEvent::GuessScored { word: wrong, likeness: expected }
        );
    }

    #[test]
    fn deadline_tick_locks_exactly_once() {
        let mut s = session(cfg(3, 1, None));
        let t0 = Instant::now();
        s.start(t0);
        assert!(s.tick(t0).is_empty());

        let late = t0 + Duration::from_secs(2);
        let events = s.tick(late);
        assert_eq!(
            events,
            vec![PuzzleEvent::TerminalLocked { reason: LockReason::TimerExpired }]
        );
        assert!(s.over && s.locked);

        // Idempotent: no events, no log growth.
        let log_len = s.log.len();
        assert!(s.tick(late + Duration::from_secs(1)).is_empty());
        assert_eq!(s.log.len(), log_len);
    }

    #[test]
    fn reset_redraws_and_preserves_the_deadline() {
        let mut s = session(cfg(3, 60, None));
        let t0 = Instant::now();
        s.start(t0);
        let deadline = s.timer_end;
        let wrong = wrong_words(&s).remove(0);
        s.guess(&wrong);
        assert_eq!(s.remaining, 2);

        let events = s.reset();
        assert_eq!(events, vec![PuzzleEvent::ResetApplied]);
        assert_eq!(s.remaining, 3);
        assert_eq!(s.resets_used, 1);
        assert!(s.disabled.is_empty());
        assert!(!s.over && !s.locked);
        assert_eq!(s.timer_end, deadline);
        assert!(s.bank.words.contains(&s.bank.secret));
    }

    #[test]
    fn reset_before_start_does_not_count_against_quota() {
        let mut s = session(cfg(3, 0, Some(1)));
        let events = s.reset();
        assert_eq!(events, vec![PuzzleEvent::ResetApplied]);
        assert_eq!(s.resets_used, 0);
        assert_eq!(s.resets_left(), Some(1));
    }

    #[test]
    fn reset_refused_while_locked() {
        let mut s = session(cfg(1, 0, None));
        s.start(Instant::now());
        let wrong = wrong_words(&s).remove(0);
        s.guess(&wrong);
        assert!(s.locked);

        let words_before = s.bank.words.clone();
        let secret_before = s.bank.secret.clone();
        let rows_before = s.grid.left.clone();
        let log_before = s.log.len();
        let events = s.reset();
        assert_eq!(
            events,
            vec![PuzzleEvent::ResetRefused { reason: RefuseReason::Lockout }]
        );
        assert_eq!(s.bank.words, words_before);
        assert_eq!(s.bank.secret, secret_before);
        assert_eq!(s.grid.left, rows_before);
        assert_eq!(s.remaining, 0);
        assert_eq!(s.log.len(), log_before + 1);
    }

    #[test]
    fn reset_refused_once_quota_is_spent() {
        let mut s = session(cfg(3, 0, Some(1)));
        s.start(Instant::now());
        assert_eq!(s.reset(), vec![PuzzleEvent::ResetApplied]);
        assert_eq!(s.resets_used, 1);

        let events = s.reset();
        assert_eq!(
            events,
            vec![PuzzleEvent::ResetRefused { reason: RefuseReason::QuotaSpent }]
        );
        assert_eq!(s.resets_used, 1);
    }

    #[test]
    fn end_to_end_three_misses() {
        // Full playthrough: five-letter words, three attempts, no timer.
        let mut s = session(cfg(3, 0, None));
        assert!(s.bank.words.len() <= 12);
        assert!(s.bank.words.iter().all(|w| w.chars().count() == 5));
        s.start(Instant::now());
        for w in wrong_words(&s).iter().take(3) {
            s.guess(w);
        }
        assert!(s.over && s.locked);
        assert_eq!(s.remaining, 0);
    }
}
