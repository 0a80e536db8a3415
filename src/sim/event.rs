/// Events emitted by session transitions.
/// The presentation layer consumes these for overlays, cues, and sound.

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PuzzleEvent {
    /// The session left idle: timer armed, boot lines logged.
    Booted,
    GuessScored { word: String, likeness: usize },
    /// The secret was guessed. Fired once per session.
    AccessGranted,
    TerminalLocked { reason: LockReason },
    ResetApplied,
    ResetRefused { reason: RefuseReason },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockReason {
    AttemptsExhausted,
    TimerExpired,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefuseReason {
    /// A locked-out terminal cannot self-reset.
    Lockout,
    QuotaSpent,
}
