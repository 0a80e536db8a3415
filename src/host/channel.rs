/// Single-use completion correlation between a puzzle surface and the host.
///
/// The host mints a random token per session and keeps the receiving half;
/// the surface gets the sending half and fires it once, on the win
/// transition. The host accepts only a notice carrying its own token and
/// drops the subscription after the first match, so a stale or duplicated
/// notice can never unlock anything twice. Send failure is logged and
/// swallowed: the win is already recorded in the session and must survive
/// a vanished listener.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

/// The structured message a surface posts back to the host on success.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolvedNotice {
    /// Registered id of the package that ran the puzzle.
    pub package: String,
    /// Session correlation token issued by the host.
    pub token: u64,
    /// Name of the attached object the session was opened for.
    pub object: String,
}

pub struct CompletionSender {
    token: u64,
    tx: Sender<SolvedNotice>,
    spent: bool,
}

pub struct CompletionHandle {
    token: u64,
    rx: Option<Receiver<SolvedNotice>>,
}

pub fn completion_channel(token: u64) -> (CompletionSender, CompletionHandle) {
    let (tx, rx) = mpsc::channel();
    (
        CompletionSender { token, tx, spent: false },
        CompletionHandle { token, rx: Some(rx) },
    )
}

impl CompletionSender {
    /// Post the solved notice. Fire-and-forget: at most one notice per
    /// sender, and a missing listener is a warning, not an error.
    pub fn send(&mut self, package: &str, object: &str) {
        if self.spent {
            return;
        }
        self.spent = true;
        let notice = SolvedNotice {
            package: package.to_string(),
            token: self.token,
            object: object.to_string(),
        };
        if self.tx.send(notice).is_err() {
            eprintln!("warning: completion listener gone; win recorded locally only");
        }
    }
}

impl CompletionHandle {
    /// Non-blocking poll. The first notice with a matching token consumes
    /// the subscription; mismatched tokens are discarded.
    pub fn poll(&mut self) -> Option<SolvedNotice> {
        let rx = self.rx.take()?;
        loop {
            match rx.try_recv() {
                Ok(notice) if notice.token == self.token => return Some(notice),
                Ok(_) => continue,
                Err(TryRecvError::Empty) => {
                    self.rx = Some(rx);
                    return None;
                }
                Err(TryRecvError::Disconnected) => return None,
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
