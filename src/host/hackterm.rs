/// The terminal-hacking puzzle package.
///
/// Thin adapter between the host contracts and the pure session state
/// machine: `open` draws a session from the dictionary, and the surface
/// owns the win side of the completion protocol, posting exactly one
/// solved notice when the access code is guessed.

use std::time::Instant;

use crate::host::channel::CompletionSender;
use crate::host::registry::{
    OpenContext, OpenError, PuzzlePackage, PuzzleSurface, SurfaceView, TargetView,
};
use crate::sim::event::PuzzleEvent;
use crate::sim::session::Session;

pub const PACKAGE_ID: &str = "hackterm";

pub struct HackTermPackage;

impl PuzzlePackage for HackTermPackage {
    fn id(&self) -> &str {
        PACKAGE_ID
    }

    fn title(&self) -> &str {
        "Breach Terminal"
    }

    fn open(&mut self, ctx: OpenContext) -> Result<Box<dyn PuzzleSurface>, OpenError> {
        let session = Session::new(ctx.settings, ctx.dictionary, ctx.rng)?;
        Ok(Box::new(HackTermSurface {
            session,
            completion: ctx.completion,
            object: ctx.object_name,
        }))
    }
}

struct HackTermSurface {
    session: Session,
    completion: CompletionSender,
    object: String,
}

impl HackTermSurface {
    /// Forward the win to the host. The sender is single-shot, so a
    /// session can never notify twice even across odd event orders.
    fn relay_completion(&mut self, events: &[PuzzleEvent]) {
        if events.iter().any(|e| matches!(e, PuzzleEvent::AccessGranted)) {
            self.completion.send(PACKAGE_ID, &self.object);
        }
    }
}

impl PuzzleSurface for HackTermSurface {
    fn start(&mut self, now: Instant) -> Vec<PuzzleEvent> {
        self.session.start(now)
    }

    fn guess(&mut self, word: &str) -> Vec<PuzzleEvent> {
        let events = self.session.guess(word);
        self.relay_completion(&events);
        events
    }

    fn reset(&mut self) -> Vec<PuzzleEvent> {
        self.session.reset()
    }

    fn tick(&mut self, now: Instant) -> Vec<PuzzleEvent> {
        self.session.tick(now)
    }

    fn view(&self, now: Instant) -> SurfaceView {
        let s = &self.session;
        SurfaceView {
            left: s.grid.left.clone(),
            right: s.grid.right.clone(),
            targets: s
                .grid
                .targets()
                .iter()
                .map(|p| TargetView {
                    word: p.word.clone(),
                    column: p.column,
                    row: p.row,
                    start: p.start,
                    disabled: s.disabled.contains(&p.word),
                })
                .collect(),
            remaining: s.remaining,
            attempts: s.config.attempts,
            resets_left: s.resets_left(),
            countdown: s.countdown(now),
            log: s.log.clone(),
            started: s.started,
            over: s.over,
            locked: s.locked,
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
