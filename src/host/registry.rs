/// The puzzle-package registry: where independently authored puzzles plug
/// into the host.
///
/// A package is validated structurally at registration and addressed by id
/// afterwards. `open` is the only route from a user interaction to a live
/// puzzle: it checks the package is known and enabled, runs its one-time
/// `load` hook, then delegates. The registry is an owned value constructed
/// in `main` and passed by reference; there is no global lookup.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::Instant;

use rand::rngs::StdRng;

use crate::domain::grid::Column;
use crate::domain::words::SelectError;
use crate::host::channel::CompletionSender;
use crate::host::object::ObjectKind;
use crate::sim::event::PuzzleEvent;
use crate::sim::session::SessionConfig;

// ── Package contract ──

/// Everything a package needs to open one session.
pub struct OpenContext {
    pub object_name: String,
    pub object_kind: ObjectKind,
    pub settings: SessionConfig,
    pub dictionary: Vec<String>,
    pub completion: CompletionSender,
    pub rng: StdRng,
}

pub trait PuzzlePackage {
    fn id(&self) -> &str;
    fn title(&self) -> &str;

    /// One-time setup, run before the first `open`.
    fn load(&mut self) -> Result<(), OpenError> {
        Ok(())
    }

    fn open(&mut self, ctx: OpenContext) -> Result<Box<dyn PuzzleSurface>, OpenError>;
}

/// The protocol the host loop drives once a session is open, plus the
/// render contract: `view` returns everything the presentation layer
/// needs to redraw the puzzle after any transition.
pub trait PuzzleSurface {
    fn start(&mut self, now: Instant) -> Vec<PuzzleEvent>;
    fn guess(&mut self, word: &str) -> Vec<PuzzleEvent>;
    fn reset(&mut self) -> Vec<PuzzleEvent>;
    fn tick(&mut self, now: Instant) -> Vec<PuzzleEvent>;
    fn view(&self, now: Instant) -> SurfaceView;
}

/// Render snapshot: delimited grid rows, selectable targets, budgets,
/// countdown, transcript, and the terminal flags.
#[derive(Clone, Debug)]
pub struct SurfaceView {
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub targets: Vec<TargetView>,
    pub remaining: u32,
    pub attempts: u32,
    pub resets_left: Option<u32>,
    pub countdown: Option<u64>,
    pub log: Vec<String>,
    pub started: bool,
    pub over: bool,
    pub locked: bool,
}

#[derive(Clone, Debug)]
pub struct TargetView {
    pub word: String,
    pub column: Column,
    pub row: usize,
    pub start: usize,
    pub disabled: bool,
}

// ── Errors ──

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistrationError {
    EmptyId,
    /// Ids are lowercase slugs: ascii alphanumerics and '-'.
    InvalidId(String),
    EmptyTitle(String),
    Duplicate(String),
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationError::EmptyId => write!(f, "package id is empty"),
            RegistrationError::InvalidId(id) => {
                write!(f, "package id '{id}' is not a lowercase slug")
            }
            RegistrationError::EmptyTitle(id) => write!(f, "package '{id}' has an empty title"),
            RegistrationError::Duplicate(id) => write!(f, "package '{id}' is already registered"),
        }
    }
}

impl std::error::Error for RegistrationError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OpenError {
    UnknownPackage(String),
    PackageDisabled(String),
    /// The dictionary has nothing at the configured word length.
    NoWords { length: usize },
    Failed(String),
}

impl fmt::Display for OpenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpenError::UnknownPackage(id) => write!(f, "no puzzle package registered as '{id}'"),
            OpenError::PackageDisabled(id) => write!(f, "puzzle package '{id}' is disabled"),
            OpenError::NoWords { length } => {
                write!(f, "no dictionary entries of length {length}")
            }
            OpenError::Failed(msg) => write!(f, "puzzle failed to open: {msg}"),
        }
    }
}

impl std::error::Error for OpenError {}

impl From<SelectError> for OpenError {
    fn from(e: SelectError) -> OpenError {
        match e {
            SelectError::NoWords { length } => OpenError::NoWords { length },
        }
    }
}

// ── Registry ──

struct PackageSlot {
    pkg: Box<dyn PuzzlePackage>,
    loaded: bool,
}

pub struct Registry {
    packages: Vec<PackageSlot>,
    enabled: HashSet<String>,
    defaults: HashMap<ObjectKind, String>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry {
            packages: Vec::new(),
            enabled: HashSet::new(),
            defaults: HashMap::new(),
        }
    }

    /// Validate and admit a package. Newly registered packages start
    /// enabled; settings may disable them afterwards.
    pub fn register(&mut self, pkg: Box<dyn PuzzlePackage>) -> Result<(), RegistrationError> {
        let id = pkg.id().to_string();
        if id.is_empty() {
            return Err(RegistrationError::EmptyId);
        }
        if !id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(RegistrationError::InvalidId(id));
        }
        if pkg.title().is_empty() {
            return Err(RegistrationError::EmptyTitle(id));
        }
        if self.packages.iter().any(|slot| slot.pkg.id() == id) {
            return Err(RegistrationError::Duplicate(id));
        }
        self.enabled.insert(id);
        self.packages.push(PackageSlot { pkg, loaded: false });
        Ok(())
    }

    pub fn set_enabled(&mut self, id: &str, on: bool) {
        if on {
            self.enabled.insert(id.to_string());
        } else {
            self.enabled.remove(id);
        }
    }

    pub fn is_enabled(&self, id: &str) -> bool {
        self.enabled.contains(id)
    }

    /// Sync the enabled set with the settings list: only registered
    /// packages named there stay enabled.
    pub fn apply_enabled_list(&mut self, ids: &[String]) {
        self.enabled = self
            .packages
            .iter()
            .map(|slot| slot.pkg.id().to_string())
            .filter(|id| ids.iter().any(|want| want == id))
            .collect();
    }

    /// Default package for an object kind, used when the object carries
    /// no explicit type flag.
    pub fn set_default(&mut self, kind: ObjectKind, id: &str) {
        self.defaults.insert(kind, id.to_string());
    }

    /// Resolve an object's type flag to a package id.
    pub fn resolve(&self, kind: ObjectKind, type_flag: &str) -> Option<String> {
        if !type_flag.is_empty() {
            return Some(type_flag.to_string());
        }
        self.defaults.get(&kind).cloned()
    }

    pub fn title_of(&self, id: &str) -> Option<&str> {
        self.packages
            .iter()
            .find(|slot| slot.pkg.id() == id)
            .map(|slot| slot.pkg.title())
    }

    /// Route an interaction to the governing package: known, enabled,
    /// loaded (once), then opened.
    pub fn open(
        &mut self,
        id: &str,
        ctx: OpenContext,
    ) -> Result<Box<dyn PuzzleSurface>, OpenError> {
        let slot = self
            .packages
            .iter_mut()
            .find(|slot| slot.pkg.id() == id)
            .ok_or_else(|| OpenError::UnknownPackage(id.to_string()))?;
        if !self.enabled.contains(id) {
            return Err(OpenError::PackageDisabled(id.to_string()));
        }
        if !slot.loaded {
            slot.pkg.load()?;
            slot.loaded = true;
        }
        slot.pkg.open(ctx)
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use rand::SeedableRng;

    use crate::host::channel::completion_channel;

    struct NullSurface;

    impl PuzzleSurface for NullSurface {
        fn start(&mut self, _now: Instant) -> Vec<PuzzleEvent> {
            vec![]
        }
        fn guess(&mut self, _word: &str) -> Vec<PuzzleEvent> {
            vec![]
        }
        fn reset(&mut self) -> Vec<PuzzleEvent> {
            vec![]
        }
        fn tick(&mut self, _now: Instant) -> Vec<PuzzleEvent> {
            vec![]
        }
        fn view(&self, _now: Instant) -> SurfaceView {
            SurfaceView {
                left: vec![],
                right: vec![],
                targets: vec![],
                remaining: 0,
                attempts: 0,
                resets_left: None,
                countdown: None,
                log: vec![],
                started: false,
                over: false,
                locked: false,
            }
        }
    }

    /// Records the order of load/open calls into a shared trace.
    struct Probe {
        id: &'static str,
        title: &'static str,
        trace: Rc<RefCell<Vec<&'static str>>>,
    }

    impl PuzzlePackage for Probe {
        fn id(&self) -> &str {
            self.id
        }
        fn title(&self) -> &str {
            self.title
        }
        fn load(&mut self) -> Result<(), OpenError> {
            self.trace.borrow_mut().push("load");
            Ok(())
        }
        fn open(&mut self, _ctx: OpenContext) -> Result<Box<dyn PuzzleSurface>, OpenError> {
            self.trace.borrow_mut().push("open");
            Ok(Box::new(NullSurface))
        }
    }

    fn probe(id: &'static str, trace: &Rc<RefCell<Vec<&'static str>>>) -> Box<Probe> {
        Box::new(Probe { id, title: "Probe", trace: Rc::clone(trace) })
    }

    fn ctx() -> OpenContext {
        let (tx, _rx) = completion_channel(1);
        OpenContext {
            object_name: "Door".to_string(),
            object_kind: ObjectKind::Door,
            settings: SessionConfig::default(),
            dictionary: vec![],
            completion: tx,
            rng: StdRng::seed_from_u64(0),
        }
    }

    #[test]
    fn registration_validates_structure() {
        let trace = Rc::new(RefCell::new(vec![]));
        let mut reg = Registry::new();

        let bad = Box::new(Probe { id: "", title: "X", trace: Rc::clone(&trace) });
        assert_eq!(reg.register(bad).unwrap_err(), RegistrationError::EmptyId);

        let bad = Box::new(Probe { id: "Hack Term", title: "X", trace: Rc::clone(&trace) });
        assert_eq!(
            reg.register(bad).unwrap_err(),
            RegistrationError::InvalidId("Hack Term".to_string())
        );

        let bad = Box::new(Probe { id: "hackterm", title: "", trace: Rc::clone(&trace) });
        assert_eq!(
            reg.register(bad).unwrap_err(),
            RegistrationError::EmptyTitle("hackterm".to_string())
        );

        assert!(reg.register(probe("hackterm", &trace)).is_ok());
        assert_eq!(
            reg.register(probe("hackterm", &trace)).unwrap_err(),
            RegistrationError::Duplicate("hackterm".to_string())
        );
    }

    #[test]
    fn open_requires_known_and_enabled() {
        let trace = Rc::new(RefCell::new(vec![]));
        let mut reg = Registry::new();
        reg.register(probe("hackterm", &trace)).unwrap();

        assert_eq!(
            reg.open("wires", ctx()).err().unwrap(),
            OpenError::UnknownPackage("wires".to_string())
        );

        reg.set_enabled("hackterm", false);
        assert_eq!(
            reg.open("hackterm", ctx()).err().unwrap(),
            OpenError::PackageDisabled("hackterm".to_string())
        );

        reg.set_enabled("hackterm", true);
        assert!(reg.open("hackterm", ctx()).is_ok());
    }

    #[test]
    fn load_runs_once_before_first_open() {
        let trace = Rc::new(RefCell::new(vec![]));
        let mut reg = Registry::new();
        reg.register(probe("hackterm", &trace)).unwrap();

        reg.open("hackterm", ctx()).unwrap();
        reg.open("hackterm", ctx()).unwrap();
        assert_eq!(*trace.borrow(), vec!["load", "open", "open"]);
    }

    #[test]
    fn enabled_list_is_authoritative() {
        let trace = Rc::new(RefCell::new(vec![]));
        let mut reg = Registry::new();
        reg.register(probe("hackterm", &trace)).unwrap();
        reg.register(probe("wires", &trace)).unwrap();

        reg.apply_enabled_list(&["hackterm".to_string(), "ghost".to_string()]);
        assert!(reg.is_enabled("hackterm"));
        assert!(!reg.is_enabled("wires"));
        // Unregistered ids in the list are ignored.
        assert!(!reg.is_enabled("ghost"));
    }

    #[test]
    fn resolve_prefers_the_explicit_flag() {
        let trace = Rc::new(RefCell::new(vec![]));
        let mut reg = Registry::new();
        reg.register(probe("hackterm", &trace)).unwrap();
        reg.set_default(ObjectKind::Door, "hackterm");

        assert_eq!(reg.resolve(ObjectKind::Door, ""), Some("hackterm".to_string()));
        assert_eq!(reg.resolve(ObjectKind::Door, "wires"), Some("wires".to_string()));
        assert_eq!(reg.resolve(ObjectKind::Actor, ""), None);
    }
}
