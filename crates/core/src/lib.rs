//! Cross-session eventual-consistency verification engine.
//!
//! `vouch` drives a set of concurrent, independently-authenticated
//! browser sessions against a web application and verifies that state
//! changes made by one actor become visible, in the expected form, to
//! other actors within a bounded polling budget.
//!
//! The moving parts, leaves first:
//!
//! - [`session::Session`]: one actor, owning an isolated authenticated
//!   browser context with navigate/act/observe primitives and a
//!   per-session operation sequence log.
//! - [`action`]: declarative single-shot actions (login, form submit),
//!   executed once, never retried.
//! - [`poll`]: the fixed-interval retry engine turning an observation
//!   function and a predicate into a structured [`poll::PollOutcome`].
//! - [`verify`]: composes a trigger action with concurrent per-target
//!   polls into an all-or-nothing, per-target-diagnosable verdict.
//! - [`evidence`]: best-effort failure artifacts (screenshots, console
//!   tails).
//! - [`scenario`]: owns sessions for one test case, applies the
//!   scenario timeout, and renders the report the runner consumes.
//!
//! The underlying page automation is the [`page::PageDriver`] capability;
//! production uses the DevTools-backed [`page::CdpPage`], tests the
//! scripted [`testing::FakePage`].

pub mod action;
pub mod browser;
pub mod config;
pub mod error;
pub mod evidence;
pub mod observe;
pub mod page;
pub mod poll;
pub mod scenario;
pub mod seed;
pub mod session;
pub mod testing;
pub mod verify;

pub use action::{ActionResult, ActionSpec, FieldInput, FieldValue};
pub use browser::Browser;
pub use config::{Credentials, HarnessConfig, Routes, Selectors, TimeoutBudget};
pub use error::{Result, VouchError};
pub use evidence::{EvidenceCollector, EvidenceRef};
pub use observe::{NotificationEntry, Observation, ObservationSpec};
pub use page::{CdpPage, ConsoleEntry, PageDriver};
pub use poll::{PollBudget, PollOutcome, poll};
pub use scenario::{
	DEFAULT_SCENARIO_TIMEOUT, Scenario, ScenarioReport, ScenarioStatus, VerificationRecord,
};
pub use seed::{SeedClient, unique_email, unique_name};
pub use session::{Session, SessionIdentity};
pub use verify::{TargetExpectation, TargetReport, TargetStatus, VerificationResult, verify_effect};
