//! Exploit decision engine and patch service for the place-and-break patch.
//!
//! Job plugins reward players for breaking and placing blocks. Placing a
//! block and breaking it again (or the reverse) would farm those rewards for
//! free. This crate decides whether such an action is an exploit, based on
//! the tags kept by `placebreak-store`.
//!
//! # Modules
//!
//! - [`clock`] -- Injected time source with a manual clock for tests.
//! - [`decision`] -- The pure exploit rule and its ephemeral window.
//! - [`restriction`] -- Material blacklist / whitelist.
//! - [`config`] -- Configuration loading from YAML into strongly-typed
//!   structs.
//! - [`service`] -- [`PatchService`], the put/remove/move/decide facade.
//! - [`dispatch`] -- Running service operations as spawned tasks.
//! - [`error`] -- The [`PatchError`] type.

pub mod clock;
pub mod config;
pub mod decision;
pub mod dispatch;
pub mod error;
pub mod restriction;
pub mod service;

pub use clock::{Clock, ClockError, ManualClock, SystemClock};
pub use config::{ConfigError, PatchConfig};
pub use decision::{DEFAULT_EPHEMERAL_WINDOW, ExploitDecider, Verdict};
pub use dispatch::{Dispatcher, PendingTask};
pub use error::PatchError;
pub use restriction::{RestrictedBlocks, RestrictionMode};
pub use service::PatchService;
