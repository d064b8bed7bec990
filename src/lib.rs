//! Local-first habit tracking: recurrence rules, completion logs, and streaks.
//!
//! Cadence keeps a collection of habits, each with a recurrence rule (daily,
//! weekly, or a set of weekdays) and a log of completion timestamps. Current
//! and best streaks are derived from the log and the rule, never edited
//! directly, and are recomputed on every mutation and when the local day
//! rolls over.
//!
//! | Frequency | Due on | Next due after a day |
//! |-----------|--------|----------------------|
//! | **Daily** | every day | the following day |
//! | **Weekly** | every day | the next Sunday |
//! | **Custom** | the listed weekdays | the next listed weekday |
//!
//! # Architecture
//!
//! - **Storage**: SQLite cache of the full collection, rewritten after every mutation
//! - **Sync**: optional HTTP remote; mutations apply locally first and are pushed
//!   in the background, failures are logged and never roll back local state
//! - **Time**: every calendar decision is made in local time through an
//!   injectable [`habit::calendar::Clock`]
//!
//! # Modules
//!
//! - [`config`] - Configuration loading from TOML files and environment variables
//! - [`db`] - SQLite cache initialization, schema, migrations, and health checks
//! - [`error`] - Error type returned by engine operations
//! - [`habit`] - Core engine: recurrence, completion log, streaks, tracker, analytics
//! - [`sync`] - Background remote pushes, session handling, and day-rollover watching

pub mod config;
pub mod db;
pub mod error;
pub mod habit;
pub mod sync;
