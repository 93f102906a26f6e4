//! `audiotally` - total duration of copied Cubase/Nuendo clips
//!
//! This library provides the core functionality for watching the system
//! clipboard for the XML clip-list format a DAW "copy" action produces,
//! extracting sample-accurate region boundaries and reporting aggregate
//! duration at a project sample rate.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod aggregate;
pub mod cli;
pub mod clip;
pub mod config;
pub mod error;
pub mod logging;
pub mod parser;
pub mod session;
pub mod status;
pub mod watcher;

pub use aggregate::{aggregate, samples_to_time, AggregateResult};
pub use clip::{ClipRecord, ClipboardReader, ClipboardSnapshot};
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use parser::{ClipParser, ParseError, ParsedClips};
pub use session::{calculate_once, Session, SessionHandle, SessionUpdate};
pub use status::{StatusMachine, StatusState};
pub use watcher::{ClipboardWatcher, PollOutcome};
