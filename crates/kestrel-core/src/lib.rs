//! # Kestrel Core
//!
//! Foundation types shared by every kestrel crate:
//!
//! - [`Message`]: a parsed chat protocol line (tags, command, channel, text, user)
//! - [`Clock`]: the time source used by all expiry arithmetic
//! - [`RateCounter`]: sliding-window accumulate-and-expire counter
//! - [`Cooldown`]: single-permit time gate with a settle gap
//! - [`TtlCache`]: key/value store with lazy expiry and amortized cleanup
//! - [`parse_duration`]: human-readable durations used throughout configuration
//!
//! The time-based primitives guard their state with a mutex owned by the
//! instance, so they can be shared freely behind an `Arc`.

pub mod cache;
pub mod clock;
pub mod cooldown;
pub mod duration;
pub mod limit;
pub mod message;

pub use cache::TtlCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use cooldown::Cooldown;
pub use duration::{DurationError, format_duration, parse_duration};
pub use limit::RateCounter;
pub use message::{HOST_NAME, Message, kind, tag};
