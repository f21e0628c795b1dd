//! Control-center events: types and broadcast bus.
//!
//! - [`EventKind`], [`Event`]: classification and metadata
//! - [`Bus`]: thin wrapper over `tokio::sync::broadcast`
//!
//! The [`ControlCenter`](crate::ControlCenter) is the only publisher apart from
//! the subscriber workers (overflow/panic). Its listener task fans events out to
//! the configured [`SubscriberSet`](crate::SubscriberSet).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
