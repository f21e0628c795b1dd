//! # Event subscribers.
//!
//! ```text
//! ControlCenter ── publish ──► Bus ──► listener ──► SubscriberSet
//!                                                     ├──► LogWriter (tracing)
//!                                                     └──► custom Subscribe impls
//! ```
//!
//! [`LogWriter`] is installed by default; anything passed to
//! [`CenterBuilder::with_subscribers`](crate::CenterBuilder::with_subscribers)
//! runs next to it.

mod log;
mod subscribe;
mod subscriber_set;

pub use log::LogWriter;
pub use subscribe::Subscribe;
pub use subscriber_set::SubscriberSet;
