//! # Execution units ("branches").
//!
//! A [`Branch`] is a uniform handle over one concurrently running activity.
//! Three independent implementations satisfy the same contract:
//!
//! | Variant              | Runs                                             | `terminate`                       |
//! |----------------------|--------------------------------------------------|-----------------------------------|
//! | [`ThreadBranch`]     | a blocking closure on the runtime's thread pool  | bounded wait only (cannot force)  |
//! | [`ProcessBranch`]    | a named entry point of the current executable    | kill + reap; killed on drop       |
//! | [`SubprocessBranch`] | an arbitrary external program                    | kill + reap; survives drop        |
//!
//! ## Lifecycle
//! ```text
//! Unstarted ──start()──► Running ──(exit | join | terminate)──► Terminated
//!     │                                 │
//!     └─ join/terminate: no-op          └─ start(): BranchError::AlreadyStarted
//! ```

mod child;
mod process;
mod subprocess;
mod thread;
mod unit;

pub use process::{current_entry, ProcessBranch, ENTRY_ENV};
pub use subprocess::SubprocessBranch;
pub use thread::{ThreadBranch, THREAD_TERMINATE_WAIT};
pub use unit::{Branch, BranchBox};
