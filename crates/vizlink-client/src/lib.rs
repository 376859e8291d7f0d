//! Vizlink Client - the synchronization state machine
//!
//! One explicitly constructed, explicitly owned client drives the protocol:
//! the host calls [`SyncClient::tick`] once per frame with a [`StepBudget`],
//! and the machine walks through initialization, steady-state updates, and
//! configuration-change recovery, mutating the scene model and mirroring the
//! changes into the renderer collaborator.

pub mod budget;
pub mod client;

pub use budget::StepBudget;
pub use client::{ClientState, SyncClient};
