//! Single-actor command loop and its JSON boundary protocol.
//!
//! One [`IndexWorker`] task owns the [`SemanticIndex`](crate::index::SemanticIndex)
//! and processes commands strictly in submission order from a bounded
//! channel. [`IndexHandle`] is the cheap, cloneable front end: typed methods
//! for in-process callers and [`IndexHandle::submit`] for boundary
//! [`Command`]s, whose outcomes are emitted as [`Event`]s.
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌──────────────────┐
//! │  IndexHandle(s) │────▶│  mpsc (bounded) │────▶│  IndexWorker     │
//! │  typed / submit │     │  FIFO           │     │  owns index      │
//! └─────────────────┘     └─────────────────┘     └──────────────────┘
//!          ▲                                              │
//!          └──────── oneshot replies / Event sink ◀───────┘
//! ```

mod actor;
mod protocol;

pub use actor::{IndexHandle, IndexWorker};
pub use protocol::{decode_command, encode_event, Command, Event, ProtocolError};
