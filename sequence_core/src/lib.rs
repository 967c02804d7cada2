//! # Sequence Core
//!
//! Authoritative engine for a networked implementation of the card-and-
//! board game Sequence. The library owns the canonical state of all
//! sessions, rooms, and games, validates every move, drives artificial
//! opponents when a room is short of humans, and fans every state change
//! out to the interested subset of clients.
//!
//! ## Architecture
//!
//! - [`game`]: card primitives, the three board plates, the seeded deck
//!   engine, and the sequence detector
//! - [`ai`]: greedy move policies at three difficulty levels
//! - [`store`]: entity records and the in-memory registry that owns them
//! - [`hub`]: the coordination engine (sessions, rooms, games, rematch
//!   voting, scheduled tasks) behind one coarse lock
//! - [`fanout`]: per-player duplex channels with heartbeat and reconnect
//!   semantics
//! - [`events`]: the tagged union of outbound channel events
//!
//! The transport lives in the server crate; everything here is expressed
//! in terms of typed requests in and typed events out.

pub mod ai;
pub mod errors;
pub mod events;
pub mod fanout;
pub mod game;
pub mod hub;
pub mod store;

pub use errors::{ServerError, ServerResult};
pub use hub::{Hub, HubConfig, HubStats};
pub use hub::sessions::AuthedSession;
