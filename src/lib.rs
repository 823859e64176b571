//! Serpent Arena Server Library
//!
//! Authoritative simulation core for a massively-multiplayer worm arena:
//! a fixed-rate tick loop over path-based worm trails, a cell-hash spatial
//! index for collision at scale, a food economy with death-to-loot
//! conversion, a validated input pipeline, and a per-client delta
//! broadcaster with interest management.
//!
//! The transport layer (sockets, framing, sessions) is an external
//! collaborator: it submits raw input payloads through [`room::room::RoomHandle`]
//! and receives [`net::protocol::ServerEvent`]s on per-client sinks.

pub mod config;
pub mod game;
pub mod net;
pub mod room;
pub mod util;
