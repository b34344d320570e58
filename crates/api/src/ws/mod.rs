//! WebSocket infrastructure for live lot updates.
//!
//! Every open connection is a member of the single viewer group
//! ([`WsManager`]) that receives all parking events. Joining queues a
//! status snapshot first; a heartbeat keeps the group free of dead viewers.

mod handler;
pub mod manager;

pub use handler::{join_viewer, ws_handler};
pub use manager::{WsManager, HEARTBEAT_INTERVAL};
