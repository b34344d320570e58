//! Delivery of parking events to WebSocket viewers.
//!
//! The [`EventFanout`] subscribes to the event bus and pushes every event,
//! as a JSON text frame, to each connection in the viewer group.

pub mod fanout;

pub use fanout::EventFanout;
