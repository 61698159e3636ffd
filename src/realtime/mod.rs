//! Realtime connection and room management.
//!
//! A persistent bidirectional connection is anonymous until it explicitly
//! joins a room; membership is never inferred from authentication. All
//! membership is ephemeral: it lives only in the [`SessionRegistry`] for
//! the life of the connection and is rebuilt from scratch on reconnect.
//!
//! Delivery to room members is at-most-once per connection per event and
//! best-effort — this channel augments a UI; the notification log is the
//! durability boundary.

mod messages;
mod registry;
mod socket;

pub use messages::{ClientMessage, ServerMessage};
pub use registry::{ConnectionId, Room, SessionRegistry};
pub use socket::handle_socket;
