pub mod protocol;
pub mod registry;
pub mod server;

pub use protocol::{ClientRequest, ServerMessage};
pub use registry::{BroadcastSummary, ClientId, SubscriberRegistry};
pub use server::{RelayServer, RelaySettings};
