pub mod error;
pub mod session;
pub mod sim;

pub use error::Result;
pub use error::TransportError;
pub use session::SessionEvent;
pub use session::Transport;
pub use sim::SimConfig;
pub use sim::SimTransport;
