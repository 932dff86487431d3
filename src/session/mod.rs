pub mod connection;
pub mod context;
pub mod events;
pub mod phase;
pub mod state;

pub use connection::{ConnectionSession, SessionSettings};
pub use context::SessionContext;
pub use events::SessionEvent;
pub use phase::SessionPhase;
pub use state::{SessionSnapshot, SessionState};
