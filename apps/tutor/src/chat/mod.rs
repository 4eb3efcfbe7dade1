// Chat session: transcript model, JSON persistence, session controller,
// paced reveal, and the HTTP handlers over them.

pub mod handlers;
pub mod models;
pub mod pacing;
pub mod session;
pub mod store;

pub use models::{Role, Transcript, Turn};
pub use session::{SessionController, SessionEvent};
pub use store::HistoryStore;
