//! Indexing: page persistence and run lifecycle management

mod session;
mod writer;

pub use session::{IndexingSession, SessionError};
pub use writer::write_page;
