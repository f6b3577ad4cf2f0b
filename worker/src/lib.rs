//! Server side of kvsweep: persistence of game records in a key-value store and
//! the session service that applies player moves to them.

pub use clock::*;
pub use config::*;
pub use error::*;
pub use kv::*;
pub use record::*;
pub use session::*;
pub use store::*;

mod clock;
mod config;
mod error;
mod kv;
mod record;
mod session;
mod store;
