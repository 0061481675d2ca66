//! Top-level facade crate for otsock.
//!
//! Re-exports the protocol core and the client runtime so users can depend on a single crate.

pub mod core {
    pub use otsock_core::*;
}

pub mod client {
    pub use otsock_client::*;
}
