//! Request and response bodies of the HTTP API

pub mod lookup;
pub mod monitor;

pub use lookup::*;
pub use monitor::*;
