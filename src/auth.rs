//! Identity and credential data types shared by verification, exchange, and sync.

pub mod credentials;
pub mod id;
pub mod identity;
pub mod token;

pub use credentials::*;
pub use id::*;
pub use identity::*;
pub use token::{access::*, secret::*};
