pub mod attestation;
pub mod errors;
pub mod layout;
pub mod request;
pub mod wire;

pub use attestation::*;
pub use errors::*;
pub use layout::*;
pub use request::*;
pub use wire::*;
