pub mod codec;
pub mod decoder;
pub mod verifier;

pub use codec::RequestCodec;
pub use decoder::ProofDecoder;
pub use verifier::{RequestEncoder, VerifierClient};
