pub mod cancel;
pub mod da_layer;
pub mod retriever;

pub use cancel::{CancelHandle, CancelToken};
pub use da_layer::DaLayerClient;
pub use retriever::{PollOutcome, ProofSource, RetryPolicy, RoundProofRetriever};
