pub mod basic;
pub mod claims;
pub mod pipeline;
pub mod request;
pub mod signing;
pub mod verifier;

pub use basic::{BasicClient, ClientSecretValidator};
pub use pipeline::AuthPipeline;
pub use request::{HttpExchange, RequestAttributes};
pub use signing::SigningSource;
