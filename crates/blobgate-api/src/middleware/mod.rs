pub mod sign_cors;

pub use sign_cors::{sign_cors_middleware, SignCorsConfig};
