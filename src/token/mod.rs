mod provider;

pub use provider::{Credential, TokenError, TokenProvider};
