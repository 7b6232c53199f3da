//! OAuth2 credentials for the publishing account: persisted tokens,
//! the interactive consent flow, refresh on demand and in the background.

pub mod callback;
pub mod error;
pub mod flow;
pub mod oauth;
pub mod provider;
pub mod scheduler;
pub mod store;
pub mod tokens;

pub use error::AuthError;
pub use flow::{ConsentMode, InteractiveAuthenticator};
pub use oauth::{GoogleOAuth, TokenResponse};
pub use provider::{AuthPolicy, Authenticator, TokenProvider};
pub use scheduler::RefreshScheduler;
pub use store::CredentialStore;
pub use tokens::{Tokens, EXPIRY_SAFETY_WINDOW};
