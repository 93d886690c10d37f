//! Authentication module
//!
//! OAuth2 authorization-code login against a single identity provider.
//!
//! ## Structure
//!
//! - `exchanger`: token endpoint client and the exchange error taxonomy
//! - `flow`: per-request state transitions of the login dance
//! - `helpers`: pure URL builders and secret scrubbing
//! - `handlers`: HTTP handlers for the login redirect and the callback
//! - `extractors`: bearer credential extractor for proxied routes
//!
//! ## Authentication Flow
//!
//! 1. Browser visits `/auth/provider` → 302 to the provider's authorize URL
//! 2. Provider authenticates → 302 to `/auth/provider/callback?code=...`
//! 3. Gateway exchanges the code → 302 to the client app with `?access_token=...`
//! 4. Browser calls `/api/...` presenting the credential
//!
//! The gateway keeps no copy of the credential after step 3.

pub mod exchanger;
pub mod extractors;
pub mod flow;
pub mod handlers;
pub mod helpers;

pub use exchanger::{AccessCredential, CredentialExchanger, ExchangeError, IDENTITY_PROVIDER};
pub use extractors::BearerCredential;
pub use flow::{CallbackParams, FlowStage};
pub use handlers::{callback_handler, login_handler};
