//! Authorization-code flow as explicit state transitions
//!
//! ```text
//! START -> REDIRECTED                      (login request)
//! START -> CALLBACK_RECEIVED -> EXCHANGED  (callback request)
//!                   |               |
//!                   +---> FAILED <--+
//! ```
//!
//! Each request owns a fresh flow value; nothing survives between the login
//! and callback requests except what the browser carries. Transitions consume
//! the previous state, so a code cannot be exchanged twice and a credential
//! cannot be handed off twice.

use oauth2::AuthorizationCode;
use serde::Deserialize;
use url::Url;

use super::exchanger::{AccessCredential, CredentialExchanger, ExchangeError};
use super::helpers::build_client_redirect_url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStage {
    Start,
    Redirected,
    CallbackReceived,
    Exchanged,
    Failed,
}

/// Query parameters the identity provider sends to the callback route
#[derive(Deserialize, Default)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// A freshly started flow
#[derive(Debug, Default)]
pub struct Start;

/// The browser is being sent to the provider's authorize URL
#[derive(Debug)]
pub struct Redirected {
    authorize_url: Url,
}

/// The provider called back with an authorization code
pub struct CallbackReceived {
    code: AuthorizationCode,
}

/// A credential was obtained and is waiting to be handed to the browser
#[derive(Debug)]
pub struct Exchanged {
    credential: AccessCredential,
}

impl Start {
    pub fn new() -> Self {
        Start
    }

    pub fn stage(&self) -> FlowStage {
        FlowStage::Start
    }

    pub fn redirect(self, exchanger: &CredentialExchanger) -> Redirected {
        Redirected {
            authorize_url: exchanger.build_authorization_redirect(),
        }
    }

    /// Accept the provider's callback
    ///
    /// A provider-reported error or a missing code fails the flow without any
    /// network call.
    pub fn receive_callback(self, params: CallbackParams) -> Result<CallbackReceived, ExchangeError> {
        if let Some(error) = params.error {
            return Err(ExchangeError::Denied {
                error,
                description: params.error_description,
            });
        }

        match params.code.filter(|c| !c.trim().is_empty()) {
            Some(code) => Ok(CallbackReceived {
                code: AuthorizationCode::new(code),
            }),
            None => Err(ExchangeError::MissingCode),
        }
    }
}

impl Redirected {
    pub fn stage(&self) -> FlowStage {
        FlowStage::Redirected
    }

    pub fn authorize_url(&self) -> &Url {
        &self.authorize_url
    }
}

impl CallbackReceived {
    pub fn stage(&self) -> FlowStage {
        FlowStage::CallbackReceived
    }

    pub fn code_length(&self) -> usize {
        self.code.secret().len()
    }

    pub async fn exchange(
        self,
        exchanger: &CredentialExchanger,
    ) -> Result<Exchanged, ExchangeError> {
        let credential = exchanger
            .exchange_code(self.code, exchanger.redirect_uri())
            .await?;
        Ok(Exchanged { credential })
    }
}

impl Exchanged {
    pub fn stage(&self) -> FlowStage {
        FlowStage::Exchanged
    }

    pub fn scopes(&self) -> &[String] {
        self.credential.scopes()
    }

    /// Hand the credential to the browser, giving up the gateway's copy
    pub fn hand_off(self, client_app_url: &Url) -> Url {
        build_client_redirect_url(client_app_url, self.credential.secret())
    }
}
