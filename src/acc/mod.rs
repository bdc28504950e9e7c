use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::{Error, Result};

mod key;

pub use self::key::{AccountKey, KeyType};

/// Account with an ACME provider.
///
/// Accounts consist of a contact email address, a private key for signing requests to the ACME
/// API and, once registered, the registration record handed out by the CA.
///
/// Accounts are throwaway: every issuance and renewal generates a new key and registers again.
/// Nothing about the account is persisted.
#[derive(Debug, Clone)]
pub struct Account {
    email: String,
    key: AccountKey,
    registration: Option<Registration>,
}

impl Account {
    /// Creates an unregistered account for `email` with a freshly generated key.
    pub fn generate(email: &str, key_type: KeyType) -> Result<Account> {
        let key = AccountKey::generate(key_type).map_err(Error::KeyGeneration)?;

        Ok(Account {
            email: email.to_owned(),
            key,
            registration: None,
        })
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Contact URIs to submit with the registration, i.e. `mailto:<email>`.
    pub fn contact(&self) -> Vec<String> {
        vec![format!("mailto:{}", self.email)]
    }

    pub fn key(&self) -> &AccountKey {
        &self.key
    }

    /// Private key for this account in PEM format.
    pub fn private_key_pem(&self) -> eyre::Result<Zeroizing<String>> {
        self.key.to_pem()
    }

    /// The registration record, set once the CA accepted the account.
    pub fn registration(&self) -> Option<&Registration> {
        self.registration.as_ref()
    }

    pub(crate) fn set_registration(&mut self, registration: Registration) {
        self.registration = Some(registration);
    }
}

/// Registration record returned by the CA for a new account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    /// Account URL at the CA.
    pub uri: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default)]
    pub contact: Vec<String>,

    /// URL of the subscriber agreement in effect when the account was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms_of_service: Option<String>,
}
