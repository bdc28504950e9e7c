//! Boundary to the ACME client that talks to the certificate authority.
//!
//! The wire protocol (JWS signing, nonces, order polling and the challenge responders) is not
//! implemented here. Anything able to perform the steps below against a CA can drive
//! [`CertManager`](crate::CertManager), including in-memory fakes for tests.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{
    acc::{Account, KeyType, Registration},
    cert::CertificateResource,
    error::DomainFailures,
};

/// Challenge types a CA may offer to prove control over a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChallengeType {
    /// Token served over plain HTTP under `/.well-known/acme-challenge/`.
    #[serde(rename = "http-01")]
    Http01,

    /// Self-signed certificate served with the `acme-tls/1` ALPN protocol.
    #[serde(rename = "tls-alpn-01")]
    TlsAlpn01,

    /// `TXT` record under `_acme-challenge.<domain>`.
    #[serde(rename = "dns-01")]
    Dns01,
}

impl ChallengeType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChallengeType::Http01 => "http-01",
            ChallengeType::TlsAlpn01 => "tls-alpn-01",
            ChallengeType::Dns01 => "dns-01",
        }
    }
}

/// Opens client sessions against a CA directory.
pub trait CaConnector {
    type Client: CaClient;

    /// Creates a client for `directory_url` that signs its requests with `account`'s key and
    /// requests certificates with keys of `key_type`.
    fn connect(
        &self,
        directory_url: &str,
        account: &Account,
        key_type: KeyType,
    ) -> impl Future<Output = eyre::Result<Self::Client>> + Send;
}

/// One authenticated session with a CA.
///
/// [`CertManager`](crate::CertManager) calls these in a fixed order:
/// [`exclude_challenges`](Self::exclude_challenges), [`register`](Self::register),
/// [`accept_agreement`](Self::accept_agreement), then either
/// [`obtain_certificate`](Self::obtain_certificate) or
/// [`renew_certificate`](Self::renew_certificate).
pub trait CaClient: Send {
    /// Never attempt the given challenge types when validating domains.
    fn exclude_challenges(&mut self, challenges: &[ChallengeType]);

    /// Registers the session's account with the CA.
    fn register(&mut self) -> impl Future<Output = eyre::Result<Registration>> + Send;

    /// Accepts the CA's current subscriber agreement for the registered account.
    fn accept_agreement(&mut self) -> impl Future<Output = eyre::Result<()>> + Send;

    /// Validates every domain in `domains` and issues a certificate for them.
    ///
    /// With `bundle` set, a single certificate covers all domains, the first one being the
    /// primary. Domains that fail validation are reported with their individual causes.
    fn obtain_certificate(
        &mut self,
        domains: &[String],
        bundle: bool,
    ) -> impl Future<Output = Result<CertificateResource, DomainFailures>> + Send;

    /// Requests a replacement for the certificate described by `cert`.
    fn renew_certificate(
        &mut self,
        cert: &CertificateResource,
        bundle: bool,
    ) -> impl Future<Output = eyre::Result<CertificateResource>> + Send;
}
