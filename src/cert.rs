use std::{
    fmt,
    io::{BufReader, Cursor},
};

use der::{
    time::{OffsetDateTime, PrimitiveDateTime},
    Decode as _,
};
use eyre::{eyre, WrapErr as _};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// An issued certificate together with its private key and the CA metadata needed to renew it.
///
/// Serializes to the `certs.json` metadata format. The private key is never part of the JSON
/// form; it is only written to its own file.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateResource {
    /// Primary domain of the certificate.
    pub domain: String,

    #[serde(default)]
    pub cert_url: String,

    #[serde(default)]
    pub cert_stable_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_ref: Option<String>,

    /// The issued certificate file in PEM format, possibly a bundled chain.
    pub certificate: String,

    /// The private key in PEM format.
    #[serde(skip)]
    pub private_key: Zeroizing<String>,
}

impl CertificateResource {
    /// The issued certificate chain in DER format, end-entity certificate first.
    pub fn certificate_chain(&self) -> eyre::Result<Vec<Vec<u8>>> {
        certificate_chain(&self.certificate)
    }

    /// `NotAfter` of the end-entity certificate.
    pub fn expiration_time(&self) -> Result<OffsetDateTime> {
        expiration_time(&self.certificate)
    }

    /// Inspect the certificate to count the number of (whole) valid days left.
    ///
    /// It's up to the ACME API provider to decide how long an issued certificate is valid.
    /// Let's Encrypt sets the validity to 90 days. This function reports 89 days for newly
    /// issued cert, since it counts _whole_ days.
    ///
    /// It is possible to get negative days for an expired certificate.
    pub fn valid_days_left(&self) -> Result<i64> {
        Ok(days_until(self.expiration_time()?, OffsetDateTime::now_utc()))
    }
}

impl fmt::Debug for CertificateResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateResource")
            .field("domain", &self.domain)
            .field("cert_url", &self.cert_url)
            .field("cert_stable_url", &self.cert_stable_url)
            .field("account_ref", &self.account_ref)
            .field("certificate", &self.certificate)
            .finish_non_exhaustive()
    }
}

fn certificate_chain(pem: &str) -> eyre::Result<Vec<Vec<u8>>> {
    let mut rdr = BufReader::new(Cursor::new(pem));

    rustls_pemfile::certs(&mut rdr)
        .map(|res| res.map(|cert| cert.to_vec()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}

/// Extracts `NotAfter` from the first (end-entity) certificate of a PEM bundle.
pub fn expiration_time(pem: &str) -> Result<OffsetDateTime> {
    parse_not_after(pem).map_err(Error::Certificate)
}

fn parse_not_after(pem: &str) -> eyre::Result<OffsetDateTime> {
    let cert_chain = certificate_chain(pem)?;
    let cert_ee = cert_chain
        .first() // EE cert is first
        .ok_or_else(|| eyre!("no certificates in PEM data"))?;

    let cert = x509_cert::Certificate::from_der(cert_ee).wrap_err("parse X.509 certificate")?;

    let not_after = cert.tbs_certificate.validity.not_after.to_date_time();
    // X.509 validity times are always UTC
    let not_after = PrimitiveDateTime::try_from(not_after)?.assume_utc();

    Ok(not_after)
}

/// Whole days from `now` until `not_after`, truncated toward zero.
pub fn days_until(not_after: OffsetDateTime, now: OffsetDateTime) -> i64 {
    (not_after - now).whole_days()
}
