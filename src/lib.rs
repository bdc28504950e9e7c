//! Lifecycle management for TLS certificates issued by ACME (Automatic Certificate Management
//! Environment) providers such as [Let's Encrypt](https://letsencrypt.org/).
//!
//! The crate requests a certificate for a domain and its subdomains, persists it, watches its
//! expiration, and renews it before it lapses. The ACME wire protocol itself is left to a client
//! implementation behind the [`CaConnector`] and [`CaClient`] traits.
//!
//! # Usage
//!
//! ```no_run
//! use acme_certs::{CaConnector, CertManager, Config, Provisioned};
//!
//! async fn keep_fresh<C: CaConnector>(connector: C) -> acme_certs::Result<()> {
//!     let manager = CertManager::new(connector, Config::staging());
//!
//!     match manager
//!         .provision("/etc/certs", "admin@example.com", "example.com", &["www", "api"])
//!         .await?
//!     {
//!         Provisioned::Issued(cert) | Provisioned::Renewed(cert) => {
//!             println!("new certificate for {}", cert.domain);
//!         }
//!         Provisioned::NotDue { days_left } => println!("{days_left} days left"),
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Domain Ownership
//!
//! Before issuing, the CA checks that the requester controls every name on the certificate. This
//! crate only accepts challenges that can be answered by the host itself; `dns-01` is excluded by
//! default, see [`Config::excluded_challenges`].
//!
//! ## Multiple Domains
//!
//! All names of a request are bundled into one certificate. Given `example.com` and the
//! subdomains `www` and `api`, the certificate covers `example.com`, `www.example.com` and
//! `api.example.com`. A primary name that already is a subdomain (`sub.example.com`) is issued on
//! its own. If any name fails validation the whole request fails, see [`Error::Issuance`].
//!
//! # Renewal
//!
//! [`CertManager::renew_certs`] refuses to contact the CA while the stored certificate is valid
//! for more than 45 days (configurable through [`Config::renew_days_limit`]).
//!
//! # Accounts
//!
//! Each issuance and renewal generates a new account key and registers it. Accounts are never
//! stored or reused.
//!
//! # Concurrency
//!
//! Every operation runs its steps one after the other. Certificate directories are not locked;
//! do not run several renewals against the same directory at once.

#![deny(rust_2018_idioms, nonstandard_style, future_incompatible)]

mod acc;
mod cert;
mod client;
mod config;
mod dir;
mod domain;
mod error;
mod issue;
mod manager;
mod renew;
mod store;


pub use crate::{
    acc::{Account, AccountKey, KeyType, Registration},
    cert::{days_until, expiration_time, CertificateResource},
    client::{CaClient, CaConnector, ChallengeType},
    config::{Config, RENEW_DAYS_LIMIT},
    dir::DirectoryUrl,
    domain::{domain_set, is_sub_domain, is_valid_domain, Domain},
    error::{DomainFailures, Error, ErrorKind, Result},
    manager::{CertManager, Provisioned},
    store::{CertStore, WriteMode, CERT_FILE, KEY_FILE, META_FILE},
};
