use std::{
    future::Future,
    path::{Path, PathBuf},
};

use eyre::WrapErr as _;

use crate::{
    acc::Account,
    cert::CertificateResource,
    client::{CaClient as _, CaConnector},
    config::Config,
    error::{Error, Result},
    store::CertStore,
};

/// All domains of a request go into one certificate.
pub(crate) const BUNDLE: bool = true;

/// Drives issuance and renewal of certificates through a [`CaConnector`].
///
/// Every call is self-contained: a new account key is generated, registered and made to accept
/// the subscriber agreement before anything is requested from the CA. No state is kept between
/// calls apart from what is written to certificate directories.
#[derive(Debug, Clone)]
pub struct CertManager<C> {
    config: Config,
    connector: C,
}

/// Result of [`CertManager::provision`].
#[derive(Debug)]
pub enum Provisioned {
    /// No certificate was stored, a new one was issued and saved.
    Issued(CertificateResource),

    /// The stored certificate was close to expiry and has been replaced.
    Renewed(CertificateResource),

    /// The stored certificate is valid for more than the renewal threshold.
    NotDue { days_left: i64 },
}

impl<C: CaConnector> CertManager<C> {
    pub fn new(connector: C, config: Config) -> Self {
        CertManager { config, connector }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Certificate store for `dir`, using the configured write mode.
    pub fn store(&self, dir: impl Into<PathBuf>) -> CertStore {
        CertStore::new(dir).with_write_mode(self.config.write_mode)
    }

    /// Makes sure `certs_dir` holds a current certificate for `domain`.
    ///
    /// Renews the stored certificate when one exists, otherwise issues a new one. Whatever the CA
    /// hands back is saved to `certs_dir`. A stored certificate that is not yet due for renewal
    /// is left untouched.
    pub async fn provision(
        &self,
        certs_dir: impl AsRef<Path>,
        email: &str,
        domain: &str,
        sub_domains: &[&str],
    ) -> Result<Provisioned> {
        let store = self.store(certs_dir.as_ref());

        if store.is_cert_available() {
            return match self.renew_certs(store.dir(), email).await {
                Ok(cert) => {
                    store.save_certs(&cert)?;
                    Ok(Provisioned::Renewed(cert))
                }
                Err(Error::NotDue { days_left }) => {
                    log::info!(
                        "Certificate in {} is valid for {days_left} more days",
                        store.dir().display()
                    );
                    Ok(Provisioned::NotDue { days_left })
                }
                Err(err) => Err(err),
            };
        }

        let cert = self.gen_certs(email, domain, sub_domains).await?;
        store.save_certs(&cert)?;

        Ok(Provisioned::Issued(cert))
    }

    /// Creates a throwaway account and an authenticated client session for it.
    ///
    /// Steps run strictly in order: key generation, connect, challenge exclusion, registration,
    /// agreement acceptance. The first failure aborts the session.
    pub(crate) async fn open_session(&self, email: &str) -> Result<(Account, C::Client)> {
        let key_type = self.config.key_type;
        let mut account = Account::generate(email, key_type)?;

        let url = self.config.directory.to_url();
        log::debug!("Connecting to ACME directory {url}");

        let mut client = self
            .connector
            .connect(url, &account, key_type)
            .await
            .wrap_err_with(|| format!("connect to {url}"))
            .map_err(Error::Protocol)?;

        client.exclude_challenges(&self.config.excluded_challenges);

        let registration = client
            .register()
            .await
            .wrap_err("account registration")
            .map_err(Error::Protocol)?;
        log::debug!("Registered account {} for {email}", registration.uri);
        account.set_registration(registration);

        client
            .accept_agreement()
            .await
            .wrap_err("accept subscriber agreement")
            .map_err(Error::Protocol)?;

        Ok((account, client))
    }

    /// Runs `fut` under the configured timeout, if any.
    pub(crate) async fn with_timeout<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| Error::Timeout(limit))?,
            None => fut.await,
        }
    }
}
