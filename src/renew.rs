use std::path::Path;

use der::time::OffsetDateTime;

use crate::{
    cert::{self, CertificateResource},
    client::{CaClient as _, CaConnector},
    error::{Error, Result},
    manager::{CertManager, BUNDLE},
    store::CertStore,
};

impl<C: CaConnector> CertManager<C> {
    /// Renews the certificate stored in `certs_dir`.
    ///
    /// Nothing is sent to the CA while the stored certificate is valid for more than
    /// [`Config::renew_days_limit`](crate::Config::renew_days_limit) days; [`Error::NotDue`] is
    /// returned instead. Otherwise a fresh account is registered and a bundled renewal is requested
    /// using the stored metadata. CA failures are returned as they are.
    ///
    /// The renewed certificate is not saved.
    pub async fn renew_certs(
        &self,
        certs_dir: impl AsRef<Path>,
        email: &str,
    ) -> Result<CertificateResource> {
        let store = self.store(certs_dir.as_ref());
        self.with_timeout(self.renew(&store, email)).await
    }

    async fn renew(&self, store: &CertStore, email: &str) -> Result<CertificateResource> {
        let cert_pem = store.load_cert()?;

        let not_after = cert::expiration_time(&cert_pem)?;
        let days_left = cert::days_until(not_after, OffsetDateTime::now_utc());

        if days_left > self.config().renew_days_limit {
            log::debug!(
                "Certificate in {} expires in {days_left} days, not renewing",
                store.dir().display()
            );
            return Err(Error::NotDue { days_left });
        }

        log::info!(
            "Certificate in {} expires in {days_left} days, renewing",
            store.dir().display()
        );

        let (_account, mut client) = self.open_session(email).await?;

        let mut meta = store.load_cert_meta()?;
        // renew what is actually on disk, not what the metadata last recorded
        meta.certificate = cert_pem;

        let renewed = client
            .renew_certificate(&meta, BUNDLE)
            .await
            .map_err(Error::Protocol)?;

        log::info!("Renewed certificate for {}", renewed.domain);

        Ok(renewed)
    }
}
