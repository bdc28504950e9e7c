//! On-disk persistence of certificate material.
//!
//! A certificate directory is flat and holds three files:
//!
//! ```text
//! certs/
//! ├── public.crt    # PEM certificate (possibly bundled chain)
//! ├── private.key   # PEM private key
//! └── certs.json    # indented JSON metadata, including the certificate itself
//! ```
//!
//! All files are readable and writable by the owner only. The directory is not locked: two
//! processes saving into the same directory at the same time can interleave their writes.

use std::{
    fs,
    io::{self, Write as _},
    path::{Path, PathBuf},
};

use der::time::OffsetDateTime;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::{
    cert::{self, CertificateResource},
    error::{Error, Result},
};

pub const CERT_FILE: &str = "public.crt";
pub const KEY_FILE: &str = "private.key";
pub const META_FILE: &str = "certs.json";

/// How [`CertStore::save_certs`] replaces existing files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteMode {
    /// Overwrite each file in place, one after the other.
    ///
    /// A failure part way through leaves the files written so far updated and the rest stale.
    #[default]
    InPlace,

    /// Write each file to a temporary sibling and rename it over the target.
    ///
    /// Every single file is replaced atomically; the set of three files is still not.
    Atomic,
}

/// Certificate directory handle.
#[derive(Debug, Clone)]
pub struct CertStore {
    dir: PathBuf,
    write_mode: WriteMode,
}

impl CertStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        CertStore {
            dir: dir.into(),
            write_mode: WriteMode::default(),
        }
    }

    pub fn with_write_mode(mut self, write_mode: WriteMode) -> Self {
        self.write_mode = write_mode;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn cert_path(&self) -> PathBuf {
        self.dir.join(CERT_FILE)
    }

    pub fn key_path(&self) -> PathBuf {
        self.dir.join(KEY_FILE)
    }

    pub fn meta_path(&self) -> PathBuf {
        self.dir.join(META_FILE)
    }

    /// Reads the PEM certificate.
    pub fn load_cert(&self) -> Result<String> {
        let path = self.cert_path();
        let pem = fs::read(&path).map_err(|err| Error::read(path.clone(), err))?;

        String::from_utf8(pem).map_err(|err| {
            let err = eyre::Report::new(err);
            Error::Certificate(err.wrap_err(format!("{} is not PEM text", path.display())))
        })
    }

    /// Reads and deserializes the certificate metadata.
    pub fn load_cert_meta(&self) -> Result<CertificateResource> {
        let path = self.meta_path();
        let meta = fs::read(&path).map_err(|err| Error::read(path.clone(), err))?;

        serde_json::from_slice(&meta).map_err(|source| Error::Meta { path, source })
    }

    /// `NotAfter` of the stored certificate.
    pub fn expiration_time(&self) -> Result<OffsetDateTime> {
        let cert = self.load_cert()?;
        cert::expiration_time(&cert)
    }

    /// Writes certificate, private key and metadata, in that order.
    ///
    /// Creates the directory if needed. The three writes are not transactional, see
    /// [`WriteMode`].
    pub fn save_certs(&self, cert: &CertificateResource) -> Result<()> {
        create_private_dir(&self.dir).map_err(|source| Error::Io {
            path: self.dir.clone(),
            source,
        })?;

        self.write_file(self.cert_path(), cert.certificate.as_bytes())?;
        self.write_file(self.key_path(), cert.private_key.as_bytes())?;

        let meta = Zeroizing::new(serde_json::to_vec_pretty(cert).map_err(|source| {
            Error::Meta {
                path: self.meta_path(),
                source,
            }
        })?);
        self.write_file(self.meta_path(), &meta)?;

        log::info!(
            "Saved certificate for {} to {}",
            cert.domain,
            self.dir.display()
        );

        Ok(())
    }

    /// Whether both certificate and private key files exist. Their contents are not checked.
    pub fn is_cert_available(&self) -> bool {
        self.cert_path().exists() && self.key_path().exists()
    }

    fn write_file(&self, path: PathBuf, contents: &[u8]) -> Result<()> {
        let res = match self.write_mode {
            WriteMode::InPlace => write_private(&path, contents),
            WriteMode::Atomic => {
                let tmp = tmp_path(&path);

                write_private(&tmp, contents)
                    .and_then(|()| fs::rename(&tmp, &path))
                    .map_err(|err| {
                        let _ = fs::remove_file(&tmp);
                        err
                    })
            }
        };

        res.map_err(|source| Error::Io { path, source })
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = std::ffi::OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(".tmp");
    path.with_file_name(name)
}

/// Writes `contents` to `path`, restricting the file to its owner.
fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut opts = fs::OpenOptions::new();
    opts.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt as _;
        opts.mode(0o600);
    }

    let mut file = opts.open(path)?;

    // mode above only applies to newly created files
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt as _;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }

    file.write_all(contents)?;
    file.sync_all()
}

fn create_private_dir(dir: &Path) -> io::Result<()> {
    if dir.is_dir() {
        return Ok(());
    }

    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt as _;
        builder.mode(0o700);
    }

    builder.create(dir)
}
