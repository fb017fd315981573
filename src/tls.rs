//! Self-signed TLS Bootstrap
//!
//! Makes sure a `localhost` certificate pair exists under the certificate
//! directory so the service can be reached over HTTPS from a page served by a
//! public origin. Existing files are reused without any validity check.
//!
//! Certificate generation needs the `tls` feature. Without it, or when any
//! step fails, [`ensure_certificate`] returns `None` and the caller serves
//! plain HTTP.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

pub const CERT_FILE: &str = "cert.pem";
pub const KEY_FILE: &str = "key.pem";

/// Days the generated certificate stays valid.
pub const VALIDITY_DAYS: i64 = 365;

#[cfg(feature = "tls")]
const ORGANIZATION: &str = "Wizyta Powiernik";
#[cfg(feature = "tls")]
const COUNTRY: &str = "PL";

/// Paths of a certificate/key pair on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificatePaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

impl CertificatePaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            cert: dir.join(CERT_FILE),
            key: dir.join(KEY_FILE),
        }
    }

    fn both_exist(&self) -> bool {
        self.cert.is_file() && self.key.is_file()
    }
}

/// Certificate bootstrap errors
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("TLS support is not compiled in")]
    Unavailable,

    #[error("cannot write {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[cfg(feature = "tls")]
    #[error("certificate generation failed: {0}")]
    Generate(#[from] rcgen::Error),
}

/// Return the certificate pair in `dir`, generating it when either file is missing.
pub fn ensure_certificate(dir: &Path) -> Option<CertificatePaths> {
    let paths = CertificatePaths::in_dir(dir);
    if paths.both_exist() {
        return Some(paths);
    }

    info!("Generating a self-signed certificate for HTTPS...");
    if let Err(e) = std::fs::create_dir_all(dir) {
        warn!("Cannot create {}: {e}. Falling back to HTTP.", dir.display());
        return None;
    }

    match generate_certificate(&paths.cert, &paths.key) {
        Ok(()) => {
            info!("Self-signed certificate written to {}", dir.display());
            Some(paths)
        }
        Err(e) => {
            warn!("Cannot generate a certificate ({e}). Falling back to HTTP.");
            None
        }
    }
}

/// Generate a fresh RSA-2048 key pair and a self-signed `localhost`
/// certificate signed with SHA-256.
///
/// The key is written first as unencrypted PKCS#8 PEM, then the certificate.
#[cfg(feature = "tls")]
pub fn generate_certificate(cert_path: &Path, key_path: &Path) -> Result<(), TlsError> {
    use std::net::{IpAddr, Ipv4Addr};

    use rcgen::{
        CertificateParams, DistinguishedName, DnType, KeyPair, SanType, SerialNumber,
        PKCS_RSA_SHA256,
    };
    use time::{Duration, OffsetDateTime};

    let key_pair = KeyPair::generate_for(&PKCS_RSA_SHA256)?;

    let mut distinguished_name = DistinguishedName::new();
    distinguished_name.push(DnType::CountryName, COUNTRY);
    distinguished_name.push(DnType::OrganizationName, ORGANIZATION);
    distinguished_name.push(DnType::CommonName, "localhost");

    let mut params = CertificateParams::default();
    params.distinguished_name = distinguished_name;
    params.subject_alt_names = vec![
        SanType::DnsName("localhost".try_into()?),
        SanType::IpAddress(IpAddr::V4(Ipv4Addr::LOCALHOST)),
    ];
    let not_before = OffsetDateTime::now_utc();
    params.not_before = not_before;
    params.not_after = not_before + Duration::days(VALIDITY_DAYS);
    params.serial_number = Some(SerialNumber::from_slice(&random_serial()));

    let cert = params.self_signed(&key_pair)?;

    write_pem(key_path, &key_pair.serialize_pem())?;
    write_pem(cert_path, &cert.pem())?;
    Ok(())
}

#[cfg(not(feature = "tls"))]
pub fn generate_certificate(_cert_path: &Path, _key_path: &Path) -> Result<(), TlsError> {
    Err(TlsError::Unavailable)
}

/// Positive 128-bit serial number.
#[cfg(feature = "tls")]
fn random_serial() -> [u8; 16] {
    let mut serial: [u8; 16] = rand::random();
    serial[0] &= 0x7f;
    serial[0] |= 0x01;
    serial
}

#[cfg(feature = "tls")]
fn write_pem(path: &Path, pem: &str) -> Result<(), TlsError> {
    std::fs::write(path, pem).map_err(|source| TlsError::Io {
        path: path.to_path_buf(),
        source,
    })
}
