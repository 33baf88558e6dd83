//! Local validation of SSL material for domain registration.
//!
//! Reads certificate, private key, and chain files from disk, verifies
//! that everything parses and that the key matches the certificate, and
//! produces an immutable [`SslBundle`] ready to submit. No network I/O.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use rustls::pki_types::CertificateDer;
use rustls::server::ParsedCertificate;
use thiserror::Error;

use cumulus_client::SslBundle;

/// Validation failures for SSL material.
#[derive(Debug, Error)]
pub enum SslError {
    #[error("The file could not be read: {path}")]
    FileUnreadable { path: PathBuf },

    #[error("The file is not a valid X.509 certificate: {path}")]
    InvalidCertificate { path: PathBuf },

    /// Passphrase-protected keys cannot be decrypted (there is no
    /// passphrase prompt) and are indistinguishable from invalid ones.
    #[error("The private key is not valid, or it is passphrase-protected")]
    InvalidPrivateKey,

    #[error("The certificate does not match the provided private key")]
    KeyMismatch,
}

/// Validate certificate, key, and chain files and assemble the bundle.
///
/// Validation order follows the failure modes: certificate readability
/// and parse, key readability and parse, key/certificate match, then
/// each chain entry in the given order. The first failure aborts; no
/// partial bundle escapes.
pub fn validate_ssl_material(
    cert_path: &Path,
    key_path: &Path,
    chain_paths: &[PathBuf],
) -> Result<SslBundle, SslError> {
    let certificate = read_trimmed(cert_path)?;
    let cert_der = parse_certificate(&certificate, cert_path)?;
    let parsed = ParsedCertificate::try_from(&cert_der).map_err(|_| SslError::InvalidCertificate {
        path: cert_path.to_path_buf(),
    })?;

    let key = read_trimmed(key_path)?;
    let key_pair = rcgen::KeyPair::from_pem(&key).map_err(|_| SslError::InvalidPrivateKey)?;

    // The key matches the certificate when the certificate's
    // SubjectPublicKeyInfo equals the SPKI derived from the private key.
    if parsed.subject_public_key_info().as_ref() != key_pair.public_key_der().as_slice() {
        return Err(SslError::KeyMismatch);
    }

    let mut chain = Vec::with_capacity(chain_paths.len());
    for chain_path in chain_paths {
        let chain_pem = read_trimmed(chain_path)?;
        let chain_der = parse_certificate(&chain_pem, chain_path)?;
        ParsedCertificate::try_from(&chain_der).map_err(|_| SslError::InvalidCertificate {
            path: chain_path.to_path_buf(),
        })?;
        chain.push(chain_pem);
    }

    Ok(SslBundle {
        certificate,
        key,
        chain,
    })
}

/// Conservative domain name syntax check: one or more 1-63 character
/// dot-free labels, final label 2-63 characters. Not full DNS or IDN
/// validation.
pub fn valid_domain(domain: &str) -> bool {
    static DOMAIN_RE: OnceLock<Regex> = OnceLock::new();
    DOMAIN_RE
        .get_or_init(|| Regex::new(r"^([^.]{1,63}\.)+[^.]{2,63}$").expect("valid regex"))
        .is_match(domain)
}

fn read_trimmed(path: &Path) -> Result<String, SslError> {
    fs::read_to_string(path)
        .map(|contents| contents.trim().to_string())
        .map_err(|_| SslError::FileUnreadable {
            path: path.to_path_buf(),
        })
}

/// Decode the first PEM certificate in `pem`.
fn parse_certificate(pem: &str, path: &Path) -> Result<CertificateDer<'static>, SslError> {
    rustls_pemfile::certs(&mut pem.as_bytes())
        .next()
        .and_then(Result::ok)
        .ok_or_else(|| SslError::InvalidCertificate {
            path: path.to_path_buf(),
        })
}
