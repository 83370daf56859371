// Serving certificate loading
//
// The API server only proxies to an APIService over HTTPS, so the webhook
// terminates TLS itself with the certificate and key mounted into the pod.

use anyhow::{Context, Result};
use rustls::ServerConfig;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

/// Build the rustls server config from PEM files
///
/// The certificate file holds the chain, leaf first. The key file holds one
/// PKCS#8, PKCS#1 or SEC1 private key.
pub fn load_server_config(cert_path: &Path, key_path: &Path) -> Result<ServerConfig> {
    let cert_chain = load_certs(cert_path)?;
    let key = load_private_key(key_path)?;

    ServerConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
        .with_safe_default_protocol_versions()
        .context("Failed to select TLS protocol versions")?
        .with_no_client_auth()
        .with_single_cert(cert_chain, key)
        .with_context(|| {
            format!(
                "Certificate {} does not match key {}",
                cert_path.display(),
                key_path.display()
            )
        })
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open certificate file: {}", path.display()))?;

    let certs = rustls_pemfile::certs(&mut BufReader::new(file))
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to parse certificate: {}", path.display()))?;

    if certs.is_empty() {
        anyhow::bail!("No certificates found in file: {}", path.display());
    }
    Ok(certs)
}

fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open key file: {}", path.display()))?;

    rustls_pemfile::private_key(&mut BufReader::new(file))
        .with_context(|| format!("Failed to parse key: {}", path.display()))?
        .with_context(|| format!("No private key found in file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn testdata(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata").join(name)
    }

    #[test]
    fn test_loads_certificate_and_key() {
        let config = load_server_config(&testdata("tls.crt"), &testdata("tls.key")).unwrap();
        assert!(config.alpn_protocols.is_empty());
    }

    #[test]
    fn test_missing_files() {
        let err = load_server_config(Path::new("/nonexistent/tls.crt"), &testdata("tls.key"))
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/tls.crt"));

        let err = load_server_config(&testdata("tls.crt"), Path::new("/nonexistent/tls.key"))
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/tls.key"));
    }

    #[test]
    fn test_key_file_without_key() {
        let mut key = tempfile::NamedTempFile::new().unwrap();
        write!(key, "not a pem file").unwrap();

        let err = load_server_config(&testdata("tls.crt"), key.path()).unwrap_err();
        assert!(err.to_string().contains("No private key found"));
    }

    #[test]
    fn test_cert_file_without_certificates() {
        let err = load_server_config(&testdata("tls.key"), &testdata("tls.key")).unwrap_err();
        assert!(err.to_string().contains("No certificates found"));
    }
}
