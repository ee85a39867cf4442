//! SHA-1 certificate fingerprints
//!
//! Fingerprints come either from the digest tool
//! (`openssl x509 -fingerprint -sha1`, output `SHA1 Fingerprint=AA:BB:…`) or
//! from hashing the DER bytes directly. Both produce canonical upper-case hex.

use crate::config::DigestMode;
use crate::engine::command_executor::{ToolCommand, ToolRunner};
use crate::Result;
use sha1::{Digest, Sha1};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Length of a SHA-1 digest in bytes
pub const SHA1_LEN: usize = 20;

/// Extract the canonical hex fingerprint from digest tool output
///
/// Strips the `… Fingerprint=` label, the `:` separators and surrounding
/// whitespace. Returns `None` when no fingerprint line is present.
pub fn parse_fingerprint_output(output: &str) -> Option<String> {
    let line = output
        .lines()
        .find(|line| line.to_ascii_lowercase().contains("fingerprint="))?;
    let (_, value) = line.split_once('=')?;

    let hex: String = value
        .trim_end()
        .chars()
        .filter(|c| *c != ':' && !c.is_whitespace())
        .collect();
    if hex.is_empty() {
        None
    } else {
        Some(hex.to_ascii_uppercase())
    }
}

/// Decode a hex fingerprint into its 20 raw bytes
pub fn decode_fingerprint(hex_digest: &str) -> std::result::Result<[u8; SHA1_LEN], String> {
    let mut bytes = [0u8; SHA1_LEN];
    hex::decode_to_slice(hex_digest, &mut bytes)
        .map_err(|e| format!("'{hex_digest}' is not a {SHA1_LEN}-byte hex digest: {e}"))?;
    Ok(bytes)
}

/// Hash a file's contents with SHA-1, streaming
pub fn hash_file_sync(path: &Path) -> Result<[u8; SHA1_LEN]> {
    let mut file = std::fs::File::open(path)?;

    let mut hasher = Sha1::new();
    let mut buffer = [0; 8192];
    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    let mut digest = [0u8; SHA1_LEN];
    digest.copy_from_slice(&hasher.finalize());
    Ok(digest)
}

/// Computes certificate fingerprints the configured way
pub struct FingerprintHasher {
    mode: DigestMode,
    openssl: PathBuf,
    runner: Arc<dyn ToolRunner>,
}

impl FingerprintHasher {
    pub fn new(mode: DigestMode, openssl: PathBuf, runner: Arc<dyn ToolRunner>) -> Self {
        Self {
            mode,
            openssl,
            runner,
        }
    }

    pub fn mode(&self) -> DigestMode {
        self.mode
    }

    /// The digest tool invocation for one certificate
    pub fn digest_command(&self, certificate: &Path) -> ToolCommand {
        ToolCommand::new(&self.openssl)
            .args(["x509", "-inform", "DER", "-in"])
            .path_arg(certificate)
            .args(["-noout", "-fingerprint", "-sha1"])
    }

    /// SHA-1 fingerprint of a DER certificate file
    pub async fn fingerprint(&self, certificate: &Path) -> Result<[u8; SHA1_LEN]> {
        match self.mode {
            DigestMode::Native => hash_file_sync(certificate),
            DigestMode::External => {
                let command = self.digest_command(certificate);
                let output = self.runner.run_checked(&command).await?;

                let hex_digest = parse_fingerprint_output(&output.stdout).ok_or_else(|| {
                    command.failure(format!(
                        "no fingerprint in output: {}",
                        output.stdout.trim()
                    ))
                })?;
                debug!("{} -> {}", certificate.display(), hex_digest);

                decode_fingerprint(&hex_digest).map_err(|reason| command.failure(reason))
            }
        }
    }
}

impl std::fmt::Debug for FingerprintHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FingerprintHasher")
            .field("mode", &self.mode)
            .field("openssl", &self.openssl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_openssl_output() {
        let output = "SHA1 Fingerprint=5F:B7:EE:06:33:E2:59:DB:AD:0C:4C:9A:E6:D3:8F:1A:61:C7:DC:25\n";
        assert_eq!(
            parse_fingerprint_output(output).as_deref(),
            Some("5FB7EE0633E259DBAD0C4C9AE6D38F1A61C7DC25")
        );
    }

    #[test]
    fn test_parse_lowercase_label_and_digits() {
        let output = "sha1 Fingerprint=5f:b7:ee:06:33:e2:59:db:ad:0c:4c:9a:e6:d3:8f:1a:61:c7:dc:25  \r\n";
        assert_eq!(
            parse_fingerprint_output(output).as_deref(),
            Some("5FB7EE0633E259DBAD0C4C9AE6D38F1A61C7DC25")
        );
    }

    #[test]
    fn test_parse_rejects_missing_label() {
        assert_eq!(parse_fingerprint_output("unable to load certificate\n"), None);
        assert_eq!(parse_fingerprint_output("SHA1 Fingerprint=\n"), None);
    }

    #[test]
    fn test_decode_fingerprint_length() {
        let bytes = decode_fingerprint("5FB7EE0633E259DBAD0C4C9AE6D38F1A61C7DC25").unwrap();
        assert_eq!(bytes[0], 0x5F);
        assert_eq!(bytes[19], 0x25);

        assert!(decode_fingerprint("5FB7").is_err());
        assert!(decode_fingerprint("ZZB7EE0633E259DBAD0C4C9AE6D38F1A61C7DC25").is_err());
    }

    #[test]
    fn test_hash_file_matches_known_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc.der");
        std::fs::write(&path, b"abc").unwrap();

        // FIPS 180-1 test vector
        assert_eq!(
            hex::encode_upper(hash_file_sync(&path).unwrap()),
            "A9993E364706816ABA3E25717850C26C9CD0D89D"
        );
    }
}
