use super::rsa1::RsaPublicKey;
use crate::error::{Error, Result};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

/// Certificate Holder/Authority Reference, the 8-byte key into the European
/// public-key directories.
pub type KeyIdentifier = [u8; 8];

pub fn key_identifier_hex(chr: &KeyIdentifier) -> String {
    chr.iter().map(|byte| format!("{:02X}", byte)).collect()
}

/// The trust anchors: the Generation 1 root public key and the Generation 2
/// root CV certificate. Either may be absent if the resolver only serves one
/// generation.
#[derive(Debug, Clone, Default)]
pub struct RootCert {
    pub rsa: Option<RsaPublicKey>,
    pub ecc: Option<Vec<u8>>,
}

/// Looks up certificates by CHR/CAR. Implementations may block on I/O; the
/// Authenticator checks its cancellation handle around every call.
pub trait CertificateResolver: Send + Sync {
    fn root(&self) -> Result<RootCert>;
    /// A 194-byte Generation 1 recoverable certificate.
    fn rsa_certificate(&self, chr: &KeyIdentifier) -> Result<Vec<u8>>;
    /// A Generation 2 CV certificate (outer tag 0x7F21).
    fn ecc_certificate(&self, chr: &KeyIdentifier) -> Result<Vec<u8>>;
}

/// Tries a list of resolvers in order, collecting each failure into the
/// final error when none can answer.
pub struct ChainResolver {
    resolvers: Vec<Box<dyn CertificateResolver>>,
}

impl ChainResolver {
    pub fn new(resolvers: Vec<Box<dyn CertificateResolver>>) -> Self {
        ChainResolver { resolvers }
    }

    fn try_each<T>(
        &self,
        what: &str,
        lookup: impl Fn(&dyn CertificateResolver) -> Result<T>,
    ) -> Result<T> {
        let mut failures = Vec::new();
        for resolver in &self.resolvers {
            match lookup(resolver.as_ref()) {
                Ok(found) => return Ok(found),
                Err(error) => failures.push(error.to_string()),
            }
        }
        Err(Error::ResolverUnavailable {
            chr: format!("{} ({})", what, failures.join("; ")),
        })
    }
}

impl CertificateResolver for ChainResolver {
    fn root(&self) -> Result<RootCert> {
        self.try_each("root", |resolver| resolver.root())
    }

    fn rsa_certificate(&self, chr: &KeyIdentifier) -> Result<Vec<u8>> {
        self.try_each(&key_identifier_hex(chr), |resolver| {
            resolver.rsa_certificate(chr)
        })
    }

    fn ecc_certificate(&self, chr: &KeyIdentifier) -> Result<Vec<u8>> {
        self.try_each(&key_identifier_hex(chr), |resolver| {
            resolver.ecc_certificate(chr)
        })
    }
}

/// Serves certificates from a local directory laid out the way the ERCA
/// download tooling stores them: `pks1/<CHR>.bin` and `pks1/root/EC_PK.bin`
/// for Generation 1, `pks2/<CHR>.bin` and `pks2/root/ERCA_Gen2.bin` for
/// Generation 2.
pub struct EmbeddedResolver {
    base_dir: PathBuf,
}

impl EmbeddedResolver {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        EmbeddedResolver {
            base_dir: base_dir.into(),
        }
    }

    fn read(&self, relative: &str) -> Result<Vec<u8>> {
        let path = self.base_dir.join(relative);
        std::fs::read(&path).map_err(|error| {
            Error::ResolverUnavailable {
                chr: format!("{}: {}", path.display(), error),
            }
        })
    }
}

impl CertificateResolver for EmbeddedResolver {
    fn root(&self) -> Result<RootCert> {
        let mut root = RootCert::default();
        if let Ok(bytes) = self.read("pks1/root/EC_PK.bin") {
            // The EC_PK file is the 8-byte key identifier followed by the
            // raw modulus and exponent.
            if bytes.len() == 144 {
                root.rsa = RsaPublicKey::from_raw(&bytes[8..]).ok();
            } else {
                root.rsa = RsaPublicKey::from_raw(&bytes).ok();
            }
        }
        if let Ok(bytes) = self.read("pks2/root/ERCA_Gen2.bin") {
            root.ecc = Some(bytes);
        }
        if root.rsa.is_none() && root.ecc.is_none() {
            return Err(Error::ResolverUnavailable {
                chr: format!("no root material under {}", self.base_dir.display()),
            });
        }
        Ok(root)
    }

    fn rsa_certificate(&self, chr: &KeyIdentifier) -> Result<Vec<u8>> {
        self.read(&format!("pks1/{}.bin", key_identifier_hex(chr)))
    }

    fn ecc_certificate(&self, chr: &KeyIdentifier) -> Result<Vec<u8>> {
        self.read(&format!("pks2/{}.bin", key_identifier_hex(chr)))
    }
}

/// Fetches single certificates from the European digital tachograph
/// certificate directory over HTTPS.
pub struct HttpResolver {
    base_url: String,
    client: reqwest::blocking::Client,
}

pub const ERCA_BASE_URL: &str = "https://dtc.jrc.ec.europa.eu/iot_doc";

impl HttpResolver {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpResolver {
            base_url: base_url.into(),
            client: reqwest::blocking::Client::new(),
        }
    }

    fn fetch(&self, path: &str) -> Result<Vec<u8>> {
        let url = format!("{}/{}", self.base_url, path);
        log::debug!("Fetching certificate from {}", url);
        let response = self.client.get(&url).send().map_err(|error| {
            Error::ResolverUnavailable {
                chr: format!("{}: {}", url, error),
            }
        })?;
        if !response.status().is_success() {
            return Err(Error::ResolverUnavailable {
                chr: format!("{}: HTTP {}", url, response.status()),
            });
        }
        response
            .bytes()
            .map(|bytes| bytes.to_vec())
            .map_err(|error| Error::ResolverUnavailable {
                chr: format!("{}: {}", url, error),
            })
    }
}

impl CertificateResolver for HttpResolver {
    fn root(&self) -> Result<RootCert> {
        // Root anchors must be pinned locally; fetching a trust anchor over
        // the network would defeat the chain verification.
        Err(Error::ResolverUnavailable {
            chr: "HTTP resolver does not serve trust anchors".to_string(),
        })
    }

    fn rsa_certificate(&self, chr: &KeyIdentifier) -> Result<Vec<u8>> {
        self.fetch(&format!("pks1/{}.bin", key_identifier_hex(chr)))
    }

    fn ecc_certificate(&self, chr: &KeyIdentifier) -> Result<Vec<u8>> {
        self.fetch(&format!("pks2/{}.bin", key_identifier_hex(chr)))
    }
}

static DEFAULT_RESOLVER: OnceLock<Arc<dyn CertificateResolver>> = OnceLock::new();

/// The process-wide resolver: embedded certificates first, the ERCA
/// directory as fallback. Built once, read-only afterwards.
pub fn default_resolver() -> Arc<dyn CertificateResolver> {
    DEFAULT_RESOLVER
        .get_or_init(|| {
            Arc::new(ChainResolver::new(vec![
                Box::new(EmbeddedResolver::new("certs")),
                Box::new(HttpResolver::new(ERCA_BASE_URL)),
            ]))
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;
    impl CertificateResolver for Failing {
        fn root(&self) -> Result<RootCert> {
            Err(Error::ResolverUnavailable {
                chr: "always fails".into(),
            })
        }
        fn rsa_certificate(&self, _chr: &KeyIdentifier) -> Result<Vec<u8>> {
            Err(Error::ResolverUnavailable {
                chr: "always fails".into(),
            })
        }
        fn ecc_certificate(&self, _chr: &KeyIdentifier) -> Result<Vec<u8>> {
            Err(Error::ResolverUnavailable {
                chr: "always fails".into(),
            })
        }
    }

    struct Fixed(Vec<u8>);
    impl CertificateResolver for Fixed {
        fn root(&self) -> Result<RootCert> {
            Ok(RootCert::default())
        }
        fn rsa_certificate(&self, _chr: &KeyIdentifier) -> Result<Vec<u8>> {
            Ok(self.0.clone())
        }
        fn ecc_certificate(&self, _chr: &KeyIdentifier) -> Result<Vec<u8>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn chain_resolver_falls_through_failures() {
        let chain = ChainResolver::new(vec![Box::new(Failing), Box::new(Fixed(vec![1, 2, 3]))]);
        let found = chain.rsa_certificate(&[0u8; 8]).unwrap();
        assert_eq!(found, vec![1, 2, 3]);
    }

    #[test]
    fn chain_resolver_collects_all_failures() {
        let chain = ChainResolver::new(vec![Box::new(Failing), Box::new(Failing)]);
        let error = chain.ecc_certificate(&[0xAB; 8]).unwrap_err();
        let message = error.to_string();
        assert!(message.contains("ABABABABABABABAB"));
    }

    #[test]
    fn key_identifier_renders_uppercase_hex() {
        assert_eq!(
            key_identifier_hex(&[0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF]),
            "0123456789ABCDEF"
        );
    }
}
