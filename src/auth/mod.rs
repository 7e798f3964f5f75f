pub mod brainpool;
pub mod ecc;
pub mod resolver;
pub mod rsa1;

use crate::dt::Generation;
use crate::error::{Error, Result};
use crate::raw::{
    AuthOutcome, AuthResult, CardFileKind, ContentType, RawCardFile, RawFile, RawVuFile,
};
use ecc::{CurveId, CvCertificate};
use resolver::{CertificateResolver, KeyIdentifier};
use rsa1::{recover_certificate, verify_pkcs1_v15_sha1, RsaPublicKey};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Cooperative cancellation handle. Checked between records and handed to
/// every resolver call; partial authentication state written before the
/// signal stays in place.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        CancelToken {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Some(deadline),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        if self.cancelled.load(Ordering::SeqCst) {
            return true;
        }
        matches!(self.deadline, Some(deadline) if Instant::now() >= deadline)
    }

    fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AuthenticateOptions {
    /// Resolver override; the embedded + HTTP default chain otherwise.
    pub resolver: Option<Arc<dyn CertificateResolver>>,
}

impl std::fmt::Debug for dyn CertificateResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CertificateResolver")
    }
}

/// Tally of one authentication run. Partial successes stay on the RawFile;
/// `into_result` turns a non-zero failure count into the aggregate error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthSummary {
    pub attempted: usize,
    pub failed: usize,
}

impl AuthSummary {
    pub fn into_result(self) -> Result<()> {
        if self.failed > 0 {
            Err(Error::AuthenticationFailed {
                failed: self.failed,
                attempted: self.attempted,
            })
        } else {
            Ok(())
        }
    }

    fn record(&mut self, outcome: AuthOutcome) {
        self.attempted += 1;
        if outcome != AuthOutcome::Valid {
            self.failed += 1;
        }
    }
}

/// End-entity verification material for one generation, or the reason it is
/// unavailable (applied to every record of that generation).
enum KeyState<K> {
    Ready(K),
    Failed(AuthOutcome, String),
}

impl<K> KeyState<K> {
    fn verify_or_report(&self, verify: impl FnOnce(&K) -> AuthResult) -> AuthResult {
        match self {
            KeyState::Ready(key) => verify(key),
            KeyState::Failed(outcome, detail) => {
                AuthResult::with_detail(*outcome, detail.clone())
            }
        }
    }
}

/// Verifies every signable record, cloning the input first. Use
/// [`authenticate_in_place`] to skip the copy.
pub fn authenticate(
    raw: &RawFile,
    options: &AuthenticateOptions,
    cancel: &CancelToken,
) -> Result<(RawFile, AuthSummary)> {
    let mut copy = raw.clone();
    let summary = authenticate_in_place(&mut copy, options, cancel)?;
    Ok((copy, summary))
}

/// Verifies every signable record, writing outcomes into the given RawFile.
/// Returns Err only on cancellation; per-record failures are reported via
/// the summary so partial results stay available.
pub fn authenticate_in_place(
    raw: &mut RawFile,
    options: &AuthenticateOptions,
    cancel: &CancelToken,
) -> Result<AuthSummary> {
    let resolver = options
        .resolver
        .clone()
        .unwrap_or_else(resolver::default_resolver);
    match raw {
        RawFile::Card(card) => authenticate_card(card, resolver.as_ref(), cancel),
        RawFile::VehicleUnit(vu) => authenticate_vu(vu, resolver.as_ref(), cancel),
    }
}

fn find_card_record<'a>(
    file: &'a RawCardFile,
    kind: CardFileKind,
    generation: Generation,
) -> Option<&'a [u8]> {
    file.records
        .iter()
        .find(|record| {
            record.kind == kind
                && record.generation == generation
                && record.content_type == ContentType::Data
        })
        .map(|record| record.value.as_slice())
}

fn gen1_card_key(file: &RawCardFile, resolver: &dyn CertificateResolver) -> KeyState<RsaPublicKey> {
    let root = match resolver.root() {
        Ok(root) => root,
        Err(error) => return KeyState::Failed(AuthOutcome::MissingCertificate, error.to_string()),
    };
    let Some(root_key) = root.rsa else {
        return KeyState::Failed(
            AuthOutcome::MissingCertificate,
            "resolver has no Generation 1 root key".to_string(),
        );
    };
    let Some(card_certificate) = find_card_record(file, CardFileKind::CardCertificate, Generation::Gen1)
    else {
        return KeyState::Failed(
            AuthOutcome::MissingCertificate,
            "EF_Card_Certificate missing".to_string(),
        );
    };
    if card_certificate.len() != rsa1::GEN1_CERTIFICATE_SIZE {
        return KeyState::Failed(
            AuthOutcome::MissingCertificate,
            format!("card certificate is {} bytes", card_certificate.len()),
        );
    }

    // The CA certificate travels in the file; fall back to the resolver,
    // addressed by the CAR in the card certificate's trailing bytes.
    let ca_certificate = match find_card_record(file, CardFileKind::CaCertificate, Generation::Gen1)
    {
        Some(bytes) => bytes.to_vec(),
        None => {
            let mut car: KeyIdentifier = [0u8; 8];
            car.copy_from_slice(&card_certificate[186..194]);
            match resolver.rsa_certificate(&car) {
                Ok(bytes) => bytes,
                Err(error) => {
                    return KeyState::Failed(AuthOutcome::MissingCertificate, error.to_string())
                }
            }
        }
    };

    let ca = match recover_certificate(&ca_certificate, &root_key) {
        Ok(ca) => ca,
        Err(error) => {
            return KeyState::Failed(
                AuthOutcome::UntrustedChain,
                format!("CA certificate did not verify against the root: {:#}", error),
            )
        }
    };
    let card = match recover_certificate(card_certificate, &ca.public_key) {
        Ok(card) => card,
        Err(error) => {
            return KeyState::Failed(
                AuthOutcome::UntrustedChain,
                format!("card certificate did not verify against the CA: {:#}", error),
            )
        }
    };
    KeyState::Ready(card.public_key)
}

/// Rejects an end-entity certificate whose expiration date has passed.
fn check_cv_validity(
    certificate: &CvCertificate,
) -> std::result::Result<(), (AuthOutcome, String)> {
    let expires = u32::from_be_bytes(certificate.expiration_date);
    if expires != 0 && (expires as i64) < chrono::Utc::now().timestamp() {
        let error = Error::CertificateExpired {
            expired_at: chrono::DateTime::from_timestamp(expires as i64, 0)
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_else(|| expires.to_string()),
        };
        return Err((AuthOutcome::UntrustedChain, error.to_string()));
    }
    Ok(())
}

fn verify_cv_link(
    certificate: &CvCertificate,
    issuer: &CvCertificate,
    what: &str,
) -> std::result::Result<(), (AuthOutcome, String)> {
    match certificate.verify_with(issuer.curve, &issuer.public_point) {
        Ok(true) => Ok(()),
        Ok(false) => Err((
            AuthOutcome::UntrustedChain,
            format!("{} signature does not verify against its issuer", what),
        )),
        Err(error) => Err((
            AuthOutcome::UntrustedChain,
            format!("{}: {:#}", what, error),
        )),
    }
}

/// Classifies a certificate parse failure: an out-of-table curve OID is an
/// algorithm problem, anything else breaks the chain.
fn certificate_failure(what: &str, error: anyhow::Error) -> (AuthOutcome, String) {
    if matches!(
        error.downcast_ref::<Error>(),
        Some(Error::UnsupportedCurve { .. })
    ) {
        (
            AuthOutcome::UnsupportedAlgorithm,
            format!("{}: {:#}", what, error),
        )
    } else {
        (
            AuthOutcome::UntrustedChain,
            format!("{} unreadable: {:#}", what, error),
        )
    }
}

/// Builds the Gen2 end-entity key for a card: root → (link) → CA → CardSign.
fn gen2_card_key(
    file: &RawCardFile,
    resolver: &dyn CertificateResolver,
) -> KeyState<(CurveId, Vec<u8>)> {
    let root = match resolver.root() {
        Ok(root) => root,
        Err(error) => return KeyState::Failed(AuthOutcome::MissingCertificate, error.to_string()),
    };
    let Some(root_bytes) = root.ecc else {
        return KeyState::Failed(
            AuthOutcome::MissingCertificate,
            "resolver has no Generation 2 root certificate".to_string(),
        );
    };
    let root_cert = match CvCertificate::parse(&root_bytes) {
        Ok(cert) => cert,
        Err(error) => {
            let (outcome, detail) = certificate_failure("root certificate", error);
            return KeyState::Failed(outcome, detail);
        }
    };

    let Some(sign_bytes) =
        find_card_record(file, CardFileKind::CardSignCertificate, Generation::Gen2)
    else {
        return KeyState::Failed(
            AuthOutcome::MissingCertificate,
            "EF_CardSign_Certificate missing".to_string(),
        );
    };
    let sign_cert = match CvCertificate::parse(sign_bytes) {
        Ok(cert) => cert,
        Err(error) => {
            let (outcome, detail) = certificate_failure("card sign certificate", error);
            return KeyState::Failed(outcome, detail);
        }
    };

    let ca_bytes = match find_card_record(file, CardFileKind::CaCertificate, Generation::Gen2) {
        Some(bytes) => bytes.to_vec(),
        None => match resolver.ecc_certificate(&sign_cert.certification_authority_reference) {
            Ok(bytes) => bytes,
            Err(error) => {
                return KeyState::Failed(AuthOutcome::MissingCertificate, error.to_string())
            }
        },
    };
    let ca_cert = match CvCertificate::parse(&ca_bytes) {
        Ok(cert) => cert,
        Err(error) => {
            let (outcome, detail) = certificate_failure("CA certificate", error);
            return KeyState::Failed(outcome, detail);
        }
    };

    // The CA links to the root either directly or through a link
    // certificate issued under the previous root key.
    let ca_issuer =
        if ca_cert.certification_authority_reference == root_cert.certificate_holder_reference {
            root_cert
        } else {
            let link_bytes =
                match find_card_record(file, CardFileKind::LinkCertificate, Generation::Gen2) {
                    Some(bytes) => bytes.to_vec(),
                    None => match resolver
                        .ecc_certificate(&ca_cert.certification_authority_reference)
                    {
                        Ok(bytes) => bytes,
                        Err(error) => {
                            return KeyState::Failed(
                                AuthOutcome::MissingCertificate,
                                error.to_string(),
                            )
                        }
                    },
                };
            let link_cert = match CvCertificate::parse(&link_bytes) {
                Ok(cert) => cert,
                Err(error) => {
                    let (outcome, detail) = certificate_failure("link certificate", error);
                    return KeyState::Failed(outcome, detail);
                }
            };
            if let Err((outcome, detail)) = verify_cv_link(&link_cert, &root_cert, "link certificate")
            {
                return KeyState::Failed(outcome, detail);
            }
            link_cert
        };

    if let Err((outcome, detail)) = verify_cv_link(&ca_cert, &ca_issuer, "CA certificate") {
        return KeyState::Failed(outcome, detail);
    }
    if let Err((outcome, detail)) = verify_cv_link(&sign_cert, &ca_cert, "card sign certificate") {
        return KeyState::Failed(outcome, detail);
    }
    if let Err((outcome, detail)) = check_cv_validity(&sign_cert) {
        return KeyState::Failed(outcome, detail);
    }

    KeyState::Ready((sign_cert.curve, sign_cert.public_point))
}

fn verify_ecdsa(key: &(CurveId, Vec<u8>), data: &[u8], signature: &[u8]) -> AuthResult {
    match key.0.verify(&key.1, data, signature) {
        Ok(true) => AuthResult::new(AuthOutcome::Valid),
        Ok(false) => AuthResult::new(AuthOutcome::InvalidSignature),
        Err(error) => {
            AuthResult::with_detail(AuthOutcome::InvalidSignature, format!("{:#}", error))
        }
    }
}

fn verify_gen1_rsa(key: &RsaPublicKey, data: &[u8], signature: &[u8]) -> AuthResult {
    match verify_pkcs1_v15_sha1(key, data, signature) {
        Ok(true) => AuthResult::new(AuthOutcome::Valid),
        Ok(false) => AuthResult::new(AuthOutcome::InvalidSignature),
        Err(error) => {
            AuthResult::with_detail(AuthOutcome::InvalidSignature, format!("{:#}", error))
        }
    }
}

fn authenticate_card(
    file: &mut RawCardFile,
    resolver: &dyn CertificateResolver,
    cancel: &CancelToken,
) -> Result<AuthSummary> {
    cancel.check()?;
    let gen1_key = gen1_card_key(file, resolver);
    cancel.check()?;
    let gen2_key = gen2_card_key(file, resolver);

    let mut summary = AuthSummary::default();
    let mut index = 1usize;
    while index < file.records.len() {
        cancel.check()?;
        if file.records[index].content_type != ContentType::Signature {
            index += 1;
            continue;
        }
        let (head, tail) = file.records.split_at_mut(index);
        let data_record = &mut head[index - 1];
        let signature_record = &mut tail[0];

        let result = match data_record.generation {
            Generation::Gen1 => gen1_key.verify_or_report(|key| {
                verify_gen1_rsa(key, &data_record.value, &signature_record.value)
            }),
            Generation::Gen2 => gen2_key.verify_or_report(|key| {
                verify_ecdsa(key, &data_record.value, &signature_record.value)
            }),
        };
        log::debug!(
            "Record {:#06x}: {:?}",
            data_record.file_id,
            result.outcome
        );
        summary.record(result.outcome);
        data_record.authentication = Some(result.clone());
        signature_record.authentication = Some(result);
        index += 1;
    }
    Ok(summary)
}

/// Locates the first record of a typed record array inside a Gen2 VU block
/// value, without building the semantic model.
fn find_gen2_array_record(value: &[u8], wanted_type: u8) -> Option<Vec<u8>> {
    let mut offset = 0usize;
    while value.len() - offset >= 5 {
        let record_type = value[offset];
        let record_size = u16::from_be_bytes([value[offset + 1], value[offset + 2]]) as usize;
        let count = u16::from_be_bytes([value[offset + 3], value[offset + 4]]) as usize;
        let payload_start = offset + 5;
        let payload_len = record_size.checked_mul(count)?;
        if value.len() - payload_start < payload_len {
            return None;
        }
        if record_type == wanted_type && count > 0 {
            return Some(value[payload_start..payload_start + record_size].to_vec());
        }
        offset = payload_start + payload_len;
    }
    None
}

fn gen1_vu_key(file: &RawVuFile, resolver: &dyn CertificateResolver) -> KeyState<RsaPublicKey> {
    let root = match resolver.root() {
        Ok(root) => root,
        Err(error) => return KeyState::Failed(AuthOutcome::MissingCertificate, error.to_string()),
    };
    let Some(root_key) = root.rsa else {
        return KeyState::Failed(
            AuthOutcome::MissingCertificate,
            "resolver has no Generation 1 root key".to_string(),
        );
    };
    let Some(overview) = file
        .records
        .iter()
        .find(|record| record.generation == Generation::Gen1 && record.trep == 0x01)
    else {
        return KeyState::Failed(
            AuthOutcome::MissingCertificate,
            "overview block with VU certificate missing".to_string(),
        );
    };
    if overview.value.len() < 2 * rsa1::GEN1_CERTIFICATE_SIZE {
        return KeyState::Failed(
            AuthOutcome::MissingCertificate,
            "overview block too short for its certificates".to_string(),
        );
    }
    let member_certificate = &overview.value[..rsa1::GEN1_CERTIFICATE_SIZE];
    let vu_certificate =
        &overview.value[rsa1::GEN1_CERTIFICATE_SIZE..2 * rsa1::GEN1_CERTIFICATE_SIZE];

    let member = match recover_certificate(member_certificate, &root_key) {
        Ok(cert) => cert,
        Err(error) => {
            return KeyState::Failed(
                AuthOutcome::UntrustedChain,
                format!("member state certificate did not verify: {:#}", error),
            )
        }
    };
    let vu = match recover_certificate(vu_certificate, &member.public_key) {
        Ok(cert) => cert,
        Err(error) => {
            return KeyState::Failed(
                AuthOutcome::UntrustedChain,
                format!("VU certificate did not verify: {:#}", error),
            )
        }
    };
    KeyState::Ready(vu.public_key)
}

fn gen2_vu_key(
    file: &RawVuFile,
    resolver: &dyn CertificateResolver,
) -> KeyState<(CurveId, Vec<u8>)> {
    let root = match resolver.root() {
        Ok(root) => root,
        Err(error) => return KeyState::Failed(AuthOutcome::MissingCertificate, error.to_string()),
    };
    let Some(root_bytes) = root.ecc else {
        return KeyState::Failed(
            AuthOutcome::MissingCertificate,
            "resolver has no Generation 2 root certificate".to_string(),
        );
    };
    let root_cert = match CvCertificate::parse(&root_bytes) {
        Ok(cert) => cert,
        Err(error) => {
            let (outcome, detail) = certificate_failure("root certificate", error);
            return KeyState::Failed(outcome, detail);
        }
    };
    let Some(overview) = file
        .records
        .iter()
        .find(|record| {
            record.generation == Generation::Gen2 && matches!(record.trep, 0x21 | 0x31)
        })
    else {
        return KeyState::Failed(
            AuthOutcome::MissingCertificate,
            "overview block with VU certificate missing".to_string(),
        );
    };

    const MEMBER_STATE_CERTIFICATE_TYPE: u8 = 0x04;
    const VU_CERTIFICATE_TYPE: u8 = 0x0F;
    let Some(member_bytes) =
        find_gen2_array_record(&overview.value, MEMBER_STATE_CERTIFICATE_TYPE)
    else {
        return KeyState::Failed(
            AuthOutcome::MissingCertificate,
            "member state certificate record array missing".to_string(),
        );
    };
    let Some(vu_bytes) = find_gen2_array_record(&overview.value, VU_CERTIFICATE_TYPE) else {
        return KeyState::Failed(
            AuthOutcome::MissingCertificate,
            "VU certificate record array missing".to_string(),
        );
    };

    let member_cert = match CvCertificate::parse(&member_bytes) {
        Ok(cert) => cert,
        Err(error) => {
            let (outcome, detail) = certificate_failure("member state certificate", error);
            return KeyState::Failed(outcome, detail);
        }
    };
    let vu_cert = match CvCertificate::parse(&vu_bytes) {
        Ok(cert) => cert,
        Err(error) => {
            let (outcome, detail) = certificate_failure("VU certificate", error);
            return KeyState::Failed(outcome, detail);
        }
    };

    if let Err((outcome, detail)) = verify_cv_link(&member_cert, &root_cert, "member state certificate") {
        return KeyState::Failed(outcome, detail);
    }
    if let Err((outcome, detail)) = verify_cv_link(&vu_cert, &member_cert, "VU certificate") {
        return KeyState::Failed(outcome, detail);
    }
    if let Err((outcome, detail)) = check_cv_validity(&vu_cert) {
        return KeyState::Failed(outcome, detail);
    }
    KeyState::Ready((vu_cert.curve, vu_cert.public_point))
}

fn authenticate_vu(
    file: &mut RawVuFile,
    resolver: &dyn CertificateResolver,
    cancel: &CancelToken,
) -> Result<AuthSummary> {
    cancel.check()?;
    let gen1_key = gen1_vu_key(file, resolver);
    cancel.check()?;
    let gen2_key = gen2_vu_key(file, resolver);

    let mut summary = AuthSummary::default();
    for record in &mut file.records {
        cancel.check()?;
        if record.signed_sections.is_empty() {
            continue;
        }
        let mut worst: Option<AuthResult> = None;
        for span in &record.signed_sections {
            let data = &record.value[span.data_start..span.data_end];
            let signature = &record.value[span.signature_start..span.signature_end];
            let result = match record.generation {
                Generation::Gen1 => {
                    gen1_key.verify_or_report(|key| verify_gen1_rsa(key, data, signature))
                }
                Generation::Gen2 => {
                    gen2_key.verify_or_report(|key| verify_ecdsa(key, data, signature))
                }
            };
            let replace = match &worst {
                None => true,
                Some(existing) => {
                    existing.outcome == AuthOutcome::Valid && result.outcome != AuthOutcome::Valid
                }
            };
            if replace {
                worst = Some(result);
            }
        }
        let result = worst.unwrap_or_else(|| AuthResult::new(AuthOutcome::NotAttempted));
        log::debug!("VU block {:#04x}: {:?}", record.trep, result.outcome);
        summary.record(result.outcome);
        record.authentication = Some(result);
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::{RawCardRecord, UnmarshalOptions};
    use ecc::tests::{build_cv_certificate, test_signing_key};
    use p256::ecdsa::signature::hazmat::PrehashSigner;
    use resolver::RootCert;
    use sha2::{Digest, Sha256};

    struct MemResolver {
        root: RootCert,
    }

    impl CertificateResolver for MemResolver {
        fn root(&self) -> Result<RootCert> {
            Ok(self.root.clone())
        }
        fn rsa_certificate(&self, chr: &KeyIdentifier) -> Result<Vec<u8>> {
            Err(Error::ResolverUnavailable {
                chr: resolver::key_identifier_hex(chr),
            })
        }
        fn ecc_certificate(&self, chr: &KeyIdentifier) -> Result<Vec<u8>> {
            Err(Error::ResolverUnavailable {
                chr: resolver::key_identifier_hex(chr),
            })
        }
    }

    fn card_record(file_id: u16, appendix: u8, value: Vec<u8>) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&file_id.to_be_bytes());
        bytes.push(appendix);
        bytes.extend_from_slice(&(value.len() as u16).to_be_bytes());
        bytes.extend_from_slice(&value);
        bytes
    }

    /// Builds a Gen2 card with a proper CV chain (root → CA → card sign) and
    /// one signed data record.
    fn gen2_card_fixture(corrupt_signature: bool) -> (RawFile, Arc<dyn CertificateResolver>) {
        let root_key = test_signing_key(0x01);
        let ca_key = test_signing_key(0x02);
        let card_key = test_signing_key(0x03);

        let root_cert = build_cv_certificate(
            b"ERCA\x00\x00\x00\x01",
            b"ERCA\x00\x00\x00\x01",
            root_key.verifying_key(),
            &root_key,
        );
        let ca_cert = build_cv_certificate(
            b"MSCA\x00\x00\x00\x01",
            b"ERCA\x00\x00\x00\x01",
            ca_key.verifying_key(),
            &root_key,
        );
        let card_cert = build_cv_certificate(
            b"CARD\x00\x00\x00\x01",
            b"MSCA\x00\x00\x00\x01",
            card_key.verifying_key(),
            &ca_key,
        );

        let data = vec![0x42u8; 17];
        let prehash = Sha256::digest(&data);
        let signature: p256::ecdsa::Signature = card_key.sign_prehash(&prehash).unwrap();
        let mut signature_bytes = signature.to_bytes().as_slice().to_vec();
        if corrupt_signature {
            signature_bytes[10] ^= 0xFF;
        }

        let mut bytes = card_record(0x0002, 0x00, vec![0u8; 25]);
        bytes.extend_from_slice(&card_record(0x0501, 0x02, data));
        bytes.extend_from_slice(&card_record(0x0501, 0x03, signature_bytes));
        bytes.extend_from_slice(&card_record(0xC101, 0x02, card_cert));
        bytes.extend_from_slice(&card_record(0xC108, 0x02, ca_cert));

        let raw = crate::raw::unmarshal(&bytes, &UnmarshalOptions::default()).unwrap();
        let resolver = Arc::new(MemResolver {
            root: RootCert {
                rsa: None,
                ecc: Some(root_cert),
            },
        });
        (raw, resolver)
    }

    /// Builds a Gen2 card whose chain and record signature use
    /// brainpoolP256r1, the predominant curve of the deployed Gen2 PKI.
    fn gen2_brainpool_card_fixture() -> (RawFile, Arc<dyn CertificateResolver>) {
        use crate::auth::brainpool;
        use crate::auth::ecc::tests::{build_cv_certificate_with, BRAINPOOL_P256_OID};
        use num_bigint::BigUint;

        let curve = brainpool::p256r1();
        let root_key = BigUint::from(0xA001u32);
        let ca_key = BigUint::from(0xA002u32);
        let card_key = BigUint::from(0xA003u32);
        let point_of = |key: &BigUint| {
            brainpool::sign_for_tests(curve, key, &BigUint::from(0x7777u32), &[0u8; 32]).0
        };
        let sign_with = |key: &BigUint, nonce: u32, body: &[u8]| {
            let prehash = Sha256::digest(body);
            brainpool::sign_for_tests(curve, key, &BigUint::from(nonce), &prehash).1
        };

        let root_cert = build_cv_certificate_with(
            b"ERCA\x00\x00\x00\x02",
            b"ERCA\x00\x00\x00\x02",
            &BRAINPOOL_P256_OID,
            &point_of(&root_key),
            |body| sign_with(&root_key, 0x3001, body),
        );
        let ca_cert = build_cv_certificate_with(
            b"MSCA\x00\x00\x00\x02",
            b"ERCA\x00\x00\x00\x02",
            &BRAINPOOL_P256_OID,
            &point_of(&ca_key),
            |body| sign_with(&root_key, 0x3002, body),
        );
        let card_cert = build_cv_certificate_with(
            b"CARD\x00\x00\x00\x02",
            b"MSCA\x00\x00\x00\x02",
            &BRAINPOOL_P256_OID,
            &point_of(&card_key),
            |body| sign_with(&ca_key, 0x3003, body),
        );

        let data = vec![0x42u8; 17];
        let prehash = Sha256::digest(&data);
        let signature =
            brainpool::sign_for_tests(curve, &card_key, &BigUint::from(0x3004u32), &prehash).1;

        let mut bytes = card_record(0x0002, 0x00, vec![0u8; 25]);
        bytes.extend_from_slice(&card_record(0x0501, 0x02, data));
        bytes.extend_from_slice(&card_record(0x0501, 0x03, signature));
        bytes.extend_from_slice(&card_record(0xC101, 0x02, card_cert));
        bytes.extend_from_slice(&card_record(0xC108, 0x02, ca_cert));

        let raw = crate::raw::unmarshal(&bytes, &UnmarshalOptions::default()).unwrap();
        let resolver = Arc::new(MemResolver {
            root: RootCert {
                rsa: None,
                ecc: Some(root_cert),
            },
        });
        (raw, resolver)
    }

    #[test]
    fn brainpool_gen2_chain_verifies_end_to_end() {
        let (raw, resolver) = gen2_brainpool_card_fixture();
        let options = AuthenticateOptions {
            resolver: Some(resolver),
        };
        let (authenticated, summary) =
            authenticate(&raw, &options, &CancelToken::new()).unwrap();
        assert_eq!(summary, AuthSummary { attempted: 1, failed: 0 });
        summary.into_result().unwrap();

        let RawFile::Card(card) = authenticated else {
            panic!("expected card file")
        };
        let data_record = card
            .records
            .iter()
            .find(|record| record.file_id == 0x0501 && !record.is_signature())
            .unwrap();
        assert_eq!(
            data_record.authentication.as_ref().unwrap().outcome,
            AuthOutcome::Valid
        );
    }

    #[test]
    fn valid_gen2_chain_marks_records_valid() {
        let (raw, resolver) = gen2_card_fixture(false);
        let options = AuthenticateOptions {
            resolver: Some(resolver),
        };
        let (authenticated, summary) =
            authenticate(&raw, &options, &CancelToken::new()).unwrap();
        assert_eq!(summary, AuthSummary { attempted: 1, failed: 0 });
        summary.into_result().unwrap();

        let RawFile::Card(card) = authenticated else {
            panic!("expected card file")
        };
        let data_record = card
            .records
            .iter()
            .find(|record| record.file_id == 0x0501 && !record.is_signature())
            .unwrap();
        assert_eq!(
            data_record.authentication.as_ref().unwrap().outcome,
            AuthOutcome::Valid
        );
        // Certificate EFs carry no signature and stay unattempted.
        let cert_record: &RawCardRecord = card
            .records
            .iter()
            .find(|record| record.file_id == 0xC101)
            .unwrap();
        assert!(cert_record.authentication.is_none());
    }

    #[test]
    fn corrupt_signature_fails_only_that_record() {
        let (raw, resolver) = gen2_card_fixture(true);
        let options = AuthenticateOptions {
            resolver: Some(resolver),
        };
        let (authenticated, summary) =
            authenticate(&raw, &options, &CancelToken::new()).unwrap();
        assert_eq!(summary.attempted, 1);
        assert_eq!(summary.failed, 1);
        assert!(matches!(
            summary.into_result(),
            Err(Error::AuthenticationFailed { failed: 1, .. })
        ));

        let RawFile::Card(card) = authenticated else {
            panic!("expected card file")
        };
        let data_record = card
            .records
            .iter()
            .find(|record| record.file_id == 0x0501 && !record.is_signature())
            .unwrap();
        assert_eq!(
            data_record.authentication.as_ref().unwrap().outcome,
            AuthOutcome::InvalidSignature
        );
    }

    #[test]
    fn missing_root_marks_missing_certificate() {
        let (raw, _) = gen2_card_fixture(false);
        let resolver = Arc::new(MemResolver {
            root: RootCert::default(),
        });
        let options = AuthenticateOptions {
            resolver: Some(resolver),
        };
        let (authenticated, summary) =
            authenticate(&raw, &options, &CancelToken::new()).unwrap();
        assert_eq!(summary.failed, 1);
        let RawFile::Card(card) = authenticated else {
            panic!("expected card file")
        };
        let data_record = card
            .records
            .iter()
            .find(|record| record.file_id == 0x0501 && !record.is_signature())
            .unwrap();
        assert_eq!(
            data_record.authentication.as_ref().unwrap().outcome,
            AuthOutcome::MissingCertificate
        );
    }

    #[test]
    fn cancellation_stops_before_any_resolution() {
        let (raw, resolver) = gen2_card_fixture(false);
        let options = AuthenticateOptions {
            resolver: Some(resolver),
        };
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(matches!(
            authenticate(&raw, &options, &cancel),
            Err(Error::Cancelled)
        ));
    }

    #[test]
    fn authenticate_clones_by_default() {
        let (raw, resolver) = gen2_card_fixture(false);
        let options = AuthenticateOptions {
            resolver: Some(resolver),
        };
        let (_, _) = authenticate(&raw, &options, &CancelToken::new()).unwrap();
        let RawFile::Card(card) = &raw else {
            panic!("expected card file")
        };
        assert!(card.records.iter().all(|r| r.authentication.is_none()));
    }
}
