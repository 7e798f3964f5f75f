use super::brainpool;
use anyhow::{Context, Result};
use sha2::{Digest, Sha256, Sha384, Sha512};

/// Curves admitted by Appendix 11 CSM_50, recognized from the domain
/// parameter OID inside the certificate's public key template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveId {
    NistP256,
    NistP384,
    NistP521,
    BrainpoolP256,
    BrainpoolP384,
    BrainpoolP512,
}

impl CurveId {
    pub fn from_oid(oid: &[u8]) -> Option<Self> {
        match oid {
            [0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x03, 0x01, 0x07] => Some(Self::NistP256),
            [0x2B, 0x81, 0x04, 0x00, 0x22] => Some(Self::NistP384),
            [0x2B, 0x81, 0x04, 0x00, 0x23] => Some(Self::NistP521),
            [0x2B, 0x24, 0x03, 0x03, 0x02, 0x08, 0x01, 0x01, 0x07] => Some(Self::BrainpoolP256),
            [0x2B, 0x24, 0x03, 0x03, 0x02, 0x08, 0x01, 0x01, 0x0B] => Some(Self::BrainpoolP384),
            [0x2B, 0x24, 0x03, 0x03, 0x02, 0x08, 0x01, 0x01, 0x0D] => Some(Self::BrainpoolP512),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::NistP256 => "NIST P-256",
            Self::NistP384 => "NIST P-384",
            Self::NistP521 => "NIST P-521",
            Self::BrainpoolP256 => "brainpoolP256r1",
            Self::BrainpoolP384 => "brainpoolP384r1",
            Self::BrainpoolP512 => "brainpoolP512r1",
        }
    }

    /// CSM_50 hash selection: the digest width follows the curve width.
    pub fn hash(&self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::NistP256 | Self::BrainpoolP256 => Sha256::digest(data).to_vec(),
            Self::NistP384 | Self::BrainpoolP384 => Sha384::digest(data).to_vec(),
            Self::NistP521 | Self::BrainpoolP512 => Sha512::digest(data).to_vec(),
        }
    }

    /// Verifies a plain `r ‖ s` ECDSA signature over `data`, hashing per
    /// CSM_50 first. NIST curves go through the RustCrypto verifiers, the
    /// Brainpool curves through the in-tree arithmetic.
    pub fn verify(&self, public_point: &[u8], data: &[u8], signature: &[u8]) -> Result<bool> {
        let prehash = self.hash(data);
        match self {
            Self::NistP256 => {
                use p256::ecdsa::signature::hazmat::PrehashVerifier;
                let key = p256::ecdsa::VerifyingKey::from_sec1_bytes(public_point)
                    .context("Failed to decode P-256 public point")?;
                let signature = p256::ecdsa::Signature::from_slice(signature)
                    .context("Failed to decode P-256 signature")?;
                Ok(key.verify_prehash(&prehash, &signature).is_ok())
            }
            Self::NistP384 => {
                use p384::ecdsa::signature::hazmat::PrehashVerifier;
                let key = p384::ecdsa::VerifyingKey::from_sec1_bytes(public_point)
                    .context("Failed to decode P-384 public point")?;
                let signature = p384::ecdsa::Signature::from_slice(signature)
                    .context("Failed to decode P-384 signature")?;
                Ok(key.verify_prehash(&prehash, &signature).is_ok())
            }
            Self::NistP521 => {
                use p521::ecdsa::signature::hazmat::PrehashVerifier;
                let key = p521::ecdsa::VerifyingKey::from_sec1_bytes(public_point)
                    .context("Failed to decode P-521 public point")?;
                let signature = p521::ecdsa::Signature::from_slice(signature)
                    .context("Failed to decode P-521 signature")?;
                Ok(key.verify_prehash(&prehash, &signature).is_ok())
            }
            Self::BrainpoolP256 => brainpool::p256r1().verify(public_point, &prehash, signature),
            Self::BrainpoolP384 => brainpool::p384r1().verify(public_point, &prehash, signature),
            Self::BrainpoolP512 => brainpool::p512r1().verify(public_point, &prehash, signature),
        }
    }
}

/// A card-verifiable certificate (DER, outer tag 0x7F21) as used by the
/// Generation 2 PKI: a body template 0x7F4E and an ECDSA signature 0x5F37.
#[derive(Debug, Clone)]
pub struct CvCertificate {
    pub certificate_profile_identifier: u8,
    pub certification_authority_reference: [u8; 8],
    pub certificate_holder_authorisation: Vec<u8>,
    pub curve: CurveId,
    pub public_point: Vec<u8>,
    pub certificate_holder_reference: [u8; 8],
    pub effective_date: [u8; 4],
    pub expiration_date: [u8; 4],
    /// The complete encoded body (tag and length included): the ECDSA
    /// signature is computed over these bytes.
    pub body: Vec<u8>,
    pub signature: Vec<u8>,
}

/// Reads one DER TLV, handling two-byte tags (high-tag-number form) and
/// one/two-byte long-form lengths. Returns (tag, value, total length).
fn read_tlv(bytes: &[u8]) -> Result<(u16, &[u8], usize)> {
    if bytes.is_empty() {
        anyhow::bail!("empty TLV window");
    }
    let (tag, tag_len) = if bytes[0] & 0x1F == 0x1F {
        if bytes.len() < 2 {
            anyhow::bail!("truncated two-byte tag");
        }
        (u16::from_be_bytes([bytes[0], bytes[1]]), 2)
    } else {
        (bytes[0] as u16, 1)
    };
    let rest = &bytes[tag_len..];
    if rest.is_empty() {
        anyhow::bail!("missing length octet");
    }
    let (length, len_len) = match rest[0] {
        0x81 => {
            if rest.len() < 2 {
                anyhow::bail!("truncated long-form length");
            }
            (rest[1] as usize, 2)
        }
        0x82 => {
            if rest.len() < 3 {
                anyhow::bail!("truncated long-form length");
            }
            (u16::from_be_bytes([rest[1], rest[2]]) as usize, 3)
        }
        short if short < 0x80 => (short as usize, 1),
        other => anyhow::bail!("unsupported length octet {:#04x}", other),
    };
    let header = tag_len + len_len;
    if bytes.len() < header + length {
        anyhow::bail!(
            "TLV {:#06x} declares {} bytes, {} remain",
            tag,
            length,
            bytes.len() - header
        );
    }
    Ok((tag, &bytes[header..header + length], header + length))
}

fn expect_tlv<'a>(bytes: &'a [u8], expected_tag: u16) -> Result<(&'a [u8], usize)> {
    let (tag, value, consumed) = read_tlv(bytes)?;
    if tag != expected_tag {
        anyhow::bail!("expected tag {:#06x}, found {:#06x}", expected_tag, tag);
    }
    Ok((value, consumed))
}

const TAG_CV_CERTIFICATE: u16 = 0x7F21;
const TAG_CERTIFICATE_BODY: u16 = 0x7F4E;
const TAG_SIGNATURE: u16 = 0x5F37;
const TAG_PROFILE_IDENTIFIER: u16 = 0x5F29;
const TAG_CAR: u16 = 0x42;
const TAG_CHA: u16 = 0x5F4C;
const TAG_PUBLIC_KEY: u16 = 0x7F49;
const TAG_OID: u16 = 0x06;
const TAG_PUBLIC_POINT: u16 = 0x86;
const TAG_CHR: u16 = 0x5F20;
const TAG_EFFECTIVE_DATE: u16 = 0x5F25;
const TAG_EXPIRATION_DATE: u16 = 0x5F24;

impl CvCertificate {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let (outer, _) = expect_tlv(bytes, TAG_CV_CERTIFICATE)
            .context("certificate is not a CV certificate template")?;

        let (body_value, body_total) = expect_tlv(outer, TAG_CERTIFICATE_BODY)
            .context("certificate body missing")?;
        let body = outer[..body_total].to_vec();

        let (signature, _) = expect_tlv(&outer[body_total..], TAG_SIGNATURE)
            .context("certificate signature missing")?;

        let mut offset = 0usize;
        let mut profile = None;
        let mut car = None;
        let mut cha = None;
        let mut curve = None;
        let mut public_point = None;
        let mut chr = None;
        let mut effective_date = [0u8; 4];
        let mut expiration_date = [0u8; 4];

        while offset < body_value.len() {
            let (tag, value, consumed) = read_tlv(&body_value[offset..])?;
            match tag {
                TAG_PROFILE_IDENTIFIER => {
                    profile = value.first().copied();
                }
                TAG_CAR => {
                    car = Some(to_reference(value).context("malformed CAR")?);
                }
                TAG_CHA => {
                    cha = Some(value.to_vec());
                }
                TAG_PUBLIC_KEY => {
                    let mut inner = 0usize;
                    while inner < value.len() {
                        let (inner_tag, inner_value, inner_consumed) = read_tlv(&value[inner..])?;
                        match inner_tag {
                            TAG_OID => {
                                curve = Some(CurveId::from_oid(inner_value).ok_or_else(|| {
                                    crate::error::Error::UnsupportedCurve {
                                        oid: inner_value
                                            .iter()
                                            .map(|b| format!("{:02X}", b))
                                            .collect::<String>(),
                                    }
                                })?);
                            }
                            TAG_PUBLIC_POINT => public_point = Some(inner_value.to_vec()),
                            _ => {}
                        }
                        inner += inner_consumed;
                    }
                }
                TAG_CHR => {
                    chr = Some(to_reference(value).context("malformed CHR")?);
                }
                TAG_EFFECTIVE_DATE => {
                    if value.len() == 4 {
                        effective_date.copy_from_slice(value);
                    }
                }
                TAG_EXPIRATION_DATE => {
                    if value.len() == 4 {
                        expiration_date.copy_from_slice(value);
                    }
                }
                other => log::debug!("Skipping certificate body tag {:#06x}", other),
            }
            offset += consumed;
        }

        Ok(CvCertificate {
            certificate_profile_identifier: profile.context("profile identifier missing")?,
            certification_authority_reference: car.context("CAR missing")?,
            certificate_holder_authorisation: cha.context("CHA missing")?,
            curve: curve.context("domain parameters missing")?,
            public_point: public_point.context("public point missing")?,
            certificate_holder_reference: chr.context("CHR missing")?,
            effective_date,
            expiration_date,
            body,
            signature: signature.to_vec(),
        })
    }

    /// Verifies this certificate's signature with the issuer's key.
    pub fn verify_with(&self, issuer_curve: CurveId, issuer_point: &[u8]) -> Result<bool> {
        issuer_curve.verify(issuer_point, &self.body, &self.signature)
    }

    pub fn is_self_signed(&self) -> bool {
        self.certification_authority_reference == self.certificate_holder_reference
    }
}

fn to_reference(value: &[u8]) -> Result<[u8; 8]> {
    if value.len() != 8 {
        anyhow::bail!("key reference must be 8 bytes, got {}", value.len());
    }
    let mut reference = [0u8; 8];
    reference.copy_from_slice(value);
    Ok(reference)
}

/// DER helper used by the test fixtures and the embedded-root tooling.
pub fn write_tlv(out: &mut Vec<u8>, tag: u16, value: &[u8]) {
    if tag > 0xFF {
        out.extend_from_slice(&tag.to_be_bytes());
    } else {
        out.push(tag as u8);
    }
    match value.len() {
        len if len < 0x80 => out.push(len as u8),
        len if len <= 0xFF => {
            out.push(0x81);
            out.push(len as u8);
        }
        len => {
            out.push(0x82);
            out.extend_from_slice(&(len as u16).to_be_bytes());
        }
    }
    out.extend_from_slice(value);
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use p256::ecdsa::signature::hazmat::PrehashSigner;
    use p256::ecdsa::{Signature, SigningKey, VerifyingKey};

    pub(crate) fn test_signing_key(seed: u8) -> SigningKey {
        let mut scalar = [0u8; 32];
        scalar[31] = seed;
        scalar[0] = 0x01;
        SigningKey::from_slice(&scalar).unwrap()
    }

    pub(crate) const NIST_P256_OID: [u8; 8] = [0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x03, 0x01, 0x07];
    pub(crate) const BRAINPOOL_P256_OID: [u8; 9] =
        [0x2B, 0x24, 0x03, 0x03, 0x02, 0x08, 0x01, 0x01, 0x07];

    /// Assembles a CV certificate template around the given holder key and
    /// hands the encoded body to the caller's signer.
    pub(crate) fn build_cv_certificate_with(
        holder: &[u8; 8],
        issuer: &[u8; 8],
        curve_oid: &[u8],
        holder_point: &[u8],
        sign_body: impl FnOnce(&[u8]) -> Vec<u8>,
    ) -> Vec<u8> {
        let mut body_value = Vec::new();
        write_tlv(&mut body_value, TAG_PROFILE_IDENTIFIER, &[0x00]);
        write_tlv(&mut body_value, TAG_CAR, issuer);
        write_tlv(&mut body_value, TAG_CHA, &[0xFF, 0x53, 0x4D, 0x52, 0x44, 0x54, 0x01]);
        let mut public_key = Vec::new();
        write_tlv(&mut public_key, TAG_OID, curve_oid);
        write_tlv(&mut public_key, TAG_PUBLIC_POINT, holder_point);
        write_tlv(&mut body_value, TAG_PUBLIC_KEY, &public_key);
        write_tlv(&mut body_value, TAG_CHR, holder);
        write_tlv(&mut body_value, TAG_EFFECTIVE_DATE, &[0x5E, 0x0B, 0xE1, 0x00]);
        write_tlv(&mut body_value, TAG_EXPIRATION_DATE, &[0x7F, 0xFF, 0xFF, 0xFF]);

        let mut body = Vec::new();
        write_tlv(&mut body, TAG_CERTIFICATE_BODY, &body_value);

        let signature = sign_body(&body);
        let mut outer = body;
        write_tlv(&mut outer, TAG_SIGNATURE, &signature);

        let mut certificate = Vec::new();
        write_tlv(&mut certificate, TAG_CV_CERTIFICATE, &outer);
        certificate
    }

    pub(crate) fn build_cv_certificate(
        holder: &[u8; 8],
        issuer: &[u8; 8],
        holder_key: &VerifyingKey,
        issuer_key: &SigningKey,
    ) -> Vec<u8> {
        build_cv_certificate_with(
            holder,
            issuer,
            &NIST_P256_OID,
            holder_key.to_encoded_point(false).as_bytes(),
            |body| {
                let prehash = Sha256::digest(body);
                let signature: Signature = issuer_key.sign_prehash(&prehash).unwrap();
                signature.to_bytes().as_slice().to_vec()
            },
        )
    }

    #[test]
    fn parses_and_verifies_a_chain_link() {
        let issuer = test_signing_key(0x11);
        let holder = test_signing_key(0x22);
        let bytes = build_cv_certificate(
            b"HOLDER\x00\x01",
            b"ISSUER\x00\x01",
            holder.verifying_key(),
            &issuer,
        );

        let certificate = CvCertificate::parse(&bytes).unwrap();
        assert_eq!(&certificate.certificate_holder_reference, b"HOLDER\x00\x01");
        assert_eq!(&certificate.certification_authority_reference, b"ISSUER\x00\x01");
        assert_eq!(certificate.curve, CurveId::NistP256);

        let issuer_point = issuer
            .verifying_key()
            .to_encoded_point(false)
            .as_bytes()
            .to_vec();
        assert!(certificate
            .verify_with(CurveId::NistP256, &issuer_point)
            .unwrap());

        // A wrong issuer key must not verify.
        let wrong = test_signing_key(0x33);
        let wrong_point = wrong
            .verifying_key()
            .to_encoded_point(false)
            .as_bytes()
            .to_vec();
        assert!(!certificate
            .verify_with(CurveId::NistP256, &wrong_point)
            .unwrap());
    }

    #[test]
    fn brainpool_chain_link_parses_and_verifies() {
        use crate::auth::brainpool;
        use num_bigint::BigUint;

        assert_eq!(
            CurveId::from_oid(&BRAINPOOL_P256_OID),
            Some(CurveId::BrainpoolP256)
        );

        let curve = brainpool::p256r1();
        // Any valid point serves as the holder key; derive one from a scalar.
        let (holder_point, _) = brainpool::sign_for_tests(
            curve,
            &BigUint::from(7u8),
            &BigUint::from(11u8),
            &[0u8; 32],
        );

        let issuer_private = BigUint::from(0x1357_9BDFu64);
        let mut issuer_point = Vec::new();
        let bytes = build_cv_certificate_with(
            b"HOLDER\x00\x02",
            b"ISSUER\x00\x02",
            &BRAINPOOL_P256_OID,
            &holder_point,
            |body| {
                let prehash = Sha256::digest(body);
                let (point, signature) = brainpool::sign_for_tests(
                    curve,
                    &issuer_private,
                    &BigUint::from(0x2468_ACE1u64),
                    &prehash,
                );
                issuer_point = point;
                signature
            },
        );

        let certificate = CvCertificate::parse(&bytes).unwrap();
        assert_eq!(certificate.curve, CurveId::BrainpoolP256);
        assert!(certificate
            .verify_with(CurveId::BrainpoolP256, &issuer_point)
            .unwrap());

        // Tampering with the signed body must fail verification.
        let mut mangled = certificate.clone();
        mangled.body[10] ^= 0x01;
        assert!(!mangled
            .verify_with(CurveId::BrainpoolP256, &issuer_point)
            .unwrap());
    }

    #[test]
    fn tlv_reader_handles_long_form_lengths() {
        let mut bytes = Vec::new();
        write_tlv(&mut bytes, 0x7F21, &vec![0xAB; 0x1234]);
        let (tag, value, consumed) = read_tlv(&bytes).unwrap();
        assert_eq!(tag, 0x7F21);
        assert_eq!(value.len(), 0x1234);
        assert_eq!(consumed, bytes.len());
    }
}
