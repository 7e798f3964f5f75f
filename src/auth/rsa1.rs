use anyhow::{Context, Result};
use num_bigint::BigUint;
use sha1::{Digest, Sha1};

/// Generation 1 tachograph keys are raw `modulus ‖ exponent` blobs carried
/// inside recoverable certificates, 128 + 8 bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaPublicKey {
    pub modulus: BigUint,
    pub exponent: BigUint,
}

pub const GEN1_MODULUS_SIZE: usize = 128;
pub const GEN1_EXPONENT_SIZE: usize = 8;
pub const GEN1_CERTIFICATE_SIZE: usize = 194;

impl RsaPublicKey {
    pub fn from_raw(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != GEN1_MODULUS_SIZE + GEN1_EXPONENT_SIZE {
            anyhow::bail!(
                "raw RSA key must be {} bytes, got {}",
                GEN1_MODULUS_SIZE + GEN1_EXPONENT_SIZE,
                bytes.len()
            );
        }
        Ok(RsaPublicKey {
            modulus: BigUint::from_bytes_be(&bytes[..GEN1_MODULUS_SIZE]),
            exponent: BigUint::from_bytes_be(&bytes[GEN1_MODULUS_SIZE..]),
        })
    }

    /// The raw public-key operation `input^e mod n`, left-padded back to the
    /// modulus width.
    fn public_op(&self, input: &[u8]) -> Result<Vec<u8>> {
        let value = BigUint::from_bytes_be(input);
        if value >= self.modulus {
            anyhow::bail!("signature representative is not reduced modulo n");
        }
        let result = value.modpow(&self.exponent, &self.modulus);
        let mut bytes = result.to_bytes_be();
        if bytes.len() > GEN1_MODULUS_SIZE {
            anyhow::bail!("public operation result exceeds the modulus width");
        }
        while bytes.len() < GEN1_MODULUS_SIZE {
            bytes.insert(0, 0);
        }
        Ok(bytes)
    }
}

/// Content of a recovered Generation 1 certificate (Appendix 11 CSM_017):
/// profile id, authority/holder references, validity, holder key.
#[derive(Debug, Clone)]
pub struct Gen1Certificate {
    pub certificate_profile_identifier: u8,
    pub certification_authority_reference: [u8; 8],
    pub certificate_holder_authorisation: [u8; 7],
    pub end_of_validity: [u8; 4],
    pub certificate_holder_reference: [u8; 8],
    pub public_key: RsaPublicKey,
}

/// ISO/IEC 9796-2 scheme 1 signature recovery of a 194-byte certificate:
/// 128-byte signature, 58 bytes of clear content, 8-byte CAR. The recovered
/// message is `0x6A ‖ C(106) ‖ SHA-1(C ‖ Cn') ‖ 0xBC`.
pub fn recover_certificate(certificate: &[u8], ca_key: &RsaPublicKey) -> Result<Gen1Certificate> {
    if certificate.len() != GEN1_CERTIFICATE_SIZE {
        anyhow::bail!(
            "Gen1 certificate must be {} bytes, got {}",
            GEN1_CERTIFICATE_SIZE,
            certificate.len()
        );
    }
    let signature = &certificate[..128];
    let clear_content = &certificate[128..186];

    let message = ca_key
        .public_op(signature)
        .context("Failed to recover certificate message")?;
    if message[0] != 0x6A || message[127] != 0xBC {
        anyhow::bail!(
            "recovered message has invalid framing {:#04x} .. {:#04x}",
            message[0],
            message[127]
        );
    }
    let recovered = &message[1..107];
    let digest = &message[107..127];

    let mut content = Vec::with_capacity(164);
    content.extend_from_slice(recovered);
    content.extend_from_slice(clear_content);

    let computed = Sha1::digest(&content);
    if computed.as_slice() != digest {
        anyhow::bail!("certificate content does not match its recovered digest");
    }

    let mut certification_authority_reference = [0u8; 8];
    certification_authority_reference.copy_from_slice(&content[1..9]);
    let mut certificate_holder_authorisation = [0u8; 7];
    certificate_holder_authorisation.copy_from_slice(&content[9..16]);
    let mut end_of_validity = [0u8; 4];
    end_of_validity.copy_from_slice(&content[16..20]);
    let mut certificate_holder_reference = [0u8; 8];
    certificate_holder_reference.copy_from_slice(&content[20..28]);
    let public_key = RsaPublicKey::from_raw(&content[28..164])?;

    Ok(Gen1Certificate {
        certificate_profile_identifier: content[0],
        certification_authority_reference,
        certificate_holder_authorisation,
        end_of_validity,
        certificate_holder_reference,
        public_key,
    })
}

/// DER DigestInfo prefix for SHA-1 in EMSA-PKCS1-v1_5.
const SHA1_DIGEST_INFO: [u8; 15] = [
    0x30, 0x21, 0x30, 0x09, 0x06, 0x05, 0x2B, 0x0E, 0x03, 0x02, 0x1A, 0x05, 0x00, 0x04, 0x14,
];

/// RSASSA-PKCS1-v1_5 verification with SHA-1, the Generation 1 record
/// signature scheme (CSM_034).
pub fn verify_pkcs1_v15_sha1(key: &RsaPublicKey, data: &[u8], signature: &[u8]) -> Result<bool> {
    if signature.len() != GEN1_MODULUS_SIZE {
        anyhow::bail!(
            "Gen1 record signature must be {} bytes, got {}",
            GEN1_MODULUS_SIZE,
            signature.len()
        );
    }
    let encoded = key
        .public_op(signature)
        .context("Failed to apply the public key operation")?;

    let mut expected = Vec::with_capacity(GEN1_MODULUS_SIZE);
    expected.push(0x00);
    expected.push(0x01);
    let padding = GEN1_MODULUS_SIZE - 3 - SHA1_DIGEST_INFO.len() - 20;
    expected.resize(2 + padding, 0xFF);
    expected.push(0x00);
    expected.extend_from_slice(&SHA1_DIGEST_INFO);
    expected.extend_from_slice(&Sha1::digest(data));

    Ok(encoded == expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A degenerate verification key with e = 1 turns the public operation
    /// into the identity, which lets the padding and digest checks be
    /// exercised without carrying a real 1024-bit key pair in the tree.
    fn identity_key() -> RsaPublicKey {
        RsaPublicKey {
            modulus: BigUint::from_bytes_be(&[0xFF; GEN1_MODULUS_SIZE + 1]),
            exponent: BigUint::from(1u8),
        }
    }

    fn emsa_pkcs1_sha1(data: &[u8]) -> Vec<u8> {
        let mut em = vec![0x00, 0x01];
        em.resize(GEN1_MODULUS_SIZE - 1 - SHA1_DIGEST_INFO.len() - 20, 0xFF);
        em.push(0x00);
        em.extend_from_slice(&SHA1_DIGEST_INFO);
        em.extend_from_slice(&Sha1::digest(data));
        em
    }

    #[test]
    fn accepts_well_formed_pkcs1_encoding() {
        let data = b"record bytes";
        let signature = emsa_pkcs1_sha1(data);
        assert!(verify_pkcs1_v15_sha1(&identity_key(), data, &signature).unwrap());
    }

    #[test]
    fn rejects_modified_data() {
        let signature = emsa_pkcs1_sha1(b"record bytes");
        assert!(!verify_pkcs1_v15_sha1(&identity_key(), b"tampered bytes", &signature).unwrap());
    }

    #[test]
    fn rejects_corrupted_signature() {
        let data = b"record bytes";
        let mut signature = emsa_pkcs1_sha1(data);
        signature[40] ^= 0x01;
        assert!(!verify_pkcs1_v15_sha1(&identity_key(), data, &signature).unwrap());
    }

    fn build_certificate(content: &[u8; 164]) -> Vec<u8> {
        let digest = Sha1::digest(content);
        let mut message = vec![0x6A];
        message.extend_from_slice(&content[..106]);
        message.extend_from_slice(&digest);
        message.push(0xBC);
        assert_eq!(message.len(), 128);
        let mut certificate = message; // identity key: signature == message
        certificate.extend_from_slice(&content[106..]);
        certificate.extend_from_slice(&content[1..9]); // trailing CAR
        assert_eq!(certificate.len(), GEN1_CERTIFICATE_SIZE);
        certificate
    }

    #[test]
    fn recovers_certificate_content() {
        let mut content = [0u8; 164];
        content[0] = 0x01; // profile
        content[1..9].copy_from_slice(b"EC ROOT\x01"); // CAR
        content[20..28].copy_from_slice(b"HOLDER\x00\x01"); // CHR
        content[28..156].iter_mut().for_each(|b| *b = 0xAB); // modulus
        content[163] = 0x03; // exponent

        let certificate = build_certificate(&content);
        let recovered = recover_certificate(&certificate, &identity_key()).unwrap();
        assert_eq!(recovered.certificate_profile_identifier, 0x01);
        assert_eq!(&recovered.certification_authority_reference, b"EC ROOT\x01");
        assert_eq!(&recovered.certificate_holder_reference, b"HOLDER\x00\x01");
        assert_eq!(recovered.public_key.exponent, BigUint::from(3u8));
    }

    #[test]
    fn rejects_certificate_with_bad_digest() {
        let mut content = [0u8; 164];
        content[0] = 0x01;
        let mut certificate = build_certificate(&content);
        certificate[130] ^= 0xFF; // flip a clear-content byte after signing
        assert!(recover_certificate(&certificate, &identity_key()).is_err());
    }
}
