use crate::dns::name::DomainName;
use crate::dns::rdata::sec::{
    ALGO_ECDSAP256SHA256, ALGO_RSASHA256, DIGEST_SHA1, DIGEST_SHA256,
};
use crate::dns::rdata::{DNSKEY, DS};
use crate::errors::DnsError;
use crate::util;
use p256::ecdsa::SigningKey as EcdsaSigningKey;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::pkcs8::DecodePrivateKey as _;
use rsa::pkcs1v15::SigningKey as RsaSigningKey;
use rsa::pkcs8::DecodePrivateKey as _;
use rsa::signature::{SignatureEncoding, Signer as _};
use rsa::traits::PublicKeyParts;
use serde::Deserialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::path::Path;

/**
A key file names the algorithm, the DNSKEY flags, and the private key as
base64 PKCS#8 DER:

```yaml
algorithm: 8        # 8 = RSA/SHA-256, 13 = ECDSA P-256/SHA-256
flags: 257          # 257 = KSK, 256 = ZSK
private_key: MIIEv...
```

The public half, the DNSKEY RDATA, and the key tag are derived from the
private key.
 */
#[derive(Debug, Deserialize)]
struct KeyFile {
    algorithm: u8,
    flags: u16,
    private_key: String,
}

enum PrivateKey {
    RsaSha256(RsaSigningKey<Sha256>),
    EcdsaP256(EcdsaSigningKey),
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrivateKey::RsaSha256(_) => write!(f, "PrivateKey::RsaSha256"),
            PrivateKey::EcdsaP256(_) => write!(f, "PrivateKey::EcdsaP256"),
        }
    }
}

/// One zone key: private material plus its published DNSKEY.
#[derive(Debug)]
pub struct KeyPair {
    flags: u16,
    algorithm: u8,
    key: PrivateKey,
    dnskey: DNSKEY,
}

impl KeyPair {
    pub fn load(path: &Path) -> Result<Self, DnsError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            DnsError::zone(format!("cannot read key file {}: {}", path.display(), e))
        })?;
        let file: KeyFile = serde_yaml::from_str(&text).map_err(|e| {
            DnsError::zone(format!("cannot parse key file {}: {}", path.display(), e))
        })?;
        let der = util::decode_base64(&file.private_key)?;
        Self::from_pkcs8_der(file.algorithm, file.flags, &der)
    }

    pub fn from_pkcs8_der(algorithm: u8, flags: u16, der: &[u8]) -> Result<Self, DnsError> {
        if flags & 0x0100 == 0 {
            return Err(DnsError::zone(format!(
                "DNSKEY flags {} lack the zone key bit",
                flags
            )));
        }
        let (key, public_key) = match algorithm {
            ALGO_RSASHA256 => {
                let private = rsa::RsaPrivateKey::from_pkcs8_der(der)
                    .map_err(|e| DnsError::zone(format!("bad RSA private key: {}", e)))?;
                let public = private.to_public_key();
                (
                    PrivateKey::RsaSha256(RsaSigningKey::new(private)),
                    rsa_dnskey_material(&public),
                )
            }
            ALGO_ECDSAP256SHA256 => {
                let secret = p256::SecretKey::from_pkcs8_der(der)
                    .map_err(|e| DnsError::zone(format!("bad P-256 private key: {}", e)))?;
                let point = secret.public_key().to_encoded_point(false);
                // drop the SEC1 0x04 prefix: DNSKEY carries X | Y
                let material = point.as_bytes()[1..].to_vec();
                (
                    PrivateKey::EcdsaP256(EcdsaSigningKey::from(&secret)),
                    material,
                )
            }
            other => {
                return Err(DnsError::zone(format!(
                    "unsupported DNSKEY algorithm {}",
                    other
                )))
            }
        };

        Ok(KeyPair {
            flags,
            algorithm,
            dnskey: DNSKEY::new(flags, algorithm, public_key),
            key,
        })
    }

    /// A fresh key pair, for tests and first-time setup.
    pub fn generate(algorithm: u8, flags: u16) -> Result<Self, DnsError> {
        use p256::pkcs8::EncodePrivateKey as _;
        use rsa::pkcs8::EncodePrivateKey as _;

        let mut rng = rand::thread_rng();
        let der = match algorithm {
            ALGO_RSASHA256 => rsa::RsaPrivateKey::new(&mut rng, 2048)
                .map_err(|e| DnsError::ServerFailure(format!("RSA key generation: {}", e)))?
                .to_pkcs8_der()
                .map_err(|e| DnsError::ServerFailure(format!("RSA key encoding: {}", e)))?,
            ALGO_ECDSAP256SHA256 => p256::SecretKey::random(&mut rng)
                .to_pkcs8_der()
                .map_err(|e| DnsError::ServerFailure(format!("P-256 key encoding: {}", e)))?,
            other => {
                return Err(DnsError::zone(format!(
                    "unsupported DNSKEY algorithm {}",
                    other
                )))
            }
        };
        Self::from_pkcs8_der(algorithm, flags, der.as_bytes())
    }

    pub fn flags(&self) -> u16 {
        self.flags
    }

    pub fn algorithm(&self) -> u8 {
        self.algorithm
    }

    pub fn dnskey(&self) -> &DNSKEY {
        &self.dnskey
    }

    pub fn key_tag(&self) -> u16 {
        self.dnskey.key_tag()
    }

    pub fn is_ksk(&self) -> bool {
        self.dnskey.secure_entry_point()
    }

    /// Signs the canonical octet stream. RSA emits PKCS#1 v1.5 over
    /// SHA-256 (RFC 5702); ECDSA emits the fixed-size r | s form
    /// (RFC 6605).
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, DnsError> {
        match &self.key {
            PrivateKey::RsaSha256(key) => Ok(key.sign(message).to_vec()),
            PrivateKey::EcdsaP256(key) => {
                let signature: p256::ecdsa::Signature = key.sign(message);
                Ok(signature.to_bytes().to_vec())
            }
        }
    }

    /// The DS RRset contents summarizing this key for the parent zone,
    /// with SHA-1 and SHA-256 digests over canonical owner | DNSKEY RDATA
    /// (RFC 4034 section 5.1.4).
    pub fn ds_records(&self, owner: &DomainName) -> Vec<DS> {
        let mut input = Vec::new();
        owner.canonical_wire(&mut input);
        let mut rdata = Vec::new();
        use crate::dns::rdata::RDataOperation as _;
        self.dnskey.encode(&mut rdata);
        input.extend_from_slice(&rdata);

        let sha1_digest = {
            let mut hasher = Sha1::new();
            hasher.update(&input);
            hasher.finalize().to_vec()
        };
        let sha256_digest = {
            let mut hasher = Sha256::new();
            hasher.update(&input);
            hasher.finalize().to_vec()
        };
        vec![
            DS::new(self.key_tag(), self.algorithm, DIGEST_SHA1, sha1_digest),
            DS::new(self.key_tag(), self.algorithm, DIGEST_SHA256, sha256_digest),
        ]
    }
}

/// RFC 3110 wire layout: exponent length, exponent, modulus.
fn rsa_dnskey_material(public: &rsa::RsaPublicKey) -> Vec<u8> {
    let e = public.e().to_bytes_be();
    let n = public.n().to_bytes_be();
    let mut out = Vec::with_capacity(3 + e.len() + n.len());
    if e.len() < 256 {
        out.push(e.len() as u8);
    } else {
        out.push(0);
        out.extend_from_slice(&(e.len() as u16).to_be_bytes());
    }
    out.extend_from_slice(&e);
    out.extend_from_slice(&n);
    out
}
