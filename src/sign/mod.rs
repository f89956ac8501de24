/*!
Online signing: RRSIGs are computed per response over the canonical form
of each RRset. The KSK only ever covers the apex DNSKEY RRset, the ZSK
covers everything else (RFC 4035 section 2.2).
 */

pub mod denial;
pub mod keys;
pub mod signed_zone;

use crate::dns::name::DomainName;
use crate::dns::rdata::sec::nsec3::NSEC3_FLAG_OPT_OUT;
use crate::dns::rdata::sec::NSEC3_HASH_SHA1;
use crate::dns::rdata::{RDataType, RRSig, DNSKEY};
use crate::dns::rr::RRset;
use crate::dns::{TYPE_DNSKEY, TYPE_RRSIG};
use crate::errors::DnsError;
use self::keys::KeyPair;

/// Default RRSIG inception slack: one hour back, absorbing clock skew.
pub const DEFAULT_INCEPTION_OFFSET: u32 = 3600;
/// Default RRSIG lifetime: fourteen days.
pub const DEFAULT_EXPIRATION_OFFSET: u32 = 14 * 86400;

/// DNSSEC behavior knobs carried from the command line into the zone.
#[derive(Debug, Clone)]
pub struct DnssecConfig {
    pub enable_nsec: bool,
    pub enable_nsec3: bool,
    pub salt: Vec<u8>,
    pub iterations: u16,
    pub hash_algorithm: u8,
    /// NSEC3 opt-out: leave insecure delegations out of the hashed chain.
    pub opt_out: bool,
    pub inception_offset: u32,
    pub expiration_offset: u32,
}

impl Default for DnssecConfig {
    fn default() -> Self {
        DnssecConfig {
            enable_nsec: true,
            enable_nsec3: false,
            salt: vec![0x00],
            iterations: 1,
            hash_algorithm: NSEC3_HASH_SHA1,
            opt_out: false,
            inception_offset: DEFAULT_INCEPTION_OFFSET,
            expiration_offset: DEFAULT_EXPIRATION_OFFSET,
        }
    }
}

impl DnssecConfig {
    pub fn nsec3_flags(&self) -> u8 {
        if self.opt_out {
            NSEC3_FLAG_OPT_OUT
        } else {
            0
        }
    }
}

/// Holds the zone's two keys and produces RRSIGs on demand. Stateless per
/// signature, so concurrent queries sign without locking.
#[derive(Debug)]
pub struct Signer {
    apex: DomainName,
    ksk: KeyPair,
    zsk: KeyPair,
    inception_offset: u32,
    expiration_offset: u32,
}

impl Signer {
    pub fn new(
        apex: DomainName,
        ksk: KeyPair,
        zsk: KeyPair,
        config: &DnssecConfig,
    ) -> Result<Self, DnsError> {
        if !ksk.is_ksk() {
            return Err(DnsError::zone(format!(
                "KSK must carry flags 257, got {}",
                ksk.flags()
            )));
        }
        if zsk.is_ksk() {
            return Err(DnsError::zone(format!(
                "ZSK must carry flags 256, got {}",
                zsk.flags()
            )));
        }
        Ok(Signer {
            apex,
            ksk,
            zsk,
            inception_offset: config.inception_offset,
            expiration_offset: config.expiration_offset,
        })
    }

    pub fn ksk(&self) -> &KeyPair {
        &self.ksk
    }

    pub fn zsk(&self) -> &KeyPair {
        &self.zsk
    }

    fn key_for(&self, rrset: &RRset) -> &KeyPair {
        if rrset.typ() == TYPE_DNSKEY && *rrset.owner() == self.apex {
            &self.ksk
        } else {
            &self.zsk
        }
    }

    /**
    Signs one RRset, returning its RRSIG RRset. The signed stream is

    ```shell
    RRSIG_RDATA (minus signature) | RR(1) | RR(2)...
    RR(i) = canonical_owner | type | class | TTL | rdlength | canonical_rdata
    ```

    with members in canonical order (RFC 4034 section 3.1.8.1). For a
    wildcard-sourced RRset the caller passes the source set (owner
    `*.<encloser>`); the labels field counts the wildcard's labels minus
    the asterisk, which is what tells validators an expansion happened.
    */
    pub fn sign_rrset(&self, rrset: &RRset, now: u32) -> Result<RRset, DnsError> {
        let key = self.key_for(rrset);
        let owner = rrset.owner();
        let labels = owner.label_count() as u8 - if owner.is_wildcard() { 1 } else { 0 };

        let mut rrsig = RRSig {
            type_covered: rrset.typ(),
            algorithm: key.algorithm(),
            labels,
            original_ttl: rrset.ttl(),
            expiration: now.wrapping_add(self.expiration_offset),
            inception: now.wrapping_sub(self.inception_offset),
            key_tag: key.key_tag(),
            signer: self.apex.clone(),
            signature: Vec::new(),
        };

        let message = signed_stream(&rrsig, rrset);
        rrsig.signature = key.sign(&message)?;

        let mut out = RRset::new(owner.clone(), TYPE_RRSIG, rrset.class(), rrset.ttl());
        out.push(RDataType::RRSig(rrsig));
        Ok(out)
    }
}

/// The octet stream a signature covers.
fn signed_stream(rrsig: &RRSig, rrset: &RRset) -> Vec<u8> {
    let mut message = rrsig.signed_prefix();
    let mut owner_wire = Vec::new();
    rrset.owner().canonical_wire(&mut owner_wire);
    for rdata in rrset.canonical_rdatas() {
        message.extend_from_slice(&owner_wire);
        message.extend_from_slice(&rrset.typ().to_be_bytes());
        message.extend_from_slice(&rrset.class().to_be_bytes());
        message.extend_from_slice(&rrsig.original_ttl.to_be_bytes());
        message.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
        message.extend_from_slice(&rdata);
    }
    message
}

/**
Verifies an RRSIG over `rrset` against a published DNSKEY. The server
never consumes foreign signatures; this exists so signing is testable
end to end and key mismatches surface as errors, not silence.
*/
pub fn verify_rrset(
    dnskey: &DNSKEY,
    rrsig: &RRSig,
    rrset: &RRset,
    now: u32,
) -> Result<(), DnsError> {
    use crate::dns::rdata::sec::{ALGO_ECDSAP256SHA256, ALGO_RSASHA256};

    if !rrsig.valid_at(now) {
        return Err(DnsError::ServerFailure(format!(
            "signature outside its validity window at {}",
            now
        )));
    }
    if rrsig.key_tag != dnskey.key_tag() || rrsig.algorithm != dnskey.algorithm {
        return Err(DnsError::ServerFailure(
            "signature does not reference this DNSKEY".to_string(),
        ));
    }

    let message = signed_stream(rrsig, rrset);
    match rrsig.algorithm {
        ALGO_RSASHA256 => {
            use rsa::signature::Verifier as _;
            let public = rsa_public_from_dnskey(dnskey)?;
            let verifier = rsa::pkcs1v15::VerifyingKey::<sha2::Sha256>::new(public);
            let signature = rsa::pkcs1v15::Signature::try_from(rrsig.signature.as_slice())
                .map_err(|e| DnsError::ServerFailure(format!("bad RSA signature: {}", e)))?;
            verifier
                .verify(&message, &signature)
                .map_err(|e| DnsError::ServerFailure(format!("RSA verification: {}", e)))
        }
        ALGO_ECDSAP256SHA256 => {
            use p256::ecdsa::signature::Verifier as _;
            let mut point = vec![0x04];
            point.extend_from_slice(&dnskey.public_key);
            let verifier = p256::ecdsa::VerifyingKey::from_sec1_bytes(&point)
                .map_err(|e| DnsError::ServerFailure(format!("bad P-256 public key: {}", e)))?;
            let signature = p256::ecdsa::Signature::from_slice(&rrsig.signature)
                .map_err(|e| DnsError::ServerFailure(format!("bad P-256 signature: {}", e)))?;
            verifier
                .verify(&message, &signature)
                .map_err(|e| DnsError::ServerFailure(format!("P-256 verification: {}", e)))
        }
        other => Err(DnsError::ServerFailure(format!(
            "unsupported signature algorithm {}",
            other
        ))),
    }
}

/// Rebuilds an RSA public key from the RFC 3110 DNSKEY material.
fn rsa_public_from_dnskey(dnskey: &DNSKEY) -> Result<rsa::RsaPublicKey, DnsError> {
    let material = &dnskey.public_key;
    if material.is_empty() {
        return Err(DnsError::ServerFailure("empty RSA key material".to_string()));
    }
    let (e_len, e_start) = if material[0] != 0 {
        (material[0] as usize, 1)
    } else {
        if material.len() < 3 {
            return Err(DnsError::ServerFailure("truncated RSA exponent".to_string()));
        }
        (
            u16::from_be_bytes([material[1], material[2]]) as usize,
            3,
        )
    };
    if material.len() < e_start + e_len + 1 {
        return Err(DnsError::ServerFailure("truncated RSA key".to_string()));
    }
    let e = rsa::BigUint::from_bytes_be(&material[e_start..e_start + e_len]);
    let n = rsa::BigUint::from_bytes_be(&material[e_start + e_len..]);
    rsa::RsaPublicKey::new(n, e)
        .map_err(|e| DnsError::ServerFailure(format!("bad RSA public key: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::rdata::sec::dnskey::{FLAGS_KSK, FLAGS_ZSK};
    use crate::dns::rdata::sec::{ALGO_ECDSAP256SHA256, ALGO_RSASHA256};
    use crate::dns::rdata::A;
    use crate::dns::{CLASS_IN, TYPE_A};
    use crate::util;
    use std::net::Ipv4Addr;

    fn name(text: &str) -> DomainName {
        DomainName::from_text(text, None).unwrap()
    }

    fn signer(algorithm: u8) -> Signer {
        Signer::new(
            name("example.com."),
            KeyPair::generate(algorithm, FLAGS_KSK).unwrap(),
            KeyPair::generate(algorithm, FLAGS_ZSK).unwrap(),
            &DnssecConfig::default(),
        )
        .unwrap()
    }

    fn a_rrset(owner: &str) -> RRset {
        let mut rrset = RRset::new(name(owner), TYPE_A, CLASS_IN, 3600);
        rrset.push(RDataType::A(A::new(Ipv4Addr::new(192, 168, 0, 102))));
        rrset.push(RDataType::A(A::new(Ipv4Addr::new(192, 168, 0, 101))));
        rrset
    }

    fn extract(rrsig_rrset: &RRset) -> &RRSig {
        match rrsig_rrset.first() {
            Some(RDataType::RRSig(rrsig)) => rrsig,
            other => panic!("expected RRSIG rdata, got {:?}", other),
        }
    }

    #[test]
    fn test_rsa_sign_and_verify() {
        let signer = signer(ALGO_RSASHA256);
        let rrset = a_rrset("www.example.com.");
        let now = util::now_epoch();

        let rrsig_rrset = signer.sign_rrset(&rrset, now).unwrap();
        let rrsig = extract(&rrsig_rrset);
        assert_eq!(TYPE_A, rrsig.type_covered);
        assert_eq!(3, rrsig.labels);
        assert_eq!(signer.zsk().key_tag(), rrsig.key_tag);

        verify_rrset(signer.zsk().dnskey(), rrsig, &rrset, now).unwrap();
    }

    #[test]
    fn test_ecdsa_sign_and_verify() {
        let signer = signer(ALGO_ECDSAP256SHA256);
        let rrset = a_rrset("www.example.com.");
        let now = util::now_epoch();

        let rrsig_rrset = signer.sign_rrset(&rrset, now).unwrap();
        let rrsig = extract(&rrsig_rrset);
        assert_eq!(64, rrsig.signature.len());
        verify_rrset(signer.zsk().dnskey(), rrsig, &rrset, now).unwrap();
    }

    #[test]
    fn test_verification_fails_for_tampered_rrset() {
        let signer = signer(ALGO_ECDSAP256SHA256);
        let rrset = a_rrset("www.example.com.");
        let now = util::now_epoch();
        let rrsig_rrset = signer.sign_rrset(&rrset, now).unwrap();
        let rrsig = extract(&rrsig_rrset);

        let tampered = a_rrset("evil.example.com.");
        assert!(verify_rrset(signer.zsk().dnskey(), rrsig, &tampered, now).is_err());
    }

    #[test]
    fn test_verification_respects_window() {
        let signer = signer(ALGO_ECDSAP256SHA256);
        let rrset = a_rrset("www.example.com.");
        let now = util::now_epoch();
        let rrsig_rrset = signer.sign_rrset(&rrset, now).unwrap();
        let rrsig = extract(&rrsig_rrset);

        assert_eq!(now.wrapping_sub(DEFAULT_INCEPTION_OFFSET), rrsig.inception);
        assert_eq!(now.wrapping_add(DEFAULT_EXPIRATION_OFFSET), rrsig.expiration);
        let too_late = rrsig.expiration.wrapping_add(1);
        assert!(verify_rrset(signer.zsk().dnskey(), rrsig, &rrset, too_late).is_err());
    }

    #[test]
    fn test_dnskey_rrset_is_signed_by_ksk() {
        let signer = signer(ALGO_ECDSAP256SHA256);
        let mut dnskeys = RRset::new(name("example.com."), TYPE_DNSKEY, CLASS_IN, 3600);
        dnskeys.push(RDataType::DNSKEY(signer.ksk().dnskey().clone()));
        dnskeys.push(RDataType::DNSKEY(signer.zsk().dnskey().clone()));
        let now = util::now_epoch();

        let rrsig_rrset = signer.sign_rrset(&dnskeys, now).unwrap();
        let rrsig = extract(&rrsig_rrset);
        assert_eq!(signer.ksk().key_tag(), rrsig.key_tag);
        verify_rrset(signer.ksk().dnskey(), rrsig, &dnskeys, now).unwrap();
    }

    #[test]
    fn test_wildcard_labels_count_source() {
        let signer = signer(ALGO_ECDSAP256SHA256);
        let rrset = a_rrset("*.wild.example.com.");
        let rrsig_rrset = signer.sign_rrset(&rrset, util::now_epoch()).unwrap();
        // *.wild.example.com. has 4 labels, the wildcard does not count
        assert_eq!(3, extract(&rrsig_rrset).labels);
    }

    #[test]
    fn test_signer_rejects_swapped_keys() {
        let ksk = KeyPair::generate(ALGO_ECDSAP256SHA256, FLAGS_ZSK).unwrap();
        let zsk = KeyPair::generate(ALGO_ECDSAP256SHA256, FLAGS_KSK).unwrap();
        assert!(Signer::new(name("example.com."), ksk, zsk, &DnssecConfig::default()).is_err());
    }
}
