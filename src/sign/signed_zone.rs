use super::denial::{Nsec3Chain, NsecChain};
use super::keys::KeyPair;
use super::{DnssecConfig, Signer};
use crate::dns::name::DomainName;
use crate::dns::rdata::{NSec3Param, RDataType};
use crate::dns::rr::RRset;
use crate::dns::{CLASS_IN, TYPE_DNSKEY, TYPE_DS, TYPE_NSEC3PARAM};
use crate::errors::DnsError;
use crate::zone::{Denial, Zone};

/**
A zone plus everything DNSSEC adds to it: the two keys, the DS set for
the parent, and a precomputed denial chain. Setup publishes the DNSKEY
RRset (and NSEC3PARAM when hashed denial is on) into the apex before
the chains are built, so the denial bitmaps see them.

Records are signed per response; the chains and the tree never change
after load.
 */
#[derive(Debug)]
pub struct SignedZone {
    zone: Zone,
    signer: Signer,
    config: DnssecConfig,
    nsec: Option<NsecChain>,
    nsec3: Option<Nsec3Chain>,
    ds: RRset,
}

impl SignedZone {
    pub fn new(
        mut zone: Zone,
        ksk: KeyPair,
        zsk: KeyPair,
        config: DnssecConfig,
    ) -> Result<Self, DnsError> {
        zone.validate()?;
        let apex = zone.apex().clone();
        let signer = Signer::new(apex.clone(), ksk, zsk, &config)?;
        let apex_ttl = zone.soa()?.ttl();

        let mut dnskeys = RRset::new(apex.clone(), TYPE_DNSKEY, CLASS_IN, apex_ttl);
        dnskeys.push(RDataType::DNSKEY(signer.ksk().dnskey().clone()));
        dnskeys.push(RDataType::DNSKEY(signer.zsk().dnskey().clone()));
        zone.add(dnskeys)?;

        if config.enable_nsec3 {
            let mut param = RRset::new(apex.clone(), TYPE_NSEC3PARAM, CLASS_IN, apex_ttl);
            param.push(RDataType::NSec3Param(NSec3Param::new(
                config.hash_algorithm,
                0,
                config.iterations,
                config.salt.clone(),
            )));
            zone.add(param)?;
        }

        let nsec3 = if config.enable_nsec3 {
            Some(Nsec3Chain::build(&zone, &config)?)
        } else {
            None
        };
        let nsec = if config.enable_nsec && nsec3.is_none() {
            Some(NsecChain::build(&zone))
        } else {
            None
        };

        let mut ds = RRset::new(apex.clone(), TYPE_DS, CLASS_IN, apex_ttl);
        for record in signer.ksk().ds_records(&apex) {
            ds.push(RDataType::DS(record));
        }

        Ok(SignedZone {
            zone,
            signer,
            config,
            nsec,
            nsec3,
            ds,
        })
    }

    pub fn zone(&self) -> &Zone {
        &self.zone
    }

    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    pub fn config(&self) -> &DnssecConfig {
        &self.config
    }

    /// The DS RRset (SHA-1 and SHA-256 digests of the KSK) printed at
    /// startup for upload to the parent.
    pub fn ds_records(&self) -> &RRset {
        &self.ds
    }

    pub fn sign_rrset(&self, rrset: &RRset, now: u32) -> Result<RRset, DnsError> {
        self.signer.sign_rrset(rrset, now)
    }

    /// Renders one denial requirement into the NSEC or NSEC3 RRsets that
    /// prove it, per sections 3.1.3 of RFC 4035 and 7.2 of RFC 5155.
    pub fn denial_rrsets(&self, denial: &Denial) -> Vec<RRset> {
        let mut proofs: Vec<RRset> = Vec::new();
        let push = |rrset: Option<&RRset>, proofs: &mut Vec<RRset>| {
            if let Some(rrset) = rrset {
                if !proofs.iter().any(|p| p.owner() == rrset.owner()) {
                    proofs.push(rrset.clone());
                }
            }
        };

        if let Some(chain) = &self.nsec {
            match denial {
                Denial::NxDomain {
                    qname,
                    closest_encloser,
                    ..
                } => {
                    push(chain.covering(qname), &mut proofs);
                    push(chain.covering(&closest_encloser.wildcard()), &mut proofs);
                }
                Denial::NoData { owner, .. } => {
                    push(chain.matching(owner), &mut proofs);
                }
                Denial::WildcardAnswer { next_closer, .. } => {
                    push(chain.covering(next_closer), &mut proofs);
                }
            }
        } else if let Some(chain) = &self.nsec3 {
            match denial {
                Denial::NxDomain {
                    closest_encloser,
                    next_closer,
                    ..
                } => {
                    push(chain.matching(closest_encloser), &mut proofs);
                    push(chain.covering(next_closer), &mut proofs);
                    push(chain.covering(&closest_encloser.wildcard()), &mut proofs);
                }
                Denial::NoData { owner, .. } => match chain.matching(owner) {
                    Some(rrset) => push(Some(rrset), &mut proofs),
                    None => {
                        // opt-out gap: closest provable encloser proof
                        let (encloser, matching) =
                            chain.closest_provable_encloser(&self.zone, owner);
                        push(matching, &mut proofs);
                        let next_closer = self.zone.next_closer(owner, &encloser);
                        push(chain.covering(&next_closer), &mut proofs);
                    }
                },
                Denial::WildcardAnswer {
                    closest_encloser,
                    next_closer,
                } => {
                    push(chain.matching(closest_encloser), &mut proofs);
                    push(chain.covering(next_closer), &mut proofs);
                }
            }
        }
        proofs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::rdata::sec::dnskey::{FLAGS_KSK, FLAGS_ZSK};
    use crate::dns::rdata::sec::ALGO_ECDSAP256SHA256;
    use crate::dns::rdata::{RDataType, A, NS, SOA};
    use crate::dns::{TYPE_A, TYPE_MX, TYPE_NS, TYPE_NSEC3, TYPE_SOA};
    use crate::util;

    fn name(text: &str) -> DomainName {
        DomainName::from_text(text, None).unwrap()
    }

    fn base_zone() -> Zone {
        let mut zone = Zone::new(name("example.com."));
        let mut soa = RRset::new(name("example.com."), TYPE_SOA, CLASS_IN, 3600);
        soa.push(RDataType::SOA(SOA::new(
            name("ns1.example.com."),
            name("hostmaster.example.com."),
            1,
            7200,
            3600,
            1209600,
            300,
        )));
        zone.add(soa).unwrap();
        let mut ns = RRset::new(name("example.com."), TYPE_NS, CLASS_IN, 3600);
        ns.push(RDataType::NS(NS::new(name("ns1.example.com."))));
        zone.add(ns).unwrap();
        for owner in ["mail.example.com.", "ns1.example.com.", "www.example.com."] {
            let mut rrset = RRset::new(name(owner), TYPE_A, CLASS_IN, 3600);
            rrset.push(RDataType::A(A::new([10, 0, 0, 1].into())));
            zone.add(rrset).unwrap();
        }
        zone
    }

    fn signed(config: DnssecConfig) -> SignedZone {
        SignedZone::new(
            base_zone(),
            KeyPair::generate(ALGO_ECDSAP256SHA256, FLAGS_KSK).unwrap(),
            KeyPair::generate(ALGO_ECDSAP256SHA256, FLAGS_ZSK).unwrap(),
            config,
        )
        .unwrap()
    }

    #[test]
    fn test_setup_publishes_dnskey() {
        let zone = signed(DnssecConfig::default());
        let dnskeys = zone
            .zone()
            .find(&name("example.com."), TYPE_DNSKEY)
            .unwrap();
        assert_eq!(2, dnskeys.len());
        assert!(zone
            .zone()
            .find(&name("example.com."), TYPE_NSEC3PARAM)
            .is_none());
    }

    #[test]
    fn test_nsec3_setup_publishes_param() {
        let zone = signed(DnssecConfig {
            enable_nsec3: true,
            salt: vec![0xab],
            ..DnssecConfig::default()
        });
        let param = zone
            .zone()
            .find(&name("example.com."), TYPE_NSEC3PARAM)
            .unwrap();
        match param.first() {
            Some(RDataType::NSec3Param(p)) => {
                assert_eq!(0, p.flags);
                assert_eq!(vec![0xab], p.salt);
            }
            other => panic!("expected NSEC3PARAM, got {:?}", other),
        }
    }

    #[test]
    fn test_ds_records_cover_both_digests() {
        let zone = signed(DnssecConfig::default());
        assert_eq!(2, zone.ds_records().len());
        let lines = zone.ds_records().to_zone();
        assert!(lines[0].contains(" IN DS "));
    }

    #[test]
    fn test_nxdomain_proofs_nsec() {
        let zone = signed(DnssecConfig::default());
        let denial = Denial::NxDomain {
            qname: name("missing.example.com."),
            closest_encloser: name("example.com."),
            next_closer: name("missing.example.com."),
        };
        let proofs = zone.denial_rrsets(&denial);
        // one NSEC covering qname, one covering the wildcard
        assert_eq!(2, proofs.len());
    }

    #[test]
    fn test_nxdomain_proofs_nsec3() {
        let zone = signed(DnssecConfig {
            enable_nsec3: true,
            salt: vec![0xaa, 0xbb],
            ..DnssecConfig::default()
        });
        let denial = Denial::NxDomain {
            qname: name("missing.example.com."),
            closest_encloser: name("example.com."),
            next_closer: name("missing.example.com."),
        };
        let proofs = zone.denial_rrsets(&denial);
        // closest-encloser match, next-closer cover, wildcard cover;
        // with only four names some covers may collapse together
        assert!(!proofs.is_empty() && proofs.len() <= 3);
        for rrset in &proofs {
            assert_eq!(TYPE_NSEC3, rrset.typ());
        }
    }

    #[test]
    fn test_nodata_proof_matches_owner() {
        let zone = signed(DnssecConfig::default());
        let denial = Denial::NoData {
            owner: name("www.example.com."),
            qtype: TYPE_MX,
        };
        let proofs = zone.denial_rrsets(&denial);
        assert_eq!(1, proofs.len());
        assert_eq!(name("www.example.com."), *proofs[0].owner());
        match proofs[0].first() {
            Some(RDataType::NSec(nsec)) => {
                assert!(nsec.types.contains(&TYPE_A));
                assert!(!nsec.types.contains(&TYPE_MX));
            }
            other => panic!("expected NSEC, got {:?}", other),
        }
    }

    #[test]
    fn test_signed_denial_verifies() {
        let zone = signed(DnssecConfig::default());
        let denial = Denial::NoData {
            owner: name("www.example.com."),
            qtype: TYPE_MX,
        };
        let proofs = zone.denial_rrsets(&denial);
        let now = util::now_epoch();
        let rrsig_rrset = zone.sign_rrset(&proofs[0], now).unwrap();
        match rrsig_rrset.first() {
            Some(RDataType::RRSig(rrsig)) => {
                super::super::verify_rrset(zone.signer().zsk().dnskey(), rrsig, &proofs[0], now)
                    .unwrap();
            }
            other => panic!("expected RRSIG, got {:?}", other),
        }
    }
}
