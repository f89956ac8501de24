/*!
Authenticated denial of existence. Both chains are precomputed over the
frozen zone at load time; responses pick records out of them, and the
responder signs whatever it emits.
 */

use super::DnssecConfig;
use crate::dns::name::DomainName;
use crate::dns::rdata::sec::NSEC3_HASH_SHA1;
use crate::dns::rdata::{NSec, NSec3, RDataType};
use crate::dns::rr::RRset;
use crate::dns::{CLASS_IN, TYPE_DS, TYPE_NSEC, TYPE_NSEC3, TYPE_RRSIG};
use crate::errors::DnsError;
use crate::zone::Zone;
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;
use std::ops::Bound;

/// The iterated NSEC3 hash of RFC 5155 section 5: SHA-1 over the
/// canonical wire name with the salt appended, re-hashed `iterations`
/// more times.
pub fn nsec3_hash(salt: &[u8], iterations: u16, name: &DomainName) -> Vec<u8> {
    fn round(data: &[u8], salt: &[u8]) -> Vec<u8> {
        let mut hasher = Sha1::new();
        hasher.update(data);
        hasher.update(salt);
        hasher.finalize().to_vec()
    }

    let mut wire = Vec::new();
    name.canonical_wire(&mut wire);
    let mut hash = round(&wire, salt);
    for _ in 0..iterations {
        hash = round(&hash, salt);
    }
    hash
}

pub fn base32hex(hash: &[u8]) -> String {
    base32::encode(base32::Alphabet::Rfc4648HexLower { padding: false }, hash)
}

/**
The NSEC chain: every existent authoritative name (empty non-terminals
included, glue excluded) linked to its canonical successor, the last
name wrapping back to the apex. The bitmap lists the types present at
the owner plus NSEC and RRSIG, which the owner gains by being in the
signed chain.
 */
#[derive(Debug)]
pub struct NsecChain {
    records: BTreeMap<DomainName, RRset>,
}

impl NsecChain {
    pub fn build(zone: &Zone) -> Self {
        let ttl = zone.negative_ttl();
        let names = zone.authoritative_names();
        let mut records = BTreeMap::new();

        for (index, owner) in names.iter().enumerate() {
            let node = match zone.node(owner) {
                Some(node) => node,
                None => continue,
            };
            let next = names[(index + 1) % names.len()];

            let mut types = node.types();
            types.push(TYPE_NSEC);
            types.push(TYPE_RRSIG);

            let mut rrset = RRset::new((*owner).clone(), TYPE_NSEC, CLASS_IN, ttl);
            rrset.push(RDataType::NSec(NSec::new((*next).clone(), types)));
            records.insert((*owner).clone(), rrset);
        }
        NsecChain { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &RRset> {
        self.records.values()
    }

    /// The NSEC whose owner is exactly `name`.
    pub fn matching(&self, name: &DomainName) -> Option<&RRset> {
        self.records.get(name)
    }

    /// The NSEC covering a nonexistent `name`: the canonical predecessor,
    /// wrapping from the first name to the last.
    pub fn covering(&self, name: &DomainName) -> Option<&RRset> {
        self.records
            .range((Bound::Unbounded, Bound::Excluded(name.clone())))
            .next_back()
            .map(|(_, rrset)| rrset)
            .or_else(|| self.records.values().next_back())
    }
}

/**
The NSEC3 chain of RFC 5155: authoritative names hashed with the zone's
salt and iteration count, ordered by hash, each record naming the next
hash. Under opt-out, insecure delegations are left out and the flag is
set so validators accept the gaps.
 */
#[derive(Debug)]
pub struct Nsec3Chain {
    salt: Vec<u8>,
    iterations: u16,
    records: BTreeMap<Vec<u8>, RRset>,
}

impl Nsec3Chain {
    pub fn build(zone: &Zone, config: &DnssecConfig) -> Result<Self, DnsError> {
        if config.hash_algorithm != NSEC3_HASH_SHA1 {
            return Err(DnsError::zone(format!(
                "unsupported NSEC3 hash algorithm {}",
                config.hash_algorithm
            )));
        }

        let ttl = zone.negative_ttl();
        let flags = config.nsec3_flags();
        let mut hashed: BTreeMap<Vec<u8>, (&DomainName, Vec<u16>)> = BTreeMap::new();

        for owner in zone.authoritative_names() {
            let node = match zone.node(owner) {
                Some(node) => node,
                None => continue,
            };
            let insecure_delegation =
                zone.is_delegation(owner) && node.get(TYPE_DS).is_none();
            if config.opt_out && insecure_delegation {
                continue;
            }

            let mut types = node.types();
            if !types.is_empty() && !insecure_delegation {
                types.push(TYPE_RRSIG);
            }
            hashed.insert(
                nsec3_hash(&config.salt, config.iterations, owner),
                (owner, types),
            );
        }

        let hashes: Vec<Vec<u8>> = hashed.keys().cloned().collect();
        let mut records = BTreeMap::new();
        for (index, (hash, (_, types))) in hashed.iter().enumerate() {
            let next = hashes[(index + 1) % hashes.len()].clone();
            let owner = zone.apex().prepend(&base32hex(hash))?;

            let mut rrset = RRset::new(owner, TYPE_NSEC3, CLASS_IN, ttl);
            rrset.push(RDataType::NSec3(NSec3::new(
                NSEC3_HASH_SHA1,
                flags,
                config.iterations,
                config.salt.clone(),
                next,
                types.clone(),
            )));
            records.insert(hash.clone(), rrset);
        }

        Ok(Nsec3Chain {
            salt: config.salt.clone(),
            iterations: config.iterations,
            records,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &RRset> {
        self.records.values()
    }

    pub fn hash_name(&self, name: &DomainName) -> Vec<u8> {
        nsec3_hash(&self.salt, self.iterations, name)
    }

    /// The NSEC3 whose hashed owner equals H(name).
    pub fn matching(&self, name: &DomainName) -> Option<&RRset> {
        self.records.get(&self.hash_name(name))
    }

    /// The NSEC3 covering H(name): the hash-order predecessor, wrapping
    /// around the chain.
    pub fn covering(&self, name: &DomainName) -> Option<&RRset> {
        let hash = self.hash_name(name);
        self.records
            .range((Bound::Unbounded, Bound::Excluded(hash)))
            .next_back()
            .map(|(_, rrset)| rrset)
            .or_else(|| self.records.values().next_back())
    }

    /// The deepest ancestor of `name` with a matching NSEC3: the closest
    /// provable encloser under opt-out. Falls back to the apex, which is
    /// always in the chain.
    pub fn closest_provable_encloser(
        &self,
        zone: &Zone,
        name: &DomainName,
    ) -> (DomainName, Option<&RRset>) {
        let mut candidate = Some(name.clone());
        while let Some(current) = candidate {
            if zone.node(&current).is_some() {
                if let Some(rrset) = self.matching(&current) {
                    return (current, Some(rrset));
                }
            }
            if current == *zone.apex() {
                break;
            }
            candidate = current.parent();
        }
        (zone.apex().clone(), self.matching(zone.apex()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::rdata::{RDataType, A, NS, SOA, TXT};
    use crate::dns::{CLASS_IN, TYPE_A, TYPE_NS, TYPE_SOA, TYPE_TXT};

    fn name(text: &str) -> DomainName {
        DomainName::from_text(text, None).unwrap()
    }

    fn sample_zone() -> Zone {
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

        for (owner, addr) in [
            ("ns1.example.com.", [10, 0, 0, 53]),
            ("www.example.com.", [10, 0, 0, 80]),
            ("a.b.example.com.", [10, 0, 0, 1]),
        ] {
            let mut rrset = RRset::new(name(owner), TYPE_A, CLASS_IN, 3600);
            rrset.push(RDataType::A(A::new(addr.into())));
            zone.add(rrset).unwrap();
        }

        let mut txt = RRset::new(name("www.example.com."), TYPE_TXT, CLASS_IN, 3600);
        txt.push(RDataType::TXT(TXT::new(vec!["x".into()])));
        zone.add(txt).unwrap();
        zone
    }

    fn nsec_next(rrset: &RRset) -> &DomainName {
        match rrset.first() {
            Some(RDataType::NSec(nsec)) => &nsec.next,
            other => panic!("expected NSEC, got {:?}", other),
        }
    }

    #[test]
    fn test_nsec3_hash_rfc5155_vectors() {
        // RFC 5155 Appendix A: salt AABBCCDD, 12 iterations
        let salt = [0xaa, 0xbb, 0xcc, 0xdd];
        let cases = [
            ("example.", "0p9mhaveqvm6t7vbl5lop2u3t2rp3tom"),
            ("a.example.", "35mthgpgcu1qg68fab165klnsnk3dpvl"),
            ("ai.example.", "gjeqe526plbf1g8mklp59enfd789njgi"),
            ("x.w.example.", "b4um86eghhds6nea196smvmlo4ors995"),
        ];
        for (text, expected) in cases {
            let hash = nsec3_hash(&salt, 12, &name(text));
            assert_eq!(expected, base32hex(&hash), "H({})", text);
        }
    }

    #[test]
    fn test_nsec_chain_is_a_cycle() {
        let zone = sample_zone();
        let chain = NsecChain::build(&zone);
        // apex, a.b, b, ns1, www
        assert_eq!(5, chain.len());

        let mut current = zone.apex().clone();
        let mut seen = 0;
        loop {
            let rrset = chain.matching(&current).expect("chain must be closed");
            current = nsec_next(rrset).clone();
            seen += 1;
            if current == *zone.apex() {
                break;
            }
            assert!(seen <= chain.len(), "chain does not close");
        }
        assert_eq!(chain.len(), seen);
    }

    #[test]
    fn test_nsec_covering_picks_predecessor() {
        let zone = sample_zone();
        let chain = NsecChain::build(&zone);

        // m.example.com. sorts between a.b.example.com. (which follows
        // b.example.com. canonically) and ns1.example.com.
        let cover = chain.covering(&name("m.example.com.")).unwrap();
        assert_eq!(name("a.b.example.com."), *cover.owner());

        // zzz.example.com. sorts after every name: covered by the last
        let cover = chain.covering(&name("zzz.example.com.")).unwrap();
        assert_eq!(name("www.example.com."), *cover.owner());
        assert_eq!(name("example.com."), *nsec_next(cover));
    }

    #[test]
    fn test_nsec_bitmap_lists_present_types() {
        let zone = sample_zone();
        let chain = NsecChain::build(&zone);
        let rrset = chain.matching(&name("www.example.com.")).unwrap();
        match rrset.first() {
            Some(RDataType::NSec(nsec)) => {
                assert!(nsec.types.contains(&TYPE_A));
                assert!(nsec.types.contains(&TYPE_TXT));
                assert!(nsec.types.contains(&TYPE_NSEC));
                assert!(nsec.types.contains(&TYPE_RRSIG));
                assert!(!nsec.types.contains(&TYPE_NS));
            }
            other => panic!("expected NSEC, got {:?}", other),
        }
        assert_eq!(300, rrset.ttl());
    }

    #[test]
    fn test_nsec3_chain_is_cyclic_and_ordered() {
        let zone = sample_zone();
        let config = DnssecConfig {
            enable_nsec3: true,
            salt: vec![0xab],
            iterations: 1,
            ..DnssecConfig::default()
        };
        let chain = Nsec3Chain::build(&zone, &config).unwrap();
        assert_eq!(5, chain.len());

        // strictly increasing hashes, each naming the next, last wraps
        let rrsets: Vec<&RRset> = chain.records().collect();
        let hashes: Vec<Vec<u8>> = rrsets
            .iter()
            .map(|r| match r.first() {
                Some(RDataType::NSec3(n)) => n.next_hashed.clone(),
                other => panic!("expected NSEC3, got {:?}", other),
            })
            .collect();
        let owners: Vec<Vec<u8>> = chain
            .records()
            .map(|r| {
                crate::util::decode_base32hex(&r.owner().labels()[0])
                    .expect("owner label must be base32hex")
            })
            .collect();
        for window in owners.windows(2) {
            assert!(window[0] < window[1]);
        }
        for (index, next) in hashes.iter().enumerate() {
            assert_eq!(owners[(index + 1) % owners.len()], *next);
        }
    }

    #[test]
    fn test_nsec3_matching_and_covering() {
        let zone = sample_zone();
        let config = DnssecConfig {
            enable_nsec3: true,
            salt: vec![0xab],
            iterations: 1,
            ..DnssecConfig::default()
        };
        let chain = Nsec3Chain::build(&zone, &config).unwrap();

        assert!(chain.matching(&name("www.example.com.")).is_some());
        assert!(chain.matching(&name("missing.example.com.")).is_none());
        assert!(chain.covering(&name("missing.example.com.")).is_some());
    }

    #[test]
    fn test_nsec3_rejects_unknown_hash() {
        let zone = sample_zone();
        let config = DnssecConfig {
            hash_algorithm: 2,
            ..DnssecConfig::default()
        };
        assert!(Nsec3Chain::build(&zone, &config).is_err());
    }
}
