/*!
The zone tree: an ordered map from owner name to node, rooted at the apex.
The map order is the DNSSEC canonical order of [`DomainName`], which the
denial engine depends on. The tree is built once by a loader, validated,
then frozen; queries only read it.
 */

pub mod masterfile;
pub mod yaml;

use crate::dns::name::DomainName;
use crate::dns::rdata::RDataType;
use crate::dns::rr::RRset;
use crate::dns::{Type, TYPE_AAAA, TYPE_ANY, TYPE_A, TYPE_CNAME, TYPE_DNAME, TYPE_DS, TYPE_NS, TYPE_SOA};
use crate::errors::{DnsError, RCODE_NOERROR, RCODE_NXDOMAIN};
use std::collections::BTreeMap;

/// A CNAME/DNAME chain longer than this answers SERVFAIL.
const MAX_CHAIN_LINKS: usize = 16;

/// One owner name: its RRsets keyed by type. A node with no RRsets is an
/// empty non-terminal, kept in the tree because denial proofs must know
/// the name exists.
#[derive(Debug, Default)]
pub struct Node {
    rrsets: BTreeMap<Type, RRset>,
}

impl Node {
    pub fn get(&self, typ: Type) -> Option<&RRset> {
        self.rrsets.get(&typ)
    }

    pub fn rrsets(&self) -> impl Iterator<Item = &RRset> {
        self.rrsets.values()
    }

    pub fn types(&self) -> Vec<Type> {
        self.rrsets.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rrsets.is_empty()
    }
}

/// One RRset headed for the answer section. `sign_as` carries the wildcard
/// source RRset when the owner was rewritten: the signature is computed
/// over the source so the RRSIG labels field exposes the expansion.
/// Synthesized CNAMEs (from DNAME) are never signed.
#[derive(Debug, Clone)]
pub struct AnswerRRset {
    pub rrset: RRset,
    pub sign_as: Option<RRset>,
    pub synthesized: bool,
}

impl AnswerRRset {
    fn plain(rrset: RRset) -> Self {
        AnswerRRset {
            rrset,
            sign_as: None,
            synthesized: false,
        }
    }
}

/// A denial proof the response must carry when DNSSEC is requested. The
/// denial engine turns these into NSEC or NSEC3 RRsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    /// qname does not exist: prove it, and prove no wildcard could have
    /// synthesized it.
    NxDomain {
        qname: DomainName,
        closest_encloser: DomainName,
        next_closer: DomainName,
    },
    /// The owner exists but the queried type does not.
    NoData { owner: DomainName, qtype: Type },
    /// A wildcard answered: prove the next closer name does not exist.
    WildcardAnswer {
        closest_encloser: DomainName,
        next_closer: DomainName,
    },
}

/// The response skeleton a lookup produces; the responder renders it into
/// a wire message, attaching signatures and denial RRsets as needed.
#[derive(Debug)]
pub struct Resolution {
    pub rcode: u8,
    pub aa: bool,
    pub answer: Vec<AnswerRRset>,
    /// Include the SOA (at the negative TTL) in the authority section.
    pub authority_soa: bool,
    /// Referral: the delegation NS RRset and its glue.
    pub referral: Option<(RRset, Vec<RRset>)>,
    /// DS RRset accompanying a referral to a signed child.
    pub referral_ds: Option<RRset>,
    pub denials: Vec<Denial>,
}

impl Resolution {
    fn new() -> Self {
        Resolution {
            rcode: RCODE_NOERROR,
            aa: true,
            answer: Vec::new(),
            authority_soa: false,
            referral: None,
            referral_ds: None,
            denials: Vec::new(),
        }
    }
}

/// One classification step for a single name, before chain chasing.
#[derive(Debug)]
enum LookupStep {
    OutOfZone,
    Answer(Vec<RRset>),
    Cname(RRset),
    Dname {
        dname: RRset,
        target: DomainName,
    },
    Referral(RRset),
    Wildcard {
        rrsets: Vec<RRset>,
        source: DomainName,
        next_closer: DomainName,
    },
    WildcardCname {
        cname: RRset,
        source: DomainName,
        next_closer: DomainName,
    },
    WildcardNoData {
        source: DomainName,
        next_closer: DomainName,
    },
    NoData(DomainName),
    NxDomain {
        closest_encloser: DomainName,
        next_closer: DomainName,
    },
}

#[derive(Debug)]
pub struct Zone {
    apex: DomainName,
    nodes: BTreeMap<DomainName, Node>,
}

impl Zone {
    pub fn new(apex: DomainName) -> Self {
        Zone {
            apex,
            nodes: BTreeMap::new(),
        }
    }

    pub fn apex(&self) -> &DomainName {
        &self.apex
    }

    /// Merges an RRset into the tree, materializing empty non-terminals
    /// for every name between the owner and the apex.
    pub fn add(&mut self, rrset: RRset) -> Result<(), DnsError> {
        if !rrset.owner().ends_with(&self.apex) {
            return Err(DnsError::zone(format!(
                "owner {} is outside zone {}",
                rrset.owner(),
                self.apex
            )));
        }
        if rrset.is_empty() {
            return Err(DnsError::zone(format!(
                "empty rrset at {}",
                rrset.owner()
            )));
        }

        let mut ancestor = rrset.owner().clone();
        while ancestor != self.apex {
            ancestor = match ancestor.parent() {
                Some(parent) => parent,
                None => break,
            };
            self.nodes.entry(ancestor.clone()).or_default();
        }

        let owner = rrset.owner().clone();
        let typ = rrset.typ();
        let node = self.nodes.entry(owner.clone()).or_default();
        match node.rrsets.get_mut(&typ) {
            Some(existing) => {
                if existing.ttl() != rrset.ttl() {
                    return Err(DnsError::zone(format!(
                        "ttl mismatch within rrset {} type {}",
                        owner, typ
                    )));
                }
                for rdata in rrset.rdatas() {
                    existing.push(rdata.clone());
                }
            }
            None => {
                node.rrsets.insert(typ, rrset);
            }
        }
        Ok(())
    }

    /// The load-time checks of section 4.5: apex SOA and NS, CNAME
    /// exclusivity, wildcard shape.
    pub fn validate(&self) -> Result<(), DnsError> {
        let apex_node = self
            .nodes
            .get(&self.apex)
            .ok_or_else(|| DnsError::zone(format!("no records at apex {}", self.apex)))?;
        let soa = apex_node
            .get(TYPE_SOA)
            .ok_or_else(|| DnsError::zone(format!("no SOA at apex {}", self.apex)))?;
        if soa.len() != 1 {
            return Err(DnsError::zone(format!(
                "{} SOA records at apex, need exactly one",
                soa.len()
            )));
        }
        if apex_node.get(TYPE_NS).is_none() {
            return Err(DnsError::zone(format!("no NS at apex {}", self.apex)));
        }

        for (owner, node) in &self.nodes {
            if *owner != self.apex && node.get(TYPE_SOA).is_some() {
                return Err(DnsError::zone(format!("SOA at non-apex owner {}", owner)));
            }
            if let Some(cname) = node.get(TYPE_CNAME) {
                if *owner == self.apex {
                    return Err(DnsError::zone("CNAME at the zone apex"));
                }
                if cname.len() != 1 {
                    return Err(DnsError::zone(format!(
                        "CNAME rrset at {} must hold exactly one record",
                        owner
                    )));
                }
                if node.rrsets.len() != 1 {
                    return Err(DnsError::zone(format!(
                        "CNAME at {} coexists with other data",
                        owner
                    )));
                }
            }
            if node.get(TYPE_DNAME).is_some() && node.get(TYPE_NS).is_some() && *owner != self.apex
            {
                return Err(DnsError::zone(format!(
                    "DNAME at delegation point {}",
                    owner
                )));
            }
            for (index, label) in owner.labels().iter().enumerate() {
                if label.contains('*') && !(index == 0 && label == "*") {
                    return Err(DnsError::zone(format!(
                        "wildcard label only allowed as the leftmost label: {}",
                        owner
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn soa(&self) -> Result<&RRset, DnsError> {
        self.nodes
            .get(&self.apex)
            .and_then(|node| node.get(TYPE_SOA))
            .ok_or_else(|| DnsError::ServerFailure("zone without SOA".to_string()))
    }

    /// TTL for negative answers: min(SOA MINIMUM, SOA TTL) per RFC 2308.
    pub fn negative_ttl(&self) -> u32 {
        match self.soa() {
            Ok(rrset) => match rrset.first() {
                Some(RDataType::SOA(soa)) => soa.minimum.min(rrset.ttl()),
                _ => rrset.ttl(),
            },
            Err(_) => 0,
        }
    }

    pub fn node(&self, name: &DomainName) -> Option<&Node> {
        self.nodes.get(name)
    }

    pub fn find(&self, name: &DomainName, typ: Type) -> Option<&RRset> {
        self.nodes.get(name).and_then(|node| node.get(typ))
    }

    pub fn names(&self) -> impl Iterator<Item = &DomainName> {
        self.nodes.keys()
    }

    /// Whether `name` sits at a delegation point: NS present, not apex.
    pub fn is_delegation(&self, name: &DomainName) -> bool {
        *name != self.apex
            && self
                .nodes
                .get(name)
                .map(|node| node.get(TYPE_NS).is_some())
                .unwrap_or(false)
    }

    /// Whether `name` is strictly below a delegation point, i.e. glue
    /// territory that is not authoritative data.
    pub fn is_below_delegation(&self, name: &DomainName) -> bool {
        for count in self.apex.label_count() + 1..name.label_count() {
            if self.is_delegation(&name.suffix(count)) {
                return true;
            }
        }
        false
    }

    /// Every existent name the zone is authoritative for, in canonical
    /// order: node names minus glue below delegation points. This is the
    /// name set the denial chains are built over.
    pub fn authoritative_names(&self) -> Vec<&DomainName> {
        self.nodes
            .keys()
            .filter(|name| !self.is_below_delegation(name))
            .collect()
    }

    /// The deepest existing ancestor of a (nonexistent) qname.
    pub fn closest_encloser(&self, qname: &DomainName) -> DomainName {
        let mut candidate = qname.parent();
        while let Some(name) = candidate {
            if self.nodes.contains_key(&name) {
                return name;
            }
            candidate = name.parent();
        }
        self.apex.clone()
    }

    /// The name one label below `encloser` on the path to `qname`.
    pub fn next_closer(&self, qname: &DomainName, encloser: &DomainName) -> DomainName {
        qname.suffix(encloser.label_count() + 1)
    }

    /// A/AAAA RRsets for in-zone NS targets, pulled even from below the
    /// cut: glue is served in the additional section only.
    pub fn glue_for(&self, ns: &RRset) -> Vec<RRset> {
        let mut glue = Vec::new();
        for rdata in ns.rdatas() {
            let target = match rdata {
                RDataType::NS(ns) => &ns.nameserver,
                _ => continue,
            };
            if !target.ends_with(&self.apex) {
                continue;
            }
            if let Some(node) = self.nodes.get(target) {
                for typ in [TYPE_A, TYPE_AAAA] {
                    if let Some(rrset) = node.get(typ) {
                        glue.push(rrset.clone());
                    }
                }
            }
        }
        glue
    }

    /// One classification step for `name`. Chain chasing and response
    /// shaping happen in [`Zone::resolve`].
    fn lookup(&self, name: &DomainName, qtype: Type) -> LookupStep {
        if !name.ends_with(&self.apex) {
            return LookupStep::OutOfZone;
        }

        // walk the path from just below the apex down to name: the first
        // cut turns the answer into a referral, the first DNAME rewrites.
        for count in self.apex.label_count()..=name.label_count() {
            let ancestor = name.suffix(count);
            let node = match self.nodes.get(&ancestor) {
                Some(node) => node,
                None => continue,
            };
            let at_qname = count == name.label_count();

            if ancestor != self.apex {
                if let Some(ns) = node.get(TYPE_NS) {
                    if at_qname && qtype == TYPE_DS {
                        // DS lives on the parent side of the cut
                        return match node.get(TYPE_DS) {
                            Some(ds) => LookupStep::Answer(vec![ds.clone()]),
                            None => LookupStep::NoData(ancestor),
                        };
                    }
                    return LookupStep::Referral(ns.clone());
                }
            }
            if !at_qname {
                if let Some(dname) = node.get(TYPE_DNAME) {
                    if let Some(RDataType::DName(rdata)) = dname.first() {
                        return LookupStep::Dname {
                            dname: dname.clone(),
                            target: rdata.target.clone(),
                        };
                    }
                }
            }
        }

        if let Some(node) = self.nodes.get(name) {
            if qtype == TYPE_ANY {
                let rrsets: Vec<RRset> = node.rrsets().cloned().collect();
                if rrsets.is_empty() {
                    return LookupStep::NoData(name.clone());
                }
                return LookupStep::Answer(rrsets);
            }
            if let Some(rrset) = node.get(qtype) {
                return LookupStep::Answer(vec![rrset.clone()]);
            }
            if let Some(cname) = node.get(TYPE_CNAME) {
                return LookupStep::Cname(cname.clone());
            }
            return LookupStep::NoData(name.clone());
        }

        let encloser = self.closest_encloser(name);
        let next_closer = self.next_closer(name, &encloser);
        let source = encloser.wildcard();
        if let Some(node) = self.nodes.get(&source) {
            if qtype == TYPE_ANY {
                let rrsets: Vec<RRset> = node.rrsets().cloned().collect();
                if !rrsets.is_empty() {
                    return LookupStep::Wildcard {
                        rrsets,
                        source,
                        next_closer,
                    };
                }
            } else if let Some(rrset) = node.get(qtype) {
                return LookupStep::Wildcard {
                    rrsets: vec![rrset.clone()],
                    source,
                    next_closer,
                };
            } else if let Some(cname) = node.get(TYPE_CNAME) {
                return LookupStep::WildcardCname {
                    cname: cname.clone(),
                    source,
                    next_closer,
                };
            }
            return LookupStep::WildcardNoData {
                source,
                next_closer,
            };
        }

        LookupStep::NxDomain {
            closest_encloser: encloser,
            next_closer,
        }
    }

    /// Classifies a query into a response skeleton, chasing CNAME and
    /// DNAME chains within the zone. Loops and chains of 16 links or more
    /// are server failures.
    pub fn resolve(&self, qname: &DomainName, qtype: Type) -> Result<Resolution, DnsError> {
        let mut res = Resolution::new();
        let mut current = qname.clone();
        let mut visited: Vec<DomainName> = Vec::new();

        loop {
            if visited.len() >= MAX_CHAIN_LINKS {
                return Err(DnsError::ServerFailure(format!(
                    "alias chain from {} exceeds {} links",
                    qname, MAX_CHAIN_LINKS
                )));
            }
            if visited.contains(&current) {
                return Err(DnsError::ServerFailure(format!(
                    "alias loop through {}",
                    current
                )));
            }
            visited.push(current.clone());

            match self.lookup(&current, qtype) {
                LookupStep::OutOfZone => {
                    if res.answer.is_empty() {
                        return Err(DnsError::Refused(format!(
                            "{} is outside zone {}",
                            current, self.apex
                        )));
                    }
                    // a chain left the zone; hand the resolver what we have
                    break;
                }
                LookupStep::Answer(rrsets) => {
                    for rrset in rrsets {
                        res.answer.push(AnswerRRset::plain(rrset));
                    }
                    break;
                }
                LookupStep::Cname(rrset) => {
                    let target = match rrset.first() {
                        Some(RDataType::CName(cname)) => cname.canonicalname.clone(),
                        _ => {
                            return Err(DnsError::ServerFailure(format!(
                                "malformed CNAME rrset at {}",
                                current
                            )))
                        }
                    };
                    res.answer.push(AnswerRRset::plain(rrset));
                    current = target;
                }
                LookupStep::Dname { dname, target } => {
                    let owner = dname.owner().clone();
                    let rewritten = current.replace_suffix(&owner, &target)?;
                    res.answer.push(AnswerRRset::plain(dname.clone()));

                    let mut cname =
                        RRset::new(current.clone(), TYPE_CNAME, dname.class(), dname.ttl());
                    cname.push(RDataType::CName(crate::dns::rdata::CName::new(
                        rewritten.clone(),
                    )));
                    res.answer.push(AnswerRRset {
                        rrset: cname,
                        sign_as: None,
                        synthesized: true,
                    });
                    current = rewritten;
                }
                LookupStep::Referral(ns) => {
                    res.aa = false;
                    let cut = ns.owner().clone();
                    match self.find(&cut, TYPE_DS) {
                        Some(ds) => res.referral_ds = Some(ds.clone()),
                        // a validating requester needs proof the child
                        // really is unsigned
                        None => res.denials.push(Denial::NoData {
                            owner: cut,
                            qtype: TYPE_DS,
                        }),
                    }
                    let glue = self.glue_for(&ns);
                    res.referral = Some((ns, glue));
                    break;
                }
                LookupStep::Wildcard {
                    rrsets,
                    source,
                    next_closer,
                } => {
                    for rrset in rrsets {
                        res.answer.push(AnswerRRset {
                            rrset: rrset.with_owner(current.clone()),
                            sign_as: Some(rrset),
                            synthesized: false,
                        });
                    }
                    res.denials.push(Denial::WildcardAnswer {
                        closest_encloser: source.parent().unwrap_or_else(|| self.apex.clone()),
                        next_closer,
                    });
                    break;
                }
                LookupStep::WildcardCname {
                    cname,
                    source,
                    next_closer,
                } => {
                    let target = match cname.first() {
                        Some(RDataType::CName(rdata)) => rdata.canonicalname.clone(),
                        _ => {
                            return Err(DnsError::ServerFailure(format!(
                                "malformed CNAME rrset at {}",
                                source
                            )))
                        }
                    };
                    res.answer.push(AnswerRRset {
                        rrset: cname.with_owner(current.clone()),
                        sign_as: Some(cname),
                        synthesized: false,
                    });
                    res.denials.push(Denial::WildcardAnswer {
                        closest_encloser: source.parent().unwrap_or_else(|| self.apex.clone()),
                        next_closer,
                    });
                    current = target;
                }
                LookupStep::WildcardNoData {
                    source,
                    next_closer,
                } => {
                    res.authority_soa = true;
                    res.denials.push(Denial::NoData {
                        owner: source.clone(),
                        qtype,
                    });
                    res.denials.push(Denial::WildcardAnswer {
                        closest_encloser: source.parent().unwrap_or_else(|| self.apex.clone()),
                        next_closer,
                    });
                    break;
                }
                LookupStep::NoData(owner) => {
                    res.authority_soa = true;
                    res.denials.push(Denial::NoData { owner, qtype });
                    break;
                }
                LookupStep::NxDomain {
                    closest_encloser,
                    next_closer,
                } => {
                    res.rcode = RCODE_NXDOMAIN;
                    res.authority_soa = true;
                    res.denials.push(Denial::NxDomain {
                        qname: current.clone(),
                        closest_encloser,
                        next_closer,
                    });
                    break;
                }
            }
        }
        Ok(res)
    }
}
