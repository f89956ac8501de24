use super::compress::CompressList;
use super::name::DomainName;
use super::rdata::RDataType;
use super::{type_to_str, Class, Type};
use crate::errors::DnsError;

/**
The answer, authority, and additional sections share the same format: a
variable number of resource records of the following shape:
```shell
      0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
    +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    /                      NAME                     /
    +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    |                      TYPE                     |
    +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    |                     CLASS                     |
    +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    |                      TTL                      |
    |                                               |
    +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    |                   RDLENGTH                    |
    +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--|
    /                     RDATA                     /
    +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
```
The owner name may be compressed; whether the RDATA may be is decided
per type by the RDATA layer.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RR {
    name: DomainName,
    typ: Type,
    class: Class,
    ttl: u32,
    rdata: RDataType,
}

impl RR {
    pub fn new(name: DomainName, typ: Type, class: Class, ttl: u32, rdata: RDataType) -> Self {
        RR {
            name,
            typ,
            class,
            ttl,
            rdata,
        }
    }

    pub fn parse(raw: &[u8], offset: &mut usize) -> Result<Self, DnsError> {
        let name = DomainName::parse(raw, offset)?;
        let fixed = raw
            .get(*offset..*offset + 10)
            .ok_or_else(|| DnsError::format("truncated resource record"))?;
        let typ = u16::from_be_bytes([fixed[0], fixed[1]]);
        let class = u16::from_be_bytes([fixed[2], fixed[3]]);
        let ttl = u32::from_be_bytes([fixed[4], fixed[5], fixed[6], fixed[7]]);
        let rdlength = u16::from_be_bytes([fixed[8], fixed[9]]) as usize;
        *offset += 10;

        let rdata = RDataType::from(raw, *offset, rdlength, typ)?;
        *offset += rdlength;

        Ok(RR {
            name,
            typ,
            class,
            ttl,
            rdata,
        })
    }

    pub fn name(&self) -> &DomainName {
        &self.name
    }

    pub fn with_name(&mut self, name: DomainName) -> &mut Self {
        self.name = name;
        self
    }

    pub fn typ(&self) -> Type {
        self.typ
    }

    pub fn class(&self) -> Class {
        self.class
    }

    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    pub fn rdata(&self) -> &RDataType {
        &self.rdata
    }

    pub fn encode(&self, out: &mut Vec<u8>, cl: &mut CompressList) -> Result<(), DnsError> {
        cl.write_name(out, &self.name);
        out.extend_from_slice(&self.typ.to_be_bytes());
        out.extend_from_slice(&self.class.to_be_bytes());
        out.extend_from_slice(&self.ttl.to_be_bytes());

        let mut rdata = Vec::new();
        self.rdata.encode(&mut rdata);
        let rdlength = u16::try_from(rdata.len())
            .map_err(|_| DnsError::format("rdata exceeds 65535 octets"))?;
        out.extend_from_slice(&rdlength.to_be_bytes());
        out.extend_from_slice(&rdata);
        Ok(())
    }
}

/// All records sharing (owner, class, type). One TTL applies to the whole
/// set; the zone loader rejects members that disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RRset {
    owner: DomainName,
    typ: Type,
    class: Class,
    ttl: u32,
    rdatas: Vec<RDataType>,
}

impl RRset {
    pub fn new(owner: DomainName, typ: Type, class: Class, ttl: u32) -> Self {
        RRset {
            owner,
            typ,
            class,
            ttl,
            rdatas: Vec::new(),
        }
    }

    pub fn push(&mut self, rdata: RDataType) {
        self.rdatas.push(rdata);
    }

    pub fn owner(&self) -> &DomainName {
        &self.owner
    }

    pub fn typ(&self) -> Type {
        self.typ
    }

    pub fn class(&self) -> Class {
        self.class
    }

    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    pub fn with_ttl(&self, ttl: u32) -> RRset {
        let mut rrset = self.clone();
        rrset.ttl = ttl;
        rrset
    }

    /// The same set under another owner, as in wildcard expansion.
    pub fn with_owner(&self, owner: DomainName) -> RRset {
        let mut rrset = self.clone();
        rrset.owner = owner;
        rrset
    }

    pub fn rdatas(&self) -> &[RDataType] {
        &self.rdatas
    }

    pub fn first(&self) -> Option<&RDataType> {
        self.rdatas.first()
    }

    pub fn len(&self) -> usize {
        self.rdatas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rdatas.is_empty()
    }

    /// Members in canonical order: octet-lexicographic on canonical RDATA,
    /// the order signatures are computed over (RFC 4034 section 6.3).
    pub fn canonical_rdatas(&self) -> Vec<Vec<u8>> {
        let mut encoded: Vec<Vec<u8>> = self.rdatas.iter().map(|r| r.canonical_bytes()).collect();
        encoded.sort();
        encoded
    }

    pub fn to_rrs(&self) -> Vec<RR> {
        self.rdatas
            .iter()
            .map(|rdata| {
                RR::new(
                    self.owner.clone(),
                    self.typ,
                    self.class,
                    self.ttl,
                    rdata.clone(),
                )
            })
            .collect()
    }

    /// One zone-text line per member.
    pub fn to_zone(&self) -> Vec<String> {
        self.rdatas
            .iter()
            .map(|rdata| {
                format!(
                    "{} {} IN {} {}",
                    self.owner,
                    self.ttl,
                    type_to_str(self.typ),
                    rdata.to_zone()
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::rdata::A;
    use crate::dns::{CLASS_IN, TYPE_A};
    use std::net::Ipv4Addr;

    fn name(text: &str) -> DomainName {
        DomainName::from_text(text, None).unwrap()
    }

    fn a_rrset() -> RRset {
        let mut rrset = RRset::new(name("www.example.com."), TYPE_A, CLASS_IN, 3600);
        rrset.push(RDataType::A(A::new(Ipv4Addr::new(192, 168, 0, 102))));
        rrset.push(RDataType::A(A::new(Ipv4Addr::new(192, 168, 0, 101))));
        rrset
    }

    #[test]
    fn test_rr_round_trip() {
        let rr = RR::new(
            name("www.example.com."),
            TYPE_A,
            CLASS_IN,
            3600,
            RDataType::A(A::new(Ipv4Addr::new(10, 0, 0, 1))),
        );
        let mut out = Vec::new();
        rr.encode(&mut out, &mut CompressList::new()).unwrap();

        let mut offset = 0;
        let parsed = RR::parse(&out, &mut offset).unwrap();
        assert_eq!(out.len(), offset);
        assert_eq!(rr, parsed);
    }

    #[test]
    fn test_rr_truncated_rdata() {
        let rr = RR::new(
            name("www.example.com."),
            TYPE_A,
            CLASS_IN,
            3600,
            RDataType::A(A::new(Ipv4Addr::new(10, 0, 0, 1))),
        );
        let mut out = Vec::new();
        rr.encode(&mut out, &mut CompressList::new()).unwrap();
        out.truncate(out.len() - 1);

        let mut offset = 0;
        assert!(RR::parse(&out, &mut offset).is_err());
    }

    #[test]
    fn test_canonical_rdatas_are_sorted() {
        let rrset = a_rrset();
        let canonical = rrset.canonical_rdatas();
        assert_eq!(vec![192, 168, 0, 101], canonical[0]);
        assert_eq!(vec![192, 168, 0, 102], canonical[1]);
    }

    #[test]
    fn test_rrset_expansion_keeps_members() {
        let rrset = a_rrset();
        let expanded = rrset.with_owner(name("foo.example.com."));
        assert_eq!(2, expanded.len());
        assert_eq!(name("foo.example.com."), *expanded.owner());
        assert_eq!(rrset.rdatas(), expanded.rdatas());
    }

    #[test]
    fn test_zone_text_lines() {
        let lines = a_rrset().to_zone();
        assert_eq!(
            "www.example.com. 3600 IN A 192.168.0.102",
            lines[0]
        );
    }
}
