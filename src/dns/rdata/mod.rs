/*!
Typed RDATA variants. Every record type the zone engine serves gets an arm
with four operations: wire decode, wire encode, canonical encode (names
uncompressed and lowercased, the form covered by signatures), and zone-text
rendering. Exhaustive matching over the enum keeps a missing arm a build
error rather than a runtime surprise.

Names inside RDATA are never written compressed. The DNSSEC-relevant types
forbid it outright (RFC 3597 section 4, RFC 4034 section 6.2) and nothing
is gained by compressing the rest.
 */

pub mod a;
pub mod aaaa;
pub mod caa;
pub mod cname;
pub mod dname;
pub mod mx;
pub mod ns;
pub mod opt;
pub mod sec;
pub mod soa;
pub mod spf;
pub mod txt;

pub use self::{
    a::A, aaaa::AAAA, caa::CAA, cname::CName, dname::DName, mx::MX, ns::NS, opt::OPT, soa::SOA,
    spf::SPF, txt::TXT,
};
pub use self::sec::{
    dnskey::DNSKEY,
    ds::DS,
    nsec::NSec,
    nsec3::{NSec3, NSec3Param},
    rrsig::RRSig,
};

use super::{
    name::DomainName, Type, TYPE_A, TYPE_AAAA, TYPE_CAA, TYPE_CNAME, TYPE_DNAME, TYPE_DNSKEY,
    TYPE_DS, TYPE_MX, TYPE_NS, TYPE_NSEC, TYPE_NSEC3, TYPE_NSEC3PARAM, TYPE_OPT, TYPE_RRSIG,
    TYPE_SOA, TYPE_SPF, TYPE_TXT,
};
use crate::errors::DnsError;
use std::fmt::Debug;

/// Bounds-checked reader over one RDATA field. `name()` may chase
/// compression pointers back into the surrounding message but the cursor
/// itself never leaves the `rdlength` window.
pub(crate) struct RDataCursor<'a> {
    raw: &'a [u8],
    pos: usize,
    end: usize,
}

impl<'a> RDataCursor<'a> {
    pub fn new(raw: &'a [u8], offset: usize, rdlength: usize) -> Result<Self, DnsError> {
        let end = offset
            .checked_add(rdlength)
            .filter(|end| *end <= raw.len())
            .ok_or_else(|| DnsError::format("rdlength exceeds the remaining message"))?;
        Ok(RDataCursor {
            raw,
            pos: offset,
            end,
        })
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DnsError> {
        if self.pos + n > self.end {
            return Err(DnsError::format("truncated rdata"));
        }
        let bytes = &self.raw[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub fn u8(&mut self) -> Result<u8, DnsError> {
        Ok(self.take(1)?[0])
    }

    pub fn u16(&mut self) -> Result<u16, DnsError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn u32(&mut self) -> Result<u32, DnsError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn bytes(&mut self, n: usize) -> Result<Vec<u8>, DnsError> {
        Ok(self.take(n)?.to_vec())
    }

    pub fn rest(&mut self) -> Vec<u8> {
        let bytes = self.raw[self.pos..self.end].to_vec();
        self.pos = self.end;
        bytes
    }

    pub fn name(&mut self) -> Result<DomainName, DnsError> {
        let name = DomainName::parse(self.raw, &mut self.pos)?;
        if self.pos > self.end {
            return Err(DnsError::format("domain name overruns rdata"));
        }
        Ok(name)
    }

    pub fn remaining(&self) -> usize {
        self.end - self.pos
    }

    pub fn expect_done(&self) -> Result<(), DnsError> {
        if self.pos != self.end {
            return Err(DnsError::format("trailing octets after rdata"));
        }
        Ok(())
    }
}

/**
The operations every concrete RDATA object supports.

decode: fill the object from the `rdlength` window at `offset` in `raw`.
encode: append the uncompressed wire form, case preserved.
canonical: append the RFC 4034 section 6.2 canonical form used for signing.
to_zone: render the zone-text form.
*/
pub trait RDataOperation: Debug {
    fn decode(&mut self, raw: &[u8], offset: usize, rdlength: usize) -> Result<(), DnsError>;

    fn encode(&self, out: &mut Vec<u8>);

    fn canonical(&self, out: &mut Vec<u8>);

    fn to_zone(&self) -> String;
}

/// RDATA preserved verbatim for types outside the served set (RFC 3597).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unknown {
    pub data: Vec<u8>,
}

impl Unknown {
    pub fn from(raw: &[u8], offset: usize, rdlength: usize) -> Result<Self, DnsError> {
        let mut unknown = Unknown { data: Vec::new() };
        unknown.decode(raw, offset, rdlength)?;
        Ok(unknown)
    }
}

impl RDataOperation for Unknown {
    fn decode(&mut self, raw: &[u8], offset: usize, rdlength: usize) -> Result<(), DnsError> {
        let mut cur = RDataCursor::new(raw, offset, rdlength)?;
        self.data = cur.rest();
        Ok(())
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.data);
    }

    fn canonical(&self, out: &mut Vec<u8>) {
        self.encode(out);
    }

    fn to_zone(&self) -> String {
        format!("\\# {} {}", self.data.len(), hex::encode(&self.data))
    }
}

/**
RDataType unions every object that implements RDataOperation.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RDataType {
    A(A),
    AAAA(AAAA),
    NS(NS),
    MX(MX),
    SOA(SOA),
    CName(CName),
    DName(DName),
    TXT(TXT),
    SPF(SPF),
    CAA(CAA),
    OPT(OPT),
    RRSig(RRSig),
    DS(DS),
    DNSKEY(DNSKEY),
    NSec(NSec),
    NSec3(NSec3),
    NSec3Param(NSec3Param),
    Unknown(Unknown),
}

impl RDataType {
    pub fn from(raw: &[u8], offset: usize, rdlength: usize, typ: Type) -> Result<Self, DnsError> {
        match typ {
            TYPE_A => Ok(RDataType::A(A::from(raw, offset, rdlength)?)),
            TYPE_AAAA => Ok(RDataType::AAAA(AAAA::from(raw, offset, rdlength)?)),
            TYPE_NS => Ok(RDataType::NS(NS::from(raw, offset, rdlength)?)),
            TYPE_MX => Ok(RDataType::MX(MX::from(raw, offset, rdlength)?)),
            TYPE_SOA => Ok(RDataType::SOA(SOA::from(raw, offset, rdlength)?)),
            TYPE_CNAME => Ok(RDataType::CName(CName::from(raw, offset, rdlength)?)),
            TYPE_DNAME => Ok(RDataType::DName(DName::from(raw, offset, rdlength)?)),
            TYPE_TXT => Ok(RDataType::TXT(TXT::from(raw, offset, rdlength)?)),
            TYPE_SPF => Ok(RDataType::SPF(SPF::from(raw, offset, rdlength)?)),
            TYPE_CAA => Ok(RDataType::CAA(CAA::from(raw, offset, rdlength)?)),
            TYPE_OPT => Ok(RDataType::OPT(OPT::from(raw, offset, rdlength)?)),
            TYPE_RRSIG => Ok(RDataType::RRSig(RRSig::from(raw, offset, rdlength)?)),
            TYPE_DS => Ok(RDataType::DS(DS::from(raw, offset, rdlength)?)),
            TYPE_DNSKEY => Ok(RDataType::DNSKEY(DNSKEY::from(raw, offset, rdlength)?)),
            TYPE_NSEC => Ok(RDataType::NSec(NSec::from(raw, offset, rdlength)?)),
            TYPE_NSEC3 => Ok(RDataType::NSec3(NSec3::from(raw, offset, rdlength)?)),
            TYPE_NSEC3PARAM => Ok(RDataType::NSec3Param(NSec3Param::from(
                raw, offset, rdlength,
            )?)),
            _ => Ok(RDataType::Unknown(Unknown::from(raw, offset, rdlength)?)),
        }
    }

    fn op(&self) -> &dyn RDataOperation {
        match self {
            RDataType::A(v) => v,
            RDataType::AAAA(v) => v,
            RDataType::NS(v) => v,
            RDataType::MX(v) => v,
            RDataType::SOA(v) => v,
            RDataType::CName(v) => v,
            RDataType::DName(v) => v,
            RDataType::TXT(v) => v,
            RDataType::SPF(v) => v,
            RDataType::CAA(v) => v,
            RDataType::OPT(v) => v,
            RDataType::RRSig(v) => v,
            RDataType::DS(v) => v,
            RDataType::DNSKEY(v) => v,
            RDataType::NSec(v) => v,
            RDataType::NSec3(v) => v,
            RDataType::NSec3Param(v) => v,
            RDataType::Unknown(v) => v,
        }
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        self.op().encode(out)
    }

    pub fn canonical(&self, out: &mut Vec<u8>) {
        self.op().canonical(out)
    }

    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.canonical(&mut out);
        out
    }

    pub fn to_zone(&self) -> String {
        self.op().to_zone()
    }
}
