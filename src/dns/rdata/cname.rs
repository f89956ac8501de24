use super::{RDataCursor, RDataOperation};
use crate::dns::name::DomainName;
use crate::errors::DnsError;

/**
ref: https://www.rfc-editor.org/rfc/rfc1035#section-3.3.1

# CNAME RDATA format

```text
    +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    /                     CNAME                     /
    +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
```

A <domain-name> which specifies the canonical or primary name for the
owner. The owner name is an alias. A CNAME RRset holds exactly one
record; the zone loader enforces that.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CName {
    pub canonicalname: DomainName,
}

impl CName {
    pub fn new(canonicalname: DomainName) -> Self {
        CName { canonicalname }
    }

    pub fn from(raw: &[u8], offset: usize, rdlength: usize) -> Result<Self, DnsError> {
        let mut cname = CName::new(DomainName::root());
        cname.decode(raw, offset, rdlength)?;
        Ok(cname)
    }
}

impl RDataOperation for CName {
    fn decode(&mut self, raw: &[u8], offset: usize, rdlength: usize) -> Result<(), DnsError> {
        let mut cur = RDataCursor::new(raw, offset, rdlength)?;
        self.canonicalname = cur.name()?;
        cur.expect_done()
    }

    fn encode(&self, out: &mut Vec<u8>) {
        self.canonicalname.to_wire(out);
    }

    fn canonical(&self, out: &mut Vec<u8>) {
        self.canonicalname.canonical_wire(out);
    }

    fn to_zone(&self) -> String {
        self.canonicalname.to_string()
    }
}
