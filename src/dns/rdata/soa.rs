use super::{RDataCursor, RDataOperation};
use crate::dns::name::DomainName;
use crate::errors::DnsError;

/**
ref: https://www.rfc-editor.org/rfc/rfc1035#section-3.3.13

# SOA RDATA format

```text
    +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    /                     MNAME                     /
    +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    /                     RNAME                     /
    +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    |                    SERIAL                     |
    +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    |                    REFRESH                    |
    +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    |                     RETRY                     |
    +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    |                    EXPIRE                     |
    +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    |                    MINIMUM                    |
    +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
```

MINIMUM bounds the TTL of negative answers from this zone: the SOA in
the authority section of NXDOMAIN and NODATA responses is capped to
min(MINIMUM, SOA TTL).
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SOA {
    /// The <domain-name> of the name server that was the original or
    /// primary source of data for this zone.
    pub mname: DomainName,

    /// A <domain-name> which specifies the mailbox of the person
    /// responsible for this zone.
    pub rname: DomainName,

    /// The unsigned 32 bit version number of the original copy of the
    /// zone. This value wraps and should be compared using sequence space
    /// arithmetic.
    pub serial: u32,

    /// A 32 bit time interval before the zone should be refreshed.
    pub refresh: u32,

    /// A 32 bit time interval that should elapse before a failed refresh
    /// should be retried.
    pub retry: u32,

    /// A 32 bit time value that specifies the upper limit on the time
    /// interval that can elapse before the zone is no longer
    /// authoritative.
    pub expire: u32,

    /// The unsigned 32 bit minimum TTL field that should be exported with
    /// any RR from this zone.
    pub minimum: u32,
}

impl SOA {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        mname: DomainName,
        rname: DomainName,
        serial: u32,
        refresh: u32,
        retry: u32,
        expire: u32,
        minimum: u32,
    ) -> Self {
        SOA {
            mname,
            rname,
            serial,
            refresh,
            retry,
            expire,
            minimum,
        }
    }

    pub fn from(raw: &[u8], offset: usize, rdlength: usize) -> Result<Self, DnsError> {
        let mut soa = SOA::new(DomainName::root(), DomainName::root(), 0, 0, 0, 0, 0);
        soa.decode(raw, offset, rdlength)?;
        Ok(soa)
    }
}

impl RDataOperation for SOA {
    fn decode(&mut self, raw: &[u8], offset: usize, rdlength: usize) -> Result<(), DnsError> {
        let mut cur = RDataCursor::new(raw, offset, rdlength)?;
        self.mname = cur.name()?;
        self.rname = cur.name()?;
        self.serial = cur.u32()?;
        self.refresh = cur.u32()?;
        self.retry = cur.u32()?;
        self.expire = cur.u32()?;
        self.minimum = cur.u32()?;
        cur.expect_done()
    }

    fn encode(&self, out: &mut Vec<u8>) {
        self.mname.to_wire(out);
        self.rname.to_wire(out);
        for field in [
            self.serial,
            self.refresh,
            self.retry,
            self.expire,
            self.minimum,
        ] {
            out.extend_from_slice(&field.to_be_bytes());
        }
    }

    fn canonical(&self, out: &mut Vec<u8>) {
        self.mname.canonical_wire(out);
        self.rname.canonical_wire(out);
        for field in [
            self.serial,
            self.refresh,
            self.retry,
            self.expire,
            self.minimum,
        ] {
            out.extend_from_slice(&field.to_be_bytes());
        }
    }

    fn to_zone(&self) -> String {
        format!(
            "{} {} {} {} {} {} {}",
            self.mname, self.rname, self.serial, self.refresh, self.retry, self.expire, self.minimum
        )
    }
}
