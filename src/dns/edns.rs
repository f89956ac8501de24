use super::name::DomainName;
use super::rdata::opt::{EdnsOption, OPTION_NSID, OPT};
use super::rdata::RDataType;
use super::rr::RR;
use super::TYPE_OPT;
use crate::errors::DnsError;

/// The DO bit sits at the top of the 16 flag bits packed into the OPT ttl.
const FLAG_DNSSEC_OK: u16 = 0x8000;

/// The smallest payload size EDNS may advertise.
pub const MIN_PAYLOAD_SIZE: u16 = 512;

/**
EDNS(0) state extracted from the OPT pseudo-RR (RFC 6891). The OPT RR
shell reinterprets the fixed RR fields:

```shell
    NAME   the root
    CLASS  requestor's UDP payload size
    TTL    extended RCODE (8) | version (8) | DO (1) | Z (15)
```

Exactly one OPT may appear, in the additional section; a second one is a
format error.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edns {
    pub payload_size: u16,
    pub ext_rcode: u8,
    pub version: u8,
    pub dnssec_ok: bool,
    pub opt: OPT,
}

impl Edns {
    pub fn new(payload_size: u16) -> Self {
        Edns {
            payload_size: payload_size.max(MIN_PAYLOAD_SIZE),
            ext_rcode: 0,
            version: 0,
            dnssec_ok: false,
            opt: OPT::new(vec![]),
        }
    }

    pub fn with_dnssec_ok(mut self, dnssec_ok: bool) -> Self {
        self.dnssec_ok = dnssec_ok;
        self
    }

    pub fn from_rr(rr: &RR) -> Result<Self, DnsError> {
        if rr.typ() != TYPE_OPT {
            return Err(DnsError::format("not an OPT record"));
        }
        if !rr.name().is_root() {
            return Err(DnsError::format("OPT owner must be the root"));
        }
        let opt = match rr.rdata() {
            RDataType::OPT(opt) => opt.clone(),
            _ => return Err(DnsError::format("OPT rdata of the wrong shape")),
        };
        let ttl = rr.ttl();
        let version = ((ttl >> 16) & 0xFF) as u8;
        if version != 0 {
            return Err(DnsError::format(format!(
                "unsupported EDNS version {}",
                version
            )));
        }

        Ok(Edns {
            payload_size: rr.class().max(MIN_PAYLOAD_SIZE),
            ext_rcode: ((ttl >> 24) & 0xFF) as u8,
            version,
            dnssec_ok: (ttl & 0xFFFF) as u16 & FLAG_DNSSEC_OK != 0,
            opt,
        })
    }

    pub fn to_rr(&self) -> RR {
        let mut flags = 0_u16;
        if self.dnssec_ok {
            flags |= FLAG_DNSSEC_OK;
        }
        let ttl =
            ((self.ext_rcode as u32) << 24) | ((self.version as u32) << 16) | flags as u32;
        RR::new(
            DomainName::root(),
            TYPE_OPT,
            self.payload_size,
            ttl,
            RDataType::OPT(self.opt.clone()),
        )
    }

    pub fn nsid(&self) -> Option<&[u8]> {
        self.opt.option(OPTION_NSID).map(|o| o.data.as_slice())
    }

    pub fn with_nsid(&mut self, id: &[u8]) -> &mut Self {
        self.opt.options.push(EdnsOption {
            code: OPTION_NSID,
            data: id.to_vec(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edns_rr_round_trip() {
        let mut edns = Edns::new(4096).with_dnssec_ok(true);
        edns.ext_rcode = 0;
        edns.with_nsid(b"ns1");

        let rr = edns.to_rr();
        assert_eq!(TYPE_OPT, rr.typ());
        assert_eq!(4096, rr.class());
        assert_eq!(0x0000_8000, rr.ttl());

        let parsed = Edns::from_rr(&rr).unwrap();
        assert_eq!(edns, parsed);
        assert_eq!(Some(b"ns1".as_slice()), parsed.nsid());
    }

    #[test]
    fn test_payload_size_floor() {
        let edns = Edns::new(100);
        assert_eq!(MIN_PAYLOAD_SIZE, edns.payload_size);
    }

    #[test]
    fn test_rejects_future_version() {
        let mut edns = Edns::new(1232);
        edns.version = 1;
        let rr = edns.to_rr();
        assert!(Edns::from_rr(&rr).is_err());
    }
}
