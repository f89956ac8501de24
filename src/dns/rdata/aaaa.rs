use super::{RDataCursor, RDataOperation};
use crate::errors::DnsError;
use std::net::Ipv6Addr;

/// A 128 bit IPv6 address in network byte order.
///
/// ref: https://www.rfc-editor.org/rfc/rfc3596
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AAAA {
    pub address: Ipv6Addr,
}

impl AAAA {
    pub fn new(address: Ipv6Addr) -> Self {
        AAAA { address }
    }

    pub fn from(raw: &[u8], offset: usize, rdlength: usize) -> Result<Self, DnsError> {
        let mut aaaa = AAAA::new(Ipv6Addr::UNSPECIFIED);
        aaaa.decode(raw, offset, rdlength)?;
        Ok(aaaa)
    }
}

impl RDataOperation for AAAA {
    fn decode(&mut self, raw: &[u8], offset: usize, rdlength: usize) -> Result<(), DnsError> {
        let mut cur = RDataCursor::new(raw, offset, rdlength)?;
        let octets: [u8; 16] = cur
            .bytes(16)?
            .try_into()
            .map_err(|_| DnsError::format("bad AAAA rdata"))?;
        self.address = Ipv6Addr::from(octets);
        cur.expect_done()
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.address.octets());
    }

    fn canonical(&self, out: &mut Vec<u8>) {
        self.encode(out);
    }

    fn to_zone(&self) -> String {
        self.address.to_string()
    }
}
