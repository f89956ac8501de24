use super::{RDataCursor, RDataOperation};
use crate::dns::name::DomainName;
use crate::errors::DnsError;

/// Redirection for an entire subtree: every name below the owner is
/// rewritten under the target, and the server synthesizes the matching
/// CNAME in responses.
///
/// ref: https://www.rfc-editor.org/rfc/rfc6672
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DName {
    pub target: DomainName,
}

impl DName {
    pub fn new(target: DomainName) -> Self {
        DName { target }
    }

    pub fn from(raw: &[u8], offset: usize, rdlength: usize) -> Result<Self, DnsError> {
        let mut dname = DName::new(DomainName::root());
        dname.decode(raw, offset, rdlength)?;
        Ok(dname)
    }
}

impl RDataOperation for DName {
    fn decode(&mut self, raw: &[u8], offset: usize, rdlength: usize) -> Result<(), DnsError> {
        let mut cur = RDataCursor::new(raw, offset, rdlength)?;
        self.target = cur.name()?;
        cur.expect_done()
    }

    fn encode(&self, out: &mut Vec<u8>) {
        self.target.to_wire(out);
    }

    fn canonical(&self, out: &mut Vec<u8>) {
        self.target.canonical_wire(out);
    }

    fn to_zone(&self) -> String {
        self.target.to_string()
    }
}
