use super::{RDataCursor, RDataOperation};
use crate::dns::name::DomainName;
use crate::errors::DnsError;

/**
ref: https://www.rfc-editor.org/rfc/rfc1035#section-3.3.9

# MX RDATA format

```text
    +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    |                  PREFERENCE                   |
    +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    /                   EXCHANGE                    /
    +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
```

PREFERENCE is a 16 bit integer which specifies the preference given to
this RR among others at the same owner; lower values are preferred.
EXCHANGE is a <domain-name> which specifies a host willing to act as a
mail exchange for the owner name.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MX {
    pub priority: u16,
    pub mailserver: DomainName,
}

impl MX {
    pub fn new(priority: u16, mailserver: DomainName) -> Self {
        MX {
            priority,
            mailserver,
        }
    }

    pub fn from(raw: &[u8], offset: usize, rdlength: usize) -> Result<Self, DnsError> {
        let mut mx = MX::new(0, DomainName::root());
        mx.decode(raw, offset, rdlength)?;
        Ok(mx)
    }
}

impl RDataOperation for MX {
    fn decode(&mut self, raw: &[u8], offset: usize, rdlength: usize) -> Result<(), DnsError> {
        let mut cur = RDataCursor::new(raw, offset, rdlength)?;
        self.priority = cur.u16()?;
        self.mailserver = cur.name()?;
        cur.expect_done()
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.priority.to_be_bytes());
        self.mailserver.to_wire(out);
    }

    fn canonical(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.priority.to_be_bytes());
        self.mailserver.canonical_wire(out);
    }

    fn to_zone(&self) -> String {
        format!("{} {}", self.priority, self.mailserver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mx_round_trip() {
        let mx = MX::new(
            10,
            DomainName::from_text("mail.example.com.", None).unwrap(),
        );
        let mut wire = Vec::new();
        mx.encode(&mut wire);

        let parsed = MX::from(&wire, 0, wire.len()).unwrap();
        assert_eq!(mx, parsed);
        assert_eq!("10 mail.example.com.", parsed.to_zone());
    }
}
