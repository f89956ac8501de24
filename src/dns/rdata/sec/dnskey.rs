use super::SecAlgorithm;
use crate::dns::rdata::{RDataCursor, RDataOperation};
use crate::errors::DnsError;
use crate::util;

/// Zone Key flag set: the key signs zone data (a ZSK).
pub const FLAGS_ZSK: u16 = 0x0100;
/// Zone Key and Secure Entry Point flags set: a KSK referenced by the
/// parent's DS record.
pub const FLAGS_KSK: u16 = 0x0101;

/**
ref: https://www.rfc-editor.org/rfc/rfc4034#section-2.1

# DNSKEY RDATA format

```text
    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    |              Flags            |    Protocol   |   Algorithm   |
    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    /                                                               /
    /                            Public Key                         /
    /                                                               /
    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
```

Bit 7 of the Flags field is the Zone Key flag; a DNSKEY without it MUST
NOT be used to verify RRSIGs over zone data. Bit 15 is the Secure Entry
Point hint of RFC 3757. The Protocol field MUST be 3.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DNSKEY {
    pub flags: u16,
    pub protocol: u8,
    pub algorithm: SecAlgorithm,
    pub public_key: Vec<u8>,
}

impl DNSKEY {
    pub fn new(flags: u16, algorithm: SecAlgorithm, public_key: Vec<u8>) -> Self {
        DNSKEY {
            flags,
            protocol: 3,
            algorithm,
            public_key,
        }
    }

    pub fn from(raw: &[u8], offset: usize, rdlength: usize) -> Result<Self, DnsError> {
        let mut dnskey = DNSKEY::new(0, 0, vec![]);
        dnskey.decode(raw, offset, rdlength)?;
        Ok(dnskey)
    }

    pub fn zone_key(&self) -> bool {
        self.flags & 0x0100 == 0x0100
    }

    pub fn secure_entry_point(&self) -> bool {
        self.flags & 0x0001 == 0x0001
    }

    /**
    The key tag of RFC 4034 Appendix B: the wire-format RDATA folded as
    a series of 2-octet groups summed without carry. It narrows the
    candidate DNSKEYs for a signature but is not a unique identifier.
    The algorithm 1 exception of Appendix B.1 does not apply to any
    algorithm this server signs with.
    */
    pub fn key_tag(&self) -> u16 {
        let mut rdata = Vec::new();
        self.encode(&mut rdata);

        let mut ac: u32 = 0;
        for (index, octet) in rdata.iter().enumerate() {
            if index % 2 == 0 {
                ac += (*octet as u32) << 8;
            } else {
                ac += *octet as u32;
            }
        }
        ac += (ac >> 16) & 0xFFFF;
        (ac & 0xFFFF) as u16
    }
}

impl RDataOperation for DNSKEY {
    fn decode(&mut self, raw: &[u8], offset: usize, rdlength: usize) -> Result<(), DnsError> {
        let mut cur = RDataCursor::new(raw, offset, rdlength)?;
        self.flags = cur.u16()?;
        self.protocol = cur.u8()?;
        self.algorithm = cur.u8()?;
        self.public_key = cur.rest();
        if self.public_key.is_empty() {
            return Err(DnsError::format("DNSKEY record without key material"));
        }
        Ok(())
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.flags.to_be_bytes());
        out.push(self.protocol);
        out.push(self.algorithm);
        out.extend_from_slice(&self.public_key);
    }

    fn canonical(&self, out: &mut Vec<u8>) {
        self.encode(out);
    }

    fn to_zone(&self) -> String {
        format!(
            "{} {} {} {}",
            self.flags,
            self.protocol,
            self.algorithm,
            util::encode_base64(&self.public_key)
        )
    }
}
