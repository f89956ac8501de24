use super::SecAlgorithm;
use crate::dns::name::DomainName;
use crate::dns::rdata::{RDataCursor, RDataOperation};
use crate::dns::{type_to_str, Type};
use crate::errors::DnsError;
use crate::util;

/**
ref: https://www.rfc-editor.org/rfc/rfc4034#section-3.1

# RRSIG RDATA format

```text
    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    |        Type Covered           |  Algorithm    |     Labels    |
    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    |                         Original TTL                          |
    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    |                      Signature Expiration                     |
    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    |                      Signature Inception                      |
    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    |            Key Tag            |                               /
    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+         Signer's Name         /
    /                                                               /
    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    /                            Signature                          /
    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
```
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RRSig {
    /// The type of the RRset covered by this signature.
    pub type_covered: Type,

    /// The cryptographic algorithm used to create the signature.
    pub algorithm: SecAlgorithm,

    /**
    The number of labels in the original owner name, not counting the
    root or a wildcard label. A validator compares it against the owner
    it received to detect wildcard expansion: "www.example.com." carries
    3, "*.example.com." carries 2, the root carries 0.
    */
    pub labels: u8,

    /// The TTL of the covered RRset as it appears in the zone. A caching
    /// resolver decrements the RRset TTL but verification needs the
    /// original.
    pub original_ttl: u32,

    /**
    Validity bounds as 32-bit epoch seconds. The signature MUST NOT be
    used before the inception or after the expiration, and because the
    values wrap every comparison uses RFC 1982 serial number arithmetic.
    */
    pub expiration: u32,
    pub inception: u32,

    /// The key tag of the DNSKEY that validates this signature
    /// (RFC 4034 Appendix B).
    pub key_tag: u16,

    /// The owner of that DNSKEY, i.e. the zone name. Never compressed on
    /// the wire.
    pub signer: DomainName,

    /// The signature over the RRSIG RDATA (minus this field) and the
    /// covered RRset in canonical form.
    pub signature: Vec<u8>,
}

impl RRSig {
    pub fn from(raw: &[u8], offset: usize, rdlength: usize) -> Result<Self, DnsError> {
        let mut rrsig = RRSig {
            type_covered: 0,
            algorithm: 0,
            labels: 0,
            original_ttl: 0,
            expiration: 0,
            inception: 0,
            key_tag: 0,
            signer: DomainName::root(),
            signature: Vec::new(),
        };
        rrsig.decode(raw, offset, rdlength)?;
        Ok(rrsig)
    }

    /// The RDATA prefix covered by the signature: every field except the
    /// signature itself, with the signer's name in canonical form.
    pub fn signed_prefix(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.type_covered.to_be_bytes());
        out.push(self.algorithm);
        out.push(self.labels);
        out.extend_from_slice(&self.original_ttl.to_be_bytes());
        out.extend_from_slice(&self.expiration.to_be_bytes());
        out.extend_from_slice(&self.inception.to_be_bytes());
        out.extend_from_slice(&self.key_tag.to_be_bytes());
        self.signer.canonical_wire(&mut out);
        out
    }

    /// inception <= now < expiration, in serial number arithmetic.
    pub fn valid_at(&self, now: u32) -> bool {
        util::serial_le(self.inception, now) && util::serial_lt(now, self.expiration)
    }
}

impl RDataOperation for RRSig {
    fn decode(&mut self, raw: &[u8], offset: usize, rdlength: usize) -> Result<(), DnsError> {
        let mut cur = RDataCursor::new(raw, offset, rdlength)?;
        self.type_covered = cur.u16()?;
        self.algorithm = cur.u8()?;
        self.labels = cur.u8()?;
        self.original_ttl = cur.u32()?;
        self.expiration = cur.u32()?;
        self.inception = cur.u32()?;
        self.key_tag = cur.u16()?;
        self.signer = cur.name()?;
        self.signature = cur.rest();
        Ok(())
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.type_covered.to_be_bytes());
        out.push(self.algorithm);
        out.push(self.labels);
        out.extend_from_slice(&self.original_ttl.to_be_bytes());
        out.extend_from_slice(&self.expiration.to_be_bytes());
        out.extend_from_slice(&self.inception.to_be_bytes());
        out.extend_from_slice(&self.key_tag.to_be_bytes());
        self.signer.to_wire(out);
        out.extend_from_slice(&self.signature);
    }

    fn canonical(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.type_covered.to_be_bytes());
        out.push(self.algorithm);
        out.push(self.labels);
        out.extend_from_slice(&self.original_ttl.to_be_bytes());
        out.extend_from_slice(&self.expiration.to_be_bytes());
        out.extend_from_slice(&self.inception.to_be_bytes());
        out.extend_from_slice(&self.key_tag.to_be_bytes());
        self.signer.canonical_wire(out);
        out.extend_from_slice(&self.signature);
    }

    fn to_zone(&self) -> String {
        format!(
            "{} {} {} {} {} {} {} {} {}",
            type_to_str(self.type_covered),
            self.algorithm,
            self.labels,
            self.original_ttl,
            util::epoch_to_timestamp(self.expiration),
            util::epoch_to_timestamp(self.inception),
            self.key_tag,
            self.signer,
            util::encode_base64(&self.signature)
        )
    }
}
