use super::{DigestType, SecAlgorithm};
use crate::dns::rdata::{RDataCursor, RDataOperation};
use crate::errors::DnsError;

/**
ref: https://www.rfc-editor.org/rfc/rfc4034#section-5.1

# DS RDATA format

```text
    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    |           Key Tag             |  Algorithm    |  Digest Type  |
    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    /                            Digest                             /
    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
```

The digest is computed over the canonical owner name of the referenced
DNSKEY concatenated with its RDATA. These records summarize the KSK for
upload to the parent zone.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DS {
    pub key_tag: u16,
    pub algorithm: SecAlgorithm,
    pub digest_type: DigestType,
    pub digest: Vec<u8>,
}

impl DS {
    pub fn new(key_tag: u16, algorithm: SecAlgorithm, digest_type: DigestType, digest: Vec<u8>) -> Self {
        DS {
            key_tag,
            algorithm,
            digest_type,
            digest,
        }
    }

    pub fn from(raw: &[u8], offset: usize, rdlength: usize) -> Result<Self, DnsError> {
        let mut ds = DS::new(0, 0, 0, vec![]);
        ds.decode(raw, offset, rdlength)?;
        Ok(ds)
    }
}

impl RDataOperation for DS {
    fn decode(&mut self, raw: &[u8], offset: usize, rdlength: usize) -> Result<(), DnsError> {
        let mut cur = RDataCursor::new(raw, offset, rdlength)?;
        self.key_tag = cur.u16()?;
        self.algorithm = cur.u8()?;
        self.digest_type = cur.u8()?;
        self.digest = cur.rest();
        if self.digest.is_empty() {
            return Err(DnsError::format("DS record without a digest"));
        }
        Ok(())
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.key_tag.to_be_bytes());
        out.push(self.algorithm);
        out.push(self.digest_type);
        out.extend_from_slice(&self.digest);
    }

    fn canonical(&self, out: &mut Vec<u8>) {
        self.encode(out);
    }

    fn to_zone(&self) -> String {
        format!(
            "{} {} {} {}",
            self.key_tag,
            self.algorithm,
            self.digest_type,
            hex::encode_upper(&self.digest)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ds_round_trip() {
        let ds = DS::new(60485, 5, 1, vec![0x2b, 0xb1, 0x83, 0xaf]);
        let mut wire = Vec::new();
        ds.encode(&mut wire);

        let parsed = DS::from(&wire, 0, wire.len()).unwrap();
        assert_eq!(ds, parsed);
        assert_eq!("60485 5 1 2BB183AF", parsed.to_zone());
    }

    #[test]
    fn test_ds_requires_digest() {
        let wire = [0xec, 0x45, 5, 1];
        assert!(DS::from(&wire, 0, wire.len()).is_err());
    }
}
