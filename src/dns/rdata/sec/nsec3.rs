use super::nsec::{decode_type_bitmap, encode_type_bitmap, types_to_zone};
use crate::dns::rdata::{RDataCursor, RDataOperation};
use crate::dns::Type;
use crate::errors::DnsError;

/// Opt-Out flag: the interval covered by this record may contain unsigned
/// delegations.
pub const NSEC3_FLAG_OPT_OUT: u8 = 0x01;

/**
ref: https://www.rfc-editor.org/rfc/rfc5155#section-3.2

# NSEC3 RDATA format

```text
    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    |   Hash Alg.   |     Flags     |          Iterations           |
    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    |  Salt Length  |                     Salt                      /
    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    |  Hash Length  |             Next Hashed Owner Name            /
    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    /                         Type Bit Maps                         /
    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
```

The next hashed owner is the raw hash value, not base32 encoded, and
does not include the zone name. Given the hash-ordered set of all
hashed owner names, the last record's next field equals the first
record's hashed owner, closing the chain.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NSec3 {
    pub algorithm: u8,
    pub flags: u8,
    pub iterations: u16,
    pub salt: Vec<u8>,
    pub next_hashed: Vec<u8>,
    pub types: Vec<Type>,
}

impl NSec3 {
    pub fn new(
        algorithm: u8,
        flags: u8,
        iterations: u16,
        salt: Vec<u8>,
        next_hashed: Vec<u8>,
        types: Vec<Type>,
    ) -> Self {
        NSec3 {
            algorithm,
            flags,
            iterations,
            salt,
            next_hashed,
            types,
        }
    }

    pub fn from(raw: &[u8], offset: usize, rdlength: usize) -> Result<Self, DnsError> {
        let mut nsec3 = NSec3::new(0, 0, 0, vec![], vec![], vec![]);
        nsec3.decode(raw, offset, rdlength)?;
        Ok(nsec3)
    }

    pub fn opt_out(&self) -> bool {
        self.flags & NSEC3_FLAG_OPT_OUT == NSEC3_FLAG_OPT_OUT
    }
}

fn salt_to_zone(salt: &[u8]) -> String {
    if salt.is_empty() {
        "-".to_string()
    } else {
        hex::encode_upper(salt)
    }
}

impl RDataOperation for NSec3 {
    fn decode(&mut self, raw: &[u8], offset: usize, rdlength: usize) -> Result<(), DnsError> {
        let mut cur = RDataCursor::new(raw, offset, rdlength)?;
        self.algorithm = cur.u8()?;
        self.flags = cur.u8()?;
        self.iterations = cur.u16()?;
        let salt_len = cur.u8()? as usize;
        self.salt = cur.bytes(salt_len)?;
        let hash_len = cur.u8()? as usize;
        if hash_len == 0 {
            return Err(DnsError::format("NSEC3 without a next hashed owner"));
        }
        self.next_hashed = cur.bytes(hash_len)?;
        self.types = decode_type_bitmap(&mut cur)?;
        Ok(())
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.algorithm);
        out.push(self.flags);
        out.extend_from_slice(&self.iterations.to_be_bytes());
        out.push(self.salt.len() as u8);
        out.extend_from_slice(&self.salt);
        out.push(self.next_hashed.len() as u8);
        out.extend_from_slice(&self.next_hashed);
        encode_type_bitmap(&self.types, out);
    }

    fn canonical(&self, out: &mut Vec<u8>) {
        self.encode(out);
    }

    fn to_zone(&self) -> String {
        let next = base32::encode(
            base32::Alphabet::Rfc4648HexLower { padding: false },
            &self.next_hashed,
        );
        format!(
            "{} {} {} {} {} {}",
            self.algorithm,
            self.flags,
            self.iterations,
            salt_to_zone(&self.salt),
            next,
            types_to_zone(&self.types)
        )
    }
}

/**
ref: https://www.rfc-editor.org/rfc/rfc5155#section-4

NSEC3PARAM publishes, at the zone apex, the hash algorithm, iterations
and salt authoritative servers use to compute hashed owner names. Its
flags field must be zero. Validators ignore it; it exists so secondary
servers can generate NSEC3 responses.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NSec3Param {
    pub algorithm: u8,
    pub flags: u8,
    pub iterations: u16,
    pub salt: Vec<u8>,
}

impl NSec3Param {
    pub fn new(algorithm: u8, flags: u8, iterations: u16, salt: Vec<u8>) -> Self {
        NSec3Param {
            algorithm,
            flags,
            iterations,
            salt,
        }
    }

    pub fn from(raw: &[u8], offset: usize, rdlength: usize) -> Result<Self, DnsError> {
        let mut param = NSec3Param::new(0, 0, 0, vec![]);
        param.decode(raw, offset, rdlength)?;
        Ok(param)
    }
}

impl RDataOperation for NSec3Param {
    fn decode(&mut self, raw: &[u8], offset: usize, rdlength: usize) -> Result<(), DnsError> {
        let mut cur = RDataCursor::new(raw, offset, rdlength)?;
        self.algorithm = cur.u8()?;
        self.flags = cur.u8()?;
        self.iterations = cur.u16()?;
        let salt_len = cur.u8()? as usize;
        self.salt = cur.bytes(salt_len)?;
        cur.expect_done()
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.algorithm);
        out.push(self.flags);
        out.extend_from_slice(&self.iterations.to_be_bytes());
        out.push(self.salt.len() as u8);
        out.extend_from_slice(&self.salt);
    }

    fn canonical(&self, out: &mut Vec<u8>) {
        self.encode(out);
    }

    fn to_zone(&self) -> String {
        format!(
            "{} {} {} {}",
            self.algorithm,
            self.flags,
            self.iterations,
            salt_to_zone(&self.salt)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::{TYPE_A, TYPE_RRSIG};

    #[test]
    fn test_nsec3_round_trip() {
        let nsec3 = NSec3::new(
            1,
            NSEC3_FLAG_OPT_OUT,
            12,
            vec![0xaa, 0xbb, 0xcc, 0xdd],
            vec![0x11; 20],
            vec![TYPE_A, TYPE_RRSIG],
        );
        let mut wire = Vec::new();
        nsec3.encode(&mut wire);

        let parsed = NSec3::from(&wire, 0, wire.len()).unwrap();
        assert_eq!(nsec3, parsed);
        assert!(parsed.opt_out());
        assert!(parsed.to_zone().starts_with("1 1 12 AABBCCDD "));
    }

    #[test]
    fn test_nsec3param_round_trip() {
        let param = NSec3Param::new(1, 0, 1, vec![0xab]);
        let mut wire = Vec::new();
        param.encode(&mut wire);
        assert_eq!(&[1, 0, 0, 1, 1, 0xab], wire.as_slice());

        let parsed = NSec3Param::from(&wire, 0, wire.len()).unwrap();
        assert_eq!(param, parsed);
        assert_eq!("1 0 1 AB", parsed.to_zone());
    }

    #[test]
    fn test_empty_salt_renders_dash() {
        let param = NSec3Param::new(1, 0, 0, vec![]);
        assert_eq!("1 0 0 -", param.to_zone());
    }
}
