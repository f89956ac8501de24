use crate::dns::name::DomainName;
use crate::dns::rdata::{RDataCursor, RDataOperation};
use crate::dns::{type_to_str, Type};
use crate::errors::DnsError;

/**
ref: https://www.rfc-editor.org/rfc/rfc4034#section-4.1

# NSEC RDATA format

```text
    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    /                      Next Domain Name                         /
    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    /                       Type Bit Maps                           /
    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
```

The Next Domain Name field is the canonical successor of the owner in
the zone; the last NSEC wraps back to the apex, closing the chain. A
sender MUST NOT use DNS name compression on this field. The bitmap
lists exactly the RRset types that exist at the owner.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NSec {
    pub next: DomainName,
    pub types: Vec<Type>,
}

impl NSec {
    pub fn new(next: DomainName, types: Vec<Type>) -> Self {
        NSec { next, types }
    }

    pub fn from(raw: &[u8], offset: usize, rdlength: usize) -> Result<Self, DnsError> {
        let mut nsec = NSec::new(DomainName::root(), vec![]);
        nsec.decode(raw, offset, rdlength)?;
        Ok(nsec)
    }
}

/// Encodes a type list as the windowed bitmap of RFC 4034 section 4.1.2.
pub(crate) fn encode_type_bitmap(types: &[Type], out: &mut Vec<u8>) {
    let mut sorted: Vec<Type> = types.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut window: u8 = 0;
    let mut bitmap = [0_u8; 32];
    let mut used = 0_usize;
    let mut dirty = false;

    let flush = |window: u8, bitmap: &mut [u8; 32], used: &mut usize, out: &mut Vec<u8>| {
        out.push(window);
        out.push(*used as u8);
        out.extend_from_slice(&bitmap[..*used]);
        bitmap.fill(0);
        *used = 0;
    };

    for typ in sorted {
        let block = (typ >> 8) as u8;
        if dirty && block != window {
            flush(window, &mut bitmap, &mut used, out);
        }
        window = block;
        dirty = true;
        let low = (typ & 0xFF) as usize;
        bitmap[low / 8] |= 0x80 >> (low % 8);
        used = used.max(low / 8 + 1);
    }
    if dirty {
        flush(window, &mut bitmap, &mut used, out);
    }
}

/// Decodes a windowed type bitmap until the cursor is exhausted.
pub(crate) fn decode_type_bitmap(cur: &mut RDataCursor) -> Result<Vec<Type>, DnsError> {
    let mut types = Vec::new();
    while cur.remaining() > 0 {
        let window = cur.u8()? as u16;
        let len = cur.u8()? as usize;
        if len == 0 || len > 32 {
            return Err(DnsError::format("bad type bitmap window length"));
        }
        let octets = cur.bytes(len)?;
        for (index, octet) in octets.iter().enumerate() {
            for bit in 0..8 {
                if octet & (0x80 >> bit) != 0 {
                    types.push((window << 8) | (index as u16 * 8 + bit as u16));
                }
            }
        }
    }
    Ok(types)
}

pub(crate) fn types_to_zone(types: &[Type]) -> String {
    types
        .iter()
        .map(|t| type_to_str(*t))
        .collect::<Vec<_>>()
        .join(" ")
}

impl RDataOperation for NSec {
    fn decode(&mut self, raw: &[u8], offset: usize, rdlength: usize) -> Result<(), DnsError> {
        let mut cur = RDataCursor::new(raw, offset, rdlength)?;
        self.next = cur.name()?;
        self.types = decode_type_bitmap(&mut cur)?;
        Ok(())
    }

    fn encode(&self, out: &mut Vec<u8>) {
        self.next.to_wire(out);
        encode_type_bitmap(&self.types, out);
    }

    fn canonical(&self, out: &mut Vec<u8>) {
        self.next.canonical_wire(out);
        encode_type_bitmap(&self.types, out);
    }

    fn to_zone(&self) -> String {
        format!("{} {}", self.next, types_to_zone(&self.types))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::{TYPE_A, TYPE_CAA, TYPE_MX, TYPE_NSEC, TYPE_RRSIG};

    #[test]
    fn test_bitmap_single_window() {
        let mut out = Vec::new();
        encode_type_bitmap(&[TYPE_A, TYPE_MX, TYPE_RRSIG, TYPE_NSEC], &mut out);
        // A = bit 1, MX = bit 15, RRSIG = 46, NSEC = 47 -> 6 octets
        assert_eq!(0, out[0]);
        assert_eq!(6, out[1]);
        assert_eq!(0b0100_0000, out[2]);
        assert_eq!(0b0000_0001, out[3]);
        assert_eq!(0b0000_0011, out[7]);
    }

    #[test]
    fn test_bitmap_two_windows() {
        // CAA (257) lives in window 1
        let mut out = Vec::new();
        encode_type_bitmap(&[TYPE_A, TYPE_CAA], &mut out);
        assert_eq!(0, out[0]);
        assert_eq!(1, out[1]);
        assert_eq!(0b0100_0000, out[2]);
        assert_eq!(1, out[3]);
        assert_eq!(1, out[4]);
        assert_eq!(0b0100_0000, out[5]);
    }

    #[test]
    fn test_nsec_round_trip() {
        let nsec = NSec::new(
            DomainName::from_text("b.example.com.", None).unwrap(),
            vec![TYPE_A, TYPE_RRSIG, TYPE_NSEC],
        );
        let mut wire = Vec::new();
        nsec.encode(&mut wire);

        let parsed = NSec::from(&wire, 0, wire.len()).unwrap();
        assert_eq!(nsec, parsed);
        assert_eq!("b.example.com. A RRSIG NSEC", parsed.to_zone());
    }
}
