use super::{RDataCursor, RDataOperation};
use crate::errors::DnsError;

/**
ref: https://www.rfc-editor.org/rfc/rfc1035#section-3.3.14

# TXT RDATA format

```text
    +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    /                   TXT-DATA                    /
    +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
```

One or more <character-string>s: a length octet followed by up to 255
octets of data.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TXT {
    pub data: Vec<String>,
}

impl TXT {
    pub fn new(data: Vec<String>) -> Self {
        TXT { data }
    }

    pub fn from(raw: &[u8], offset: usize, rdlength: usize) -> Result<Self, DnsError> {
        let mut txt = TXT::new(vec![]);
        txt.decode(raw, offset, rdlength)?;
        Ok(txt)
    }
}

/// Reads consecutive <character-string>s until the cursor is exhausted.
pub(crate) fn read_character_strings(cur: &mut RDataCursor) -> Result<Vec<String>, DnsError> {
    let mut strings = Vec::new();
    while cur.remaining() > 0 {
        let len = cur.u8()? as usize;
        let bytes = cur.bytes(len)?;
        if !bytes.is_ascii() {
            return Err(DnsError::format("non-ascii character string"));
        }
        strings.push(String::from_utf8_lossy(&bytes).into_owned());
    }
    Ok(strings)
}

pub(crate) fn write_character_strings(strings: &[String], out: &mut Vec<u8>) {
    for s in strings {
        let len = s.len().min(255);
        out.push(len as u8);
        out.extend_from_slice(&s.as_bytes()[..len]);
    }
}

pub(crate) fn character_strings_to_zone(strings: &[String]) -> String {
    strings
        .iter()
        .map(|s| format!("\"{}\"", s))
        .collect::<Vec<_>>()
        .join(" ")
}

impl RDataOperation for TXT {
    fn decode(&mut self, raw: &[u8], offset: usize, rdlength: usize) -> Result<(), DnsError> {
        let mut cur = RDataCursor::new(raw, offset, rdlength)?;
        self.data = read_character_strings(&mut cur)?;
        Ok(())
    }

    fn encode(&self, out: &mut Vec<u8>) {
        write_character_strings(&self.data, out);
    }

    fn canonical(&self, out: &mut Vec<u8>) {
        self.encode(out);
    }

    fn to_zone(&self) -> String {
        character_strings_to_zone(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_txt_round_trip() {
        let txt = TXT::new(vec!["hello".to_string(), "world".to_string()]);
        let mut wire = Vec::new();
        txt.encode(&mut wire);
        assert_eq!(b"\x05hello\x05world".to_vec(), wire);

        let parsed = TXT::from(&wire, 0, wire.len()).unwrap();
        assert_eq!(txt, parsed);
        assert_eq!("\"hello\" \"world\"", parsed.to_zone());
    }

    #[test]
    fn test_txt_truncated_string() {
        let wire = b"\x05hel";
        assert!(TXT::from(wire, 0, wire.len()).is_err());
    }
}
