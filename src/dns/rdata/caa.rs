use super::{RDataCursor, RDataOperation};
use crate::errors::DnsError;

/**
ref: https://www.rfc-editor.org/rfc/rfc6844#section-5.1

# CAA RDATA format

```text
    +0-1-2-3-4-5-6-7-|0-1-2-3-4-5-6-7-|
    | Flags          | Tag Length = n |
    +----------------+----------------+...+---------------+
    | Tag char 0     | Tag char 1     |...| Tag char n-1  |
    +----------------+----------------+...+---------------+
    +----------------+----------------+.....+----------------+
    | Value byte 0   | Value byte 1   |.....| Value byte m-1 |
    +----------------+----------------+.....+----------------+
```

Flag bit 0 is the critical flag. The tag is a sequence of ASCII letters
and digits; the value runs to the end of the RDATA.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CAA {
    pub flag: u8,
    pub tag: String,
    pub value: String,
}

impl CAA {
    pub fn new(flag: u8, tag: String, value: String) -> Self {
        CAA { flag, tag, value }
    }

    pub fn from(raw: &[u8], offset: usize, rdlength: usize) -> Result<Self, DnsError> {
        let mut caa = CAA::new(0, String::new(), String::new());
        caa.decode(raw, offset, rdlength)?;
        Ok(caa)
    }
}

impl RDataOperation for CAA {
    fn decode(&mut self, raw: &[u8], offset: usize, rdlength: usize) -> Result<(), DnsError> {
        let mut cur = RDataCursor::new(raw, offset, rdlength)?;
        self.flag = cur.u8()?;
        let tag_len = cur.u8()? as usize;
        let tag = cur.bytes(tag_len)?;
        if tag.is_empty() || !tag.iter().all(|b| b.is_ascii_alphanumeric()) {
            return Err(DnsError::format("bad CAA tag"));
        }
        self.tag = String::from_utf8_lossy(&tag).into_owned();
        let value = cur.rest();
        if !value.is_ascii() {
            return Err(DnsError::format("non-ascii CAA value"));
        }
        self.value = String::from_utf8_lossy(&value).into_owned();
        Ok(())
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.flag);
        out.push(self.tag.len() as u8);
        out.extend_from_slice(self.tag.as_bytes());
        out.extend_from_slice(self.value.as_bytes());
    }

    fn canonical(&self, out: &mut Vec<u8>) {
        self.encode(out);
    }

    fn to_zone(&self) -> String {
        format!("{} {} \"{}\"", self.flag, self.tag, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caa_round_trip() {
        let caa = CAA::new(0, "issue".to_string(), "letsencrypt.org".to_string());
        let mut wire = Vec::new();
        caa.encode(&mut wire);

        let parsed = CAA::from(&wire, 0, wire.len()).unwrap();
        assert_eq!(caa, parsed);
        assert_eq!("0 issue \"letsencrypt.org\"", parsed.to_zone());
    }

    #[test]
    fn test_caa_rejects_bad_tag() {
        let wire = [0u8, 2, b'!', b'!', b'x'];
        assert!(CAA::from(&wire, 0, wire.len()).is_err());
    }
}
