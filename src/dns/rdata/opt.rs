use super::{RDataCursor, RDataOperation};
use crate::errors::DnsError;

/**
ref: https://www.rfc-editor.org/rfc/rfc6891#section-6.1.2

The variable part of an OPT RR is encoded in its RDATA as zero or more
of the following:
```shell
                +0 (MSB)                            +1 (LSB)
     +---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+
  0: |                          OPTION-CODE                          |
     +---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+
  2: |                         OPTION-LENGTH                         |
     +---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+
  4: |                                                               |
     /                          OPTION-DATA                          /
     /                                                               /
     +---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+
```
The fixed part of the OPT pseudo-RR lives in the RR shell (class carries
the payload size, ttl the extended RCODE/version/flags) and is
interpreted by [`crate::dns::edns::Edns`].
 */
pub const OPTION_NSID: u16 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdnsOption {
    pub code: u16,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OPT {
    pub options: Vec<EdnsOption>,
}

impl OPT {
    pub fn new(options: Vec<EdnsOption>) -> Self {
        OPT { options }
    }

    pub fn from(raw: &[u8], offset: usize, rdlength: usize) -> Result<Self, DnsError> {
        let mut opt = OPT::new(vec![]);
        opt.decode(raw, offset, rdlength)?;
        Ok(opt)
    }

    pub fn option(&self, code: u16) -> Option<&EdnsOption> {
        self.options.iter().find(|o| o.code == code)
    }
}

impl RDataOperation for OPT {
    fn decode(&mut self, raw: &[u8], offset: usize, rdlength: usize) -> Result<(), DnsError> {
        let mut cur = RDataCursor::new(raw, offset, rdlength)?;
        self.options.clear();
        while cur.remaining() > 0 {
            let code = cur.u16()?;
            let length = cur.u16()? as usize;
            let data = cur.bytes(length)?;
            self.options.push(EdnsOption { code, data });
        }
        Ok(())
    }

    fn encode(&self, out: &mut Vec<u8>) {
        for option in &self.options {
            out.extend_from_slice(&option.code.to_be_bytes());
            out.extend_from_slice(&(option.data.len() as u16).to_be_bytes());
            out.extend_from_slice(&option.data);
        }
    }

    fn canonical(&self, out: &mut Vec<u8>) {
        self.encode(out);
    }

    fn to_zone(&self) -> String {
        self.options
            .iter()
            .map(|o| format!("{}:{}", o.code, hex::encode(&o.data)))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
