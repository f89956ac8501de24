use super::compress::CompressList;
use super::name::DomainName;
use super::{Class, Type};
use crate::errors::DnsError;

/**
The question section carries the parameters that define what is being
asked. It contains QDCOUNT (usually 1) entries of the following format:
# Question Structure:
```shell
                                1  1  1  1  1  1
  0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
|                                               |
/                     QNAME                     /
/                                               /
+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
|                     QTYPE                     |
+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
|                     QCLASS                    |
+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
```
The qname keeps the case the query arrived with; matching lowercases,
the echoed question does not.
*/
#[derive(Debug, Clone)]
pub struct Question {
    qname: DomainName,
    qtype: Type,
    qclass: Class,
}

impl Question {
    pub fn new(qname: DomainName, qtype: Type, qclass: Class) -> Self {
        Question {
            qname,
            qtype,
            qclass,
        }
    }

    pub fn parse(raw: &[u8], offset: &mut usize) -> Result<Self, DnsError> {
        let qname = DomainName::parse(raw, offset)?;
        let trailer = raw
            .get(*offset..*offset + 4)
            .ok_or_else(|| DnsError::format("truncated question"))?;
        let qtype = u16::from_be_bytes([trailer[0], trailer[1]]);
        let qclass = u16::from_be_bytes([trailer[2], trailer[3]]);
        *offset += 4;

        Ok(Question {
            qname,
            qtype,
            qclass,
        })
    }

    pub fn qname(&self) -> &DomainName {
        &self.qname
    }

    pub fn qtype(&self) -> Type {
        self.qtype
    }

    pub fn qclass(&self) -> Class {
        self.qclass
    }

    pub fn encode(&self, out: &mut Vec<u8>, cl: &mut CompressList) {
        cl.write_name(out, &self.qname);
        out.extend_from_slice(&self.qtype.to_be_bytes());
        out.extend_from_slice(&self.qclass.to_be_bytes());
    }
}
