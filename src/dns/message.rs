use super::compress::CompressList;
use super::edns::Edns;
use super::header::Header;
use super::question::Question;
use super::rr::RR;
use super::TYPE_OPT;
use crate::errors::DnsError;

/**
# DNS Message Structure:
```shell
+---------------------+
|        Header       |
+---------------------+
|       Question      | the question for the name server
+---------------------+
|        Answer       | RRs answering the question
+---------------------+
|      Authority      | RRs pointing toward an authority
+---------------------+
|      Additional     | RRs holding additional information
```
The OPT pseudo-RR is lifted out of the additional section into an
[`Edns`] value on parse and appended back on encode, so section vectors
only ever hold real records.
*/
#[derive(Debug, Clone)]
pub struct Message {
    head: Header,
    questions: Vec<Question>,
    answers: Vec<RR>,
    authorities: Vec<RR>,
    additionals: Vec<RR>,
    edns: Option<Edns>,
}

impl Message {
    pub fn new() -> Self {
        Message {
            head: Header::new(),
            questions: Vec::new(),
            answers: Vec::new(),
            authorities: Vec::new(),
            additionals: Vec::new(),
            edns: None,
        }
    }

    pub fn from(raw: &[u8]) -> Result<Self, DnsError> {
        let header_bytes: [u8; 12] = raw
            .get(..12)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| DnsError::format("message shorter than the header"))?;
        let head = Header::from(header_bytes);
        let mut offset = 12;

        let mut questions = Vec::new();
        for _ in 0..head.qdcount() {
            questions.push(Question::parse(raw, &mut offset)?);
        }

        let mut answers = Vec::new();
        for _ in 0..head.ancount() {
            answers.push(RR::parse(raw, &mut offset)?);
        }
        let mut authorities = Vec::new();
        for _ in 0..head.nscount() {
            authorities.push(RR::parse(raw, &mut offset)?);
        }

        let mut additionals = Vec::new();
        let mut edns = None;
        for _ in 0..head.arcount() {
            let rr = RR::parse(raw, &mut offset)?;
            if rr.typ() == TYPE_OPT {
                if edns.is_some() {
                    return Err(DnsError::format("more than one OPT record"));
                }
                edns = Some(Edns::from_rr(&rr)?);
            } else {
                additionals.push(rr);
            }
        }

        if offset != raw.len() {
            return Err(DnsError::format("trailing octets after the message"));
        }

        Ok(Message {
            head,
            questions,
            answers,
            authorities,
            additionals,
            edns,
        })
    }

    /// A response skeleton for `query`: same id and opcode, QR set, RD
    /// echoed, the question repeated with its original case.
    pub fn reply_to(query: &Message) -> Self {
        let mut reply = Message::new();
        reply
            .head
            .with_id(query.head.id())
            .with_qr(true)
            .with_opcode(query.head.opcode())
            .with_rd(query.head.rd());
        reply.questions = query.questions.clone();
        reply
    }

    pub fn head(&self) -> &Header {
        &self.head
    }

    pub fn head_mut(&mut self) -> &mut Header {
        &mut self.head
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn with_question(&mut self, question: Question) -> &mut Self {
        self.questions.push(question);
        self
    }

    pub fn answers(&self) -> &[RR] {
        &self.answers
    }

    pub fn add_answer(&mut self, rr: RR) -> &mut Self {
        self.answers.push(rr);
        self
    }

    pub fn authorities(&self) -> &[RR] {
        &self.authorities
    }

    pub fn add_authority(&mut self, rr: RR) -> &mut Self {
        self.authorities.push(rr);
        self
    }

    pub fn additionals(&self) -> &[RR] {
        &self.additionals
    }

    pub fn add_additional(&mut self, rr: RR) -> &mut Self {
        self.additionals.push(rr);
        self
    }

    pub fn edns(&self) -> Option<&Edns> {
        self.edns.as_ref()
    }

    pub fn with_edns(&mut self, edns: Edns) -> &mut Self {
        self.edns = Some(edns);
        self
    }

    fn encode_sections(
        &self,
        answers: bool,
        authorities: bool,
        additionals: bool,
        truncated: bool,
    ) -> Result<Vec<u8>, DnsError> {
        let mut head = self.head.clone();
        head.with_qdcount(self.questions.len() as u16);
        head.with_ancount(if answers { self.answers.len() as u16 } else { 0 });
        head.with_nscount(if authorities {
            self.authorities.len() as u16
        } else {
            0
        });
        let mut arcount = if additionals {
            self.additionals.len() as u16
        } else {
            0
        };
        if self.edns.is_some() {
            arcount += 1;
        }
        head.with_arcount(arcount);
        if truncated {
            head.with_tc(true);
        }

        let mut out = Vec::with_capacity(512);
        out.extend_from_slice(head.bytes());

        let mut cl = CompressList::new();
        for question in &self.questions {
            question.encode(&mut out, &mut cl);
        }
        if answers {
            for rr in &self.answers {
                rr.encode(&mut out, &mut cl)?;
            }
        }
        if authorities {
            for rr in &self.authorities {
                rr.encode(&mut out, &mut cl)?;
            }
        }
        if additionals {
            for rr in &self.additionals {
                rr.encode(&mut out, &mut cl)?;
            }
        }
        if let Some(edns) = &self.edns {
            edns.to_rr().encode(&mut out, &mut cl)?;
        }
        Ok(out)
    }

    /**
    Serializes the message. Over TCP (`udp_limit` None) the message is
    emitted whole. Over UDP the requestor's payload size bounds the
    response; an oversized message is cut section by section, keeping
    the answer over the additional data:

    1. drop the additional section (glue is recoverable, no TC),
    2. drop the authority section too, flagging TC since proofs the
       requester may need are gone,
    3. finally keep only the question and OPT with TC set.
    */
    pub fn encode(&self, udp_limit: Option<usize>) -> Result<Vec<u8>, DnsError> {
        let full = self.encode_sections(true, true, true, false)?;
        let limit = match udp_limit {
            Some(limit) => limit,
            None => return Ok(full),
        };
        if full.len() <= limit {
            return Ok(full);
        }

        let without_additional = self.encode_sections(true, true, false, false)?;
        if without_additional.len() <= limit {
            return Ok(without_additional);
        }

        let without_authority = self.encode_sections(true, false, false, true)?;
        if without_authority.len() <= limit {
            return Ok(without_authority);
        }

        self.encode_sections(false, false, false, true)
    }
}

impl Default for Message {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::name::DomainName;
    use crate::dns::rdata::{RDataType, A, TXT};
    use crate::dns::{CLASS_IN, TYPE_A, TYPE_TXT};
    use std::net::Ipv4Addr;

    fn name(text: &str) -> DomainName {
        DomainName::from_text(text, None).unwrap()
    }

    fn a_rr(owner: &str, last_octet: u8) -> RR {
        RR::new(
            name(owner),
            TYPE_A,
            CLASS_IN,
            3600,
            RDataType::A(A::new(Ipv4Addr::new(10, 0, 0, last_octet))),
        )
    }

    fn query(qname: &str) -> Message {
        let mut msg = Message::new();
        msg.with_question(Question::new(name(qname), TYPE_A, CLASS_IN));
        msg.with_edns(Edns::new(4096).with_dnssec_ok(true));
        msg
    }

    #[test]
    fn test_query_round_trip() {
        let msg = query("www.example.com.");
        let wire = msg.encode(None).unwrap();

        let parsed = Message::from(&wire).unwrap();
        assert_eq!(msg.head().id(), parsed.head().id());
        assert_eq!(1, parsed.questions().len());
        assert_eq!(name("www.example.com."), *parsed.questions()[0].qname());
        let edns = parsed.edns().unwrap();
        assert!(edns.dnssec_ok);
        assert_eq!(4096, edns.payload_size);
    }

    #[test]
    fn test_response_round_trip_with_compression() {
        let mut msg = Message::reply_to(&query("www.example.com."));
        msg.add_answer(a_rr("www.example.com.", 1));
        msg.add_answer(a_rr("www.example.com.", 2));
        msg.add_authority(a_rr("example.com.", 3));

        let wire = msg.encode(None).unwrap();
        let parsed = Message::from(&wire).unwrap();
        assert_eq!(2, parsed.answers().len());
        assert_eq!(1, parsed.authorities().len());
        assert_eq!(msg.answers(), parsed.answers());
        assert_eq!(msg.authorities(), parsed.authorities());

        // compression actually happened: the answer owner is a pointer to
        // the question name, so the name appears spelled out only once
        let needle = b"\x03www\x07example\x03com";
        let count = wire
            .windows(needle.len())
            .filter(|w| *w == needle.as_slice())
            .count();
        assert_eq!(1, count);
    }

    #[test]
    fn test_double_opt_is_rejected() {
        let msg = query("www.example.com.");
        let mut wire = msg.encode(None).unwrap();
        // append a second OPT record and bump arcount
        let opt_rr = Edns::new(512).to_rr();
        let mut cl = CompressList::new();
        opt_rr.encode(&mut wire, &mut cl).unwrap();
        wire[11] += 1;

        assert!(Message::from(&wire).is_err());
    }

    #[test]
    fn test_trailing_garbage_is_rejected() {
        let msg = query("www.example.com.");
        let mut wire = msg.encode(None).unwrap();
        wire.push(0);
        assert!(Message::from(&wire).is_err());
    }

    #[test]
    fn test_truncation_drops_additional_first() {
        let mut msg = Message::reply_to(&query("www.example.com."));
        msg.with_edns(Edns::new(4096));
        msg.add_answer(a_rr("www.example.com.", 1));
        for i in 0..20 {
            msg.add_additional(a_rr(&format!("glue{}.example.com.", i), i));
        }

        let full = msg.encode(None).unwrap();
        let limit = full.len() - 1;
        let cut = msg.encode(Some(limit)).unwrap();
        let parsed = Message::from(&cut).unwrap();
        assert!(!parsed.head().tc());
        assert_eq!(1, parsed.answers().len());
        assert!(parsed.additionals().is_empty());
        assert!(parsed.edns().is_some());
    }

    #[test]
    fn test_truncation_falls_back_to_question_only() {
        let mut msg = Message::reply_to(&query("www.example.com."));
        msg.with_edns(Edns::new(512));
        let strings: Vec<String> = (0..8).map(|i| format!("padding-{:0200}", i)).collect();
        msg.add_answer(RR::new(
            name("www.example.com."),
            TYPE_TXT,
            CLASS_IN,
            60,
            RDataType::TXT(TXT::new(strings)),
        ));

        let cut = msg.encode(Some(512)).unwrap();
        assert!(cut.len() <= 512);
        let parsed = Message::from(&cut).unwrap();
        assert!(parsed.head().tc());
        assert!(parsed.answers().is_empty());
        assert_eq!(1, parsed.questions().len());
        assert!(parsed.edns().is_some());
    }
}
