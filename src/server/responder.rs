use crate::dns::header::Header;
use crate::dns::message::Message;
use crate::dns::question::Question;
use crate::dns::rr::RRset;
use crate::dns::{Edns, CLASS_ANY, CLASS_IN, TYPE_NS};
use crate::errors::DnsError;
use crate::sign::signed_zone::SignedZone;
use crate::util;
use crate::zone::Zone;
use tracing::{debug, error};

/// The largest UDP response this server is willing to build, whatever
/// the requestor advertises.
const SERVER_MAX_PAYLOAD: u16 = 4096;

/// The zone being served, signed or not. Frozen after load; queries only
/// read it, so worker tasks share it without locks.
#[derive(Debug)]
pub enum ZoneStore {
    Plain(Zone),
    Signed(SignedZone),
}

impl ZoneStore {
    pub fn zone(&self) -> &Zone {
        match self {
            ZoneStore::Plain(zone) => zone,
            ZoneStore::Signed(signed) => signed.zone(),
        }
    }
}

/**
Turns one query into one response, per the assembly order of the zone
engine: decode, header validation, EDNS extraction, zone lookup, RRSIG
attachment, glue, OPT, truncation. Every outcome is a single response;
only a query whose header cannot be parsed is dropped.
*/
#[derive(Debug)]
pub struct Responder {
    store: ZoneStore,
    server_id: Option<Vec<u8>>,
    max_payload: u16,
}

impl Responder {
    pub fn new(store: ZoneStore) -> Self {
        Responder {
            store,
            server_id: None,
            max_payload: SERVER_MAX_PAYLOAD,
        }
    }

    /// Identifier echoed in the NSID option when a requestor asks.
    pub fn with_server_id(mut self, id: Option<String>) -> Self {
        self.server_id = id.map(String::into_bytes);
        self
    }

    /// Handles one raw query. `None` means drop: no id to answer with,
    /// or the message was itself a response.
    pub fn handle(&self, raw: &[u8], via_tcp: bool) -> Option<Vec<u8>> {
        let query = match Message::from(raw) {
            Ok(query) => query,
            Err(e) => {
                debug!("malformed query: {}", e);
                return self.formerr_fallback(raw);
            }
        };
        if query.head().qr() {
            return None;
        }

        match self.respond(&query, via_tcp) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                match &e {
                    DnsError::ServerFailure(msg) => error!("query failed: {}", msg),
                    other => debug!("query rejected: {}", other),
                }
                self.error_response(&query, &e, via_tcp)
            }
        }
    }

    fn udp_limit(&self, query: &Message, via_tcp: bool) -> Option<usize> {
        if via_tcp {
            return None;
        }
        let size = query
            .edns()
            .map(|edns| edns.payload_size)
            .unwrap_or(512)
            .min(self.max_payload)
            .max(512);
        Some(size as usize)
    }

    /// The OPT echoed into the response iff the query carried one.
    fn response_edns(&self, query: &Message) -> Option<Edns> {
        let query_edns = query.edns()?;
        let mut edns = Edns::new(query_edns.payload_size.min(self.max_payload))
            .with_dnssec_ok(query_edns.dnssec_ok);
        if let (Some(id), Some(_)) = (&self.server_id, query_edns.nsid()) {
            edns.with_nsid(id);
        }
        Some(edns)
    }

    fn error_response(
        &self,
        query: &Message,
        error: &DnsError,
        via_tcp: bool,
    ) -> Option<Vec<u8>> {
        let mut reply = Message::reply_to(query);
        reply.head_mut().with_rcode(error.rcode());
        if let Some(edns) = self.response_edns(query) {
            reply.with_edns(edns);
        }
        reply.encode(self.udp_limit(query, via_tcp)).ok()
    }

    /// FORMERR with the question echoed when the header (and possibly
    /// the question) survive, silence otherwise.
    fn formerr_fallback(&self, raw: &[u8]) -> Option<Vec<u8>> {
        let header_bytes: [u8; 12] = raw.get(..12)?.try_into().ok()?;
        let head = Header::from(header_bytes);
        if head.qr() {
            return None;
        }

        let mut reply = Message::new();
        reply
            .head_mut()
            .with_id(head.id())
            .with_qr(true)
            .with_opcode(head.opcode())
            .with_rd(head.rd())
            .with_rcode(crate::errors::RCODE_FORMERR);
        if head.qdcount() >= 1 {
            let mut offset = 12;
            if let Ok(question) = Question::parse(raw, &mut offset) {
                reply.with_question(question);
            }
        }
        reply.encode(Some(512)).ok()
    }

    fn respond(&self, query: &Message, via_tcp: bool) -> Result<Vec<u8>, DnsError> {
        if query.head().opcode() != 0 {
            return Err(DnsError::NotImplemented(format!(
                "opcode {}",
                query.head().opcode()
            )));
        }
        if query.questions().len() != 1 {
            return Err(DnsError::format(format!(
                "{} questions in query",
                query.questions().len()
            )));
        }
        let question = &query.questions()[0];
        if question.qclass() != CLASS_IN && question.qclass() != CLASS_ANY {
            return Err(DnsError::Refused(format!("class {}", question.qclass())));
        }

        let dnssec_ok = query.edns().map(|edns| edns.dnssec_ok).unwrap_or(false);
        let signed = match (&self.store, dnssec_ok) {
            (ZoneStore::Signed(signed), true) => Some(signed),
            _ => None,
        };

        let zone = self.store.zone();
        let resolution = zone.resolve(question.qname(), question.qtype())?;
        let now = util::now_epoch();

        let mut reply = Message::reply_to(query);
        reply
            .head_mut()
            .with_aa(resolution.aa)
            .with_ra(false)
            .with_rcode(resolution.rcode);

        for answer in &resolution.answer {
            for rr in answer.rrset.to_rrs() {
                reply.add_answer(rr);
            }
            if let Some(signed) = signed {
                if answer.synthesized {
                    continue;
                }
                let source = answer.sign_as.as_ref().unwrap_or(&answer.rrset);
                let rrsig = signed
                    .sign_rrset(source, now)?
                    .with_owner(answer.rrset.owner().clone());
                for rr in rrsig.to_rrs() {
                    reply.add_answer(rr);
                }
            }
        }

        // authority: NS of a referral stays unsigned (it is not
        // authoritative here); DS, SOA and denial records get their RRSIGs
        let mut authority: Vec<(RRset, bool)> = Vec::new();
        if let Some((ns, _)) = &resolution.referral {
            authority.push((ns.clone(), false));
            if let Some(ds) = &resolution.referral_ds {
                authority.push((ds.clone(), true));
            }
        }
        if resolution.authority_soa {
            authority.push((zone.soa()?.with_ttl(zone.negative_ttl()), true));
        }
        if let Some(signed) = signed {
            for denial in &resolution.denials {
                for proof in signed.denial_rrsets(denial) {
                    if !authority
                        .iter()
                        .any(|(existing, _)| existing.owner() == proof.owner() && existing.typ() == proof.typ())
                    {
                        authority.push((proof, true));
                    }
                }
            }
        }
        for (rrset, sign) in &authority {
            for rr in rrset.to_rrs() {
                reply.add_authority(rr);
            }
            if let (Some(signed), true) = (signed, *sign) {
                for rr in signed.sign_rrset(rrset, now)?.to_rrs() {
                    reply.add_authority(rr);
                }
            }
        }

        // additional: glue for delegation and answered NS targets
        let mut additional: Vec<RRset> = Vec::new();
        let push_glue = |rrset: RRset, additional: &mut Vec<RRset>| {
            if !additional
                .iter()
                .any(|existing| existing.owner() == rrset.owner() && existing.typ() == rrset.typ())
            {
                additional.push(rrset);
            }
        };
        if let Some((_, glue)) = &resolution.referral {
            for rrset in glue {
                push_glue(rrset.clone(), &mut additional);
            }
        }
        for answer in &resolution.answer {
            if answer.rrset.typ() == TYPE_NS {
                for rrset in zone.glue_for(&answer.rrset) {
                    push_glue(rrset, &mut additional);
                }
            }
        }
        for rrset in &additional {
            for rr in rrset.to_rrs() {
                reply.add_additional(rr);
            }
        }

        if let Some(edns) = self.response_edns(query) {
            reply.with_edns(edns);
        }
        reply.encode(self.udp_limit(query, via_tcp))
    }
}
