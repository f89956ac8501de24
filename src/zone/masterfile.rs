/*!
The masterfile-lite loader: one record per line, `;` comments, fields
`<owner> <ttl> IN <type> <rdata…>`. `$ORIGIN`, `$TTL`, `@` and
parenthesized multi-line records are intentionally not supported;
relative owner names are expanded against the configured apex.
 */

use crate::dns::name::DomainName;
use crate::dns::rdata::{
    CName, DName, NSec, NSec3, NSec3Param, RDataType, RRSig, A, AAAA, CAA, DNSKEY, DS, MX, NS,
    SOA, SPF, TXT,
};
use crate::dns::rr::RRset;
use crate::dns::{
    str_to_type, Type, CLASS_IN, TYPE_A, TYPE_AAAA, TYPE_CAA, TYPE_CNAME, TYPE_DNAME,
    TYPE_DNSKEY, TYPE_DS, TYPE_MX, TYPE_NS, TYPE_NSEC, TYPE_NSEC3, TYPE_NSEC3PARAM, TYPE_RRSIG,
    TYPE_SOA, TYPE_SPF, TYPE_TXT,
};
use crate::errors::DnsError;
use crate::util;
use crate::zone::Zone;
use nom::branch::alt;
use nom::bytes::complete::{take_till, take_while1};
use nom::character::complete::{char, multispace0};
use nom::combinator::map;
use nom::multi::many1;
use nom::sequence::{delimited, preceded};
use nom::IResult;

pub fn load(apex: &DomainName, text: &str) -> Result<Zone, DnsError> {
    let mut zone = Zone::new(apex.clone());
    for (index, raw_line) in text.lines().enumerate() {
        let line = strip_comment(raw_line).trim_end();
        if line.trim().is_empty() {
            continue;
        }
        parse_line(apex, line)
            .and_then(|rrset| zone.add(rrset))
            .map_err(|e| DnsError::zone(format!("line {}: {}", index + 1, e)))?;
    }
    Ok(zone)
}

fn strip_comment(line: &str) -> &str {
    match line.find(';') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

fn quoted(input: &str) -> IResult<&str, String> {
    map(
        delimited(char('"'), take_till(|c| c == '"'), char('"')),
        |s: &str| s.to_string(),
    )(input)
}

fn bare(input: &str) -> IResult<&str, String> {
    map(take_while1(|c: char| !c.is_whitespace()), |s: &str| {
        s.to_string()
    })(input)
}

fn token(input: &str) -> IResult<&str, String> {
    preceded(multispace0, alt((quoted, bare)))(input)
}

fn tokenize(line: &str) -> Result<Vec<String>, DnsError> {
    let (rest, tokens) =
        many1(token)(line).map_err(|_| DnsError::zone(format!("cannot tokenize {:?}", line)))?;
    if !rest.trim().is_empty() {
        return Err(DnsError::zone(format!(
            "trailing garbage {:?} after record",
            rest
        )));
    }
    Ok(tokens)
}

fn parse_line(apex: &DomainName, line: &str) -> Result<RRset, DnsError> {
    let tokens = tokenize(line)?;
    let mut fields = tokens.iter();

    let owner_text = fields.next().ok_or_else(|| DnsError::zone("no owner field"))?;
    let owner = DomainName::from_text(owner_text, Some(apex))
        .map_err(|e| DnsError::zone(format!("bad owner name: {}", e)))?;

    let ttl_text = fields.next().ok_or_else(|| DnsError::zone("no ttl field"))?;
    let ttl: u32 = ttl_text
        .parse()
        .map_err(|_| DnsError::zone(format!("bad ttl {:?}", ttl_text)))?;

    let class = fields.next().ok_or_else(|| DnsError::zone("no class field"))?;
    if !class.eq_ignore_ascii_case("IN") {
        return Err(DnsError::zone(format!("unsupported class {:?}", class)));
    }

    let type_text = fields.next().ok_or_else(|| DnsError::zone("no type field"))?;
    let typ = str_to_type(type_text)
        .ok_or_else(|| DnsError::zone(format!("unknown type {:?}", type_text)))?;

    let data: Vec<&str> = fields.map(|s| s.as_str()).collect();
    if data.is_empty() {
        return Err(DnsError::zone("no data field"));
    }

    let rdata = parse_rdata(apex, typ, &data)?;
    let mut rrset = RRset::new(owner, typ, CLASS_IN, ttl);
    rrset.push(rdata);
    Ok(rrset)
}

fn parse_rdata(apex: &DomainName, typ: Type, data: &[&str]) -> Result<RDataType, DnsError> {
    match typ {
        TYPE_A => Ok(RDataType::A(A::new(parse_ipv4(data[0])?))),
        TYPE_AAAA => Ok(RDataType::AAAA(AAAA::new(parse_ipv6(data[0])?))),
        TYPE_NS => Ok(RDataType::NS(NS::new(parse_name(apex, data[0])?))),
        TYPE_MX => {
            expect_fields(data, 2, "MX needs priority and mailserver")?;
            Ok(RDataType::MX(MX::new(
                parse_num(data[0], "priority")?,
                parse_name(apex, data[1])?,
            )))
        }
        TYPE_SOA => {
            expect_fields(data, 7, "SOA needs mname rname serial refresh retry expire minimum")?;
            Ok(RDataType::SOA(SOA::new(
                parse_name(apex, data[0])?,
                parse_name(apex, data[1])?,
                parse_num(data[2], "serial")?,
                parse_num(data[3], "refresh")?,
                parse_num(data[4], "retry")?,
                parse_num(data[5], "expire")?,
                parse_num(data[6], "minimum")?,
            )))
        }
        TYPE_CNAME => Ok(RDataType::CName(CName::new(parse_name(apex, data[0])?))),
        TYPE_DNAME => Ok(RDataType::DName(DName::new(parse_name(apex, data[0])?))),
        TYPE_TXT => Ok(RDataType::TXT(TXT::new(
            data.iter().map(|s| s.to_string()).collect(),
        ))),
        TYPE_SPF => Ok(RDataType::SPF(SPF::new(
            data.iter().map(|s| s.to_string()).collect(),
        ))),
        TYPE_CAA => {
            expect_fields(data, 3, "CAA needs flag, tag and value")?;
            Ok(RDataType::CAA(CAA::new(
                parse_num(data[0], "flag")?,
                data[1].to_string(),
                data[2].to_string(),
            )))
        }
        TYPE_RRSIG => {
            expect_fields(data, 9, "RRSIG needs 8 fields and a signature")?;
            Ok(RDataType::RRSig(RRSig {
                type_covered: str_to_type(data[0])
                    .ok_or_else(|| DnsError::zone(format!("unknown covered type {:?}", data[0])))?,
                algorithm: parse_num(data[1], "algorithm")?,
                labels: parse_num(data[2], "label count")?,
                original_ttl: parse_num(data[3], "original ttl")?,
                expiration: util::timestamp_to_epoch(data[4])?,
                inception: util::timestamp_to_epoch(data[5])?,
                key_tag: parse_num(data[6], "key tag")?,
                signer: parse_name(apex, data[7])?,
                signature: util::decode_base64(&data[8..].join(""))?,
            }))
        }
        TYPE_DS => {
            expect_fields(data, 4, "DS needs key_tag algorithm digest_type digest")?;
            Ok(RDataType::DS(DS::new(
                parse_num(data[0], "key tag")?,
                parse_num(data[1], "algorithm")?,
                parse_num(data[2], "digest type")?,
                util::decode_hex(&data[3..].join(""))?,
            )))
        }
        TYPE_DNSKEY => {
            expect_fields(data, 4, "DNSKEY needs flags protocol algorithm key")?;
            let mut dnskey = DNSKEY::new(
                parse_num(data[0], "flags")?,
                parse_num(data[2], "algorithm")?,
                util::decode_base64(&data[3..].join(""))?,
            );
            dnskey.protocol = parse_num(data[1], "protocol")?;
            Ok(RDataType::DNSKEY(dnskey))
        }
        TYPE_NSEC => {
            expect_fields(data, 2, "NSEC needs a next name and types")?;
            let types = parse_types(&data[1..])?;
            Ok(RDataType::NSec(NSec::new(parse_name(apex, data[0])?, types)))
        }
        TYPE_NSEC3 => {
            expect_fields(data, 5, "NSEC3 needs algorithm flags iterations salt next")?;
            Ok(RDataType::NSec3(NSec3::new(
                parse_num(data[0], "algorithm")?,
                parse_num(data[1], "flags")?,
                parse_num(data[2], "iterations")?,
                parse_salt(data[3])?,
                util::decode_base32hex(data[4])?,
                parse_types(&data[5..])?,
            )))
        }
        TYPE_NSEC3PARAM => {
            expect_fields(data, 4, "NSEC3PARAM needs algorithm flags iterations salt")?;
            Ok(RDataType::NSec3Param(NSec3Param::new(
                parse_num(data[0], "algorithm")?,
                parse_num(data[1], "flags")?,
                parse_num(data[2], "iterations")?,
                parse_salt(data[3])?,
            )))
        }
        other => Err(DnsError::zone(format!(
            "type {} not supported in zone files",
            other
        ))),
    }
}

fn expect_fields(data: &[&str], count: usize, message: &str) -> Result<(), DnsError> {
    if data.len() < count {
        return Err(DnsError::zone(message.to_string()));
    }
    Ok(())
}

fn parse_name(apex: &DomainName, text: &str) -> Result<DomainName, DnsError> {
    DomainName::from_text(text, Some(apex)).map_err(|e| DnsError::zone(format!("{}", e)))
}

fn parse_ipv4(text: &str) -> Result<std::net::Ipv4Addr, DnsError> {
    text.parse()
        .map_err(|_| DnsError::zone(format!("bad IPv4 address {:?}", text)))
}

fn parse_ipv6(text: &str) -> Result<std::net::Ipv6Addr, DnsError> {
    text.parse()
        .map_err(|_| DnsError::zone(format!("bad IPv6 address {:?}", text)))
}

fn parse_num<T: std::str::FromStr>(text: &str, field: &str) -> Result<T, DnsError> {
    text.parse()
        .map_err(|_| DnsError::zone(format!("bad {} {:?}", field, text)))
}

fn parse_types(tokens: &[&str]) -> Result<Vec<Type>, DnsError> {
    tokens
        .iter()
        .map(|t| str_to_type(t).ok_or_else(|| DnsError::zone(format!("unknown type {:?}", t))))
        .collect()
}

fn parse_salt(text: &str) -> Result<Vec<u8>, DnsError> {
    if text == "-" {
        return Ok(vec![]);
    }
    util::decode_hex(text)
}
