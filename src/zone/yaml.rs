/*!
The YAML zone form: a sequence of RRset objects, each with `owner`,
`ttl`, `type` and a `record` list whose fields name the RDATA
components by role:

```yaml
- owner: example.com.
  ttl: 3600
  type: SOA
  record:
    - mname: ns1.example.com.
      rname: hostmaster.example.com.
      serial: 2024010101
      refresh: 7200
      retry: 3600
      expire: 1209600
      minimum: 300
- owner: www.example.com.
  ttl: 3600
  type: A
  record:
    - address: 192.168.0.101
    - address: 192.168.0.102
```

base64 fields (`signature`, `public_key`), hex fields (`digest`,
`salt`) and the base32hex NSEC3 `next` hash are decoded at load.
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
use serde::Deserialize;
use serde_yaml::Value;

#[derive(Debug, Deserialize)]
struct RRsetDoc {
    owner: String,
    ttl: u32,
    #[serde(rename = "type")]
    typ: String,
    record: Vec<Value>,
}

pub fn load(apex: &DomainName, text: &str) -> Result<Zone, DnsError> {
    let docs: Vec<RRsetDoc> = serde_yaml::from_str(text)
        .map_err(|e| DnsError::zone(format!("cannot load zone: {}", e)))?;

    let mut zone = Zone::new(apex.clone());
    for doc in &docs {
        let rrset = parse_rrset(apex, doc)
            .map_err(|e| DnsError::zone(format!("rrset {} {}: {}", doc.owner, doc.typ, e)))?;
        zone.add(rrset)?;
    }
    Ok(zone)
}

fn parse_rrset(apex: &DomainName, doc: &RRsetDoc) -> Result<RRset, DnsError> {
    let owner = DomainName::from_text(&doc.owner, Some(apex))
        .map_err(|e| DnsError::zone(format!("bad owner name: {}", e)))?;
    let typ = str_to_type(&doc.typ)
        .ok_or_else(|| DnsError::zone(format!("unknown type {:?}", doc.typ)))?;

    let mut rrset = RRset::new(owner, typ, CLASS_IN, doc.ttl);
    if doc.record.is_empty() {
        return Err(DnsError::zone("empty record list"));
    }
    for record in &doc.record {
        rrset.push(parse_record(apex, typ, record)?);
    }
    Ok(rrset)
}

fn parse_record(apex: &DomainName, typ: Type, record: &Value) -> Result<RDataType, DnsError> {
    match typ {
        TYPE_A => Ok(RDataType::A(A::new(
            str_field(record, "address", "A record must have \"address\" attribute")?
                .parse()
                .map_err(|_| DnsError::zone("bad IPv4 address"))?,
        ))),
        TYPE_AAAA => Ok(RDataType::AAAA(AAAA::new(
            str_field(record, "address", "AAAA record must have \"address\" attribute")?
                .parse()
                .map_err(|_| DnsError::zone("bad IPv6 address"))?,
        ))),
        TYPE_NS => Ok(RDataType::NS(NS::new(name_field(
            apex,
            record,
            "nameserver",
            "NS record must have \"nameserver\" attribute",
        )?))),
        TYPE_MX => Ok(RDataType::MX(MX::new(
            num_field(record, "priority", "MX record must have \"priority\" attribute")? as u16,
            name_field(
                apex,
                record,
                "mailserver",
                "MX record must have \"mailserver\" attribute",
            )?,
        ))),
        TYPE_SOA => Ok(RDataType::SOA(SOA::new(
            name_field(apex, record, "mname", SOA_ERROR)?,
            name_field(apex, record, "rname", SOA_ERROR)?,
            num_field(record, "serial", SOA_ERROR)?,
            num_field(record, "refresh", SOA_ERROR)?,
            num_field(record, "retry", SOA_ERROR)?,
            num_field(record, "expire", SOA_ERROR)?,
            num_field(record, "minimum", SOA_ERROR)?,
        ))),
        TYPE_CNAME => Ok(RDataType::CName(CName::new(name_field(
            apex,
            record,
            "canonicalname",
            "CNAME record must have \"canonicalname\" attribute",
        )?))),
        TYPE_DNAME => Ok(RDataType::DName(DName::new(name_field(
            apex,
            record,
            "canonicalname",
            "DNAME record must have \"canonicalname\" attribute",
        )?))),
        TYPE_TXT => Ok(RDataType::TXT(TXT::new(string_list_field(
            record,
            "data",
            "TXT record must have \"data\" array",
        )?))),
        TYPE_SPF => Ok(RDataType::SPF(SPF::new(string_list_field(
            record,
            "data",
            "SPF record must have \"data\" array",
        )?))),
        TYPE_CAA => Ok(RDataType::CAA(CAA::new(
            num_field(record, "flag", "CAA record must have \"flag\" attribute")? as u8,
            str_field(record, "tag", "CAA record must have \"tag\" attribute")?,
            str_field(record, "value", "CAA record must have \"value\" attribute")?,
        ))),
        TYPE_RRSIG => Ok(RDataType::RRSig(RRSig {
            type_covered: {
                let text = str_field(record, "type_covered", RRSIG_ERROR)?;
                str_to_type(&text)
                    .ok_or_else(|| DnsError::zone(format!("unknown covered type {:?}", text)))?
            },
            algorithm: num_field(record, "algorithm", RRSIG_ERROR)? as u8,
            labels: num_field(record, "label_count", RRSIG_ERROR)? as u8,
            original_ttl: num_field(record, "original_ttl", RRSIG_ERROR)?,
            expiration: num_field(record, "expiration", RRSIG_ERROR)?,
            inception: num_field(record, "inception", RRSIG_ERROR)?,
            key_tag: num_field(record, "key_tag", RRSIG_ERROR)? as u16,
            signer: name_field(apex, record, "signer", RRSIG_ERROR)?,
            signature: util::decode_base64(&str_field(record, "signature", RRSIG_ERROR)?)?,
        })),
        TYPE_DNSKEY => Ok(RDataType::DNSKEY(DNSKEY::new(
            num_field(record, "flag", DNSKEY_ERROR)? as u16,
            num_field(record, "algorithm", DNSKEY_ERROR)? as u8,
            util::decode_base64(&str_field(record, "public_key", DNSKEY_ERROR)?)?,
        ))),
        TYPE_DS => Ok(RDataType::DS(DS::new(
            num_field(record, "key_tag", DS_ERROR)? as u16,
            num_field(record, "algorithm", DS_ERROR)? as u8,
            num_field(record, "digest_type", DS_ERROR)? as u8,
            util::decode_hex(&str_field(record, "digest", DS_ERROR)?)?,
        ))),
        TYPE_NSEC => Ok(RDataType::NSec(NSec::new(
            name_field(apex, record, "next", NSEC_ERROR)?,
            types_field(record, NSEC_ERROR)?,
        ))),
        TYPE_NSEC3 => Ok(RDataType::NSec3(NSec3::new(
            num_field(record, "algorithm", NSEC3_ERROR)? as u8,
            num_field(record, "flags", NSEC3_ERROR)? as u8,
            num_field(record, "iterations", NSEC3_ERROR)? as u16,
            util::decode_hex(&str_field(record, "salt", NSEC3_ERROR)?)?,
            util::decode_base32hex(&str_field(record, "next", NSEC3_ERROR)?)?,
            types_field(record, NSEC3_ERROR)?,
        ))),
        TYPE_NSEC3PARAM => Ok(RDataType::NSec3Param(NSec3Param::new(
            num_field(record, "algorithm", NSEC3PARAM_ERROR)? as u8,
            num_field(record, "flags", NSEC3PARAM_ERROR)? as u8,
            num_field(record, "iterations", NSEC3PARAM_ERROR)? as u16,
            util::decode_hex(&str_field(record, "salt", NSEC3PARAM_ERROR)?)?,
        ))),
        other => Err(DnsError::zone(format!(
            "type {} not supported in the YAML form",
            other
        ))),
    }
}

const SOA_ERROR: &str =
    "SOA record must have \"mname,rname,serial,refresh,retry,expire,minimum\" attributes";
const RRSIG_ERROR: &str = "RRSIG record must have \"type_covered\", \"algorithm\", \
    \"label_count\", \"original_ttl\", \"expiration\", \"inception\", \"key_tag\", \
    \"signer\" and \"signature\" attributes";
const DNSKEY_ERROR: &str =
    "DNSKEY record must have \"flag\", \"algorithm\" and \"public_key\" attributes";
const DS_ERROR: &str =
    "DS record must have \"key_tag\", \"algorithm\", \"digest_type\" and \"digest\" attributes";
const NSEC_ERROR: &str = "NSEC record must have \"next\" and \"types\" attributes";
const NSEC3_ERROR: &str = "NSEC3 record must have \"algorithm\", \"flags\", \"iterations\", \
    \"salt\", \"next\" and \"types\" attributes";
const NSEC3PARAM_ERROR: &str =
    "NSEC3PARAM record must have \"algorithm\", \"flags\", \"iterations\" and \"salt\" attributes";

fn str_field(record: &Value, key: &str, error: &str) -> Result<String, DnsError> {
    record
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| DnsError::zone(error))
}

fn num_field(record: &Value, key: &str, error: &str) -> Result<u32, DnsError> {
    record
        .get(key)
        .and_then(|v| v.as_u64())
        .filter(|v| *v <= u32::MAX as u64)
        .map(|v| v as u32)
        .ok_or_else(|| DnsError::zone(error))
}

fn name_field(
    apex: &DomainName,
    record: &Value,
    key: &str,
    error: &str,
) -> Result<DomainName, DnsError> {
    let text = str_field(record, key, error)?;
    DomainName::from_text(&text, Some(apex))
        .map_err(|e| DnsError::zone(format!("bad name in {:?}: {}", key, e)))
}

fn types_field(record: &Value, error: &str) -> Result<Vec<Type>, DnsError> {
    record
        .get("types")
        .and_then(|v| v.as_sequence())
        .ok_or_else(|| DnsError::zone(error))?
        .iter()
        .map(|v| {
            v.as_str()
                .and_then(str_to_type)
                .ok_or_else(|| DnsError::zone(error))
        })
        .collect()
}

fn string_list_field(record: &Value, key: &str, error: &str) -> Result<Vec<String>, DnsError> {
    record
        .get(key)
        .and_then(|v| v.as_sequence())
        .ok_or_else(|| DnsError::zone(error))?
        .iter()
        .map(|v| {
            v.as_str()
                .map(|s| s.to_string())
                .ok_or_else(|| DnsError::zone(error))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apex() -> DomainName {
        DomainName::from_text("example.com.", None).unwrap()
    }

    const SAMPLE: &str = r#"
- owner: example.com.
  ttl: 3600
  type: SOA
  record:
    - mname: ns1.example.com.
      rname: hostmaster.example.com.
      serial: 2024010101
      refresh: 7200
      retry: 3600
      expire: 1209600
      minimum: 300
- owner: example.com.
  ttl: 3600
  type: NS
  record:
    - nameserver: ns1.example.com.
- owner: ns1.example.com.
  ttl: 3600
  type: A
  record:
    - address: 10.0.0.53
- owner: www.example.com.
  ttl: 3600
  type: A
  record:
    - address: 192.168.0.101
    - address: 192.168.0.102
- owner: mail
  ttl: 3600
  type: MX
  record:
    - priority: 10
      mailserver: www.example.com.
- owner: txt.example.com.
  ttl: 60
  type: TXT
  record:
    - data: ["hello", "world"]
"#;

    #[test]
    fn test_load_sample_zone() {
        let zone = load(&apex(), SAMPLE).unwrap();
        zone.validate().unwrap();

        let www = zone
            .find(
                &DomainName::from_text("www.example.com.", None).unwrap(),
                TYPE_A,
            )
            .unwrap();
        assert_eq!(2, www.len());
        assert_eq!(3600, www.ttl());

        // relative owner expanded against the apex
        assert!(zone
            .find(
                &DomainName::from_text("mail.example.com.", None).unwrap(),
                TYPE_MX
            )
            .is_some());
    }

    #[test]
    fn test_missing_attribute_is_cited() {
        let text = "- owner: www.example.com.\n  ttl: 60\n  type: A\n  record:\n    - host: 1.2.3.4\n";
        let err = load(&apex(), text).unwrap_err();
        assert!(
            err.to_string().contains("\"address\""),
            "got {}",
            err
        );
        assert!(err.to_string().contains("www.example.com."));
    }

    #[test]
    fn test_not_a_sequence_fails() {
        assert!(load(&apex(), "owner: example.com.").is_err());
    }

    #[test]
    fn test_dnskey_base64_is_decoded() {
        let text = r#"
- owner: example.com.
  ttl: 3600
  type: DNSKEY
  record:
    - flag: 256
      algorithm: 8
      public_key: aGVsbG8=
"#;
        let zone = load(&apex(), text).unwrap();
        let rrset = zone
            .find(&apex(), crate::dns::TYPE_DNSKEY)
            .unwrap();
        match rrset.first() {
            Some(RDataType::DNSKEY(key)) => assert_eq!(b"hello".to_vec(), key.public_key),
            other => panic!("expected DNSKEY, got {:?}", other),
        }
    }

    #[test]
    fn test_nsec3_fields_are_decoded() {
        let text = r#"
- owner: 0p9mhaveqvm6t7vbl5lop2u3t2rp3tom.example.com.
  ttl: 300
  type: NSEC3
  record:
    - algorithm: 1
      flags: 1
      iterations: 12
      salt: aabbccdd
      next: 35mthgpgcu1qg68fab165klnsnk3dpvl
      types: [A, RRSIG]
"#;
        let zone = load(&apex(), text).unwrap();
        let owner = DomainName::from_text(
            "0p9mhaveqvm6t7vbl5lop2u3t2rp3tom.example.com.",
            None,
        )
        .unwrap();
        let rrset = zone.find(&owner, TYPE_NSEC3).unwrap();
        match rrset.first() {
            Some(RDataType::NSec3(nsec3)) => {
                assert!(nsec3.opt_out());
                assert_eq!(12, nsec3.iterations);
                assert_eq!(vec![0xaa, 0xbb, 0xcc, 0xdd], nsec3.salt);
                assert_eq!(20, nsec3.next_hashed.len());
                assert_eq!(vec![TYPE_A, crate::dns::TYPE_RRSIG], nsec3.types);
            }
            other => panic!("expected NSEC3, got {:?}", other),
        }
    }

    #[test]
    fn test_nsec3_missing_attribute_is_cited() {
        let text = r#"
- owner: example.com.
  ttl: 300
  type: NSEC3
  record:
    - algorithm: 1
      flags: 0
"#;
        let err = load(&apex(), text).unwrap_err();
        assert!(err.to_string().contains("NSEC3 record must have"));
    }

    #[test]
    fn test_soa_requires_all_fields() {
        let text = r#"
- owner: example.com.
  ttl: 3600
  type: SOA
  record:
    - mname: ns1.example.com.
      rname: hostmaster.example.com.
"#;
        let err = load(&apex(), text).unwrap_err();
        assert!(err.to_string().contains("SOA record must have"));
    }
}
