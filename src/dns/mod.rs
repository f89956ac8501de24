mod compress;
pub mod edns;
pub mod header;
pub mod message;
pub mod name;
pub mod question;
pub mod rdata;
pub mod rr;

pub use self::compress::CompressList;
pub use self::edns::Edns;
pub use self::header::Header;
pub use self::message::Message;
pub use self::name::DomainName;
pub use self::question::Question;
pub use self::rr::{RRset, RR};

use once_cell::sync::Lazy;
use std::collections::HashMap;

pub type Type = u16;
pub type Class = u16;

/// a host address
pub const TYPE_A: Type = 1;

/// an authoritative name server
pub const TYPE_NS: Type = 2;

/// the canonical name for an alias
pub const TYPE_CNAME: Type = 5;

/// marks the start of a zone of authority
pub const TYPE_SOA: Type = 6;

/// mail exchange
pub const TYPE_MX: Type = 15;

/// text strings
pub const TYPE_TXT: Type = 16;

/// an IPv6 host address
pub const TYPE_AAAA: Type = 28;

/// subtree redirection
///
/// ref: https://www.rfc-editor.org/rfc/rfc6672
pub const TYPE_DNAME: Type = 39;

/// EDNS(0) pseudo RR
pub const TYPE_OPT: Type = 41;

/// delegation signer
pub const TYPE_DS: Type = 43;

/// RRset signature
pub const TYPE_RRSIG: Type = 46;

/// authenticated denial of existence
pub const TYPE_NSEC: Type = 47;

/// zone public key
pub const TYPE_DNSKEY: Type = 48;

/// hashed authenticated denial of existence
///
/// ref: https://www.rfc-editor.org/rfc/rfc5155
pub const TYPE_NSEC3: Type = 50;

/// NSEC3 parameters published at the apex
pub const TYPE_NSEC3PARAM: Type = 51;

/// sender policy framework (TXT layout)
///
/// ref: https://www.rfc-editor.org/rfc/rfc4408
pub const TYPE_SPF: Type = 99;

/// for QType
///
/// ref: https://www.rfc-editor.org/rfc/rfc8482
pub const TYPE_ANY: Type = 255;

/// certification authority authorization
///
/// ref: https://www.rfc-editor.org/rfc/rfc6844
pub const TYPE_CAA: Type = 257;

/// the Internet
pub const CLASS_IN: Class = 1;
/// the CHAOS class
pub const CLASS_CH: Class = 3;
/// Hesiod [Dyer 87]
pub const CLASS_HS: Class = 4;

/// for QClass
pub const CLASS_ANY: Class = 255;

static TYPE_NAMES: &[(Type, &str)] = &[
    (TYPE_A, "A"),
    (TYPE_NS, "NS"),
    (TYPE_CNAME, "CNAME"),
    (TYPE_SOA, "SOA"),
    (TYPE_MX, "MX"),
    (TYPE_TXT, "TXT"),
    (TYPE_AAAA, "AAAA"),
    (TYPE_DNAME, "DNAME"),
    (TYPE_OPT, "OPT"),
    (TYPE_DS, "DS"),
    (TYPE_RRSIG, "RRSIG"),
    (TYPE_NSEC, "NSEC"),
    (TYPE_DNSKEY, "DNSKEY"),
    (TYPE_NSEC3, "NSEC3"),
    (TYPE_NSEC3PARAM, "NSEC3PARAM"),
    (TYPE_SPF, "SPF"),
    (TYPE_ANY, "ANY"),
    (TYPE_CAA, "CAA"),
];

static NAME_TO_TYPE: Lazy<HashMap<&'static str, Type>> =
    Lazy::new(|| TYPE_NAMES.iter().map(|(t, n)| (*n, *t)).collect());

static TYPE_TO_NAME: Lazy<HashMap<Type, &'static str>> =
    Lazy::new(|| TYPE_NAMES.iter().map(|(t, n)| (*t, *n)).collect());

/// Resolves a zone-text type mnemonic to its code. `TYPE12345` generic names
/// are accepted for types outside the table.
pub fn str_to_type(name: &str) -> Option<Type> {
    let upper = name.to_ascii_uppercase();
    if let Some(t) = NAME_TO_TYPE.get(upper.as_str()) {
        return Some(*t);
    }
    upper.strip_prefix("TYPE").and_then(|n| n.parse().ok())
}

pub fn type_to_str(typ: Type) -> String {
    match TYPE_TO_NAME.get(&typ) {
        Some(n) => (*n).to_string(),
        None => format!("TYPE{}", typ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_table_round_trip() {
        assert_eq!(Some(TYPE_NSEC3), str_to_type("nsec3"));
        assert_eq!(Some(TYPE_CAA), str_to_type("CAA"));
        assert_eq!(Some(99), str_to_type("TYPE99"));
        assert_eq!("RRSIG", type_to_str(TYPE_RRSIG));
        assert_eq!("TYPE9999", type_to_str(9999));
        assert_eq!(None, str_to_type("NOPE"));
    }
}
