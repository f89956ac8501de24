pub mod dnskey;
pub mod ds;
pub mod nsec;
pub mod nsec3;
pub mod rrsig;

/// DNS Security Algorithm Numbers used for zone signing.
///
/// ref: https://www.iana.org/assignments/dns-sec-alg-numbers/dns-sec-alg-numbers.xhtml
pub type SecAlgorithm = u8;

/// RSA/SHA-1
///
/// [RFC3110](https://www.rfc-editor.org/rfc/rfc3110)
pub const ALGO_RSASHA1: SecAlgorithm = 5;

/// RSA/SHA-256
///
/// [RFC5702](https://www.rfc-editor.org/rfc/rfc5702)
pub const ALGO_RSASHA256: SecAlgorithm = 8;

/// ECDSA Curve P-256 with SHA-256
///
/// [RFC6605](https://www.rfc-editor.org/rfc/rfc6605)
pub const ALGO_ECDSAP256SHA256: SecAlgorithm = 13;

/// DS digest types
///
/// ref: https://www.iana.org/assignments/ds-rr-types/ds-rr-types.xhtml
pub type DigestType = u8;

pub const DIGEST_SHA1: DigestType = 1;
pub const DIGEST_SHA256: DigestType = 2;

/// NSEC3 hash algorithm identifiers; only SHA-1 is assigned.
///
/// ref: https://www.iana.org/assignments/dnssec-nsec3-parameters/dnssec-nsec3-parameters.xhtml
pub const NSEC3_HASH_SHA1: u8 = 1;
