use crate::errors::DnsError;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Labels must be 1 to 63 octets; the encoded form of a whole name, length
/// octets and the root included, must fit in 255 octets.
const MAX_LABEL_LEN: usize = 63;
const MAX_NAME_LEN: usize = 255;

/// An absolute domain name as an ordered sequence of labels, most specific
/// first. The root is the empty sequence.
///
/// Comparison follows the DNSSEC canonical ordering of RFC 4034 section 6.1:
/// names are compared right to left, label by label, on lowercased raw
/// bytes. Equality is case-insensitive so that `Ord` and `Eq` agree, while
/// the stored labels preserve the case they were parsed with.
#[derive(Debug, Clone)]
pub struct DomainName {
    labels: Vec<String>,
}

impl DomainName {
    pub fn root() -> Self {
        DomainName { labels: vec![] }
    }

    pub fn from_labels(labels: Vec<String>) -> Result<Self, DnsError> {
        let name = DomainName { labels };
        name.check_lengths()?;
        Ok(name)
    }

    /// Parses dotted text. A trailing dot marks the name absolute; without
    /// one the name is taken relative to `origin`.
    pub fn from_text(text: &str, origin: Option<&DomainName>) -> Result<Self, DnsError> {
        if text == "." {
            return Ok(Self::root());
        }
        let (body, absolute) = match text.strip_suffix('.') {
            Some(body) => (body, true),
            None => (text, false),
        };
        if body.is_empty() {
            return Err(DnsError::format(format!("empty domain name {:?}", text)));
        }

        let mut labels = Vec::new();
        for label in body.split('.') {
            if label.is_empty() {
                return Err(DnsError::format(format!("empty label in {:?}", text)));
            }
            if !label.is_ascii() {
                return Err(DnsError::format(format!("non-ascii label in {:?}", text)));
            }
            labels.push(label.to_string());
        }
        if !absolute {
            match origin {
                Some(origin) => labels.extend(origin.labels.iter().cloned()),
                None => {
                    return Err(DnsError::format(format!(
                        "relative name {:?} without an origin",
                        text
                    )))
                }
            }
        }

        Self::from_labels(labels)
    }

    /// Decodes a wire-format name starting at `*offset` in `raw`, following
    /// compression pointers. Pointer targets at or beyond the pointer itself
    /// are rejected, which also rules out pointer loops together with the
    /// 255-octet name bound. `*offset` advances past the name in the
    /// outermost sequence only.
    pub fn parse(raw: &[u8], offset: &mut usize) -> Result<Self, DnsError> {
        let mut labels = Vec::new();
        let mut pos = *offset;
        let mut jumped = false;
        let mut encoded_len = 0_usize;

        loop {
            let octet = *raw
                .get(pos)
                .ok_or_else(|| DnsError::format("truncated domain name"))?;

            if octet == 0 {
                if !jumped {
                    *offset = pos + 1;
                }
                break;
            }

            if octet & 0b1100_0000 == 0b1100_0000 {
                let low = *raw
                    .get(pos + 1)
                    .ok_or_else(|| DnsError::format("truncated compression pointer"))?;
                let target = (((octet & 0b0011_1111) as usize) << 8) | low as usize;
                if target >= pos {
                    return Err(DnsError::format(format!(
                        "compression pointer to {} does not precede {}",
                        target, pos
                    )));
                }
                if !jumped {
                    *offset = pos + 2;
                }
                jumped = true;
                pos = target;
                continue;
            }

            if octet & 0b1100_0000 != 0 {
                return Err(DnsError::format(format!("unknown label type {:#x}", octet)));
            }

            let len = octet as usize;
            let bytes = raw
                .get(pos + 1..pos + 1 + len)
                .ok_or_else(|| DnsError::format("truncated label"))?;
            encoded_len += len + 1;
            if encoded_len + 1 > MAX_NAME_LEN {
                return Err(DnsError::format("domain name exceeds 255 octets"));
            }
            if !bytes.is_ascii() {
                return Err(DnsError::format("non-ascii label"));
            }
            labels.push(String::from_utf8_lossy(bytes).into_owned());
            pos += 1 + len;
        }

        Ok(DomainName { labels })
    }

    fn check_lengths(&self) -> Result<(), DnsError> {
        let mut encoded_len = 1; // root octet
        for label in &self.labels {
            if label.is_empty() || label.len() > MAX_LABEL_LEN {
                return Err(DnsError::format(format!(
                    "label {:?} length out of range",
                    label
                )));
            }
            encoded_len += label.len() + 1;
        }
        if encoded_len > MAX_NAME_LEN {
            return Err(DnsError::format(format!(
                "domain name {} exceeds 255 octets",
                self
            )));
        }
        Ok(())
    }

    /// Uncompressed wire form, case preserved.
    pub fn to_wire(&self, out: &mut Vec<u8>) {
        for label in &self.labels {
            out.push(label.len() as u8);
            out.extend_from_slice(label.as_bytes());
        }
        out.push(0);
    }

    /// Canonical wire form used for signing and hashing: uncompressed and
    /// lowercased.
    pub fn canonical_wire(&self, out: &mut Vec<u8>) {
        for label in &self.labels {
            out.push(label.len() as u8);
            out.extend_from_slice(label.to_ascii_lowercase().as_bytes());
        }
        out.push(0);
    }

    pub fn wire_len(&self) -> usize {
        self.labels.iter().map(|l| l.len() + 1).sum::<usize>() + 1
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Label count excluding the root.
    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    pub fn is_root(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn is_wildcard(&self) -> bool {
        self.labels.first().map(|l| l == "*").unwrap_or(false)
    }

    pub fn parent(&self) -> Option<DomainName> {
        if self.labels.is_empty() {
            return None;
        }
        Some(DomainName {
            labels: self.labels[1..].to_vec(),
        })
    }

    /// The name formed by the last `count` labels of this name.
    pub fn suffix(&self, count: usize) -> DomainName {
        let skip = self.labels.len().saturating_sub(count);
        DomainName {
            labels: self.labels[skip..].to_vec(),
        }
    }

    /// True when `other` is this name or an ancestor of it.
    pub fn ends_with(&self, other: &DomainName) -> bool {
        if other.labels.len() > self.labels.len() {
            return false;
        }
        self.labels
            .iter()
            .rev()
            .zip(other.labels.iter().rev())
            .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }

    /// Prefixes one label, as when forming `*.parent`.
    pub fn prepend(&self, label: &str) -> Result<DomainName, DnsError> {
        let mut labels = Vec::with_capacity(self.labels.len() + 1);
        labels.push(label.to_string());
        labels.extend(self.labels.iter().cloned());
        Self::from_labels(labels)
    }

    pub fn wildcard(&self) -> DomainName {
        let mut labels = Vec::with_capacity(self.labels.len() + 1);
        labels.push("*".to_string());
        labels.extend(self.labels.iter().cloned());
        DomainName { labels }
    }

    /// Rewrites the `from` suffix of this name to `to`, the DNAME
    /// substitution of RFC 6672.
    pub fn replace_suffix(
        &self,
        from: &DomainName,
        to: &DomainName,
    ) -> Result<DomainName, DnsError> {
        if !self.ends_with(from) {
            return Err(DnsError::ServerFailure(format!(
                "{} is not below {}",
                self, from
            )));
        }
        let keep = self.labels.len() - from.labels.len();
        let mut labels: Vec<String> = self.labels[..keep].to_vec();
        labels.extend(to.labels.iter().cloned());
        Self::from_labels(labels)
    }

    fn canonical_label(label: &str) -> Vec<u8> {
        label.as_bytes().to_ascii_lowercase()
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.labels.is_empty() {
            return write!(f, ".");
        }
        for label in &self.labels {
            write!(f, "{}.", label)?;
        }
        Ok(())
    }
}

impl PartialEq for DomainName {
    fn eq(&self, other: &Self) -> bool {
        self.labels.len() == other.labels.len()
            && self
                .labels
                .iter()
                .zip(other.labels.iter())
                .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }
}

impl Eq for DomainName {}

impl Hash for DomainName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for label in &self.labels {
            Self::canonical_label(label).hash(state);
        }
    }
}

impl Ord for DomainName {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.labels.iter().rev().zip(other.labels.iter().rev()) {
            match Self::canonical_label(a).cmp(&Self::canonical_label(b)) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        self.labels.len().cmp(&other.labels.len())
    }
}

impl PartialOrd for DomainName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(text: &str) -> DomainName {
        DomainName::from_text(text, None).unwrap()
    }

    #[test]
    fn test_parse_wire() {
        use hex_literal::hex;
        // google com
        let raw = hex!("06 676f6f676c65 03 636f6d 00");
        let mut offset = 0;
        let parsed = DomainName::parse(&raw, &mut offset).unwrap();
        assert_eq!(12, offset);
        assert_eq!(name("google.com."), parsed);

        let truncated = &raw[..11];
        let mut offset = 0;
        assert!(DomainName::parse(truncated, &mut offset).is_err());
    }

    #[test]
    fn test_parse_compression_pointer() {
        // "ns." at the end pointing back to "example.com." at 0
        let mut raw = Vec::new();
        name("example.com.").to_wire(&mut raw);
        let pointer_pos = raw.len();
        raw.extend_from_slice(&[0x02, b'n', b's', 0xC0, 0x00]);

        let mut offset = pointer_pos;
        let parsed = DomainName::parse(&raw, &mut offset).unwrap();
        assert_eq!(name("ns.example.com."), parsed);
        assert_eq!(raw.len(), offset);
    }

    #[test]
    fn test_parse_rejects_forward_pointer() {
        // pointer at 0 targeting itself
        let raw = [0xC0, 0x00];
        let mut offset = 0;
        assert!(DomainName::parse(&raw, &mut offset).is_err());

        // pointer targeting beyond itself
        let raw = [0xC0, 0x05, 0x00];
        let mut offset = 0;
        assert!(DomainName::parse(&raw, &mut offset).is_err());
    }

    #[test]
    fn test_length_limits() {
        let long_label = "a".repeat(64);
        assert!(DomainName::from_text(&format!("{}.com.", long_label), None).is_err());

        let label = "a".repeat(63);
        let too_long = format!("{0}.{0}.{0}.{0}.", label);
        assert!(DomainName::from_text(&too_long, None).is_err());
    }

    #[test]
    fn test_relative_names_need_origin() {
        let apex = name("example.com.");
        assert_eq!(
            name("www.example.com."),
            DomainName::from_text("www", Some(&apex)).unwrap()
        );
        assert!(DomainName::from_text("www", None).is_err());
    }

    #[test]
    fn test_canonical_ordering() {
        // the ordering example of RFC 4034 section 6.1
        let ordered = [
            "example.",
            "a.example.",
            "yljkjljk.a.example.",
            "Z.a.example.",
            "zABC.a.EXAMPLE.",
            "z.example.",
            "*.z.example.",
        ];
        for pair in ordered.windows(2) {
            assert!(
                name(pair[0]) < name(pair[1]),
                "{} should sort before {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_case_insensitive_equality() {
        assert_eq!(name("WWW.Example.COM."), name("www.example.com."));
    }

    #[test]
    fn test_suffix_relations() {
        let qname = name("a.b.example.com.");
        assert!(qname.ends_with(&name("example.com.")));
        assert!(qname.ends_with(&qname));
        assert!(!name("example.com.").ends_with(&qname));
        assert_eq!(name("b.example.com."), qname.suffix(3));
        assert_eq!(name("b.example.com."), qname.parent().unwrap());
    }

    #[test]
    fn test_replace_suffix() {
        let qname = name("www.dept.example.com.");
        let rewritten = qname
            .replace_suffix(&name("dept.example.com."), &name("dept.example.net."))
            .unwrap();
        assert_eq!(name("www.dept.example.net."), rewritten);
    }

    #[test]
    fn test_canonical_wire_lowercases() {
        let mut wire = Vec::new();
        name("WWW.Example.com.").canonical_wire(&mut wire);
        let mut expected = Vec::new();
        name("www.example.com.").to_wire(&mut expected);
        assert_eq!(expected, wire);
    }
}
