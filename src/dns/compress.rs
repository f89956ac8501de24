use super::name::DomainName;

/// Offsets usable as compression targets must fit the 14-bit pointer form.
const MAX_POINTER_OFFSET: usize = 0x4000;

/// Tracks every name suffix already written into a message together with its
/// offset, so later names can be emitted as a pointer to the longest suffix
/// match. Matching is label-wise; a suffix can never start mid-label.
#[derive(Debug, Default)]
pub struct CompressList {
    entries: Vec<(DomainName, usize)>,
}

impl CompressList {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn get(&self, name: &DomainName) -> Option<usize> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, offset)| *offset)
    }

    /// The registered suffix of `name` with the most labels, with its offset.
    fn longest_suffix(&self, name: &DomainName) -> Option<(usize, usize)> {
        let mut best: Option<(usize, usize)> = None;
        for (entry, offset) in &self.entries {
            if !name.ends_with(entry) {
                continue;
            }
            let labels = entry.label_count();
            if labels > 0 && best.map(|(l, _)| labels > l).unwrap_or(true) {
                best = Some((labels, *offset));
            }
        }
        best
    }

    /// Writes `name` at the current end of `out`, compressing against
    /// previously written names and registering the new suffixes.
    pub fn write_name(&mut self, out: &mut Vec<u8>, name: &DomainName) {
        let matched = self.longest_suffix(name);
        let matched_labels = matched.map(|(labels, _)| labels).unwrap_or(0);
        let total = name.label_count();

        let mut new_suffixes = Vec::new();
        for index in 0..total - matched_labels {
            let offset = out.len();
            if offset < MAX_POINTER_OFFSET {
                new_suffixes.push((name.suffix(total - index), offset));
            }
            let label = &name.labels()[index];
            out.push(label.len() as u8);
            out.extend_from_slice(label.as_bytes());
        }

        match matched {
            Some((_, target)) => {
                out.extend_from_slice(&(0xC000_u16 | target as u16).to_be_bytes())
            }
            None => out.push(0),
        }

        for (suffix, offset) in new_suffixes {
            if self.get(&suffix).is_none() {
                self.entries.push((suffix, offset));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(text: &str) -> DomainName {
        DomainName::from_text(text, None).unwrap()
    }

    #[test]
    fn test_second_name_is_a_pointer() {
        let mut cl = CompressList::new();
        let mut out = Vec::new();
        cl.write_name(&mut out, &name("www.example.com."));
        let first_len = out.len();
        assert_eq!(17, first_len);

        cl.write_name(&mut out, &name("www.example.com."));
        // full pointer to offset 0
        assert_eq!(&[0xC0, 0x00], &out[first_len..]);
    }

    #[test]
    fn test_suffix_match_keeps_leading_labels() {
        let mut cl = CompressList::new();
        let mut out = Vec::new();
        cl.write_name(&mut out, &name("example.com."));
        let first_len = out.len();

        cl.write_name(&mut out, &name("mail.example.com."));
        // "mail" literal, then pointer to offset 0
        assert_eq!(&[4, b'm', b'a', b'i', b'l', 0xC0, 0x00], &out[first_len..]);

        // the new "mail.example.com." suffix is itself reusable
        let before = out.len();
        cl.write_name(&mut out, &name("mail.example.com."));
        assert_eq!(
            &[0xC0, first_len as u8],
            &out[before..],
            "whole name should compress to one pointer"
        );
    }

    #[test]
    fn test_no_match_across_label_boundary() {
        let mut cl = CompressList::new();
        let mut out = Vec::new();
        cl.write_name(&mut out, &name("ns.example.com."));
        let first_len = out.len();

        // "dns.example.com" shares the text "ns.example.com" but not the
        // label, so only "example.com." may be referenced.
        cl.write_name(&mut out, &name("dns.example.com."));
        assert_eq!(&[3, b'd', b'n', b's', 0xC0, 0x03], &out[first_len..]);
    }

    #[test]
    fn test_round_trips_through_parser() {
        let mut cl = CompressList::new();
        let mut out = Vec::new();
        let names = [
            name("example.com."),
            name("a.b.example.com."),
            name("b.example.com."),
            name("a.b.example.com."),
        ];
        let mut offsets = Vec::new();
        for n in &names {
            offsets.push(out.len());
            cl.write_name(&mut out, n);
        }
        for (n, mut offset) in names.iter().zip(offsets.into_iter()) {
            let parsed = DomainName::parse(&out, &mut offset).unwrap();
            assert_eq!(*n, parsed);
        }
    }
}
