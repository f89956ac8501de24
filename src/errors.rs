use thiserror::Error;

/// Errors surfaced by the zone engine. Classification outcomes (NXDOMAIN,
/// NODATA) are not errors; they are carried in the lookup result.
#[derive(Debug, Error)]
pub enum DnsError {
    /// Malformed wire message. Answered with FORMERR when the query id is
    /// recoverable, dropped otherwise.
    #[error("format error: {0}")]
    Format(String),

    /// Unsupported opcode or operation, answered with NOTIMP.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// Query outside the served zone or for a disabled feature.
    #[error("refused: {0}")]
    Refused(String),

    /// Internal fault (missing key, signing failure). Answered with SERVFAIL
    /// and logged, never swallowed.
    #[error("server failure: {0}")]
    ServerFailure(String),

    /// Load-time rejection of the zone or key material, aborts startup.
    #[error("zone config error: {0}")]
    ZoneConfig(String),

    /// Socket-layer fault, fatal for one connection only.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DnsError {
    pub fn format<S: Into<String>>(msg: S) -> Self {
        DnsError::Format(msg.into())
    }

    pub fn zone<S: Into<String>>(msg: S) -> Self {
        DnsError::ZoneConfig(msg.into())
    }

    /// RCODE carried in the response generated for this error.
    pub fn rcode(&self) -> u8 {
        match self {
            DnsError::Format(_) => RCODE_FORMERR,
            DnsError::NotImplemented(_) => RCODE_NOTIMP,
            DnsError::Refused(_) => RCODE_REFUSED,
            DnsError::ServerFailure(_) | DnsError::ZoneConfig(_) | DnsError::Io(_) => {
                RCODE_SERVFAIL
            }
        }
    }
}

pub const RCODE_NOERROR: u8 = 0;
pub const RCODE_FORMERR: u8 = 1;
pub const RCODE_SERVFAIL: u8 = 2;
pub const RCODE_NXDOMAIN: u8 = 3;
pub const RCODE_NOTIMP: u8 = 4;
pub const RCODE_REFUSED: u8 = 5;
