pub mod dns;
pub mod errors;
pub mod server;
pub mod sign;
mod util;
pub mod zone;

pub use crate::dns::Message;
pub use crate::errors::DnsError;
pub use crate::server::NameServer;
pub use crate::sign::signed_zone::SignedZone;
pub use crate::zone::Zone;
