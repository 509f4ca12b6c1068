use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};
use uuid::Uuid;

/// Format identifier stamped on every Xid this tool issues.
pub const XID_FORMAT_ID: i32 = 1;

/// Distributed-transaction identity: one shared global transaction id per
/// copy run plus a branch qualifier unique to each destination connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Xid {
    pub format_id: i32,
    pub gtrid: [u8; 8],
    pub bqual: [u8; 8],
}

impl Xid {
    pub fn gtrid_hex(&self) -> String {
        hex(&self.gtrid)
    }

    pub fn bqual_hex(&self) -> String {
        hex(&self.bqual)
    }
}

impl fmt::Display for Xid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.gtrid_hex(), self.bqual_hex())
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().fold(
        String::with_capacity(bytes.len() * 2),
        |mut out, byte| {
            let _ = write!(out, "{byte:02x}");
            out
        },
    )
}

/// Issues the Xids for one copy run.
///
/// The global transaction id is eight random bytes drawn from a v4 UUID at
/// construction; branch qualifiers are a plain monotonic counter starting at
/// zero. Issuance is sequential from the coordinator thread, so there is no
/// interior locking. The counter cannot realistically wrap for any sane
/// worker count.
#[derive(Debug)]
pub struct XidGenerator {
    gtrid: [u8; 8],
    counter: u64,
}

impl XidGenerator {
    pub fn new() -> Self {
        let uuid = Uuid::new_v4();
        let mut gtrid = [0u8; 8];
        gtrid.copy_from_slice(&uuid.into_bytes()[..8]);
        XidGenerator { gtrid, counter: 0 }
    }

    pub fn next_xid(&mut self) -> Xid {
        let bqual = self.counter.to_be_bytes();
        self.counter += 1;
        Xid {
            format_id: XID_FORMAT_ID,
            gtrid: self.gtrid,
            bqual,
        }
    }
}

impl Default for XidGenerator {
    fn default() -> Self {
        Self::new()
    }
}
