//! Types shared by the lookup loader, the classifier and the report generator.

use std::{cmp::Ordering, fmt};

/// Minimum number of whitespace-delimited fields in a usable flow record.
pub const MIN_FLOW_FIELDS: usize = 14;

/// Index of the destination port field in a flow record.
pub const DSTPORT_FIELD: usize = 5;

/// Index of the protocol indicator field in a flow record.
pub const PROTOCOL_FIELD: usize = 6;

/// Protocol indicator that denotes TCP. Everything else is treated as UDP.
pub const TCP_INDICATOR: &str = "6";

/// Normalized protocol of a flow record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowProtocol {
    Tcp,
    Udp,
}

impl FlowProtocol {
    /// Map a raw protocol indicator to a protocol.
    ///
    /// Only the exact string `"6"` is TCP. Any other value, including other
    /// IANA protocol numbers such as `"1"` (ICMP), is folded into UDP.
    pub fn from_indicator(indicator: &str) -> Self {
        if indicator == TCP_INDICATOR {
            FlowProtocol::Tcp
        } else {
            FlowProtocol::Udp
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FlowProtocol::Tcp => "tcp",
            FlowProtocol::Udp => "udp",
        }
    }
}

impl fmt::Display for FlowProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exact-match key of the lookup table: a destination port and a protocol.
///
/// The port is kept as the string it was read as, so `"80"` and `"080"` are
/// different keys. The protocol is lowercased on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupKey {
    port: String,
    protocol: String,
}

impl LookupKey {
    /// Create a key, lowercasing the protocol.
    pub fn new(port: impl Into<String>, protocol: &str) -> Self {
        Self {
            port: port.into(),
            protocol: protocol.to_lowercase(),
        }
    }

    /// Create the key for a classified flow record.
    pub fn for_flow(port: impl Into<String>, protocol: FlowProtocol) -> Self {
        Self {
            port: port.into(),
            protocol: protocol.as_str().to_string(),
        }
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    fn numeric_port(&self) -> Option<u64> {
        self.port.parse().ok()
    }
}

/// Numeric ports come first in numeric order, then non-numeric ports; ties
/// fall back to the port string and then the protocol.
impl Ord for LookupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        let by_number = match (self.numeric_port(), other.numeric_port()) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_number
            .then_with(|| self.port.cmp(&other.port))
            .then_with(|| self.protocol.cmp(&other.protocol))
    }
}

impl PartialOrd for LookupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.port, self.protocol)
    }
}
