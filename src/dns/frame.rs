use super::types::{DnsOpCode, DnsRecordType};
use bytes::Bytes;
use std::net::IpAddr;

/// A single decoded packet, reduced to the layers the classifier looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    /// Source address from the network layer, if one was decoded.
    pub src_ip: Option<IpAddr>,
    /// DNS message carried in the UDP payload, if one was decoded.
    pub dns: Option<DnsMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsMessage {
    /// QR bit: false for a query, true for a response
    pub is_response: bool,
    pub opcode: DnsOpCode,
    pub questions: Vec<DnsQuestion>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsQuestion {
    /// Dot-joined labels exactly as they appeared on the wire
    pub name: Bytes,
    pub qtype: DnsRecordType,
}

impl DnsMessage {
    /// A standard query, as opposed to a response, update or notify.
    pub fn is_query(&self) -> bool {
        !self.is_response && self.opcode == DnsOpCode::Query
    }

    /// Questions asking for an IPv4 address, in question order.
    pub fn a_questions(&self) -> impl Iterator<Item = &DnsQuestion> {
        self.questions
            .iter()
            .filter(|q| q.qtype == DnsRecordType::A)
    }
}

#[cfg(test)]
impl Frame {
    pub fn query(src: [u8; 4], questions: &[(&str, DnsRecordType)]) -> Self {
        Self {
            src_ip: Some(IpAddr::from(src)),
            dns: Some(DnsMessage {
                is_response: false,
                opcode: DnsOpCode::Query,
                questions: questions
                    .iter()
                    .map(|(name, qtype)| DnsQuestion {
                        name: Bytes::copy_from_slice(name.as_bytes()),
                        qtype: *qtype,
                    })
                    .collect(),
            }),
        }
    }

    pub fn a_query(src: [u8; 4], name: &str) -> Self {
        Self::query(src, &[(name, DnsRecordType::A)])
    }
}
