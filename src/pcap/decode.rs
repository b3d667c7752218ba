use crate::dns::types::{DnsOpCode, DnsRecordType};
use crate::dns::{DnsMessage, DnsQuestion, Frame};
use bytes::Bytes;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

const ETHERTYPE_IPV4: u16 = 0x0800;
const ETHERTYPE_IPV6: u16 = 0x86DD;
const ETHERTYPE_VLAN: u16 = 0x8100;
const IPPROTO_UDP: u8 = 17;

/// Link-layer framing of captured packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkLayer {
    /// DLT_EN10MB
    Ethernet,
    /// DLT_LINUX_SLL, used by the `any` pseudo-device
    LinuxSll,
    /// DLT_RAW, packet starts at the IP header
    RawIp,
}

impl LinkLayer {
    pub fn from_linktype(linktype: pcap::Linktype) -> Option<Self> {
        match linktype {
            pcap::Linktype::ETHERNET => Some(Self::Ethernet),
            pcap::Linktype::LINUX_SLL => Some(Self::LinuxSll),
            pcap::Linktype::RAW | pcap::Linktype::IPV4 | pcap::Linktype::IPV6 => {
                Some(Self::RawIp)
            }
            _ => None,
        }
    }
}

/// Decode a captured packet into the layers the classifier inspects.
///
/// Packet structure (layers):
/// 1. Link header (Ethernet 14 bytes, +4 per VLAN tag; Linux SLL 16 bytes; none for raw IP)
/// 2. IP Header (20+ bytes for IPv4, 40 bytes for IPv6)
/// 3. UDP Header (8 bytes)
/// 4. DNS Message (variable length)
///
/// Never fails: layers that cannot be decoded are left empty.
pub fn decode_frame(link: LinkLayer, data: &[u8]) -> Frame {
    let mut frame = Frame::default();

    let Some((ethertype, offset)) = link_payload(link, data) else {
        return frame;
    };

    let ip = match ethertype {
        ETHERTYPE_IPV4 => parse_ipv4(&data[offset..]),
        ETHERTYPE_IPV6 => parse_ipv6(&data[offset..]),
        _ => None,
    };
    let Some((src_ip, ip_header_len, protocol)) = ip else {
        return frame;
    };
    frame.src_ip = Some(src_ip);

    if protocol != IPPROTO_UDP {
        return frame;
    }

    // UDP Header: 8 bytes
    // [0-1]: Source Port
    // [2-3]: Destination Port
    // [4-5]: Length
    // [6-7]: Checksum
    let udp = offset + ip_header_len;
    if data.len() < udp + 8 {
        return frame;
    }

    frame.dns = parse_dns_message(&data[udp + 8..]);
    frame
}

/// Returns the EtherType of the network layer and the offset where it starts.
fn link_payload(link: LinkLayer, data: &[u8]) -> Option<(u16, usize)> {
    match link {
        // [0-5]: Destination MAC, [6-11]: Source MAC, [12-13]: EtherType
        LinkLayer::Ethernet => {
            if data.len() < 14 {
                return None;
            }
            let eth_type = u16::from_be_bytes([data[12], data[13]]);
            if eth_type == ETHERTYPE_VLAN {
                // 802.1Q tag: [14-15] TCI, [16-17] inner EtherType
                if data.len() < 18 {
                    return None;
                }
                return Some((u16::from_be_bytes([data[16], data[17]]), 18));
            }
            Some((eth_type, 14))
        }
        // [0-1]: packet type, [2-3]: ARPHRD type, [4-5]: address length,
        // [6-13]: address, [14-15]: protocol
        LinkLayer::LinuxSll => {
            if data.len() < 16 {
                return None;
            }
            Some((u16::from_be_bytes([data[14], data[15]]), 16))
        }
        LinkLayer::RawIp => match data.first()? >> 4 {
            4 => Some((ETHERTYPE_IPV4, 0)),
            6 => Some((ETHERTYPE_IPV6, 0)),
            _ => None,
        },
    }
}

/// Parse IPv4 header (RFC 791)
///
/// IPv4 Header Format (minimum 20 bytes):
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |Version|  IHL  |Type of Service|          Total Length         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |         Identification        |Flags|      Fragment Offset    |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |  Time to Live |    Protocol   |         Header Checksum       |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                       Source Address                          |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                    Destination Address                        |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// Returns: (source IP, header length, protocol)
fn parse_ipv4(data: &[u8]) -> Option<(IpAddr, usize, u8)> {
    if data.len() < 20 {
        return None;
    }

    // IHL is in 32-bit words
    let ihl = (data[0] & 0x0F) as usize * 4;
    if ihl < 20 || data.len() < ihl {
        return None;
    }

    let src = Ipv4Addr::new(data[12], data[13], data[14], data[15]);
    Some((IpAddr::V4(src), ihl, data[9]))
}

/// Parse IPv6 header (RFC 2460)
///
/// Fixed 40 bytes: version/class/flow (4), payload length (2), next header (1),
/// hop limit (1), source address (16), destination address (16).
/// Extension headers are not walked; their next header will not be UDP.
///
/// Returns: (source IP, header length, next header)
fn parse_ipv6(data: &[u8]) -> Option<(IpAddr, usize, u8)> {
    if data.len() < 40 {
        return None;
    }

    let mut src = [0u8; 16];
    src.copy_from_slice(&data[8..24]);
    Some((IpAddr::V6(Ipv6Addr::from(src)), 40, data[6]))
}

/// Parse DNS header and question section (RFC 1035 Section 4.1)
///
/// DNS Header Format (12 bytes):
/// ```text
///  0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                      ID                       |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |QR|   Opcode  |AA|TC|RD|RA|   Z    |   RCODE   |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                    QDCOUNT                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |            ANCOUNT / NSCOUNT / ARCOUNT        |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// ```
///
/// Each question is QNAME, QTYPE (2 bytes), QCLASS (2 bytes). A question
/// section that runs past the end of the payload yields `None`.
fn parse_dns_message(data: &[u8]) -> Option<DnsMessage> {
    if data.len() < 12 {
        return None;
    }

    let flags = u16::from_be_bytes([data[2], data[3]]);
    let is_response = (flags & 0x8000) != 0;
    let opcode = DnsOpCode::from_u8(((flags >> 11) & 0x0F) as u8);
    let qd_count = u16::from_be_bytes([data[4], data[5]]);

    let mut offset = 12;
    let mut questions = Vec::with_capacity(qd_count.min(16) as usize);
    for _ in 0..qd_count {
        let name = parse_domain_name(data, &mut offset)?;
        if offset + 4 > data.len() {
            return None;
        }
        let qtype = u16::from_be_bytes([data[offset], data[offset + 1]]);
        offset += 4; // QTYPE + QCLASS

        questions.push(DnsQuestion {
            name,
            qtype: DnsRecordType::from_u16(qtype),
        });
    }

    Some(DnsMessage {
        is_response,
        opcode,
        questions,
    })
}

/// Parse DNS domain name with compression support (RFC 1035 Section 4.1.4)
///
/// Labels are a length octet followed by that many octets, terminated by a
/// zero octet. A length octet with the top two bits set is a pointer whose
/// remaining 14 bits give an offset from the start of the message.
///
/// ```text
/// "www.example.com" is encoded as:
///  | 3 | w | w | w | 7 | e | x | a | m | p | l | e | 3 | c | o | m | 0 |
///
/// Pointer:
///  | 1  1|                OFFSET                   |
/// ```
///
/// - Maximum label length: 63 octets (RFC 1035 Section 2.3.4)
/// - Maximum domain name length: 253 octets (RFC 1035 Section 2.3.4)
/// - Pointer loop protection: limit to 10 jumps
///
/// On return `offset` points just past the name as it appears in place.
fn parse_domain_name(data: &[u8], offset: &mut usize) -> Option<Bytes> {
    let mut domain = Vec::new();
    let mut pos = *offset;
    let mut resume_at = None;
    let max_jumps = 10;
    let mut jump_count = 0;

    loop {
        let len = *data.get(pos)? as usize;

        if len == 0 {
            pos += 1;
            break;
        }

        if (len & 0xC0) == 0xC0 {
            let low = *data.get(pos + 1)? as usize;
            if resume_at.is_none() {
                resume_at = Some(pos + 2);
            }
            jump_count += 1;
            if jump_count > max_jumps {
                return None;
            }
            pos = ((len & 0x3F) << 8) | low;
            continue;
        }

        if len > 63 {
            return None;
        }
        pos += 1;

        if pos + len > data.len() {
            return None;
        }
        if !domain.is_empty() {
            domain.push(b'.');
        }
        domain.extend_from_slice(&data[pos..pos + len]);
        pos += len;

        if domain.len() > 253 {
            return None;
        }
    }

    *offset = resume_at.unwrap_or(pos);
    Some(Bytes::from(domain))
}
