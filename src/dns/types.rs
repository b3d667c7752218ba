/// DNS Record Types (RFC 1035 Section 3.2.2, RFC 3596)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DnsRecordType {
    /// A record: IPv4 address (32 bits)
    A,
    /// NS record: Authoritative name server
    Ns,
    /// CNAME record: Canonical name for an alias
    Cname,
    /// PTR record: Domain name pointer
    Ptr,
    /// MX record: Mail exchange
    Mx,
    /// TXT record: Text strings
    Txt,
    /// AAAA record: IPv6 address (128 bits) - RFC 3596
    Aaaa,
    /// HTTPS record: HTTPS binding - RFC 9460
    Https,
    /// Unknown or unsupported record type
    Unknown(u16),
}

impl DnsRecordType {
    /// Convert wire format u16 to `DnsRecordType`
    pub fn from_u16(value: u16) -> Self {
        match value {
            1 => Self::A,
            2 => Self::Ns,
            5 => Self::Cname,
            12 => Self::Ptr,
            15 => Self::Mx,
            16 => Self::Txt,
            28 => Self::Aaaa,
            65 => Self::Https,
            n => Self::Unknown(n),
        }
    }
}

/// DNS header OPCODE (RFC 1035 Section 4.1.1, RFC 1996, RFC 2136)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DnsOpCode {
    Query,
    InverseQuery,
    Status,
    Notify,
    Update,
    Unknown(u8),
}

impl DnsOpCode {
    /// Convert the 4-bit header field to `DnsOpCode`
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Query,
            1 => Self::InverseQuery,
            2 => Self::Status,
            4 => Self::Notify,
            5 => Self::Update,
            n => Self::Unknown(n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_type_from_wire() {
        assert_eq!(DnsRecordType::from_u16(1), DnsRecordType::A);
        assert_eq!(DnsRecordType::from_u16(28), DnsRecordType::Aaaa);
        assert_eq!(DnsRecordType::from_u16(99), DnsRecordType::Unknown(99));
    }

    #[test]
    fn test_opcode_from_wire() {
        assert_eq!(DnsOpCode::from_u8(0), DnsOpCode::Query);
        assert_eq!(DnsOpCode::from_u8(5), DnsOpCode::Update);
        assert_eq!(DnsOpCode::from_u8(9), DnsOpCode::Unknown(9));
    }
}
