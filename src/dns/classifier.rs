use super::frame::Frame;
use bytes::Bytes;
use std::net::IpAddr;

/// How captured queries are bucketed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classifier {
    /// Key is the name of the first A question of each query.
    ByHostname,
    /// Key is the IPv4 source of queries whose A questions all ask for `target`.
    BySource { target: String },
}

impl Classifier {
    pub fn new(target: Option<String>) -> Self {
        match target {
            Some(target) => Self::BySource { target },
            None => Self::ByHostname,
        }
    }

    /// Returns the aggregation key for a countable query, `None` otherwise.
    pub fn classify(&self, frame: &Frame) -> Option<Bytes> {
        match self {
            Self::ByHostname => Self::hostname_key(frame),
            Self::BySource { target } => Self::source_key(frame, target),
        }
    }

    fn hostname_key(frame: &Frame) -> Option<Bytes> {
        let dns = frame.dns.as_ref()?;
        if !dns.is_query() {
            return None;
        }
        dns.a_questions().next().map(|q| q.name.clone())
    }

    fn source_key(frame: &Frame, target: &str) -> Option<Bytes> {
        let src = match frame.src_ip {
            Some(ip @ IpAddr::V4(_)) => ip,
            _ => return None,
        };
        let dns = frame.dns.as_ref()?;
        if !dns.is_query() {
            return None;
        }

        // Every A question has to name the target, one stray name drops the frame.
        let mut a_questions = dns.a_questions().peekable();
        a_questions.peek()?;
        if a_questions.any(|q| q.name.as_ref() != target.as_bytes()) {
            return None;
        }
        Some(Bytes::from(src.to_string()))
    }

    pub fn describe(&self) -> String {
        match self {
            Self::ByHostname => "count queries by hostname".to_string(),
            Self::BySource { target } => format!("count sources querying {target}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::frame::DnsMessage;
    use crate::dns::types::{DnsOpCode, DnsRecordType};
    use std::net::Ipv6Addr;

    #[test]
    fn test_hostname_first_a_question_wins() {
        let frame = Frame::query(
            [10, 0, 0, 1],
            &[
                ("ipv6.example.com", DnsRecordType::Aaaa),
                ("first.example.com", DnsRecordType::A),
                ("second.example.com", DnsRecordType::A),
            ],
        );
        assert_eq!(
            Classifier::ByHostname.classify(&frame),
            Some(Bytes::from("first.example.com"))
        );
    }

    #[test]
    fn test_hostname_key_is_verbatim() {
        let frame = Frame::a_query([10, 0, 0, 1], "WWW.Example.COM.");
        assert_eq!(
            Classifier::ByHostname.classify(&frame),
            Some(Bytes::from("WWW.Example.COM."))
        );
    }

    #[test]
    fn test_rejects_response_and_update() {
        let mut frame = Frame::a_query([10, 0, 0, 1], "example.com.");
        if let Some(dns) = frame.dns.as_mut() {
            dns.is_response = true;
        }
        assert_eq!(Classifier::ByHostname.classify(&frame), None);

        let mut frame = Frame::a_query([10, 0, 0, 1], "example.com.");
        if let Some(dns) = frame.dns.as_mut() {
            dns.opcode = DnsOpCode::Update;
        }
        assert_eq!(Classifier::ByHostname.classify(&frame), None);
    }

    #[test]
    fn test_rejects_non_dns_and_no_a_question() {
        let frame = Frame {
            src_ip: Some(IpAddr::from([10, 0, 0, 1])),
            dns: None,
        };
        assert_eq!(Classifier::ByHostname.classify(&frame), None);

        let frame = Frame::query([10, 0, 0, 1], &[("example.com", DnsRecordType::Aaaa)]);
        assert_eq!(Classifier::ByHostname.classify(&frame), None);

        let frame = Frame {
            src_ip: None,
            dns: Some(DnsMessage {
                is_response: false,
                opcode: DnsOpCode::Query,
                questions: Vec::new(),
            }),
        };
        assert_eq!(Classifier::ByHostname.classify(&frame), None);
    }

    #[test]
    fn test_source_mode_counts_matching_query() {
        let classifier = Classifier::new(Some("x.com.".to_string()));
        let frame = Frame::a_query([10, 0, 0, 1], "x.com.");
        assert_eq!(classifier.classify(&frame), Some(Bytes::from("10.0.0.1")));
    }

    #[test]
    fn test_source_mode_rejects_mixed_questions() {
        let classifier = Classifier::new(Some("x.com.".to_string()));
        let frame = Frame::query(
            [10, 0, 0, 2],
            &[("x.com.", DnsRecordType::A), ("y.com.", DnsRecordType::A)],
        );
        assert_eq!(classifier.classify(&frame), None);

        // Non-A questions are not compared against the target.
        let frame = Frame::query(
            [10, 0, 0, 3],
            &[("x.com.", DnsRecordType::A), ("y.com.", DnsRecordType::Aaaa)],
        );
        assert_eq!(classifier.classify(&frame), Some(Bytes::from("10.0.0.3")));
    }

    #[test]
    fn test_source_mode_requires_ipv4_and_a_question() {
        let classifier = Classifier::new(Some("x.com.".to_string()));

        let mut frame = Frame::a_query([10, 0, 0, 1], "x.com.");
        frame.src_ip = Some(IpAddr::V6(Ipv6Addr::LOCALHOST));
        assert_eq!(classifier.classify(&frame), None);

        frame.src_ip = None;
        assert_eq!(classifier.classify(&frame), None);

        let frame = Frame::query([10, 0, 0, 1], &[("x.com.", DnsRecordType::Aaaa)]);
        assert_eq!(classifier.classify(&frame), None);
    }

    #[test]
    fn test_classification_is_repeatable() {
        let frame = Frame::a_query([192, 168, 1, 7], "repeat.example.");
        for classifier in [
            Classifier::ByHostname,
            Classifier::new(Some("repeat.example.".to_string())),
        ] {
            assert_eq!(classifier.classify(&frame), classifier.classify(&frame));
        }
    }
}
