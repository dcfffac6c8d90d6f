//! Wire-format query construction.
//!
//! Builds one standalone RFC 1035 query per address family, with the
//! caller-assigned transaction id and an optional EDNS0 client-subnet
//! option derived from the client address hint.

use doh_stub_domain::{DnsError, QueryFamily};
use hickory_proto::op::{Edns, Message, MessageType, OpCode, Query};
use hickory_proto::rr::rdata::opt::{ClientSubnet, EdnsOption};
use hickory_proto::rr::{DNSClass, Name, RecordType};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use std::net::IpAddr;
use std::str::FromStr;

/// Source prefix lengths advertised in the client-subnet option.
const SUBNET_PREFIX_V4: u8 = 24;
const SUBNET_PREFIX_V6: u8 = 96;

/// EDNS advertised payload size.
const EDNS_MAX_PAYLOAD: u16 = 1232;

pub fn record_type(family: QueryFamily) -> RecordType {
    match family {
        QueryFamily::V4 => RecordType::A,
        QueryFamily::V6 => RecordType::AAAA,
    }
}

/// Build and serialize one query for `domain`/`family` with transaction
/// id `id`. The id doubles as the freshness-ordering sequence once the
/// reply comes back.
pub fn build_query(
    domain: &str,
    family: QueryFamily,
    id: u16,
    client_ip: Option<IpAddr>,
) -> Result<Vec<u8>, DnsError> {
    let name = Name::from_str(domain)
        .map_err(|e| DnsError::InvalidDomainName(format!("{domain}: {e}")))?;

    let mut query = Query::new();
    query.set_name(name);
    query.set_query_type(record_type(family));
    query.set_query_class(DNSClass::IN);

    let mut message = Message::new();
    message.set_id(id);
    message.set_message_type(MessageType::Query);
    message.set_op_code(OpCode::Query);
    message.set_recursion_desired(true);
    message.add_query(query);

    if let Some(ip) = client_ip {
        attach_client_subnet(&mut message, ip)?;
    }

    serialize(&message)
}

fn attach_client_subnet(message: &mut Message, client_ip: IpAddr) -> Result<(), DnsError> {
    let prefix = match client_ip {
        IpAddr::V4(_) => SUBNET_PREFIX_V4,
        IpAddr::V6(_) => SUBNET_PREFIX_V6,
    };
    let subnet = ClientSubnet::from_str(&format!("{client_ip}/{prefix}"))
        .map_err(|e| DnsError::InvalidClientSubnet(format!("{client_ip}/{prefix}: {e}")))?;

    let edns = message.extensions_mut().get_or_insert_with(Edns::new);
    edns.set_max_payload(EDNS_MAX_PAYLOAD);
    edns.options_mut().insert(EdnsOption::Subnet(subnet));
    Ok(())
}

fn serialize(message: &Message) -> Result<Vec<u8>, DnsError> {
    let mut buf = Vec::with_capacity(512);
    let mut encoder = BinEncoder::new(&mut buf);
    message
        .emit(&mut encoder)
        .map_err(|e| DnsError::InvalidDnsResponse(format!("failed to serialize query: {e}")))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hickory_proto::rr::rdata::opt::EdnsCode;

    #[test]
    fn builds_a_plain_recursive_query() {
        let wire = build_query("example.com.", QueryFamily::V4, 42, None).unwrap();
        let parsed = Message::from_vec(&wire).unwrap();

        assert_eq!(parsed.id(), 42);
        assert!(parsed.recursion_desired());
        let question = &parsed.queries()[0];
        assert_eq!(question.name().to_utf8(), "example.com.");
        assert_eq!(question.query_type(), RecordType::A);
        assert!(parsed.extensions().is_none());
    }

    #[test]
    fn v6_family_queries_aaaa() {
        let wire = build_query("example.com.", QueryFamily::V6, 7, None).unwrap();
        let parsed = Message::from_vec(&wire).unwrap();
        assert_eq!(parsed.queries()[0].query_type(), RecordType::AAAA);
    }

    #[test]
    fn client_hint_adds_subnet_option() {
        let hint: IpAddr = "203.0.113.7".parse().unwrap();
        let wire = build_query("example.com.", QueryFamily::V4, 1, Some(hint)).unwrap();
        let parsed = Message::from_vec(&wire).unwrap();

        let edns = parsed.extensions().as_ref().expect("EDNS section expected");
        assert!(edns.option(EdnsCode::Subnet).is_some());
    }

    #[test]
    fn rejects_unparsable_domain() {
        let too_long_label = format!("{}.example.com.", "a".repeat(64));
        assert!(build_query(&too_long_label, QueryFamily::V4, 1, None).is_err());
    }
}
