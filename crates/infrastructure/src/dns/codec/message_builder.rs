//! Constructs upstream DNS query messages in wire format using
//! `hickory-proto`, giving the forwarder full control over the header bits
//! it must echo (RD always, CD and DO passed through unvalidated).

use super::record_type_map::RecordTypeMapper;
use hickory_proto::op::{Edns, Message, MessageType, OpCode, Query};
use hickory_proto::rr::{DNSClass, Name};
use std::str::FromStr;
use warden_dns_domain::{Question, ResolveError};

/// EDNS0 payload advertised to upstreams.
const EDNS_MAX_PAYLOAD: u16 = 4096;

pub struct MessageBuilder;

impl MessageBuilder {
    /// Build a recursive query for `question` with a fresh random id.
    ///
    /// `dnssec_ok` and `checking_disabled` are the client's DO/CD bits;
    /// they are forwarded as received, never acted upon.
    pub fn upstream_query(
        question: &Question,
        dnssec_ok: bool,
        checking_disabled: bool,
    ) -> Result<Message, ResolveError> {
        let name = Name::from_str(&question.name).map_err(|e| {
            ResolveError::InvalidDomainName(format!("'{}': {}", question.name, e))
        })?;

        let mut query = Query::new();
        query.set_name(name);
        query.set_query_type(RecordTypeMapper::to_wire(question.record_type));
        query.set_query_class(DNSClass::IN);

        let mut message = Message::new(fastrand::u16(..), MessageType::Query, OpCode::Query);
        message.set_recursion_desired(true);
        message.set_checking_disabled(checking_disabled);
        message.add_query(query);

        let mut edns = Edns::new();
        edns.set_max_payload(EDNS_MAX_PAYLOAD);
        edns.set_dnssec_ok(dnssec_ok);
        message.set_edns(edns);

        Ok(message)
    }
}
