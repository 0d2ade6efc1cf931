//! Assembles the responses the resolver makes up itself: blocked answers,
//! authoritative local answers, policy redirects, and protocol errors.

use super::record_type_map::RecordTypeMapper;
use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::rdata::{A, AAAA, CNAME};
use hickory_proto::rr::{DNSClass, Name, RData, Record};
use std::net::IpAddr;
use std::str::FromStr;
use warden_dns_domain::config::BlockMode;
use warden_dns_domain::{Question, RecordType, RedirectTarget, ResolveError};

pub struct Synthesizer;

impl Synthesizer {
    /// Response skeleton: QR=1, RA=1, RD echoed, NOERROR.
    fn base(id: u16, recursion_desired: bool) -> Message {
        let mut message = Message::new(id, MessageType::Response, OpCode::Query);
        message.set_recursion_desired(recursion_desired);
        message.set_recursion_available(true);
        message
    }

    fn echo_question(message: &mut Message, question: &Question) -> Result<Name, ResolveError> {
        let name = Name::from_str(&question.name).map_err(|e| {
            ResolveError::InvalidDomainName(format!("'{}': {}", question.name, e))
        })?;
        let mut query = Query::new();
        query.set_name(name.clone());
        query.set_query_type(RecordTypeMapper::to_wire(question.record_type));
        query.set_query_class(DNSClass::IN);
        message.add_query(query);
        Ok(name)
    }

    /// Blocked response per the configured block mode. The AA bit is never
    /// set: the resolver is not authoritative for the blocked name.
    pub fn blocked(
        id: u16,
        recursion_desired: bool,
        question: &Question,
        mode: BlockMode,
        blocked_ttl: u32,
    ) -> Result<Message, ResolveError> {
        let mut message = Self::base(id, recursion_desired);
        let name = Self::echo_question(&mut message, question)?;

        match mode {
            BlockMode::ZeroIp => match question.record_type {
                RecordType::A => {
                    message.add_answer(Record::from_rdata(
                        name,
                        blocked_ttl,
                        RData::A(A::new(0, 0, 0, 0)),
                    ));
                }
                RecordType::Aaaa => {
                    message.add_answer(Record::from_rdata(
                        name,
                        blocked_ttl,
                        RData::AAAA(AAAA::new(0, 0, 0, 0, 0, 0, 0, 0)),
                    ));
                }
                // Other types get NODATA under zero-ip.
                _ => {}
            },
            BlockMode::Nxdomain => {
                message.set_response_code(ResponseCode::NXDomain);
            }
            BlockMode::Refused => {
                message.set_response_code(ResponseCode::Refused);
            }
        }

        Ok(message)
    }

    /// Answer assembled from resolver-owned records. `authoritative` sets
    /// the AA bit (local overlay answers only).
    pub fn answer(
        id: u16,
        recursion_desired: bool,
        question: &Question,
        answers: Vec<Record>,
        authoritative: bool,
    ) -> Result<Message, ResolveError> {
        let mut message = Self::base(id, recursion_desired);
        Self::echo_question(&mut message, question)?;
        message.set_authoritative(authoritative);
        for record in answers {
            message.add_answer(record);
        }
        Ok(message)
    }

    /// Policy redirect: an address target becomes an A/AAAA answer, a name
    /// target becomes a CNAME.
    pub fn redirect(
        id: u16,
        recursion_desired: bool,
        question: &Question,
        target: &RedirectTarget,
        ttl: u32,
    ) -> Result<Message, ResolveError> {
        let mut message = Self::base(id, recursion_desired);
        let name = Self::echo_question(&mut message, question)?;

        match target {
            RedirectTarget::Address(IpAddr::V4(v4)) => {
                message.add_answer(Record::from_rdata(name, ttl, RData::A(A(*v4))));
            }
            RedirectTarget::Address(IpAddr::V6(v6)) => {
                message.add_answer(Record::from_rdata(name, ttl, RData::AAAA(AAAA(*v6))));
            }
            RedirectTarget::Name(target_name) => {
                let target = Name::from_str(target_name).map_err(|e| {
                    ResolveError::InvalidDomainName(format!("'{}': {}", target_name, e))
                })?;
                message.add_answer(Record::from_rdata(name, ttl, RData::CNAME(CNAME(target))));
            }
        }

        Ok(message)
    }

    /// Error response. The question is echoed when it survived parsing.
    pub fn error(
        id: u16,
        recursion_desired: bool,
        question: Option<&Question>,
        rcode: ResponseCode,
    ) -> Message {
        let mut message = Self::base(id, recursion_desired);
        if let Some(question) = question {
            // Best effort; an unparseable name just skips the echo.
            let _ = Self::echo_question(&mut message, question);
        }
        message.set_response_code(rcode);
        message
    }
}
