use hickory_proto::rr::RecordType as WireType;
use warden_dns_domain::RecordType;

/// Maps the domain-layer record type to and from `hickory-proto`'s.
pub struct RecordTypeMapper;

impl RecordTypeMapper {
    pub fn to_wire(record_type: RecordType) -> WireType {
        match record_type {
            RecordType::A => WireType::A,
            RecordType::Aaaa => WireType::AAAA,
            RecordType::Cname => WireType::CNAME,
            RecordType::Mx => WireType::MX,
            RecordType::Ns => WireType::NS,
            RecordType::Ptr => WireType::PTR,
            RecordType::Soa => WireType::SOA,
            RecordType::Srv => WireType::SRV,
            RecordType::Txt => WireType::TXT,
            RecordType::Https => WireType::HTTPS,
            RecordType::Svcb => WireType::SVCB,
            RecordType::Unknown(code) => WireType::from(code),
        }
    }

    pub fn from_wire(wire: WireType) -> RecordType {
        RecordType::from_u16(u16::from(wire))
    }
}
