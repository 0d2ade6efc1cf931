use hickory_proto::op::{Message, ResponseCode};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use warden_dns_domain::ResolveError;

/// Serialize a message to wire bytes.
pub fn serialize_message(message: &Message) -> Result<Vec<u8>, ResolveError> {
    let mut buf = Vec::with_capacity(512);
    let mut encoder = BinEncoder::new(&mut buf);
    message
        .emit(&mut encoder)
        .map_err(|e| ResolveError::Internal(format!("failed to serialize DNS message: {}", e)))?;
    Ok(buf)
}

/// NXDOMAIN, or NOERROR with no answers (NODATA).
pub fn is_negative(message: &Message) -> bool {
    match message.response_code() {
        ResponseCode::NXDomain => true,
        ResponseCode::NoError => message.answers().is_empty(),
        _ => false,
    }
}

/// Smallest answer TTL, if any answers are present.
pub fn min_answer_ttl(message: &Message) -> Option<u32> {
    message.answers().iter().map(|r| r.ttl()).min()
}

/// Age every RR in a cloned cached response by `elapsed_secs`, flooring at 0.
///
/// The cache hands out clones, so mutating here never affects other readers.
pub fn decay_ttls(message: &mut Message, elapsed_secs: u32) {
    if elapsed_secs == 0 {
        return;
    }

    let answers = message
        .take_answers()
        .into_iter()
        .map(|mut r| {
            let ttl = r.ttl().saturating_sub(elapsed_secs);
            r.set_ttl(ttl);
            r
        })
        .collect();
    message.insert_answers(answers);

    let authorities = message
        .take_name_servers()
        .into_iter()
        .map(|mut r| {
            let ttl = r.ttl().saturating_sub(elapsed_secs);
            r.set_ttl(ttl);
            r
        })
        .collect();
    message.insert_name_servers(authorities);
}
