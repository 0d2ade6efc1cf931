use warden_dns_domain::{ClientInfo, PolicyDecision, Question};

/// Policy evaluation port.
///
/// A pure function over an immutable rule set: no I/O, no locks held across
/// the call. The pipeline consults it after the whitelist/blocklist stages
/// and acts on the returned sum type.
pub trait PolicyEngine: Send + Sync {
    fn evaluate(&self, question: &Question, client: &ClientInfo) -> PolicyDecision;
}
