use std::net::IpAddr;

/// A compiled set of CIDR networks with containment lookup.
///
/// An empty set is a wildcard: conditional-forwarding rules with no client
/// restriction match every client.
#[derive(Debug, Clone, Default)]
pub struct SubnetSet {
    networks: Vec<ipnetwork::IpNetwork>,
}

impl SubnetSet {
    pub fn parse(cidrs: &[String]) -> Result<Self, String> {
        let mut networks = Vec::with_capacity(cidrs.len());
        for cidr in cidrs {
            let network: ipnetwork::IpNetwork = cidr
                .parse()
                .map_err(|e| format!("invalid CIDR {}: {}", cidr, e))?;
            networks.push(network);
        }
        Ok(Self { networks })
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    pub fn contains(&self, ip: IpAddr) -> bool {
        self.networks.iter().any(|network| network.contains(ip))
    }
}
