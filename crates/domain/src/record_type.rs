use std::fmt;
use std::str::FromStr;

/// DNS record type as the resolver reasons about it.
///
/// Wire mapping to `hickory-proto` lives in the infrastructure layer;
/// this enum keeps the domain free of wire dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordType {
    A,
    Aaaa,
    Cname,
    Mx,
    Ns,
    Ptr,
    Soa,
    Srv,
    Txt,
    Https,
    Svcb,
    Unknown(u16),
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Cname => "CNAME",
            RecordType::Mx => "MX",
            RecordType::Ns => "NS",
            RecordType::Ptr => "PTR",
            RecordType::Soa => "SOA",
            RecordType::Srv => "SRV",
            RecordType::Txt => "TXT",
            RecordType::Https => "HTTPS",
            RecordType::Svcb => "SVCB",
            RecordType::Unknown(_) => "TYPE",
        }
    }

    pub fn from_u16(code: u16) -> Self {
        match code {
            1 => RecordType::A,
            28 => RecordType::Aaaa,
            5 => RecordType::Cname,
            15 => RecordType::Mx,
            2 => RecordType::Ns,
            12 => RecordType::Ptr,
            6 => RecordType::Soa,
            33 => RecordType::Srv,
            16 => RecordType::Txt,
            65 => RecordType::Https,
            64 => RecordType::Svcb,
            other => RecordType::Unknown(other),
        }
    }

    pub fn to_u16(&self) -> u16 {
        match self {
            RecordType::A => 1,
            RecordType::Aaaa => 28,
            RecordType::Cname => 5,
            RecordType::Mx => 15,
            RecordType::Ns => 2,
            RecordType::Ptr => 12,
            RecordType::Soa => 6,
            RecordType::Srv => 33,
            RecordType::Txt => 16,
            RecordType::Https => 65,
            RecordType::Svcb => 64,
            RecordType::Unknown(code) => *code,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::Unknown(code) => write!(f, "TYPE{}", code),
            other => f.write_str(other.as_str()),
        }
    }
}

impl FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "A" => Ok(RecordType::A),
            "AAAA" => Ok(RecordType::Aaaa),
            "CNAME" => Ok(RecordType::Cname),
            "MX" => Ok(RecordType::Mx),
            "NS" => Ok(RecordType::Ns),
            "PTR" => Ok(RecordType::Ptr),
            "SOA" => Ok(RecordType::Soa),
            "SRV" => Ok(RecordType::Srv),
            "TXT" => Ok(RecordType::Txt),
            "HTTPS" => Ok(RecordType::Https),
            "SVCB" => Ok(RecordType::Svcb),
            other => {
                if let Some(code) = other.strip_prefix("TYPE") {
                    code.parse::<u16>()
                        .map(RecordType::Unknown)
                        .map_err(|_| format!("unknown record type '{}'", s))
                } else {
                    Err(format!("unknown record type '{}'", s))
                }
            }
        }
    }
}
