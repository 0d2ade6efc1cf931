//! List line parsing.
//!
//! Accepts hosts-file lines (`0.0.0.0 domain`), plain domains, suffix
//! wildcards (`*.ads.com`), prefix wildcards (`ads.*`) and `/regex/`
//! patterns; comments and self-referential hosts entries are skipped.

/// Classified pattern produced by the line parser.
#[derive(Debug, PartialEq, Eq)]
pub enum ParsedPattern {
    Exact(String),
    /// Stem of `*.stem`: matches any subdomain and the stem itself.
    SuffixWildcard(String),
    /// Stem of `stem.*`: matches any name starting with `stem.`.
    PrefixWildcard(String),
    /// Body of `/body/`.
    Regex(String),
}

/// Parse one line from a blocklist/whitelist text.
pub fn parse_list_line(line: &str) -> Option<ParsedPattern> {
    let line = line.trim();

    if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
        return None;
    }

    // /pattern/ → regex
    if line.len() > 2 && line.starts_with('/') && line.ends_with('/') {
        return Some(ParsedPattern::Regex(line[1..line.len() - 1].to_string()));
    }

    // *.domain → suffix wildcard
    if let Some(stem) = line.strip_prefix("*.") {
        if !stem.is_empty() {
            return Some(ParsedPattern::SuffixWildcard(
                stem.trim_end_matches('.').to_ascii_lowercase(),
            ));
        }
        return None;
    }

    // domain.* → prefix wildcard
    if let Some(stem) = line.strip_suffix(".*") {
        if !stem.is_empty() && !stem.contains('*') {
            return Some(ParsedPattern::PrefixWildcard(stem.to_ascii_lowercase()));
        }
        return None;
    }

    let parts: Vec<&str> = line.split_whitespace().collect();

    // hosts file format: "addr domain [comment…]"
    if parts.len() >= 2 {
        let addr = parts[0];
        let domain = parts[1];

        let is_hosts_addr = matches!(addr, "0.0.0.0" | "127.0.0.1" | "::" | "::1");
        if is_hosts_addr {
            // Skip self-referential entries
            if matches!(
                domain,
                "localhost" | "0.0.0.0" | "broadcasthost" | "ip6-localhost" | "ip6-loopback"
            ) {
                return None;
            }
            if !domain.contains('.') {
                return None;
            }
            return Some(ParsedPattern::Exact(
                domain.trim_end_matches('.').to_ascii_lowercase(),
            ));
        }
    }

    // Single token with a dot → plain domain
    if parts.len() == 1 && parts[0].contains('.') {
        return Some(ParsedPattern::Exact(
            parts[0].trim_end_matches('.').to_ascii_lowercase(),
        ));
    }

    None
}

/// Parse a batch of lines, dropping everything unparseable.
pub fn parse_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Vec<ParsedPattern> {
    lines.into_iter().filter_map(parse_list_line).collect()
}
