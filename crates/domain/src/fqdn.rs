use crate::errors::DnsError;

/// Normalize a domain name to its fully-qualified (trailing dot) form.
///
/// The cache, the coalescing topics and the wire queries all key on the
/// FQDN so that "example.com" and "example.com." share one entry.
pub fn normalize(domain: &str) -> Result<String, DnsError> {
    let trimmed = domain.trim();
    if trimmed.is_empty() || trimmed == "." {
        return Err(DnsError::InvalidDomainName(domain.to_string()));
    }
    if trimmed.ends_with('.') {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{trimmed}."))
    }
}
