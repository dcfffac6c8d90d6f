use std::fmt;

/// Address family of a single DNS query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryFamily {
    V4,
    V6,
}

impl QueryFamily {
    /// Suffix appended to the FQDN to form a coalescing topic.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::V4 => "4",
            Self::V6 => "6",
        }
    }

    /// Record type name, for logs.
    pub fn record_name(&self) -> &'static str {
        match self {
            Self::V4 => "A",
            Self::V6 => "AAAA",
        }
    }
}

impl fmt::Display for QueryFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.record_name())
    }
}

/// Which address families a caller wants resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    pub ipv4: bool,
    pub ipv6: bool,
}

impl QueryOptions {
    pub fn both() -> Self {
        Self {
            ipv4: true,
            ipv6: true,
        }
    }

    pub fn ipv4_only() -> Self {
        Self {
            ipv4: true,
            ipv6: false,
        }
    }

    pub fn ipv6_only() -> Self {
        Self {
            ipv4: false,
            ipv6: true,
        }
    }

    pub fn any(&self) -> bool {
        self.ipv4 || self.ipv6
    }

    /// Requested families in cache-assembly order (IPv4 before IPv6).
    pub fn families(&self) -> Vec<QueryFamily> {
        let mut families = Vec::with_capacity(2);
        if self.ipv4 {
            families.push(QueryFamily::V4);
        }
        if self.ipv6 {
            families.push(QueryFamily::V6);
        }
        families
    }
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self::both()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn families_keep_v4_first() {
        assert_eq!(
            QueryOptions::both().families(),
            vec![QueryFamily::V4, QueryFamily::V6]
        );
        assert_eq!(QueryOptions::ipv6_only().families(), vec![QueryFamily::V6]);
    }

    #[test]
    fn empty_selection_has_no_families() {
        let options = QueryOptions {
            ipv4: false,
            ipv6: false,
        };
        assert!(!options.any());
        assert!(options.families().is_empty());
    }
}
