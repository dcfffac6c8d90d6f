use thiserror::Error;

#[derive(Error, Debug)]
pub enum DnsError {
    /// No answer has been cached yet for any requested family.
    /// Internal to the resolution loop; never returned to callers.
    #[error("record not found")]
    RecordNotFound,

    /// An authoritative empty answer is cached for every requested family.
    #[error("empty response")]
    EmptyResponse,

    /// The caller's deadline passed or its cancellation token fired.
    #[error("resolution cancelled")]
    Cancelled,

    /// The queried domain is the upstream DoH endpoint itself.
    #[error("refusing to resolve the upstream DoH host {0} through itself")]
    SelfQuery(String),

    #[error("invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("invalid client subnet hint: {0}")]
    InvalidClientSubnet(String),

    #[error("invalid DNS response: {0}")]
    InvalidDnsResponse(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("query timeout")]
    QueryTimeout,
}
