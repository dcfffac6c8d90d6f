#![allow(dead_code)]
use async_trait::async_trait;
use doh_stub_domain::DnsError;
use doh_stub_infrastructure::dns::transport::{DnsTransport, TransportResponse};
use hickory_proto::op::{Message, MessageType, OpCode};
use hickory_proto::rr::rdata::{A, AAAA};
use hickory_proto::rr::{Name, RData, Record, RecordType};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Scripted in-process upstream.
///
/// Parses each outbound query, echoes its transaction id and answers from
/// a fixed script, so tests cover the resolver engine without a network.
pub struct ScriptedTransport {
    a_records: Vec<(Ipv4Addr, u32)>,
    aaaa_records: Vec<(Ipv6Addr, u32)>,
    fail_a: bool,
    fail_aaaa: bool,
    delay: Option<Duration>,
    pub a_queries: AtomicUsize,
    pub aaaa_queries: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            a_records: Vec::new(),
            aaaa_records: Vec::new(),
            fail_a: false,
            fail_aaaa: false,
            delay: None,
            a_queries: AtomicUsize::new(0),
            aaaa_queries: AtomicUsize::new(0),
        }
    }

    pub fn with_a(mut self, address: &str, ttl: u32) -> Self {
        self.a_records.push((address.parse().unwrap(), ttl));
        self
    }

    pub fn with_aaaa(mut self, address: &str, ttl: u32) -> Self {
        self.aaaa_records.push((address.parse().unwrap(), ttl));
        self
    }

    pub fn failing_a(mut self) -> Self {
        self.fail_a = true;
        self
    }

    pub fn failing_aaaa(mut self) -> Self {
        self.fail_aaaa = true;
        self
    }

    /// Delay every reply, to hold callers in the coalescing wait.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn a_query_count(&self) -> usize {
        self.a_queries.load(Ordering::SeqCst)
    }

    pub fn aaaa_query_count(&self) -> usize {
        self.aaaa_queries.load(Ordering::SeqCst)
    }

    fn build_response(&self, query: &Message, query_type: RecordType) -> Vec<u8> {
        let name = Name::from_str("example.com.").unwrap();
        let mut response = Message::new();
        response.set_id(query.id());
        response.set_message_type(MessageType::Response);
        response.set_op_code(OpCode::Query);

        match query_type {
            RecordType::A => {
                for (address, ttl) in &self.a_records {
                    response.add_answer(Record::from_rdata(name.clone(), *ttl, RData::A(A(*address))));
                }
            }
            RecordType::AAAA => {
                for (address, ttl) in &self.aaaa_records {
                    response.add_answer(Record::from_rdata(
                        name.clone(),
                        *ttl,
                        RData::AAAA(AAAA(*address)),
                    ));
                }
            }
            _ => {}
        }

        let mut buf = Vec::new();
        let mut encoder = BinEncoder::new(&mut buf);
        response.emit(&mut encoder).unwrap();
        buf
    }
}

#[async_trait]
impl DnsTransport for ScriptedTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        _timeout: Duration,
    ) -> Result<TransportResponse, DnsError> {
        let query = Message::from_vec(message_bytes).expect("well-formed query expected");
        let query_type = query.queries()[0].query_type();

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match query_type {
            RecordType::A => {
                self.a_queries.fetch_add(1, Ordering::SeqCst);
                if self.fail_a {
                    return Err(DnsError::Transport("scripted A failure".to_string()));
                }
            }
            RecordType::AAAA => {
                self.aaaa_queries.fetch_add(1, Ordering::SeqCst);
                if self.fail_aaaa {
                    return Err(DnsError::Transport("scripted AAAA failure".to_string()));
                }
            }
            other => panic!("unexpected query type {other}"),
        }

        Ok(TransportResponse {
            bytes: self.build_response(&query, query_type),
        })
    }

    fn protocol_name(&self) -> &'static str {
        "SCRIPTED"
    }
}
