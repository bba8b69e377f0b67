// # OpenDNS IP Source
//
// This crate learns the host's public IPv4 address with a single DNS query.
//
// ## How it works
//
// OpenDNS resolvers answer the name `myip.opendns.com` with the address the
// query arrived from. Asking `resolver1.opendns.com` for that A record
// therefore returns the caller's public IP, with no HTTP service involved.
//
// ## Exchange
//
// - One query per call, random id, recursion desired
// - UDP first; a truncated reply is repeated once over TCP
// - Only the first answer record is consulted and it must be an A record

use async_trait::async_trait;
use ddns_core::net::with_timeout;
use ddns_core::traits::IpSource;
use ddns_core::{Error, Result};

use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::{Name, RData, RecordType};

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};

/// Name whose A record is the caller's public address
pub const OPENDNS_TARGET: &str = "myip.opendns.com.";

/// Resolver that implements the `myip` convention
pub const OPENDNS_SERVER: &str = "resolver1.opendns.com:53";

/// Receive buffer for UDP replies
const MAX_UDP_RESPONSE: usize = 4096;

/// External IP source backed by the OpenDNS `myip` convention
#[derive(Debug, Clone)]
pub struct OpenDnsIpSource {
    /// `host:port` of the DNS server to ask
    server: String,

    /// Name to query for an A record
    target: String,

    /// Upper bound for the whole exchange
    timeout: Option<Duration>,
}

impl OpenDnsIpSource {
    /// Create a source that asks `resolver1.opendns.com` for `myip.opendns.com`
    pub fn new(timeout: Option<Duration>) -> Self {
        Self::with_server(OPENDNS_SERVER, OPENDNS_TARGET, timeout)
    }

    /// Create a source that asks a different server or name
    ///
    /// # Parameters
    ///
    /// - `server`: `host:port` of the resolver (e.g. "208.67.222.222:53")
    /// - `target`: Name whose A record is the caller's address
    /// - `timeout`: Upper bound for one lookup (`None` waits forever)
    pub fn with_server(
        server: impl Into<String>,
        target: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            server: server.into(),
            target: target.into(),
            timeout,
        }
    }

    /// Build the A query for the target name
    fn build_query(&self) -> Result<Message> {
        let name = Name::from_ascii(&self.target).map_err(|e| {
            Error::invalid_input(format!("Invalid query name {}: {}", self.target, e))
        })?;

        let mut message = Message::new();
        message
            .set_id(rand::random())
            .set_message_type(MessageType::Query)
            .set_op_code(OpCode::Query)
            .set_recursion_desired(true)
            .add_query(Query::query(name, RecordType::A));

        Ok(message)
    }

    /// Resolve the server name, preferring IPv4 so the answer is an IPv4 address
    async fn server_addr(&self) -> Result<SocketAddr> {
        let addrs: Vec<SocketAddr> = tokio::net::lookup_host(self.server.as_str())
            .await
            .map_err(|e| Error::lookup(&self.server, e.to_string()))?
            .collect();

        addrs
            .iter()
            .find(|addr| addr.is_ipv4())
            .or_else(|| addrs.first())
            .copied()
            .ok_or_else(|| Error::lookup(&self.server, "no addresses"))
    }

    async fn query(&self) -> Result<Ipv4Addr> {
        let message = self.build_query()?;
        let query = message
            .to_vec()
            .map_err(|e| Error::dns(format!("Failed to encode query: {}", e)))?;

        let server = self.server_addr().await?;
        tracing::trace!("Asking {} for {}", server, self.target);

        let mut response = parse_reply(&exchange_udp(server, &query).await?)?;
        if response.truncated() {
            tracing::debug!("Truncated UDP reply from {}, retrying over TCP", server);
            response = parse_reply(&exchange_tcp(server, &query).await?)?;
        }

        extract_external_ip(message.id(), &response)
    }
}

#[async_trait]
impl IpSource for OpenDnsIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        with_timeout(self.timeout, self.query()).await
    }

    fn source_name(&self) -> &'static str {
        "opendns"
    }
}

/// Pull the external IP out of a reply to the query with id `query_id`
///
/// Only the first answer counts. Anything but an A record there is an
/// [`Error::UnexpectedRecordType`].
pub fn extract_external_ip(query_id: u16, response: &Message) -> Result<Ipv4Addr> {
    if response.id() != query_id {
        return Err(Error::dns(format!(
            "Reply id {} does not match query id {}",
            response.id(),
            query_id
        )));
    }

    if response.response_code() != ResponseCode::NoError {
        return Err(Error::dns(format!(
            "Server answered {}",
            response.response_code()
        )));
    }

    let first = response.answers().first().ok_or(Error::EmptyAnswer)?;

    match first.data() {
        Some(RData::A(a)) => Ok(a.0),
        Some(other) => Err(Error::unexpected_record(
            RecordType::A.to_string(),
            other.record_type().to_string(),
        )),
        None => Err(Error::unexpected_record(
            RecordType::A.to_string(),
            first.record_type().to_string(),
        )),
    }
}

fn parse_reply(bytes: &[u8]) -> Result<Message> {
    Message::from_vec(bytes).map_err(|e| Error::dns(format!("Malformed reply: {}", e)))
}

async fn exchange_udp(server: SocketAddr, query: &[u8]) -> Result<Vec<u8>> {
    let local: SocketAddr = if server.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };

    let socket = UdpSocket::bind(local).await?;
    socket.connect(server).await?;
    socket.send(query).await?;

    let mut buf = vec![0u8; MAX_UDP_RESPONSE];
    let len = socket.recv(&mut buf).await?;
    buf.truncate(len);
    Ok(buf)
}

/// DNS over TCP: every message is prefixed with its length as a big-endian u16
async fn exchange_tcp(server: SocketAddr, query: &[u8]) -> Result<Vec<u8>> {
    let len = u16::try_from(query.len())
        .map_err(|_| Error::invalid_input("DNS query exceeds 65535 bytes"))?;

    let mut framed = Vec::with_capacity(query.len() + 2);
    framed.extend_from_slice(&len.to_be_bytes());
    framed.extend_from_slice(query);

    let mut stream = TcpStream::connect(server).await?;
    stream.write_all(&framed).await?;

    let mut len_buf = [0u8; 2];
    stream.read_exact(&mut len_buf).await?;

    let mut buf = vec![0u8; u16::from_be_bytes(len_buf) as usize];
    stream.read_exact(&mut buf).await?;
    Ok(buf)
}
