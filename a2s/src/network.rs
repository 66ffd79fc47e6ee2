//! UDP transport for A2S_INFO queries

use crate::packet::{info_request, parse_response, QueryError, Response};
use log::debug;
use shared::ServerInfo;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{lookup_host, UdpSocket};
use tokio::time::{timeout, Instant};

/// Smallest receive buffer we allocate, whatever the configuration says.
const MIN_BUFFER_SIZE: u16 = 64;

/// Queries game servers for their `A2S_INFO` record.
///
/// The client is stateless; every query opens its own socket so queries to
/// different servers can run concurrently without sharing a receive loop.
#[derive(Debug, Clone)]
pub struct A2sClient {
    max_challenges: usize,
}

impl Default for A2sClient {
    fn default() -> Self {
        Self::new()
    }
}

impl A2sClient {
    pub fn new() -> Self {
        Self { max_challenges: 3 }
    }

    /// Sends `A2S_INFO` to `address` (`host:port`) and decodes the reply.
    ///
    /// `query_timeout` bounds the whole exchange including name resolution
    /// and the challenge handshake. `buffer_size` is the receive buffer, a
    /// reply that does not fit is reported as malformed.
    pub async fn query_info(
        &self,
        address: &str,
        query_timeout: Duration,
        buffer_size: u16,
    ) -> Result<ServerInfo, QueryError> {
        let started = Instant::now();

        match timeout(query_timeout, self.exchange(address, buffer_size)).await {
            Ok(Ok(mut info)) => {
                info.ping = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                Ok(info)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(QueryError::Timeout(query_timeout)),
        }
    }

    async fn exchange(&self, address: &str, buffer_size: u16) -> Result<ServerInfo, QueryError> {
        let server_addr = resolve(address).await?;
        let bind_addr = if server_addr.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };

        let socket = UdpSocket::bind(bind_addr).await?;
        socket.connect(server_addr).await?;

        // One spare byte tells a reply that filled the buffer from one that was cut off
        let limit = usize::from(buffer_size.max(MIN_BUFFER_SIZE));
        let mut buffer = vec![0u8; limit + 1];
        let mut challenge = None;

        for _ in 0..=self.max_challenges {
            socket.send(&info_request(challenge)).await?;
            let len = socket.recv(&mut buffer).await?;
            if len > limit {
                return Err(QueryError::Malformed(format!(
                    "reply larger than the {} byte receive buffer",
                    limit
                )));
            }

            match parse_response(&buffer[..len])? {
                Response::Info(info) => return Ok(info),
                Response::Challenge(next) => {
                    debug!("{} answered with challenge {:02x?}", server_addr, next);
                    challenge = Some(next);
                }
            }
        }

        Err(QueryError::ChallengeLoop(self.max_challenges + 1))
    }
}

async fn resolve(address: &str) -> Result<SocketAddr, QueryError> {
    if let Ok(addr) = address.parse::<SocketAddr>() {
        return Ok(addr);
    }

    lookup_host(address)
        .await
        .map_err(|_| QueryError::Address(address.to_string()))?
        .next()
        .ok_or_else(|| QueryError::Address(address.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::fixture::{challenge_datagram, info_datagram};

    fn sample_info() -> ServerInfo {
        ServerInfo {
            name: "Test Server".to_string(),
            map: "chernarusplus".to_string(),
            players: 5,
            max_players: 32,
            server_type: 'd',
            environment: 'l',
            ..Default::default()
        }
    }

    /// Answers the first request with a challenge and the second with info,
    /// checking that the challenge was echoed back.
    async fn spawn_fake_server(info: ServerInfo) -> SocketAddr {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();

        tokio::spawn(async move {
            let mut buf = [0u8; 1400];
            let challenge = [0xAA, 0xBB, 0xCC, 0xDD];

            let (_, peer) = socket.recv_from(&mut buf).await.unwrap();
            socket.send_to(&challenge_datagram(challenge), peer).await.unwrap();

            let (len, peer) = socket.recv_from(&mut buf).await.unwrap();
            assert_eq!(&buf[len - 4..len], &challenge);
            socket.send_to(&info_datagram(&info), peer).await.unwrap();
        });

        addr
    }

    #[tokio::test]
    async fn test_query_with_challenge() {
        let addr = spawn_fake_server(sample_info()).await;

        let info = A2sClient::new()
            .query_info(&addr.to_string(), Duration::from_secs(2), 1400)
            .await
            .unwrap();

        assert_eq!(info.name, "Test Server");
        assert_eq!(info.players, 5);
        assert_eq!(info.max_players, 32);
    }

    #[tokio::test]
    async fn test_oversized_reply_is_malformed() {
        let info = ServerInfo {
            name: "x".repeat(200),
            ..sample_info()
        };
        let addr = spawn_fake_server(info).await;

        let result = A2sClient::new()
            .query_info(&addr.to_string(), Duration::from_secs(2), 100)
            .await;

        assert!(matches!(result, Err(QueryError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_reply_filling_buffer_is_accepted() {
        let info = sample_info();
        let size = u16::try_from(info_datagram(&info).len()).unwrap().max(MIN_BUFFER_SIZE);
        let addr = spawn_fake_server(info).await;

        let info = A2sClient::new()
            .query_info(&addr.to_string(), Duration::from_secs(2), size)
            .await
            .unwrap();

        assert_eq!(info.name, "Test Server");
    }

    #[tokio::test]
    async fn test_query_timeout() {
        // Bound but never answers
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = silent.local_addr().unwrap();

        let result = A2sClient::new()
            .query_info(&addr.to_string(), Duration::from_millis(100), 1400)
            .await;

        assert!(matches!(result, Err(QueryError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_query_invalid_address() {
        let result = A2sClient::new()
            .query_info("not an address", Duration::from_secs(1), 1400)
            .await;

        assert!(matches!(result, Err(QueryError::Address(_))));
    }

    #[tokio::test]
    async fn test_challenge_loop_gives_up() {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();

        tokio::spawn(async move {
            let mut buf = [0u8; 1400];
            while let Ok((_, peer)) = socket.recv_from(&mut buf).await {
                let _ = socket.send_to(&challenge_datagram([1, 2, 3, 4]), peer).await;
            }
        });

        let result = A2sClient::new()
            .query_info(&addr.to_string(), Duration::from_secs(2), 1400)
            .await;

        assert!(matches!(result, Err(QueryError::ChallengeLoop(4))));
    }
}
