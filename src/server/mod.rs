/*!
Socket front end: a shared UDP socket drained by `--thread` worker
tasks, plus a TCP accept loop with the 2-octet length framing of
RFC 1035 section 4.2.2. The responder and zone are read-only behind an
`Arc`; a failing connection or worker logs and dies alone, the server
keeps running.
 */

pub mod responder;

pub use self::responder::{Responder, ZoneStore};

use crate::errors::DnsError;
use bytes::{BufMut, BytesMut};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tracing::{debug, info, warn};

/// Largest datagram we ever accept; TCP messages are bounded by the
/// 16-bit length prefix anyway.
const MAX_MESSAGE_SIZE: usize = 65535;

pub struct NameServer {
    bind: String,
    port: u16,
    workers: u16,
    responder: Arc<Responder>,
}

impl NameServer {
    pub fn new(bind: &str, port: u16, workers: u16, responder: Responder) -> Self {
        NameServer {
            bind: bind.to_string(),
            port,
            workers: workers.max(1),
            responder: Arc::new(responder),
        }
    }

    /// Binds UDP and TCP and serves until the process dies.
    pub async fn serve(&self) -> Result<(), DnsError> {
        let addr = format!("{}:{}", self.bind, self.port);
        let udp = Arc::new(UdpSocket::bind(&addr).await?);
        let tcp = TcpListener::bind(&addr).await?;
        info!(
            "listening on {} (udp workers: {}, tcp)",
            addr, self.workers
        );

        let mut tasks = Vec::new();
        for worker in 0..self.workers {
            let socket = udp.clone();
            let responder = self.responder.clone();
            tasks.push(tokio::spawn(async move {
                udp_loop(worker, socket, responder).await;
            }));
        }
        let responder = self.responder.clone();
        tasks.push(tokio::spawn(async move {
            tcp_loop(tcp, responder).await;
        }));

        for task in tasks {
            let _ = task.await;
        }
        Ok(())
    }
}

async fn udp_loop(worker: u16, socket: Arc<UdpSocket>, responder: Arc<Responder>) {
    let mut buf = BytesMut::zeroed(MAX_MESSAGE_SIZE);
    loop {
        match socket.recv_from(&mut buf).await {
            Ok((len, peer)) => {
                debug!("udp worker {}: {} octets from {}", worker, len, peer);
                let Some(response) = responder.handle(&buf[..len], false) else {
                    debug!("dropped unanswerable datagram from {}", peer);
                    continue;
                };
                if let Err(e) = socket.send_to(&response, peer).await {
                    warn!("udp send to {} failed: {}", peer, e);
                }
            }
            // transient receive faults (ICMP backpressure and friends)
            // must not kill the worker
            Err(e) => warn!("udp worker {} receive failed: {}", worker, e),
        }
    }
}

async fn tcp_loop(listener: TcpListener, responder: Arc<Responder>) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                let responder = responder.clone();
                tokio::spawn(async move {
                    if let Err(e) = serve_tcp_connection(stream, responder).await {
                        debug!("tcp connection from {} ended: {}", peer, e);
                    }
                });
            }
            Err(e) => warn!("tcp accept failed: {}", e),
        }
    }
}

/// Serves length-framed queries on one connection until the client
/// closes it.
async fn serve_tcp_connection(
    mut stream: TcpStream,
    responder: Arc<Responder>,
) -> Result<(), DnsError> {
    loop {
        let mut length = [0u8; 2];
        match stream.read_exact(&mut length).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(e) => return Err(e.into()),
        }
        let len = u16::from_be_bytes(length) as usize;
        let mut buf = vec![0u8; len];
        stream.read_exact(&mut buf).await?;

        let Some(response) = responder.handle(&buf, true) else {
            continue;
        };
        let mut framed = BytesMut::with_capacity(2 + response.len());
        framed.put_u16(response.len() as u16);
        framed.put_slice(&response);
        stream.write_all(&framed).await?;
        stream.flush().await?;
    }
}
