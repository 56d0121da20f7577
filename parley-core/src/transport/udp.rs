//! `UdpTransport`: one OSC message per UDP datagram.

use std::net::UdpSocket;

use tracing::{debug, info};

use crate::error::{ParleyError, Result};
use crate::osc::{codec, OscArg, Packet};
use crate::transport::Transport;

/// Where the typing indicator lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingTarget {
    pub host: String,
    pub port: u16,
    pub address: String,
}

impl Default for TypingTarget {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 9000,
            address: "/chatbox/typing".into(),
        }
    }
}

pub struct UdpTransport {
    socket: UdpSocket,
    typing: TypingTarget,
}

impl UdpTransport {
    /// Bind an ephemeral local socket.
    pub fn bind(typing: TypingTarget) -> Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", 0))?;
        info!(local = ?socket.local_addr().ok(), "udp transport bound");
        Ok(Self { socket, typing })
    }
}

impl Transport for UdpTransport {
    fn send(&self, packet: &Packet) -> Result<()> {
        let datagram = codec::encode(packet);
        let written = self
            .socket
            .send_to(&datagram, (packet.host(), packet.port()))
            .map_err(|e| ParleyError::Transport(format!("{}: {e}", packet.address())))?;
        if written != datagram.len() {
            return Err(ParleyError::Transport(format!(
                "short write for {}: {written}/{} bytes",
                packet.address(),
                datagram.len()
            )));
        }
        debug!(packet = %packet, bytes = written, "datagram sent");
        Ok(())
    }

    fn set_typing(&self, typing: bool) -> Result<()> {
        let packet = Packet::new(
            self.typing.address.clone(),
            self.typing.host.clone(),
            self.typing.port,
            vec![OscArg::Bool(typing)],
        )?;
        self.send(&packet)
    }
}
