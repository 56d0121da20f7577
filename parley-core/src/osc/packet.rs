//! Validated outbound OSC message.

use std::fmt;

use crate::error::{ParleyError, Result};

/// One typed OSC argument.
#[derive(Debug, Clone, PartialEq)]
pub enum OscArg {
    Float(f32),
    Int(i32),
    String(String),
    Bool(bool),
}

impl OscArg {
    /// OSC 1.0 type tag character for this argument.
    pub fn type_tag(&self) -> char {
        match self {
            OscArg::Float(_) => 'f',
            OscArg::Int(_) => 'i',
            OscArg::String(_) => 's',
            OscArg::Bool(true) => 'T',
            OscArg::Bool(false) => 'F',
        }
    }
}

impl fmt::Display for OscArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OscArg::Float(v) => write!(f, "{v}"),
            OscArg::Int(v) => write!(f, "{v}"),
            OscArg::String(v) => write!(f, "{v:?}"),
            OscArg::Bool(v) => write!(f, "{v}"),
        }
    }
}

/// An immutable, validated OSC message plus its destination.
///
/// The only way to obtain a `Packet` is [`Packet::new`], so every packet that
/// reaches a [`Transport`](crate::transport::Transport) already satisfies:
/// - address is non-empty and starts with `/`
/// - host is non-empty
/// - port is in `1..=65535`
/// - at least one argument
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    address: String,
    host: String,
    port: u16,
    args: Vec<OscArg>,
}

impl Packet {
    pub fn new(
        address: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        args: Vec<OscArg>,
    ) -> Result<Self> {
        let address = address.into();
        let host = host.into();

        if address.is_empty() || !address.starts_with('/') {
            return Err(ParleyError::InvalidAddress(address));
        }
        if host.trim().is_empty() {
            return Err(ParleyError::InvalidHost(host));
        }
        if port == 0 {
            return Err(ParleyError::InvalidPort(port.to_string()));
        }
        if args.is_empty() {
            return Err(ParleyError::NoArguments { address });
        }

        Ok(Self {
            address,
            host,
            port,
            args,
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn args(&self) -> &[OscArg] {
        &self.args
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}:{} [", self.address, self.host, self.port)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_packet_keeps_fields() {
        let p = Packet::new(
            "/avatar/parameters/Wave",
            "127.0.0.1",
            9000,
            vec![OscArg::Bool(true), OscArg::Int(3)],
        )
        .expect("valid packet");

        assert_eq!(p.address(), "/avatar/parameters/Wave");
        assert_eq!(p.host(), "127.0.0.1");
        assert_eq!(p.port(), 9000);
        assert_eq!(p.args(), &[OscArg::Bool(true), OscArg::Int(3)]);
    }

    #[test]
    fn rejects_address_without_leading_slash() {
        let err = Packet::new("chatbox/input", "127.0.0.1", 9000, vec![OscArg::Int(1)]);
        assert!(matches!(err, Err(ParleyError::InvalidAddress(_))));

        let err = Packet::new("", "127.0.0.1", 9000, vec![OscArg::Int(1)]);
        assert!(matches!(err, Err(ParleyError::InvalidAddress(_))));
    }

    #[test]
    fn rejects_zero_port_and_empty_host() {
        let err = Packet::new("/a", "127.0.0.1", 0, vec![OscArg::Int(1)]);
        assert!(matches!(err, Err(ParleyError::InvalidPort(_))));

        let err = Packet::new("/a", "  ", 9000, vec![OscArg::Int(1)]);
        assert!(matches!(err, Err(ParleyError::InvalidHost(_))));
    }

    #[test]
    fn rejects_empty_argument_list() {
        let err = Packet::new("/a", "127.0.0.1", 9000, vec![]);
        match err {
            Err(ParleyError::NoArguments { address }) => assert_eq!(address, "/a"),
            other => panic!("expected NoArguments, got {other:?}"),
        }
    }

    #[test]
    fn bool_type_tags_encode_value() {
        assert_eq!(OscArg::Bool(true).type_tag(), 'T');
        assert_eq!(OscArg::Bool(false).type_tag(), 'F');
        assert_eq!(OscArg::String("x".into()).type_tag(), 's');
    }

    #[test]
    fn display_lists_arguments_in_order() {
        let p = Packet::new(
            "/foo",
            "10.0.0.2",
            9001,
            vec![OscArg::Int(1), OscArg::String("bar".into())],
        )
        .expect("valid packet");
        assert_eq!(p.to_string(), "/foo -> 10.0.0.2:9001 [1, \"bar\"]");
    }
}
