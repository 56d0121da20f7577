//! OSC 1.0 message encoding.
//!
//! ```text
//! address  : OSC-string   ("/foo\0\0\0\0")
//! typetags : OSC-string   (",ifsT\0\0\0")
//! payload  : f → 4 bytes BE IEEE-754, i → 4 bytes BE two's complement,
//!            s → OSC-string, T/F → no bytes
//! ```
//!
//! An OSC-string is the UTF-8 bytes, one NUL terminator, then NUL padding to
//! the next multiple of four.

use super::packet::{OscArg, Packet};

/// Encode a packet as one OSC message datagram.
pub fn encode(packet: &Packet) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_len(packet));

    push_osc_string(&mut out, packet.address());

    let mut tags = String::with_capacity(packet.args().len() + 1);
    tags.push(',');
    tags.extend(packet.args().iter().map(OscArg::type_tag));
    push_osc_string(&mut out, &tags);

    for arg in packet.args() {
        match arg {
            OscArg::Float(v) => out.extend_from_slice(&v.to_be_bytes()),
            OscArg::Int(v) => out.extend_from_slice(&v.to_be_bytes()),
            OscArg::String(s) => push_osc_string(&mut out, s),
            OscArg::Bool(_) => {}
        }
    }

    out
}

fn padded_len(raw: usize) -> usize {
    // +1 for the mandatory terminator.
    (raw + 1 + 3) & !3
}

fn encoded_len(packet: &Packet) -> usize {
    let mut len = padded_len(packet.address().len()) + padded_len(packet.args().len() + 1);
    for arg in packet.args() {
        len += match arg {
            OscArg::Float(_) | OscArg::Int(_) => 4,
            OscArg::String(s) => padded_len(s.len()),
            OscArg::Bool(_) => 0,
        };
    }
    len
}

fn push_osc_string(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(s.as_bytes());
    let pad = padded_len(s.len()) - s.len();
    out.extend(std::iter::repeat(0u8).take(pad));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(address: &str, args: Vec<OscArg>) -> Packet {
        Packet::new(address, "127.0.0.1", 9000, args).expect("valid packet")
    }

    #[test]
    fn encodes_int_and_string_arguments() {
        let bytes = encode(&packet(
            "/foo",
            vec![OscArg::Int(1), OscArg::String("bar".into())],
        ));

        let expected: Vec<u8> = [
            b"/foo\0\0\0\0".as_slice(),
            b",is\0".as_slice(),
            [0u8, 0, 0, 1].as_slice(),
            b"bar\0".as_slice(),
        ]
        .concat();
        assert_eq!(bytes, expected);
    }

    #[test]
    fn booleans_are_tags_without_payload() {
        let bytes = encode(&packet(
            "/chatbox/typing",
            vec![OscArg::Bool(true), OscArg::Bool(false)],
        ));

        // "/chatbox/typing" is 15 bytes → 16 with terminator.
        assert_eq!(&bytes[..16], b"/chatbox/typing\0");
        assert_eq!(&bytes[16..], b",TF\0");
    }

    #[test]
    fn float_is_big_endian_ieee754() {
        let bytes = encode(&packet("/f", vec![OscArg::Float(1.0)]));
        assert_eq!(&bytes[..4], b"/f\0\0");
        assert_eq!(&bytes[4..8], b",f\0\0");
        assert_eq!(&bytes[8..], &[0x3f, 0x80, 0x00, 0x00]);
    }

    #[test]
    fn string_of_exact_word_length_gets_full_padding_word() {
        let bytes = encode(&packet("/s", vec![OscArg::String("abcd".into())]));
        assert_eq!(&bytes[8..], b"abcd\0\0\0\0");
        assert_eq!(bytes.len() % 4, 0);
    }

    #[test]
    fn negative_int_is_twos_complement() {
        let bytes = encode(&packet("/i", vec![OscArg::Int(-2)]));
        assert_eq!(&bytes[8..], &[0xff, 0xff, 0xff, 0xfe]);
    }

    #[test]
    fn capacity_estimate_matches_output() {
        let p = packet(
            "/avatar/parameters/Mood",
            vec![
                OscArg::Float(0.5),
                OscArg::String("héllo".into()),
                OscArg::Bool(true),
                OscArg::Int(7),
            ],
        );
        assert_eq!(encode(&p).len(), encoded_len(&p));
    }
}
