//! Wire format: length-prefixed bincode v2 frames.
//!
//! Each frame is:
//!   [4 bytes big-endian length][bincode v2 payload]

use bincode::{Decode, Encode};

use crate::error::ProtocolError;

/// Maximum frame payload size (64 KiB).
pub const MAX_FRAME_SIZE: u32 = 64 * 1024;

/// Encode a value with its length prefix.
pub fn encode_frame<T: Encode>(value: &T) -> Result<Vec<u8>, ProtocolError> {
    let config = bincode::config::standard();
    let payload = bincode::encode_to_vec(value, config)
        .map_err(|e| ProtocolError::Serialization(e.to_string()))?;

    let len = u32::try_from(payload.len())
        .map_err(|_| ProtocolError::Serialization("frame too large".to_string()))?;
    if len > MAX_FRAME_SIZE {
        return Err(ProtocolError::Serialization(format!(
            "frame size {len} exceeds maximum {MAX_FRAME_SIZE}"
        )));
    }

    let mut buf = Vec::with_capacity(4 + payload.len());
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(&payload);
    Ok(buf)
}

/// Decode one complete frame, length prefix included.
pub fn decode_frame<T: Decode<()>>(bytes: &[u8]) -> Result<T, ProtocolError> {
    if bytes.len() < 4 {
        return Err(ProtocolError::Deserialization(
            "missing length prefix".to_string(),
        ));
    }
    let (prefix, payload) = bytes.split_at(4);
    let len = u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]);
    if len > MAX_FRAME_SIZE {
        return Err(ProtocolError::Deserialization(format!(
            "frame size {len} exceeds maximum {MAX_FRAME_SIZE}"
        )));
    }
    if payload.len() != len as usize {
        return Err(ProtocolError::Deserialization(format!(
            "length prefix says {len} bytes, got {}",
            payload.len()
        )));
    }

    let config = bincode::config::standard();
    let (value, consumed) = bincode::decode_from_slice(payload, config)
        .map_err(|e| ProtocolError::Deserialization(e.to_string()))?;
    if consumed != payload.len() {
        return Err(ProtocolError::Deserialization(format!(
            "{} trailing bytes after frame",
            payload.len() - consumed
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Signal;

    fn denied_signal() -> Signal {
        Signal::new("/org/devstate/signal", "org.devstate.signal", "state_req_denied_ind")
            .arg("shutdown")
            .arg("battery_low")
    }

    #[test]
    fn length_prefix_matches_payload() {
        let bytes = encode_frame(&denied_signal()).unwrap();
        let len = u32::from_be_bytes(bytes[..4].try_into().unwrap());
        assert_eq!(len as usize, bytes.len() - 4);
    }

    #[test]
    fn signal_arguments_survive_the_wire() {
        let bytes = encode_frame(&denied_signal()).unwrap();
        let sig: Signal = decode_frame(&bytes).unwrap();
        assert_eq!(sig.name, "state_req_denied_ind");
        assert_eq!(sig.args, vec!["shutdown", "battery_low"]);
    }

    #[test]
    fn truncated_frame_is_rejected() {
        let bytes = encode_frame(&denied_signal()).unwrap();
        let err = decode_frame::<Signal>(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, ProtocolError::Deserialization(_)));
        assert!(decode_frame::<Signal>(&bytes[..2]).is_err());
    }

    #[test]
    fn oversized_prefix_is_rejected() {
        let mut bytes = (MAX_FRAME_SIZE + 1).to_be_bytes().to_vec();
        bytes.extend_from_slice(&[0; 8]);
        assert!(matches!(
            decode_frame::<Signal>(&bytes),
            Err(ProtocolError::Deserialization(_))
        ));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let signal = denied_signal();
        let mut payload = bincode::encode_to_vec(&signal, bincode::config::standard()).unwrap();
        payload.push(0);
        let mut bytes = u32::try_from(payload.len()).unwrap().to_be_bytes().to_vec();
        bytes.extend_from_slice(&payload);
        assert!(matches!(
            decode_frame::<Signal>(&bytes),
            Err(ProtocolError::Deserialization(_))
        ));
    }
}
