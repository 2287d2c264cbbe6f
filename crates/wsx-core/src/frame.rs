//! Terminal frame codec.
//!
//! One JSON object per socket message. Four frame kinds are exchanged:
//! `input` and `resize` flow client → server, `output` and `error` flow
//! server → client.
//!
//! Wire format:
//!
//! ```json
//! { "type": "input",  "data": "ls\n" }
//! { "type": "output", "data": "file1\n" }
//! { "type": "error",  "data": "container stopped" }
//! { "type": "resize", "cols": 120, "rows": 40 }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{WsxError, WsxResult};

/// A single typed message on the terminal socket.
///
/// `input`/`output`/`error` carry `data`; `resize` carries the geometry.
/// The tagged representation makes the exactly-one-payload invariant a
/// property of the type rather than a runtime check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Frame {
    /// Raw keystroke/paste bytes from the display surface, as text.
    Input { data: String },
    /// Raw shell output bytes, as text.
    Output { data: String },
    /// Human-readable error text from the remote side. Rendered inline,
    /// not treated as a transport failure.
    Error { data: String },
    /// Terminal geometry announcement.
    Resize { cols: u16, rows: u16 },
}

impl Frame {
    /// Serialize into the wire text for one socket message.
    pub fn encode(&self) -> WsxResult<String> {
        serde_json::to_string(self).map_err(|e| WsxError::Codec(e.to_string()))
    }

    /// Parse one socket message.
    ///
    /// Malformed text is a `Codec` error, never a panic; the transport logs
    /// and drops it without tearing down the connection.
    pub fn decode(text: &str) -> WsxResult<Frame> {
        serde_json::from_str(text).map_err(|e| WsxError::Codec(e.to_string()))
    }

    /// Whether the client is allowed to send this frame kind.
    pub fn is_outbound(&self) -> bool {
        matches!(self, Frame::Input { .. } | Frame::Resize { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_all_kinds() {
        let frames = vec![
            Frame::Input {
                data: "ls -la\n".into(),
            },
            Frame::Output {
                data: "total 0\n".into(),
            },
            Frame::Error {
                data: "container stopped".into(),
            },
            Frame::Resize {
                cols: 120,
                rows: 40,
            },
        ];

        for frame in frames {
            let wire = frame.encode().unwrap();
            assert_eq!(Frame::decode(&wire).unwrap(), frame);
        }
    }

    #[test]
    fn decodes_wire_literals() {
        let frame = Frame::decode(r#"{"type":"output","data":"file1\n"}"#).unwrap();
        assert_eq!(
            frame,
            Frame::Output {
                data: "file1\n".into()
            }
        );

        let frame = Frame::decode(r#"{"type":"resize","cols":80,"rows":24}"#).unwrap();
        assert_eq!(frame, Frame::Resize { cols: 80, rows: 24 });
    }

    #[test]
    fn input_tag_is_lowercase() {
        let wire = Frame::Input { data: "q".into() }.encode().unwrap();
        assert!(wire.contains(r#""type":"input""#));
    }

    #[test]
    fn non_json_is_an_error_not_a_panic() {
        assert!(matches!(
            Frame::decode("not json at all"),
            Err(WsxError::Codec(_))
        ));
    }

    #[test]
    fn missing_required_field_is_an_error() {
        // resize without geometry
        assert!(Frame::decode(r#"{"type":"resize"}"#).is_err());
        // input without data
        assert!(Frame::decode(r#"{"type":"input"}"#).is_err());
    }

    #[test]
    fn unknown_kind_is_an_error() {
        assert!(Frame::decode(r#"{"type":"ack","data":"ok"}"#).is_err());
    }

    #[test]
    fn directionality() {
        assert!(Frame::Input { data: "x".into() }.is_outbound());
        assert!(Frame::Resize { cols: 1, rows: 1 }.is_outbound());
        assert!(!Frame::Output { data: "x".into() }.is_outbound());
        assert!(!Frame::Error { data: "x".into() }.is_outbound());
    }
}
