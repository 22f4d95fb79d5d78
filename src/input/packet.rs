//! Engine.IO v4 / Socket.IO v5 text frame codec
//!
//! Engine frames are a single type digit followed by the payload. Socket.IO
//! packets ride inside engine `message` frames as
//! `<type>[/<namespace>,][<ack id>][<json>]`.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PacketError {
    #[error("Empty packet")]
    Empty,

    #[error("Unknown packet type: {0:?}")]
    UnknownType(char),

    #[error("Invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    #[error("Binary packets are not supported")]
    Unsupported,
}

/// Handshake data sent by the server in the open packet
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenInfo {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    pub ping_interval: u64,
    pub ping_timeout: u64,
    #[serde(default)]
    pub max_payload: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(OpenInfo),
    Close,
    Ping(String),
    Pong(String),
    Message(String),
    Upgrade,
    Noop,
}

impl EnginePacket {
    pub fn decode(frame: &str) -> Result<Self, PacketError> {
        let mut chars = frame.chars();
        let kind = chars.next().ok_or(PacketError::Empty)?;
        let body = chars.as_str();

        Ok(match kind {
            '0' => EnginePacket::Open(serde_json::from_str(body)?),
            '1' => EnginePacket::Close,
            '2' => EnginePacket::Ping(body.to_string()),
            '3' => EnginePacket::Pong(body.to_string()),
            '4' => EnginePacket::Message(body.to_string()),
            '5' => EnginePacket::Upgrade,
            '6' => EnginePacket::Noop,
            other => return Err(PacketError::UnknownType(other)),
        })
    }

    /// Encode a client-originated frame
    pub fn encode(&self) -> String {
        match self {
            EnginePacket::Open(_) => "0".to_string(),
            EnginePacket::Close => "1".to_string(),
            EnginePacket::Ping(data) => format!("2{}", data),
            EnginePacket::Pong(data) => format!("3{}", data),
            EnginePacket::Message(data) => format!("4{}", data),
            EnginePacket::Upgrade => "5".to_string(),
            EnginePacket::Noop => "6".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect { namespace: String, data: Option<Value> },
    Disconnect { namespace: String },
    Event { namespace: String, name: String, data: Value, ack_id: Option<u64> },
    Ack { namespace: String, ack_id: Option<u64> },
    ConnectError { namespace: String, message: String },
}

impl SocketPacket {
    /// Decode the payload of an engine `message` frame
    pub fn decode(input: &str) -> Result<Self, PacketError> {
        let mut chars = input.chars();
        let kind = chars.next().ok_or(PacketError::Empty)?;
        if kind == '5' || kind == '6' {
            return Err(PacketError::Unsupported);
        }
        let mut rest = chars.as_str();

        let namespace = if rest.starts_with('/') {
            match rest.find(',') {
                Some(end) => {
                    let ns = &rest[..end];
                    rest = &rest[end + 1..];
                    ns.to_string()
                }
                None => {
                    let ns = rest;
                    rest = "";
                    ns.to_string()
                }
            }
        } else {
            "/".to_string()
        };

        let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        let ack_id: Option<u64> = if digits > 0 {
            rest[..digits].parse().ok()
        } else {
            None
        };
        rest = &rest[digits..];

        let payload = if rest.is_empty() {
            None
        } else {
            Some(serde_json::from_str::<Value>(rest)?)
        };

        Ok(match kind {
            '0' => SocketPacket::Connect { namespace, data: payload },
            '1' => SocketPacket::Disconnect { namespace },
            '2' => {
                let (name, data) = split_event(payload)?;
                SocketPacket::Event { namespace, name, data, ack_id }
            }
            '3' => SocketPacket::Ack { namespace, ack_id },
            '4' => {
                let message = payload
                    .as_ref()
                    .and_then(|p| p.get("message").and_then(Value::as_str).or_else(|| p.as_str()))
                    .unwrap_or("connection refused")
                    .to_string();
                SocketPacket::ConnectError { namespace, message }
            }
            other => return Err(PacketError::UnknownType(other)),
        })
    }

    /// Encode as the payload of an engine `message` frame
    pub fn encode(&self) -> String {
        match self {
            SocketPacket::Connect { namespace, data } => {
                let mut out = format!("0{}", namespace_prefix(namespace));
                if let Some(data) = data {
                    out.push_str(&data.to_string());
                }
                out
            }
            SocketPacket::Disconnect { namespace } => format!("1{}", namespace_prefix(namespace)),
            SocketPacket::Event { namespace, name, data, ack_id } => format!(
                "2{}{}{}",
                namespace_prefix(namespace),
                ack_id.map(|id| id.to_string()).unwrap_or_default(),
                Value::Array(vec![Value::String(name.clone()), data.clone()])
            ),
            SocketPacket::Ack { namespace, ack_id } => format!(
                "3{}{}[]",
                namespace_prefix(namespace),
                ack_id.map(|id| id.to_string()).unwrap_or_default()
            ),
            SocketPacket::ConnectError { namespace, message } => format!(
                "4{}{}",
                namespace_prefix(namespace),
                serde_json::json!({ "message": message })
            ),
        }
    }

    /// Wrap into a full engine frame
    pub fn to_frame(&self) -> String {
        EnginePacket::Message(self.encode()).encode()
    }

    pub fn namespace(&self) -> &str {
        match self {
            SocketPacket::Connect { namespace, .. }
            | SocketPacket::Disconnect { namespace }
            | SocketPacket::Event { namespace, .. }
            | SocketPacket::Ack { namespace, .. }
            | SocketPacket::ConnectError { namespace, .. } => namespace,
        }
    }
}

fn namespace_prefix(namespace: &str) -> String {
    if namespace.is_empty() || namespace == "/" {
        String::new()
    } else {
        format!("{},", namespace)
    }
}

/// Split an event array `["name", data, ...]` into name and first argument
pub fn split_event(payload: Option<Value>) -> Result<(String, Value), PacketError> {
    let mut items = match payload {
        Some(Value::Array(items)) => items.into_iter(),
        other => {
            return Err(PacketError::MalformedEvent(format!(
                "expected array, got {}",
                other.map(|v| v.to_string()).unwrap_or_else(|| "nothing".to_string())
            )))
        }
    };
    let name = match items.next() {
        Some(Value::String(name)) => name,
        _ => return Err(PacketError::MalformedEvent("missing event name".to_string())),
    };
    Ok((name, items.next().unwrap_or(Value::Null)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_open() {
        let frame = r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;
        match EnginePacket::decode(frame).unwrap() {
            EnginePacket::Open(info) => {
                assert_eq!(info.sid, "abc");
                assert_eq!(info.ping_interval, 25000);
                assert_eq!(info.ping_timeout, 20000);
                assert_eq!(info.max_payload, Some(1000000));
            }
            other => panic!("unexpected packet {:?}", other),
        }
    }

    #[test]
    fn test_ping_pong() {
        assert_eq!(EnginePacket::decode("2").unwrap(), EnginePacket::Ping(String::new()));
        assert_eq!(EnginePacket::decode("2probe").unwrap(), EnginePacket::Ping("probe".to_string()));
        assert_eq!(EnginePacket::Pong(String::new()).encode(), "3");
    }

    #[test]
    fn test_unknown_and_empty() {
        assert!(matches!(EnginePacket::decode(""), Err(PacketError::Empty)));
        assert!(matches!(EnginePacket::decode("9"), Err(PacketError::UnknownType('9'))));
    }

    #[test]
    fn test_decode_event() {
        let packet = SocketPacket::decode(r#"2["new_detection",{"traffic_type":"DNS"}]"#).unwrap();
        assert_eq!(
            packet,
            SocketPacket::Event {
                namespace: "/".to_string(),
                name: "new_detection".to_string(),
                data: json!({"traffic_type": "DNS"}),
                ack_id: None,
            }
        );
    }

    #[test]
    fn test_decode_event_with_namespace_and_ack() {
        let packet = SocketPacket::decode(r#"2/sensors,12["status_update",{}]"#).unwrap();
        match packet {
            SocketPacket::Event { namespace, name, ack_id, .. } => {
                assert_eq!(namespace, "/sensors");
                assert_eq!(name, "status_update");
                assert_eq!(ack_id, Some(12));
            }
            other => panic!("unexpected packet {:?}", other),
        }
    }

    #[test]
    fn test_event_without_data() {
        let packet = SocketPacket::decode(r#"2["ping_me"]"#).unwrap();
        assert!(matches!(packet, SocketPacket::Event { data: Value::Null, .. }));
    }

    #[test]
    fn test_malformed_event() {
        assert!(matches!(
            SocketPacket::decode(r#"2{"a":1}"#),
            Err(PacketError::MalformedEvent(_))
        ));
        assert!(matches!(SocketPacket::decode("2[1,2]"), Err(PacketError::MalformedEvent(_))));
    }

    #[test]
    fn test_connect_packets() {
        let connect = SocketPacket::Connect { namespace: "/".to_string(), data: None };
        assert_eq!(connect.to_frame(), "40");

        let connect = SocketPacket::Connect { namespace: "/admin".to_string(), data: None };
        assert_eq!(connect.to_frame(), "40/admin,");

        let ack = SocketPacket::decode(r#"0{"sid":"xyz"}"#).unwrap();
        assert_eq!(ack.namespace(), "/");
        assert!(matches!(ack, SocketPacket::Connect { data: Some(_), .. }));
    }

    #[test]
    fn test_connect_error_message() {
        let packet = SocketPacket::decode(r#"4{"message":"Not authorized"}"#).unwrap();
        assert_eq!(
            packet,
            SocketPacket::ConnectError {
                namespace: "/".to_string(),
                message: "Not authorized".to_string()
            }
        );
    }

    #[test]
    fn test_binary_unsupported() {
        assert!(matches!(SocketPacket::decode("51-[\"x\"]"), Err(PacketError::Unsupported)));
    }

    #[test]
    fn test_event_encode_decodes_back() {
        let event = SocketPacket::Event {
            namespace: "/".to_string(),
            name: "status_update".to_string(),
            data: json!({"total_checks": 3}),
            ack_id: None,
        };
        let frame = event.to_frame();
        assert!(frame.starts_with("42[\"status_update\""));

        match EnginePacket::decode(&frame).unwrap() {
            EnginePacket::Message(body) => assert_eq!(SocketPacket::decode(&body).unwrap(), event),
            other => panic!("unexpected packet {:?}", other),
        }
    }
}
