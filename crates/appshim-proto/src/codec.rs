//! CBOR encoding of routed messages.
//!
//! A routed message is a single CBOR map. The `msgType` entry selects the
//! shape; the remaining entries are the shape's fields. Decoding inspects
//! `msgType` before committing to a shape, so a message with an unknown tag
//! is never parsed beyond its top-level map and is kept as the exact input
//! bytes. A known tag whose fields do not fit its shape is kept the same way.

use bytes::Bytes;
use ciborium::Value;
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    ContextChange, FocusStack, GenericKind, GenericMessage, OpaqueMessage, ProtocolError, Result,
    RoutedMessage,
};

/// Map key carrying the message tag.
pub const MSG_TYPE: &str = "msgType";

impl RoutedMessage {
    /// Decode a message from its CBOR encoding.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let value: Value =
            ciborium::de::from_reader(bytes).map_err(|e| ProtocolError::Decode(e.to_string()))?;
        let Value::Map(entries) = value else {
            return Err(ProtocolError::NotAMap);
        };

        let Some(tag) = find_tag(&entries) else {
            return Ok(Self::Other(OpaqueMessage::new(None, Bytes::copy_from_slice(bytes))));
        };

        let typed = match tag.as_str() {
            ContextChange::TAG => body(entries).ok().map(Self::ContextChange),
            FocusStack::TAG => body(entries).ok().map(Self::FocusStack),
            other => GenericKind::from_tag(other).and_then(|kind| {
                let msg: GenericMessage = body(entries).ok()?;
                Some(Self::Generic(GenericMessage { kind, ..msg }))
            }),
        };

        // Unknown tags, and known tags in an unexpected shape, stay untouched.
        Ok(typed.unwrap_or_else(|| {
            Self::Other(OpaqueMessage::new(Some(tag), Bytes::copy_from_slice(bytes)))
        }))
    }

    /// Encode the message. [`RoutedMessage::Other`] returns its original
    /// bytes unchanged.
    pub fn encode(&self) -> Result<Bytes> {
        match self {
            Self::ContextChange(msg) => encode_tagged(ContextChange::TAG, msg),
            Self::FocusStack(msg) => encode_tagged(FocusStack::TAG, msg),
            Self::Generic(msg) => encode_tagged(msg.kind.tag(), msg),
            Self::Other(opaque) => Ok(opaque.raw().clone()),
        }
    }
}

fn find_tag(entries: &[(Value, Value)]) -> Option<String> {
    entries.iter().find_map(|(key, value)| match (key, value) {
        (Value::Text(key), Value::Text(tag)) if key == MSG_TYPE => Some(tag.clone()),
        _ => None,
    })
}

fn body<T: DeserializeOwned>(entries: Vec<(Value, Value)>) -> Result<T> {
    let fields = entries
        .into_iter()
        .filter(|(key, _)| !matches!(key, Value::Text(key) if key == MSG_TYPE))
        .collect();

    Value::Map(fields).deserialized().map_err(|e| ProtocolError::Decode(e.to_string()))
}

fn encode_tagged<T: Serialize>(tag: &str, body: &T) -> Result<Bytes> {
    let value = Value::serialized(body).map_err(|e| ProtocolError::Encode(e.to_string()))?;
    let Value::Map(mut entries) = value else {
        return Err(ProtocolError::Encode("message body is not a map".to_string()));
    };
    entries.insert(0, (Value::Text(MSG_TYPE.to_string()), Value::Text(tag.to_string())));

    let mut out = Vec::new();
    ciborium::ser::into_writer(&Value::Map(entries), &mut out)
        .map_err(|e| ProtocolError::Encode(e.to_string()))?;
    Ok(Bytes::from(out))
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;
    use crate::FocusEntry;

    fn encode_value(value: &Value) -> Vec<u8> {
        let mut out = Vec::new();
        ciborium::ser::into_writer(value, &mut out).unwrap();
        out
    }

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    #[test]
    fn unknown_tag_keeps_exact_bytes() {
        // {"msgType": "vcEvt", "data": 7}
        let input = hex!("a2 67 6d736754797065 65 7663457674 64 64617461 07");

        let msg = RoutedMessage::decode(&input).unwrap();
        assert_eq!(msg.msg_type(), Some("vcEvt"));
        assert!(matches!(msg, RoutedMessage::Other(_)));
        assert_eq!(msg.encode().unwrap().as_ref(), &input[..]);
    }

    #[test]
    fn missing_tag_is_opaque() {
        // {"data": 7}
        let input = hex!("a1 64 64617461 07");

        let msg = RoutedMessage::decode(&input).unwrap();
        assert_eq!(msg.msg_type(), None);
        assert_eq!(msg.encode().unwrap().as_ref(), &input[..]);
    }

    #[test]
    fn decodes_context_change_with_extra_fields() {
        let input = encode_value(&Value::Map(vec![
            (text("msgType"), text("ctxtChg")),
            (text("uiaId"), text("vdt")),
            (text("ctxtId"), text("DriveChartDetails")),
            (text("params"), Value::Integer(3.into())),
        ]));

        let RoutedMessage::ContextChange(msg) = RoutedMessage::decode(&input).unwrap() else {
            panic!("expected context change");
        };
        assert_eq!(msg.uia_id, "vdt");
        assert_eq!(msg.ctxt_id, "DriveChartDetails");
        assert_eq!(msg.extra.get("params"), Some(&Value::Integer(3.into())));
        assert!(!msg.extra.contains_key("msgType"));
    }

    #[test]
    fn decodes_focus_stack_entries_in_order() {
        let entry = |id: &str| Value::Map(vec![(text("id"), text(id))]);
        let input = encode_value(&Value::Map(vec![
            (text("msgType"), text("focusStack")),
            (text("appIdList"), Value::Array(vec![entry("vdt"), entry("system"), entry("vdt")])),
        ]));

        let RoutedMessage::FocusStack(stack) = RoutedMessage::decode(&input).unwrap() else {
            panic!("expected focus stack");
        };
        assert_eq!(stack.ids().collect::<Vec<_>>(), vec!["vdt", "system", "vdt"]);
        assert_eq!(stack.uia_id, None);
    }

    #[test]
    fn decodes_alert_kind() {
        let input = encode_value(&Value::Map(vec![
            (text("msgType"), text("alert")),
            (text("uiaId"), text("vdt")),
        ]));

        let RoutedMessage::Generic(msg) = RoutedMessage::decode(&input).unwrap() else {
            panic!("expected generic message");
        };
        assert_eq!(msg.kind, GenericKind::Alert);
        assert_eq!(msg.uia_id.as_deref(), Some("vdt"));
    }

    #[test]
    fn encode_then_decode_preserves_rewritten_fields() {
        let mut stack = FocusStack::from_ids(["custom", "system"]);
        stack.app_id_list[1].extra.insert("visible".to_string(), Value::Bool(true));
        let msg = RoutedMessage::FocusStack(stack);

        let decoded = RoutedMessage::decode(&msg.encode().unwrap()).unwrap();
        assert_eq!(decoded, msg);
        if let RoutedMessage::FocusStack(stack) = decoded {
            assert_eq!(
                stack.app_id_list[1],
                FocusEntry {
                    id: "system".to_string(),
                    extra: [("visible".to_string(), Value::Bool(true))].into_iter().collect(),
                }
            );
        }
    }

    #[test]
    fn malformed_known_shapes_pass_through_verbatim() {
        let nameless = Value::Map(vec![(text("name"), text("vdt"))]);
        let cases = [
            // ctxtChg without ctxtId
            Value::Map(vec![(text("msgType"), text("ctxtChg")), (text("uiaId"), text("vdt"))]),
            // msg whose uiaId is not a string
            Value::Map(vec![
                (text("msgType"), text("msg")),
                (text("uiaId"), Value::Integer(7.into())),
            ]),
            // focusStack with a null list
            Value::Map(vec![
                (text("msgType"), text("focusStack")),
                (text("appIdList"), Value::Null),
            ]),
            // focus entry without an id
            Value::Map(vec![
                (text("msgType"), text("focusStack")),
                (text("appIdList"), Value::Array(vec![nameless])),
            ]),
        ];

        for case in &cases {
            let input = encode_value(case);
            let msg = RoutedMessage::decode(&input).unwrap();

            assert!(matches!(msg, RoutedMessage::Other(_)), "{case:?} was interpreted");
            assert_eq!(msg.encode().unwrap().as_ref(), input.as_slice());
        }
    }

    #[test]
    fn malformed_alert_keeps_its_tag() {
        let input = encode_value(&Value::Map(vec![
            (text("msgType"), text("alert")),
            (text("uiaId"), Value::Bool(false)),
        ]));

        assert_eq!(RoutedMessage::decode(&input).unwrap().msg_type(), Some("alert"));
    }

    #[test]
    fn non_map_is_rejected() {
        let input = encode_value(&text("ctxtChg"));
        assert_eq!(RoutedMessage::decode(&input), Err(ProtocolError::NotAMap));
    }

    #[test]
    fn truncated_input_is_error() {
        let truncated = RoutedMessage::decode(&hex!("a2 67 6d73"));
        assert!(matches!(truncated, Err(ProtocolError::Decode(_))));
    }
}
