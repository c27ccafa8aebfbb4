//! Raw-text to raw-tree decoding.

use aria_core::Value;

/// Decoder failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The text is not valid for this format
    #[error("syntax error: {message}")]
    Syntax {
        /// Parser message, including position when known
        message: String,
    },
}

/// Turns loaded bytes into a raw tree
pub trait Decoder: Send + Sync {
    /// Decoder name for diagnostics
    fn name(&self) -> &str;

    /// Decode a document
    ///
    /// # Errors
    ///
    /// Returns error if the bytes are not a valid document
    fn decode(&self, bytes: &[u8]) -> Result<Value, DecodeError>;
}

/// YAML decoder; an empty document decodes to an empty map
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlDecoder;

impl Decoder for YamlDecoder {
    fn name(&self) -> &str {
        "yaml"
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, DecodeError> {
        let value: serde_yaml::Value =
            serde_yaml::from_slice(bytes).map_err(|err| DecodeError::Syntax {
                message: err.to_string(),
            })?;
        let value = Value::try_from_yaml(value).map_err(|err| DecodeError::Syntax {
            message: err.to_string(),
        })?;
        Ok(match value {
            Value::Null => Value::map(),
            other => other,
        })
    }
}

/// JSON decoder
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl Decoder for JsonDecoder {
    fn name(&self) -> &str {
        "json"
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, DecodeError> {
        let value: serde_json::Value =
            serde_json::from_slice(bytes).map_err(|err| DecodeError::Syntax {
                message: err.to_string(),
            })?;
        Ok(Value::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_decoder() {
        let value = YamlDecoder.decode(b"b: 1\na: [x, y]\n").unwrap();
        let keys: Vec<_> = value.as_map().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(YamlDecoder.decode(b"").unwrap(), Value::map());
    }

    #[test]
    fn test_yaml_syntax_error() {
        let err = YamlDecoder.decode(b"a: [1, 2\n").unwrap_err();
        assert!(matches!(err, DecodeError::Syntax { .. }));
    }

    #[test]
    fn test_yaml_colliding_keys_rejected() {
        let err = YamlDecoder.decode(b"node_types:\n  1: {}\n  '1': {}\n").unwrap_err();
        let DecodeError::Syntax { message } = err;
        assert!(message.contains("\"1\""), "{}", message);
    }

    #[test]
    fn test_json_decoder_keeps_order() {
        let value = JsonDecoder.decode(br#"{"z": 1, "a": {"k": true}}"#).unwrap();
        let keys: Vec<_> = value.as_map().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["z", "a"]);
        assert!(JsonDecoder.decode(b"{").is_err());
    }
}
