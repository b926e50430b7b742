//! Envelope export to JSON.
//!
//! Encoding never fails: when the serializer errors, the failure is logged and
//! a fixed document built without the serializer is returned instead.

use serde::Serialize;

use super::{Envelope, FragmentArray, FragmentMap};

/// Error text carried by the fallback document.
pub const FALLBACK_MESSAGE: &str = "Encode failed. Check log";

#[derive(Serialize)]
struct WireEnvelope<'a> {
    #[serde(rename = "Status")]
    status: bool,
    #[serde(rename = "ErrArr")]
    errors: &'a [String],
    #[serde(rename = "ObjArr")]
    objects: &'a FragmentArray,
    #[serde(rename = "ObjMap")]
    data: &'a FragmentMap,
}

impl Envelope {
    /// Finalize status and payload, then serialize the whole envelope.
    pub fn encode(&mut self) -> Vec<u8> {
        self.finalize();
        let data = self.read_data();
        let wire = WireEnvelope {
            status: self.status,
            errors: &self.errors,
            objects: &self.objects,
            data: &data,
        };
        serde_json::to_vec(&wire).unwrap_or_else(|err| {
            tracing::error!(error = %err, "envelope encode failed, sending fallback document");
            fallback_document(FALLBACK_MESSAGE)
        })
    }

    /// Like [`Envelope::encode`] with two-space indentation.
    ///
    /// The compact document is re-indented as a whole, payload fragments
    /// included, keeping their key order.
    pub fn encode_pretty(&mut self) -> Vec<u8> {
        let compact = self.encode();
        indent(&compact).unwrap_or_else(|err| {
            tracing::error!(error = %err, "envelope indent failed, sending fallback document");
            fallback_document(FALLBACK_MESSAGE)
        })
    }

    pub fn encode_string(&mut self) -> String {
        String::from_utf8(self.encode())
            .unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
    }
}

fn indent(compact: &[u8]) -> serde_json::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(compact.len() * 2);
    let mut de = serde_json::Deserializer::from_slice(compact);
    {
        let mut ser = serde_json::Serializer::pretty(&mut out);
        serde_transcode::transcode(&mut de, &mut ser)?;
    }
    de.end()?;
    Ok(out)
}

/// Minimal failure document built by hand.
///
/// Quotes, backslashes and control characters are stripped from `message` so
/// the result is always valid JSON.
pub fn fallback_document(message: &str) -> Vec<u8> {
    let sanitized: String = message
        .chars()
        .filter(|c| *c != '"' && *c != '\\' && !c.is_control())
        .collect();
    format!(r#"{{"Status":false,"ErrArr":["{sanitized}"],"ObjArr":[],"ObjMap":{{}}}}"#).into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    #[test]
    fn test_encode_empty() {
        let mut env = Envelope::new();
        assert_eq!(
            env.encode_string(),
            r#"{"Status":true,"ErrArr":[],"ObjArr":[],"ObjMap":{}}"#
        );
        assert!(env.status());
    }

    #[test]
    fn test_encode_sorts_map_keys() {
        let mut env = Envelope::new();
        env.add_data("b", &2).unwrap();
        env.add_data("a", &1).unwrap();
        assert_eq!(
            env.encode_string(),
            r#"{"Status":true,"ErrArr":[],"ObjArr":[],"ObjMap":{"a":1,"b":2}}"#
        );
    }

    #[test]
    fn test_encode_pretty_is_indented_and_equivalent() {
        let mut env = Envelope::new();
        env.add_obj(&serde_json::json!({"Name": "Car"})).unwrap();
        let pretty = String::from_utf8(env.encode_pretty()).unwrap();
        assert!(pretty.contains("\n  \"Status\": true"));

        let compact: Value = serde_json::from_slice(&env.encode()).unwrap();
        let reparsed: Value = serde_json::from_str(&pretty).unwrap();
        assert_eq!(compact, reparsed);
    }

    #[test]
    fn test_encode_pretty_indents_fragments() {
        let mut env = Envelope::new();
        env.add_obj(&serde_json::json!({"Name": "Car", "Items": [{"Name": "Bag"}]}))
            .unwrap();
        let pretty = String::from_utf8(env.encode_pretty()).unwrap();
        assert_eq!(
            pretty,
            r#"{
  "Status": true,
  "ErrArr": [],
  "ObjArr": [
    {
      "Items": [
        {
          "Name": "Bag"
        }
      ],
      "Name": "Car"
    }
  ],
  "ObjMap": {}
}"#
        );
    }

    #[test]
    fn test_indent_keeps_fragment_key_order() {
        let pretty = indent(br#"{"b":1,"a":{"z":[true,null],"y":"s"}}"#).unwrap();
        assert_eq!(
            String::from_utf8(pretty).unwrap(),
            "{\n  \"b\": 1,\n  \"a\": {\n    \"z\": [\n      true,\n      null\n    ],\n    \"y\": \"s\"\n  }\n}"
        );
    }

    #[test]
    fn test_indent_rejects_malformed_input() {
        assert!(indent(br#"{"a":"#).is_err());
        assert!(indent(br#"{} trailing"#).is_err());
    }

    #[test]
    fn test_encode_pretty_applies_reset() {
        let mut env = Envelope::new();
        env.add_obj(&1).unwrap();
        env.add_error("boom");
        let doc: Value = serde_json::from_slice(&env.encode_pretty()).unwrap();
        assert_eq!(doc["Status"], Value::Bool(false));
        assert_eq!(doc["ObjArr"], serde_json::json!([]));
    }

    #[test]
    fn test_fallback_document_fixed_message() {
        assert_eq!(
            fallback_document(FALLBACK_MESSAGE),
            br#"{"Status":false,"ErrArr":["Encode failed. Check log"],"ObjArr":[],"ObjMap":{}}"#.to_vec()
        );
    }

    #[test]
    fn test_fallback_document_sanitizes() {
        let doc = fallback_document("bad \"quote\" \\ and\nnewline");
        let parsed: Value = serde_json::from_slice(&doc).unwrap();
        assert_eq!(parsed["ErrArr"][0], "bad quote  andnewline");
        assert_eq!(parsed["Status"], Value::Bool(false));
    }
}
