//! Serialization codec — portable envelopes for wrapper chains
//!
//! One envelope per chain node, outermost first, child nested; the leaf
//! carries dtype, shape, and a hex-encoded little-endian payload. JSON on
//! the wire; byte-exactness is only promised within a single deployment.
//! Decoding validates before building — a malformed stream never yields a
//! partially-built chain.

use crate::identity::{Context, TensorHandle};
use crate::tensor::{DenseTensor, Dtype, LeafTensor, TensorNode, WrapperLayer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

pub const TAG_LEAF: &str = "leaf";
pub const TAG_POINTER: &str = "pointer";
pub const TAG_TRACE: &str = "trace";

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("malformed envelope: {0}")]
    Malformed(String),
    #[error("envelope is missing required field '{0}'")]
    MissingField(&'static str),
    #[error("unknown envelope tag '{0}'")]
    UnknownTag(String),
    #[error("unknown dtype '{0}'")]
    UnknownDtype(String),
    #[error("payload of {len} bytes does not fit dtype {dtype:?} and shape {shape:?}")]
    PayloadMismatch {
        len: usize,
        dtype: Dtype,
        shape: Vec<usize>,
    },
    #[error("fingerprint mismatch for tensor {id}")]
    FingerprintMismatch { id: u64 },
}

/// Wire form of one chain node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub tag: String,
    pub id: u64,
    pub owner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child: Option<Box<Envelope>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dtype: Option<Dtype>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

/// Serialize a wrapper chain to portable bytes
pub fn serialize(node: &TensorNode) -> Result<Vec<u8>, CodecError> {
    let envelope = encode_node(node);
    serde_json::to_vec(&envelope).map_err(|e| CodecError::Malformed(e.to_string()))
}

/// Rebuild a wrapper chain from bytes. Ids are re-attached through the
/// handle's explicit-set path, so the result carries the ids it was
/// serialized with; owners and locations resolve against `local`.
pub fn deserialize(bytes: &[u8], local: &Arc<Context>) -> Result<TensorNode, CodecError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| CodecError::Malformed(e.to_string()))?;
    decode_node(&value, local)
}

fn encode_node(node: &TensorNode) -> Envelope {
    let handle = node.handle();
    let base = Envelope {
        tag: node.kind().to_string(),
        id: handle.id(),
        owner: handle.owner.id.clone(),
        location: handle.location.as_ref().map(|c| c.id.clone()),
        child: None,
        dtype: None,
        shape: None,
        payload: None,
        fingerprint: None,
    };
    match node {
        TensorNode::Leaf(leaf) => Envelope {
            dtype: Some(leaf.data.dtype),
            shape: Some(leaf.data.shape.clone()),
            payload: Some(hex::encode(encode_payload(&leaf.data))),
            fingerprint: Some(leaf.data.fingerprint()),
            ..base
        },
        TensorNode::Pointer(layer) | TensorNode::Trace(layer) => Envelope {
            child: Some(Box::new(encode_node(&layer.child))),
            ..base
        },
    }
}

fn decode_node(value: &Value, local: &Arc<Context>) -> Result<TensorNode, CodecError> {
    let obj = value
        .as_object()
        .ok_or_else(|| CodecError::Malformed("envelope is not an object".into()))?;
    let tag = require_str(obj, "tag")?;
    let id = obj
        .get("id")
        .and_then(Value::as_u64)
        .ok_or(CodecError::MissingField("id"))?;
    let owner = resolve_context(require_str(obj, "owner")?, local);
    let location = obj
        .get("location")
        .and_then(Value::as_str)
        .map(|ident| resolve_context(ident, local));

    match tag {
        TAG_LEAF => {
            let dtype_name = require_str(obj, "dtype")?;
            let dtype = Dtype::parse(dtype_name)
                .ok_or_else(|| CodecError::UnknownDtype(dtype_name.to_string()))?;
            let shape = decode_shape(obj)?;
            let payload = require_str(obj, "payload")?;
            let bytes = hex::decode(payload)
                .map_err(|e| CodecError::Malformed(format!("payload is not valid hex: {e}")))?;
            let data = decode_payload(dtype, &shape, &bytes)?;
            let tensor =
                DenseTensor::new(dtype, shape.clone(), data).map_err(|_| {
                    CodecError::PayloadMismatch {
                        len: bytes.len(),
                        dtype,
                        shape,
                    }
                })?;
            if let Some(expected) = obj.get("fingerprint").and_then(Value::as_str) {
                if expected != tensor.fingerprint() {
                    return Err(CodecError::FingerprintMismatch { id });
                }
            }
            let mut handle = TensorHandle::with_owner(owner);
            handle.location = location;
            handle.set_id(id);
            Ok(TensorNode::Leaf(LeafTensor {
                handle,
                data: tensor,
            }))
        }
        TAG_POINTER | TAG_TRACE => {
            let child_value = obj.get("child").ok_or(CodecError::MissingField("child"))?;
            let child = decode_node(child_value, local)?;
            let handle = TensorHandle::wrapper(owner, location);
            handle.set_id(id);
            let layer = WrapperLayer {
                handle,
                child: Box::new(child),
            };
            Ok(if tag == TAG_POINTER {
                TensorNode::Pointer(layer)
            } else {
                TensorNode::Trace(layer)
            })
        }
        other => Err(CodecError::UnknownTag(other.to_string())),
    }
}

fn require_str<'a>(
    obj: &'a serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, CodecError> {
    obj.get(field)
        .and_then(Value::as_str)
        .ok_or(CodecError::MissingField(field))
}

fn decode_shape(obj: &serde_json::Map<String, Value>) -> Result<Vec<usize>, CodecError> {
    let entries = obj
        .get("shape")
        .and_then(Value::as_array)
        .ok_or(CodecError::MissingField("shape"))?;
    entries
        .iter()
        .map(|v| {
            v.as_u64().map(|n| n as usize).ok_or_else(|| {
                CodecError::Malformed("shape entries must be unsigned integers".into())
            })
        })
        .collect()
}

fn resolve_context(id: &str, local: &Arc<Context>) -> Arc<Context> {
    if id == local.id {
        local.clone()
    } else {
        Context::remote(id)
    }
}

fn encode_payload(tensor: &DenseTensor) -> Vec<u8> {
    let mut out = Vec::with_capacity(tensor.len() * tensor.dtype.byte_width());
    for &v in &tensor.data {
        match tensor.dtype {
            Dtype::F64 => out.extend_from_slice(&v.to_le_bytes()),
            Dtype::F32 => out.extend_from_slice(&(v as f32).to_le_bytes()),
            Dtype::I64 => out.extend_from_slice(&(v as i64).to_le_bytes()),
            Dtype::Bool => out.push(u8::from(v != 0.0)),
        }
    }
    out
}

fn decode_payload(dtype: Dtype, shape: &[usize], bytes: &[u8]) -> Result<Vec<f64>, CodecError> {
    let width = dtype.byte_width();
    let expected: usize = shape.iter().product();
    if bytes.len() != expected * width {
        return Err(CodecError::PayloadMismatch {
            len: bytes.len(),
            dtype,
            shape: shape.to_vec(),
        });
    }
    let mut data = Vec::with_capacity(expected);
    for chunk in bytes.chunks_exact(width) {
        let v = match dtype {
            Dtype::F64 => f64::from_le_bytes(chunk.try_into().expect("8-byte chunk")),
            Dtype::F32 => f32::from_le_bytes(chunk.try_into().expect("4-byte chunk")) as f64,
            Dtype::I64 => i64::from_le_bytes(chunk.try_into().expect("8-byte chunk")) as f64,
            Dtype::Bool => {
                if chunk[0] != 0 {
                    1.0
                } else {
                    0.0
                }
            }
        };
        data.push(v);
    }
    Ok(data)
}
