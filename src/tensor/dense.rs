//! Dense tensors — the built-in native numeric payload
//!
//! Row-major values with dtype and shape metadata. Values are held as f64
//! in memory regardless of dtype; construction rounds them to the dtype's
//! precision so the in-memory tensor always matches its wire encoding.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Element type of a dense tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dtype {
    F64,
    F32,
    I64,
    Bool,
}

impl Dtype {
    pub const ALL: [Dtype; 4] = [Dtype::F64, Dtype::F32, Dtype::I64, Dtype::Bool];

    pub fn as_str(self) -> &'static str {
        match self {
            Dtype::F64 => "f64",
            Dtype::F32 => "f32",
            Dtype::I64 => "i64",
            Dtype::Bool => "bool",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "f64" => Some(Dtype::F64),
            "f32" => Some(Dtype::F32),
            "i64" => Some(Dtype::I64),
            "bool" => Some(Dtype::Bool),
            _ => None,
        }
    }

    /// Bytes per element on the wire
    pub fn byte_width(self) -> usize {
        match self {
            Dtype::F64 | Dtype::I64 => 8,
            Dtype::F32 => 4,
            Dtype::Bool => 1,
        }
    }

    /// Round a value to what this dtype can represent
    fn canonical(self, v: f64) -> f64 {
        match self {
            Dtype::F64 => v,
            Dtype::F32 => v as f32 as f64,
            Dtype::I64 => v as i64 as f64,
            Dtype::Bool => {
                if v != 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

/// Errors from native dense-tensor operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NativeError {
    #[error("{op}: shape mismatch {left:?} vs {right:?}")]
    ShapeMismatch {
        op: &'static str,
        left: Vec<usize>,
        right: Vec<usize>,
    },
    #[error("shapes not conformable for matrix product: {left:?} x {right:?}")]
    NotConformable { left: Vec<usize>, right: Vec<usize> },
    #[error("operation '{0}' expects an operand")]
    MissingOperand(&'static str),
    #[error("operation '{0}' requires a 2-d tensor")]
    NotAMatrix(&'static str),
    #[error("payload of {len} values does not fit shape {shape:?}")]
    PayloadMismatch { len: usize, shape: Vec<usize> },
}

/// A dense row-major tensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseTensor {
    pub dtype: Dtype,
    /// Empty shape = scalar
    pub shape: Vec<usize>,
    pub data: Vec<f64>,
}

impl DenseTensor {
    pub fn new(dtype: Dtype, shape: Vec<usize>, data: Vec<f64>) -> Result<Self, NativeError> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(NativeError::PayloadMismatch {
                len: data.len(),
                shape,
            });
        }
        let data = data.into_iter().map(|v| dtype.canonical(v)).collect();
        Ok(Self { dtype, shape, data })
    }

    pub fn scalar(v: f64) -> Self {
        Self {
            dtype: Dtype::F64,
            shape: Vec::new(),
            data: vec![v],
        }
    }

    pub fn vector(values: Vec<f64>) -> Self {
        Self {
            dtype: Dtype::F64,
            shape: vec![values.len()],
            data: values,
        }
    }

    pub fn from_matrix(m: &DMatrix<f64>) -> Self {
        let mut data = Vec::with_capacity(m.nrows() * m.ncols());
        for i in 0..m.nrows() {
            for j in 0..m.ncols() {
                data.push(m[(i, j)]);
            }
        }
        Self {
            dtype: Dtype::F64,
            shape: vec![m.nrows(), m.ncols()],
            data,
        }
    }

    pub fn to_matrix(&self, op: &'static str) -> Result<DMatrix<f64>, NativeError> {
        if self.shape.len() != 2 {
            return Err(NativeError::NotAMatrix(op));
        }
        Ok(DMatrix::from_row_slice(
            self.shape[0],
            self.shape[1],
            &self.data,
        ))
    }

    /// Element count
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_scalar(&self) -> bool {
        self.shape.is_empty()
    }

    /// SHA256 over dtype, shape, and payload
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.dtype.as_str().as_bytes());
        for dim in &self.shape {
            hasher.update((*dim as u64).to_le_bytes());
        }
        for val in &self.data {
            hasher.update(val.to_le_bytes());
        }
        hex::encode(hasher.finalize())
    }
}
