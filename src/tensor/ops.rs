//! Native operations of the dense backend
//!
//! Plain functions over raw tensors. The interception engine registers
//! these as the preserved originals behind every dispatcher stand-in;
//! nothing here knows about wrappers or identity.

use super::dense::{DenseTensor, Dtype, NativeError};

/// Signature shared by every native dense operation
pub type NativeFn = fn(&DenseTensor, &[&DenseTensor]) -> Result<DenseTensor, NativeError>;

fn operand<'a>(op: &'static str, args: &[&'a DenseTensor]) -> Result<&'a DenseTensor, NativeError> {
    args.first().copied().ok_or(NativeError::MissingOperand(op))
}

fn promote(a: Dtype, b: Dtype) -> Dtype {
    use Dtype::*;
    match (a, b) {
        (F64, _) | (_, F64) => F64,
        (F32, _) | (_, F32) => F32,
        (I64, _) | (_, I64) => I64,
        _ => Bool,
    }
}

/// Elementwise combine with scalar broadcast on either side
fn zip(
    op: &'static str,
    recv: &DenseTensor,
    other: &DenseTensor,
    dtype: Dtype,
    f: impl Fn(f64, f64) -> f64,
) -> Result<DenseTensor, NativeError> {
    if other.is_scalar() && !recv.is_scalar() {
        let b = other.data[0];
        let data = recv.data.iter().map(|&a| f(a, b)).collect();
        return DenseTensor::new(dtype, recv.shape.clone(), data);
    }
    if recv.is_scalar() && !other.is_scalar() {
        let a = recv.data[0];
        let data = other.data.iter().map(|&b| f(a, b)).collect();
        return DenseTensor::new(dtype, other.shape.clone(), data);
    }
    if recv.shape != other.shape {
        return Err(NativeError::ShapeMismatch {
            op,
            left: recv.shape.clone(),
            right: other.shape.clone(),
        });
    }
    let data = recv
        .data
        .iter()
        .zip(&other.data)
        .map(|(&a, &b)| f(a, b))
        .collect();
    DenseTensor::new(dtype, recv.shape.clone(), data)
}

fn arithmetic(
    op: &'static str,
    recv: &DenseTensor,
    args: &[&DenseTensor],
    f: impl Fn(f64, f64) -> f64,
) -> Result<DenseTensor, NativeError> {
    let other = operand(op, args)?;
    zip(op, recv, other, promote(recv.dtype, other.dtype), f)
}

fn compare(
    op: &'static str,
    recv: &DenseTensor,
    args: &[&DenseTensor],
    f: impl Fn(f64, f64) -> bool,
) -> Result<DenseTensor, NativeError> {
    let other = operand(op, args)?;
    zip(op, recv, other, Dtype::Bool, |a, b| {
        if f(a, b) {
            1.0
        } else {
            0.0
        }
    })
}

pub fn add(recv: &DenseTensor, args: &[&DenseTensor]) -> Result<DenseTensor, NativeError> {
    arithmetic("add", recv, args, |a, b| a + b)
}

pub fn sub(recv: &DenseTensor, args: &[&DenseTensor]) -> Result<DenseTensor, NativeError> {
    arithmetic("sub", recv, args, |a, b| a - b)
}

pub fn mul(recv: &DenseTensor, args: &[&DenseTensor]) -> Result<DenseTensor, NativeError> {
    arithmetic("mul", recv, args, |a, b| a * b)
}

pub fn neg(recv: &DenseTensor, _args: &[&DenseTensor]) -> Result<DenseTensor, NativeError> {
    let data = recv.data.iter().map(|&v| -v).collect();
    DenseTensor::new(recv.dtype, recv.shape.clone(), data)
}

pub fn matmul(recv: &DenseTensor, args: &[&DenseTensor]) -> Result<DenseTensor, NativeError> {
    let other = operand("matmul", args)?;
    let a = recv.to_matrix("matmul")?;
    let b = other.to_matrix("matmul")?;
    if a.ncols() != b.nrows() {
        return Err(NativeError::NotConformable {
            left: recv.shape.clone(),
            right: other.shape.clone(),
        });
    }
    let product = a * b;
    let out = DenseTensor::from_matrix(&product);
    DenseTensor::new(promote(recv.dtype, other.dtype), out.shape, out.data)
}

pub fn sum(recv: &DenseTensor, _args: &[&DenseTensor]) -> Result<DenseTensor, NativeError> {
    let dtype = match recv.dtype {
        Dtype::Bool => Dtype::I64,
        d => d,
    };
    DenseTensor::new(dtype, Vec::new(), vec![recv.data.iter().sum()])
}

pub fn transpose(recv: &DenseTensor, _args: &[&DenseTensor]) -> Result<DenseTensor, NativeError> {
    let m = recv.to_matrix("transpose")?;
    let out = DenseTensor::from_matrix(&m.transpose());
    DenseTensor::new(recv.dtype, out.shape, out.data)
}

pub fn gt(recv: &DenseTensor, args: &[&DenseTensor]) -> Result<DenseTensor, NativeError> {
    compare("gt", recv, args, |a, b| a > b)
}

pub fn ge(recv: &DenseTensor, args: &[&DenseTensor]) -> Result<DenseTensor, NativeError> {
    compare("ge", recv, args, |a, b| a >= b)
}

pub fn lt(recv: &DenseTensor, args: &[&DenseTensor]) -> Result<DenseTensor, NativeError> {
    compare("lt", recv, args, |a, b| a < b)
}

pub fn le(recv: &DenseTensor, args: &[&DenseTensor]) -> Result<DenseTensor, NativeError> {
    compare("le", recv, args, |a, b| a <= b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;

    #[test]
    fn test_add_scalars() {
        let five = DenseTensor::scalar(5.0);
        let three = DenseTensor::scalar(3.0);
        let out = add(&five, &[&three]).unwrap();
        assert_eq!(out.data, vec![8.0]);
    }

    #[test]
    fn test_add_broadcasts_scalar() {
        let v = DenseTensor::vector(vec![1.0, 2.0, 3.0]);
        let s = DenseTensor::scalar(10.0);
        assert_eq!(add(&v, &[&s]).unwrap().data, vec![11.0, 12.0, 13.0]);
        assert_eq!(sub(&s, &[&v]).unwrap().data, vec![9.0, 8.0, 7.0]);
    }

    #[test]
    fn test_add_shape_mismatch() {
        let a = DenseTensor::vector(vec![1.0, 2.0]);
        let b = DenseTensor::vector(vec![1.0, 2.0, 3.0]);
        let err = add(&a, &[&b]).unwrap_err();
        assert_eq!(
            err,
            NativeError::ShapeMismatch {
                op: "add",
                left: vec![2],
                right: vec![3]
            }
        );
    }

    #[test]
    fn test_missing_operand() {
        let a = DenseTensor::scalar(1.0);
        assert_eq!(add(&a, &[]).unwrap_err(), NativeError::MissingOperand("add"));
    }

    #[test]
    fn test_matmul_matches_nalgebra() {
        let a = DMatrix::new_random(4, 3);
        let b = DMatrix::new_random(3, 5);
        let ta = DenseTensor::from_matrix(&a);
        let tb = DenseTensor::from_matrix(&b);
        let out = matmul(&ta, &[&tb]).unwrap();
        assert_eq!(out.shape, vec![4, 5]);
        assert_eq!(out.to_matrix("test").unwrap(), a * b);
    }

    #[test]
    fn test_matmul_not_conformable() {
        let a = DenseTensor::from_matrix(&DMatrix::new_random(4, 3));
        let b = DenseTensor::from_matrix(&DMatrix::new_random(2, 5));
        let err = matmul(&a, &[&b]).unwrap_err();
        assert_eq!(
            err,
            NativeError::NotConformable {
                left: vec![4, 3],
                right: vec![2, 5]
            }
        );
    }

    #[test]
    fn test_comparisons_yield_bool() {
        let a = DenseTensor::vector(vec![1.0, 5.0, 3.0]);
        let b = DenseTensor::vector(vec![2.0, 2.0, 3.0]);
        let out = gt(&a, &[&b]).unwrap();
        assert_eq!(out.dtype, Dtype::Bool);
        assert_eq!(out.data, vec![0.0, 1.0, 0.0]);
        assert_eq!(le(&a, &[&b]).unwrap().data, vec![1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_sum_reduces_to_scalar() {
        let v = DenseTensor::vector(vec![1.0, 2.0, 3.5]);
        let out = sum(&v, &[]).unwrap();
        assert!(out.is_scalar());
        assert_eq!(out.data, vec![6.5]);
    }

    #[test]
    fn test_sum_of_bool_counts() {
        let b = DenseTensor::new(Dtype::Bool, vec![4], vec![1.0, 0.0, 1.0, 1.0]).unwrap();
        let out = sum(&b, &[]).unwrap();
        assert_eq!(out.dtype, Dtype::I64);
        assert_eq!(out.data, vec![3.0]);
    }

    #[test]
    fn test_transpose() {
        let m = DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let t = transpose(&DenseTensor::from_matrix(&m), &[]).unwrap();
        assert_eq!(t.shape, vec![3, 2]);
        assert_eq!(t.to_matrix("test").unwrap(), m.transpose());
    }

    #[test]
    fn test_promotion_keeps_widest_dtype() {
        let i = DenseTensor::new(Dtype::I64, vec![2], vec![1.0, 2.0]).unwrap();
        let f = DenseTensor::new(Dtype::F64, vec![2], vec![0.5, 0.5]).unwrap();
        assert_eq!(add(&i, &[&f]).unwrap().dtype, Dtype::F64);
        assert_eq!(add(&i, &[&i]).unwrap().dtype, Dtype::I64);
    }
}
