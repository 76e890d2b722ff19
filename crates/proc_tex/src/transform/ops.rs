//! Element-wise arithmetic between textures and scalars.
//!
//! `+`, `-` and `*` are implemented for every mix of `Tex`, `&Tex` and `f32` and return
//! `Result<Tex>`, since two texture operands must agree on channel count and space dims.
//! Unary `-` cannot fail and returns a `Tex`.
use std::ops::{Add, Mul, Neg, Sub};

use crate::error::{Error, Result};
use crate::texture::Tex;
use crate::transform::values::map_values;
use crate::transform::Transform;

/// One side of a binary combination.
#[derive(Clone, Debug)]
pub enum Operand {
    Texture(Tex),
    /// Broadcast over every channel and point, shaped like the other operand.
    Scalar(f32),
}

impl From<Tex> for Operand {
    fn from(t: Tex) -> Self {
        Operand::Texture(t)
    }
}

impl From<&Tex> for Operand {
    fn from(t: &Tex) -> Self {
        Operand::Texture(t.clone())
    }
}

impl From<f32> for Operand {
    fn from(v: f32) -> Self {
        Operand::Scalar(v)
    }
}

/// Combines two operands value by value with `f`.
pub fn combine<F>(lhs: impl Into<Operand>, rhs: impl Into<Operand>, f: F) -> Result<Tex>
where
    F: Fn(f32, f32) -> f32 + 'static,
{
    let (a, b) = match (lhs.into(), rhs.into()) {
        (Operand::Texture(a), Operand::Texture(b)) => (a, b),
        (Operand::Texture(a), Operand::Scalar(v)) => {
            let b = Tex::constant(a.channels(), a.space_dims(), v)?;
            (a, b)
        }
        (Operand::Scalar(v), Operand::Texture(b)) => {
            let a = Tex::constant(b.channels(), b.space_dims(), v)?;
            (a, b)
        }
        (Operand::Scalar(_), Operand::Scalar(_)) => {
            return Err(Error::config(
                "combining two scalars needs a texture to take the shape from",
            ));
        }
    };

    if a.channels() != b.channels() || a.space_dims() != b.space_dims() {
        return Err(Error::shape(format!(
            "cannot combine {} channel {}D texture with {} channel {}D texture",
            a.channels(),
            a.space_dims(),
            b.channels(),
            b.space_dims()
        )));
    }

    Transform::new(a.channels(), a.space_dims())
        .with_source(a)
        .with_source(b)
        .build(move |values| {
            let mut values = values.into_iter();
            let (Some(mut out), Some(rhs)) = (values.next(), values.next()) else {
                return Err(Error::shape("binary node needs two source batches"));
            };
            for (l, r) in out.data_mut().iter_mut().zip(rhs.data()) {
                *l = f(*l, *r);
            }
            Ok(out)
        })
}

pub fn add(lhs: impl Into<Operand>, rhs: impl Into<Operand>) -> Result<Tex> {
    combine(lhs, rhs, |a, b| a + b)
}

pub fn sub(lhs: impl Into<Operand>, rhs: impl Into<Operand>) -> Result<Tex> {
    combine(lhs, rhs, |a, b| a - b)
}

pub fn mul(lhs: impl Into<Operand>, rhs: impl Into<Operand>) -> Result<Tex> {
    combine(lhs, rhs, |a, b| a * b)
}

pub fn neg(src: &Tex) -> Tex {
    map_values(src, |v| -v)
}

macro_rules! impl_binary_op {
    ($op:ident, $method:ident, $func:ident) => {
        impl $op<Tex> for Tex {
            type Output = Result<Tex>;
            fn $method(self, rhs: Tex) -> Result<Tex> {
                $func(self, rhs)
            }
        }

        impl $op<&Tex> for Tex {
            type Output = Result<Tex>;
            fn $method(self, rhs: &Tex) -> Result<Tex> {
                $func(self, rhs)
            }
        }

        impl $op<Tex> for &Tex {
            type Output = Result<Tex>;
            fn $method(self, rhs: Tex) -> Result<Tex> {
                $func(self, rhs)
            }
        }

        impl $op<&Tex> for &Tex {
            type Output = Result<Tex>;
            fn $method(self, rhs: &Tex) -> Result<Tex> {
                $func(self, rhs)
            }
        }

        impl $op<f32> for Tex {
            type Output = Result<Tex>;
            fn $method(self, rhs: f32) -> Result<Tex> {
                $func(self, rhs)
            }
        }

        impl $op<f32> for &Tex {
            type Output = Result<Tex>;
            fn $method(self, rhs: f32) -> Result<Tex> {
                $func(self, rhs)
            }
        }

        impl $op<Tex> for f32 {
            type Output = Result<Tex>;
            fn $method(self, rhs: Tex) -> Result<Tex> {
                $func(self, rhs)
            }
        }

        impl $op<&Tex> for f32 {
            type Output = Result<Tex>;
            fn $method(self, rhs: &Tex) -> Result<Tex> {
                $func(self, rhs)
            }
        }
    };
}

impl_binary_op!(Add, add, add);
impl_binary_op!(Sub, sub, sub);
impl_binary_op!(Mul, mul, mul);

impl Neg for Tex {
    type Output = Tex;
    fn neg(self) -> Tex {
        neg(&self)
    }
}

impl Neg for &Tex {
    type Output = Tex;
    fn neg(self) -> Tex {
        neg(self)
    }
}
