//! Compute backend seam.
//!
//! Heavy generators can hand a whole point batch to a [`ComputeBackend`] (a GPU service,
//! a worker pool, ...) through [`KernelTexture`]. The call is blocking: submit a batch,
//! get the whole result back. The backend must return a batch with the same leading
//! shape as its input and the kernel's channel count as width.
//!
//! [`CpuBackend`] is an in-process backend holding [`Kernel`]s by id.
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use tracing::warn;

use crate::batch::Batch;
use crate::error::{Error, Result};
use crate::texture::{validate_shape, Texture};

/// Evaluates a named kernel over a batch of points.
pub trait ComputeBackend {
    fn evaluate_batch(&self, kernel_id: &str, params: &[f32], points: &Batch) -> Result<Batch>;
}

/// A per-point kernel run by [`CpuBackend`].
pub trait Kernel: Send + Sync {
    fn channels(&self) -> usize;

    /// Writes `channels()` values for `point` into `out`.
    fn evaluate(&self, params: &[f32], point: &[f32], out: &mut [f32]);
}

/// Adapts a closure into a [`Kernel`].
pub struct FnKernel<F> {
    channels: usize,
    f: F,
}

impl<F> FnKernel<F>
where
    F: Fn(&[f32], &[f32], &mut [f32]) + Send + Sync,
{
    pub fn new(channels: usize, f: F) -> Self {
        Self { channels, f }
    }
}

impl<F> Kernel for FnKernel<F>
where
    F: Fn(&[f32], &[f32], &mut [f32]) + Send + Sync,
{
    fn channels(&self) -> usize {
        self.channels
    }

    fn evaluate(&self, params: &[f32], point: &[f32], out: &mut [f32]) {
        (self.f)(params, point, out)
    }
}

/// In-process backend with kernels registered under string ids.
#[non_exhaustive]
pub struct CpuBackend {
    kernels: HashMap<String, Arc<dyn Kernel>>,
}

impl CpuBackend {
    pub fn new() -> Self {
        Self {
            kernels: HashMap::new(),
        }
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            kernels: HashMap::with_capacity(n),
        }
    }

    pub fn len(&self) -> usize {
        self.kernels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }

    /// Registers a kernel, replacing any previous kernel with the same id.
    pub fn register<K>(&mut self, id: impl Into<String>, kernel: K)
    where
        K: Kernel + 'static,
    {
        self.kernels.insert(id.into(), Arc::new(kernel));
    }

    pub fn register_arc(&mut self, id: impl Into<String>, kernel: Arc<dyn Kernel>) {
        self.kernels.insert(id.into(), kernel);
    }

    /// Returns `true` if a kernel was removed.
    pub fn unregister(&mut self, id: &str) -> bool {
        self.kernels.remove(id).is_some()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.kernels.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Kernel>> {
        self.kernels.get(id).cloned()
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ComputeBackend for CpuBackend {
    fn evaluate_batch(&self, kernel_id: &str, params: &[f32], points: &Batch) -> Result<Batch> {
        let Some(kernel) = self.kernels.get(kernel_id) else {
            warn!("Unknown kernel id '{}'.", kernel_id);
            return Err(Error::UnknownKernel {
                id: kernel_id.to_string(),
            });
        };

        let mut out = Batch::filled(points.shape(), kernel.channels(), 0.0);
        for (p, o) in points.rows().zip(out.rows_mut()) {
            kernel.evaluate(params, p, o);
        }
        Ok(out)
    }
}

/// A leaf texture whose values come from a [`ComputeBackend`] kernel.
pub struct KernelTexture {
    backend: Rc<dyn ComputeBackend>,
    kernel_id: String,
    params: Vec<f32>,
    channels: usize,
    space_dims: usize,
}

impl KernelTexture {
    pub fn new(
        backend: Rc<dyn ComputeBackend>,
        kernel_id: impl Into<String>,
        params: Vec<f32>,
        channels: usize,
        space_dims: usize,
    ) -> Result<Self> {
        validate_shape(channels, space_dims)?;
        Ok(Self {
            backend,
            kernel_id: kernel_id.into(),
            params,
            channels,
            space_dims,
        })
    }

    pub fn kernel_id(&self) -> &str {
        &self.kernel_id
    }
}

impl Texture for KernelTexture {
    fn channels(&self) -> usize {
        self.channels
    }

    fn space_dims(&self) -> usize {
        self.space_dims
    }

    fn evaluate(&self, points: &Batch) -> Result<Batch> {
        let out = self
            .backend
            .evaluate_batch(&self.kernel_id, &self.params, points)?;
        if !out.same_prefix(points) || out.width() != self.channels {
            return Err(Error::Backend(format!(
                "kernel '{}' returned shape {:?} x {}, expected {:?} x {}",
                self.kernel_id,
                out.shape(),
                out.width(),
                points.shape(),
                self.channels
            )));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sum_kernel() -> FnKernel<impl Fn(&[f32], &[f32], &mut [f32]) + Send + Sync> {
        FnKernel::new(1, |params: &[f32], p: &[f32], out: &mut [f32]| {
            out[0] = params[0] * p.iter().sum::<f32>();
        })
    }

    #[test]
    fn registry_register_and_unregister() {
        let mut backend = CpuBackend::new();
        assert!(backend.is_empty());
        backend.register("sum", sum_kernel());
        assert!(backend.contains("sum"));
        assert_eq!(backend.len(), 1);
        assert!(backend.get("sum").is_some());
        assert!(backend.unregister("sum"));
        assert!(!backend.unregister("sum"));
    }

    #[test]
    fn kernel_texture_evaluates_through_backend() {
        let mut backend = CpuBackend::new();
        backend.register("sum", sum_kernel());
        let tex = KernelTexture::new(Rc::new(backend), "sum", vec![2.0], 1, 2).unwrap();
        let out = tex
            .evaluate(&Batch::from_rows(&[[0.25, 0.5], [1.0, 1.0]]))
            .unwrap();
        assert_eq!(out.data(), &[1.5, 4.0]);
    }

    #[test]
    fn unknown_kernel_is_an_error() {
        let tex = KernelTexture::new(Rc::new(CpuBackend::new()), "nope", vec![], 1, 2).unwrap();
        let err = tex
            .evaluate(&Batch::from_rows(&[[0.0, 0.0]]))
            .expect_err("missing kernel");
        assert!(matches!(err, Error::UnknownKernel { ref id } if id == "nope"));
    }

    struct BadBackend;

    impl ComputeBackend for BadBackend {
        fn evaluate_batch(&self, _: &str, _: &[f32], points: &Batch) -> Result<Batch> {
            Ok(Batch::filled(&[points.len() + 1], 1, 0.0))
        }
    }

    #[test]
    fn backend_shape_contract_is_enforced() {
        let tex = KernelTexture::new(Rc::new(BadBackend), "any", vec![], 1, 2).unwrap();
        let err = tex
            .evaluate(&Batch::from_rows(&[[0.0, 0.0]]))
            .expect_err("prefix mismatch");
        assert!(matches!(err, Error::Backend(_)));
    }
}
