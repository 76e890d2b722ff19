//! Composition graph.
//!
//! A composition node wraps zero or more source textures and two closures:
//!
//! - a [`SpaceTransform`] that maps the incoming point batch to one point batch per source,
//! - a value closure that maps the evaluated source batches to the node's output.
//!
//! Nodes are immutable once built and own no animation state. Their sources (and any
//! extra `synced` textures a closure reads from) are reached by [`Tex::leaves`], which is
//! how frame stepping finds every leaf exactly once.
//!
//! The helpers in [`ops`], [`values`], [`channels`] and [`space`] are all thin
//! specializations of [`Transform::build`].
use crate::batch::Batch;
use crate::error::{Error, Result};
use crate::render::SampleFormat;
use crate::texture::{validate_shape, Tex};

pub mod channels;
pub mod ops;
pub mod space;
pub mod values;

pub use channels::{broadcast_channels, concat_channels, select_channels};
pub use ops::{add, combine, mul, neg, sub, Operand};
pub use space::{affine_space, offset_by_texture, sphere_map};
pub use values::{map_values, scale_to_region, to_sample_format};

pub type SpaceFn = Box<dyn Fn(&Batch) -> Result<Vec<Batch>>>;
pub type ValueFn = Box<dyn Fn(Vec<Batch>) -> Result<Batch>>;

/// How a node maps its input points to points for each source.
pub enum SpaceTransform {
    /// Every source sees the incoming points unchanged.
    Identity,
    /// Produces one batch per source, in source order.
    Map(SpaceFn),
}

pub(crate) struct TransformNode {
    channels: usize,
    space_dims: usize,
    sample_format: SampleFormat,
    sources: Vec<Tex>,
    synced: Vec<Tex>,
    space: SpaceTransform,
    value: ValueFn,
}

impl TransformNode {
    pub(crate) fn channels(&self) -> usize {
        self.channels
    }

    pub(crate) fn space_dims(&self) -> usize {
        self.space_dims
    }

    pub(crate) fn sample_format(&self) -> SampleFormat {
        self.sample_format
    }

    /// Sources followed by synced textures.
    pub(crate) fn children(&self) -> impl Iterator<Item = &Tex> + '_ {
        self.sources.iter().chain(self.synced.iter())
    }

    pub(crate) fn evaluate(&self, points: &Batch) -> Result<Batch> {
        let values = match &self.space {
            SpaceTransform::Identity => self
                .sources
                .iter()
                .map(|s| s.evaluate(points))
                .collect::<Result<Vec<_>>>()?,
            SpaceTransform::Map(map) => {
                let mapped = map(points)?;
                if mapped.len() != self.sources.len() {
                    return Err(Error::shape(format!(
                        "space transform produced {} batches for {} sources",
                        mapped.len(),
                        self.sources.len()
                    )));
                }
                self.sources
                    .iter()
                    .zip(&mapped)
                    .map(|(s, pts)| {
                        if pts.width() != s.space_dims() {
                            return Err(Error::shape(format!(
                                "space transform produced width {} for a {}D source",
                                pts.width(),
                                s.space_dims()
                            )));
                        }
                        s.evaluate(pts)
                    })
                    .collect::<Result<Vec<_>>>()?
            }
        };
        (self.value)(values)
    }
}

/// Builder for composition nodes.
///
/// ```ignore
/// let doubled = Transform::new(1, 2)
///     .with_source(noise.clone())
///     .build(|mut v| {
///         let mut b = v.remove(0);
///         b.data_mut().iter_mut().for_each(|x| *x *= 2.0);
///         Ok(b)
///     })?;
/// ```
pub struct Transform {
    channels: usize,
    space_dims: usize,
    sample_format: Option<SampleFormat>,
    sources: Vec<Tex>,
    synced: Vec<Tex>,
    space: SpaceTransform,
}

impl Transform {
    pub fn new(channels: usize, space_dims: usize) -> Self {
        Self {
            channels,
            space_dims,
            sample_format: None,
            sources: Vec::new(),
            synced: Vec::new(),
            space: SpaceTransform::Identity,
        }
    }

    pub fn with_source(mut self, source: Tex) -> Self {
        self.sources.push(source);
        self
    }

    pub fn with_sources(mut self, sources: impl IntoIterator<Item = Tex>) -> Self {
        self.sources.extend(sources);
        self
    }

    /// Adds a texture that must advance with this node without being a source.
    pub fn with_synced(mut self, tex: Tex) -> Self {
        self.synced.push(tex);
        self
    }

    pub fn with_space_map<F>(mut self, map: F) -> Self
    where
        F: Fn(&Batch) -> Result<Vec<Batch>> + 'static,
    {
        self.space = SpaceTransform::Map(Box::new(map));
        self
    }

    /// Overrides the output sample format. Defaults to the first source's format.
    pub fn with_sample_format(mut self, format: SampleFormat) -> Self {
        self.sample_format = Some(format);
        self
    }

    /// Validates the node and returns a handle to it.
    pub fn build<F>(self, value: F) -> Result<Tex>
    where
        F: Fn(Vec<Batch>) -> Result<Batch> + 'static,
    {
        validate_shape(self.channels, self.space_dims)?;
        if matches!(self.space, SpaceTransform::Identity) {
            if let Some(s) = self
                .sources
                .iter()
                .find(|s| s.space_dims() != self.space_dims)
            {
                return Err(Error::shape(format!(
                    "{}D node cannot pass its points to a {}D source",
                    self.space_dims,
                    s.space_dims()
                )));
            }
        }
        Ok(self.build_unchecked(Box::new(value)))
    }

    /// Callers guarantee the shape checks in [`Transform::build`] hold.
    pub(crate) fn build_unchecked(self, value: ValueFn) -> Tex {
        let sample_format = self
            .sample_format
            .or_else(|| self.sources.first().map(Tex::sample_format))
            .unwrap_or(SampleFormat::F32);
        Tex::from_transform(TransformNode {
            channels: self.channels,
            space_dims: self.space_dims,
            sample_format,
            sources: self.sources,
            synced: self.synced,
            space: self.space,
            value,
        })
    }
}

/// Takes the single batch of a one-source node.
pub(crate) fn single(values: Vec<Batch>) -> Result<Batch> {
    values
        .into_iter()
        .next()
        .ok_or_else(|| Error::shape("node has no source values"))
}
