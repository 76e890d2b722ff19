//! Texture trait and the shared graph handle.
//!
//! - Implement [`Texture`] for a new generator (a leaf of the graph).
//! - Wrap it with [`Tex::leaf`] to get a cheaply cloned handle that composition nodes
//!   in [`crate::transform`] can reference.
//! - Drive animation through [`Tex::step_frame`] / [`Tex::set_frame`] on any node; each
//!   distinct leaf reachable from it advances exactly once per frame, however many paths
//!   lead to it.
//!
//! Evaluation is only weakly consistent: a texture may return different values for the
//! same points at the same frame (see [`crate::noise::WhiteNoise`]). Callers that need a
//! stable value should keep the result rather than re-evaluating.
//!
//! Graphs are single-threaded (`Rc` + `RefCell`); each graph is driven by one thread of
//! control at a time.
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::batch::Batch;
use crate::error::{Error, Result};
use crate::render::SampleFormat;
use crate::transform::TransformNode;

pub mod backend;
pub mod constant;

pub use backend::{ComputeBackend, CpuBackend, FnKernel, Kernel, KernelTexture};
pub use constant::ScalarConstant;

/// A procedural source of channel values over 2D or 3D space.
pub trait Texture {
    /// Number of output channels (at least 1).
    fn channels(&self) -> usize;

    /// Number of spatial dimensions of the evaluation points (2 or 3).
    fn space_dims(&self) -> usize;

    /// Evaluates every row of `points` (width [`Texture::space_dims`]) for the current frame.
    /// The result has the same leading shape and width [`Texture::channels`].
    fn evaluate(&self, points: &Batch) -> Result<Batch>;

    /// Moves to the next frame. Static textures keep the default no-op.
    fn step_frame(&mut self) {}
}

pub(crate) fn validate_shape(channels: usize, space_dims: usize) -> Result<()> {
    if channels == 0 {
        return Err(Error::config("textures need at least one channel"));
    }
    if !(2..=3).contains(&space_dims) {
        return Err(Error::config(format!(
            "textures must be 2D or 3D, got {space_dims} space dimensions"
        )));
    }
    Ok(())
}

pub(crate) struct Leaf {
    texture: RefCell<Box<dyn Texture>>,
    frame: Cell<u64>,
    channels: usize,
    space_dims: usize,
}

impl Leaf {
    fn step(&self) {
        self.texture.borrow_mut().step_frame();
        self.frame.set(self.frame.get() + 1);
    }
}

pub(crate) enum Node {
    Leaf(Leaf),
    Transform(TransformNode),
}

/// Shared handle to a node of a texture graph.
#[derive(Clone)]
pub struct Tex {
    node: Rc<Node>,
}

impl Tex {
    /// Wraps a generator as a graph leaf.
    pub fn leaf<T>(texture: T) -> Result<Self>
    where
        T: Texture + 'static,
    {
        let channels = texture.channels();
        let space_dims = texture.space_dims();
        validate_shape(channels, space_dims)?;
        Ok(Self {
            node: Rc::new(Node::Leaf(Leaf {
                texture: RefCell::new(Box::new(texture)),
                frame: Cell::new(0),
                channels,
                space_dims,
            })),
        })
    }

    /// Shorthand for a [`ScalarConstant`] leaf.
    pub fn constant(channels: usize, space_dims: usize, value: f32) -> Result<Self> {
        Self::leaf(ScalarConstant::new(channels, space_dims, value)?)
    }

    pub(crate) fn from_transform(node: TransformNode) -> Self {
        Self {
            node: Rc::new(Node::Transform(node)),
        }
    }

    pub fn channels(&self) -> usize {
        match &*self.node {
            Node::Leaf(leaf) => leaf.channels,
            Node::Transform(t) => t.channels(),
        }
    }

    pub fn space_dims(&self) -> usize {
        match &*self.node {
            Node::Leaf(leaf) => leaf.space_dims,
            Node::Transform(t) => t.space_dims(),
        }
    }

    /// Sample format the values are meant to be stored in.
    pub fn sample_format(&self) -> SampleFormat {
        match &*self.node {
            Node::Leaf(_) => SampleFormat::F32,
            Node::Transform(t) => t.sample_format(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(&*self.node, Node::Leaf(_))
    }

    /// `true` when both handles point at the same node.
    pub fn ptr_eq(&self, other: &Tex) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }

    /// Evaluates the texture at every row of `points`. Either the whole batch is
    /// returned or the call fails.
    pub fn evaluate(&self, points: &Batch) -> Result<Batch> {
        if points.width() != self.space_dims() {
            return Err(Error::shape(format!(
                "texture expects {}D points, got width {}",
                self.space_dims(),
                points.width()
            )));
        }

        let values = match &*self.node {
            Node::Leaf(leaf) => leaf.texture.borrow().evaluate(points)?,
            Node::Transform(t) => t.evaluate(points)?,
        };

        if !values.same_prefix(points) || values.width() != self.channels() {
            return Err(Error::shape(format!(
                "texture produced shape {:?} x {}, expected {:?} x {}",
                values.shape(),
                values.width(),
                points.shape(),
                self.channels()
            )));
        }
        Ok(values)
    }

    /// Distinct leaves reachable from this node, including through synchronized children.
    pub fn leaves(&self) -> Vec<Tex> {
        let mut seen: HashSet<*const Node> = HashSet::new();
        let mut out = Vec::new();
        let mut stack = vec![self.clone()];

        while let Some(tex) = stack.pop() {
            if !seen.insert(Rc::as_ptr(&tex.node)) {
                continue;
            }
            match &*tex.node {
                Node::Leaf(_) => out.push(tex),
                Node::Transform(t) => stack.extend(t.children().cloned()),
            }
        }
        out
    }

    /// Current frame: the most advanced frame among the reachable leaves.
    pub fn frame(&self) -> u64 {
        self.leaves()
            .iter()
            .filter_map(|t| match &*t.node {
                Node::Leaf(leaf) => Some(leaf.frame.get()),
                Node::Transform(_) => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// Advances every distinct reachable leaf by one frame.
    pub fn step_frame(&self) {
        let leaves = self.leaves();
        for tex in &leaves {
            if let Node::Leaf(leaf) = &*tex.node {
                leaf.step();
            }
        }
        debug!(leaves = leaves.len(), "stepped texture graph one frame");
    }

    /// Advances every reachable leaf to `frame`. Moving backwards fails with
    /// [`Error::InvalidFrameTransition`] before any leaf is touched; build a fresh graph
    /// to rewind.
    pub fn set_frame(&self, frame: u64) -> Result<()> {
        let leaves = self.leaves();
        for tex in &leaves {
            if let Node::Leaf(leaf) = &*tex.node {
                let current = leaf.frame.get();
                if current > frame {
                    return Err(Error::InvalidFrameTransition {
                        current,
                        requested: frame,
                    });
                }
            }
        }

        for tex in &leaves {
            if let Node::Leaf(leaf) = &*tex.node {
                while leaf.frame.get() < frame {
                    leaf.step();
                }
            }
        }
        debug!(leaves = leaves.len(), frame, "moved texture graph to frame");
        Ok(())
    }
}

impl fmt::Debug for Tex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_leaf() { "leaf" } else { "transform" };
        f.debug_struct("Tex")
            .field("kind", &kind)
            .field("channels", &self.channels())
            .field("space_dims", &self.space_dims())
            .finish()
    }
}
