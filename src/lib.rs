//! # Kiln
//!
//! Declarative render-graph core for real-time 3D rendering.
//!
//! A frame is described as named passes reading and writing named
//! resources; the graph resolves dependencies, orders passes, generates
//! layout/access barriers, tracks resource lifetimes for transient-memory
//! aliasing, and sorts the frame's draw calls — serially or across a
//! worker pool.
//!
//! ```ignore
//! let mut graph = RenderGraph::new();
//! let shadow = graph.create_depth_buffer("shadow_map", 2048, 2048, TextureFormat::Depth32Float);
//! let backbuffer = graph.import_backbuffer(1920, 1080, TextureFormat::Bgra8Unorm);
//!
//! let pass = graph.add_pass("shadow_pass", PassKind::Graphics).unwrap();
//! pass.set_depth_attachment(DepthAttachment::clear(shadow, 1.0));
//! pass.set_execute_callback(|ctx| { /* record commands */ });
//!
//! graph.compile()?;
//! graph.execute(dt, &mut cmd, &mut renderer)?;
//! ```
//!
//! The core is backend-agnostic: Vulkan and Metal backends plug in through
//! [`backend::CommandContext`] and the numeric mapping methods on the
//! format/layout/access types.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod backend;
pub mod barrier;
pub mod draw;
pub mod errors;
pub mod format;
pub mod graph;
pub mod handle;
pub mod pass;
pub mod resource;
pub mod worker;

pub use backend::CommandContext;
pub use barrier::{AccessFlags, ImageLayout, PipelineStageFlags, ResourceBarrier};
pub use draw::{
    DrawCall, DrawList, GeometryId, MAX_DRAW_CALLS, PARALLEL_SORT_THRESHOLD, PassDrawList,
    encode_sort_key,
};
pub use errors::GraphError;
pub use format::TextureFormat;
pub use graph::{
    CompiledPass, FrameStats, MAX_PASSES, MAX_RESOURCES, PassContext, RenderGraph,
    compiler::{MAX_PASS_BARRIERS, MAX_PASS_PREDECESSORS},
};
pub use handle::ResourceHandle;
pub use pass::{
    ColorAttachment, DepthAttachment, LoadOp, MAX_COLOR_ATTACHMENTS, MAX_READ_BINDINGS,
    MAX_WRITE_BINDINGS, Pass, PassKind, ResourceBinding, ShaderStageFlags, StoreOp,
};
pub use resource::{
    GpuPayload, MAX_NAME_LEN, ResourceDescriptor, ResourceEntry, ResourceKind, ResourceUsage,
};
pub use worker::{WaitCounter, WorkerPool};
