#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod animation;
pub mod engine;
pub mod errors;
pub mod frame;
pub mod material;
pub mod pipe;
pub mod scene;
pub mod settings;

pub use animation::{LinearMotion, Motion, SpinMotion};
pub use engine::{Engine, EngineHandle, FrameHook, LogicalTime};
pub use errors::{EngineError, Result};
pub use frame::{FrameBuffers, Generation, Primitive};
pub use material::{Material, TexturedMaterial, VertexColorMaterial};
pub use pipe::{FrameConsumer, FramePacket, OutputSink, PublishedFrame, RenderPipe};
pub use scene::camera::{Camera, StaticCamera};
pub use scene::light::LightRig;
pub use scene::object::{MeshData, ObjectId, SceneObject};
pub use settings::EngineSettings;
