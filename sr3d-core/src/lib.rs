/// SR3D Core Library - Software rendering pipeline
///
/// This library provides the math kernel, mesh loading, camera, per-triangle
/// transform pipeline and depth-tested rasterizer. Front ends supply a pixel
/// surface and a held-key set and drive `Engine::advance` once per frame.

pub mod camera;
pub mod engine;
pub mod geometry;
pub mod input;
pub mod math;
pub mod obj;
pub mod pipeline;
pub mod raster;
pub mod surface;

// Re-export commonly used types
pub use camera::Camera;
pub use engine::{Engine, EngineConfig, EngineError, FpsCounter, FrameStats, RotationStep};
pub use geometry::{Mesh, Rgb, Triangle};
pub use input::{Key, KeySet, KeyState};
pub use math::{Mat4, Quaternion, Vector3D};
pub use obj::{ObjError, ObjParse};
pub use pipeline::CullMode;
pub use surface::{BottomUp, PixelBuffer, Surface};
