mod vertex;
pub use vertex::{
    pack_color, tint_from_hex, Vertex, COLOR_OFFSET, INDICES_PER_QUAD, POSITION_OFFSET, QUAD_STRIDE,
    UV_OFFSET, VERTEX_SIZE, VERTICES_PER_QUAD,
};

mod context;
pub use context::*;

mod buffer_pool;
pub use buffer_pool::{VertexBufferPool, MAX_CAPACITY};

mod texture;
pub use texture::{Rectangle, Texture, TextureId, TextureManager, TextureUvs};

mod shader;
pub use shader::{ShaderCache, ShaderId, ShaderSource, PROJECTION_UNIFORM};

mod request;
pub use request::RenderRequest;

mod quad_packer;
pub use quad_packer::{CornerOffsets, QuadPacker};

mod partition;
pub use partition::{runs, BatchState, Run, Runs};

mod projection;
pub use projection::{screen_projection, ProjectionComposer, DEPTH_SCALE, PSEUDO_PERSPECTIVE};

mod stats;
pub use stats::{total_draw_calls, FrameStats};

mod object_renderer;
pub use object_renderer::ObjectRenderer;

mod sprite_renderer;
pub use sprite_renderer::{RendererState, Sprite3dRenderer};

pub mod headless;

mod dynamic_buffer;
pub use dynamic_buffer::DynamicBuffer;

mod texture_bundle;
pub use texture_bundle::TextureBundle;

mod wgpu_context;
pub use wgpu_context::{WgpuContext, WgpuTextures, DEPTH_FORMAT};

mod window_system;
pub use window_system::{WindowSystem, DEFAULT_WINDOW_SIZE};

mod graphics_system;
pub use graphics_system::GraphicsSystem;

mod sprite_system;
pub use sprite_system::{SpriteSystem, WgpuSpriteRenderer};
