pub mod prelude {
    pub use sprite3d_core::{
        events, graphics, ConfigSystem, RenderError, RendererConfig, Sprite3dEngine,
    };
    pub use sprite3d_core::graphics::{
        BlendMode, FrameStats, ObjectRenderer, Rectangle, RenderRequest, ShaderSource,
        SpriteSystem, Texture, TextureId, WindowSystem,
    };
}
