use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::RenderError;
use crate::utils::*;
use super::context::{GraphicsContext, ProgramHandle};

/// Name of the combined projection uniform every sprite shader declares.
pub const PROJECTION_UNIFORM: &str = "projectionMatrix3d";

static NEXT_SHADER_ID: AtomicU64 = AtomicU64::new(1);


/// Identity of a logical shader, independent of any graphics context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderId(u64);
impl ShaderId {
    /// The built-in sprite shader.
    pub const SPRITE3D: ShaderId = ShaderId(0);
}

/// WGSL source of a logical shader. Entry points are `vs_main` and `fs_main`.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderSource {
    id: ShaderId,
    label: Cow<'static, str>,
    wgsl: Cow<'static, str>,
}
impl ShaderSource {
    /// Creates a shader with a fresh id.
    pub fn new(label: impl Into<Cow<'static, str>>, wgsl: impl Into<Cow<'static, str>>) -> Self {
        Self {
            id: ShaderId(NEXT_SHADER_ID.fetch_add(1, Ordering::Relaxed)),
            label: label.into(),
            wgsl: wgsl.into(),
        }
    }

    /// The default shader used by sprites without an override.
    pub fn sprite3d() -> Self {
        Self {
            id: ShaderId::SPRITE3D,
            label: Cow::Borrowed("sprite3d"),
            wgsl: Cow::Borrowed(include_str!("../../shaders/sprite3d.wgsl")),
        }
    }

    pub fn id(&self) -> ShaderId {
        self.id
    }
    pub fn label(&self) -> &str {
        &self.label
    }
    pub fn wgsl(&self) -> &str {
        &self.wgsl
    }
}


/// Programs compiled for shader overrides, keyed by (shader, context generation).
///
/// A context change invalidates every entry at once.
#[derive(Debug, Default)]
pub struct ShaderCache {
    programs: HashMap<(ShaderId, u32), ProgramHandle>,
}
impl ShaderCache {
    pub fn get(&self, shader: ShaderId, generation: u32) -> Option<ProgramHandle> {
        self.programs.get(&(shader, generation)).copied()
    }

    /// Returns the program for `source`, compiling it on first use in this context.
    pub fn resolve<G: GraphicsContext>(&mut self, context: &mut G, source: &ShaderSource) -> Result<ProgramHandle, RenderError> {
        let key = (source.id(), context.generation());
        if let Some(program) = self.programs.get(&key) {
            return Ok(*program);
        }

        let program = context.create_program(source)?;
        debug!("Compiled shader '{}' as {:?} for context {}", source.label(), program, key.1);
        self.programs.insert(key, program);
        Ok(program)
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Forgets every program, e.g. after the context was lost.
    pub fn invalidate(&mut self) {
        self.programs.clear();
    }

    /// Deletes the programs still alive in the current context and forgets all.
    pub fn release<G: GraphicsContext>(&mut self, context: &mut G) {
        let generation = context.generation();
        self.programs
            .drain()
            .filter(|((_, gen), _)| *gen == generation)
            .for_each(|(_, program)| context.delete_program(program));
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::headless::{Command, HeadlessContext};

    #[test]
    fn ids_are_unique() {
        let a = ShaderSource::new("a", "");
        let b = ShaderSource::new("b", "");
        assert_ne!(a.id(), b.id());
        assert_ne!(a.id(), ShaderId::SPRITE3D);
        assert_eq!(ShaderSource::sprite3d().id(), ShaderId::SPRITE3D);
    }

    #[test]
    fn default_shader_declares_projection() {
        let source = ShaderSource::sprite3d();
        assert!(source.wgsl().contains("vs_main"));
        assert!(source.wgsl().contains("fs_main"));
    }

    #[test]
    fn compiles_once_per_generation() {
        let mut ctx = HeadlessContext::new();
        let mut cache = ShaderCache::default();
        let source = ShaderSource::new("tinted", "// wgsl");

        let first = cache.resolve(&mut ctx, &source).unwrap();
        let second = cache.resolve(&mut ctx, &source).unwrap();
        assert_eq!(first, second);
        assert_eq!(ctx.count(|c| matches!(c, Command::CreateProgram { .. })), 1);

        ctx.lose_context();
        let third = cache.resolve(&mut ctx, &source).unwrap();
        assert_ne!(first, third);
        assert_eq!(cache.len(), 2);

        cache.invalidate();
        assert!(cache.is_empty());
    }

    #[test]
    fn release_deletes_live_programs_only() {
        let mut ctx = HeadlessContext::new();
        let mut cache = ShaderCache::default();
        let source = ShaderSource::new("old", "");
        cache.resolve(&mut ctx, &source).unwrap();
        ctx.lose_context();
        let live = cache.resolve(&mut ctx, &source).unwrap();

        cache.release(&mut ctx);
        assert!(cache.is_empty());
        assert_eq!(
            ctx.commands().iter().filter(|c| matches!(c, Command::DeleteProgram(_))).collect::<Vec<_>>(),
            vec![&Command::DeleteProgram(live)]
        );
    }
}
