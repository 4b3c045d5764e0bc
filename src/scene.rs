use std::f32::consts::TAU;

use geese::*;
use glam::{Mat4, Quat, Vec2, Vec3};
use image::{Rgba, RgbaImage};
use log::*;
use palette::{FromColor, Hsv, Srgb};
use sprite3d::prelude::*;

const SPRITE_COUNT: usize = 600;
const RING_RADIUS: f32 = 320.0;
/// Seconds until the "loading" texture becomes drawable.
const LOAD_DELAY: f32 = 1.5;


struct DemoSprite {
    angle: f32,
    height: f32,
    spin: f32,
    scale: f32,
    texture: usize,
    tint: Srgb<u8>,
    alpha: f32,
    blend_mode: BlendMode,
    grayscale: bool,
}
impl DemoSprite {
    fn transform(&self, center: Vec2, time: f32) -> Mat4 {
        let angle = self.angle + time * 0.2;
        let position = Vec3::new(
            center.x + angle.cos() * RING_RADIUS,
            center.y + self.height,
            // pushed back sprites shrink through the pseudo-perspective
            400.0 + angle.sin() * 350.0,
        );
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            Quat::from_rotation_y(time * self.spin),
            position,
        )
    }
}


/// A ring of rotating sprites cut from two generated images.
pub struct DemoScene {
    ctx: GeeseContextHandle<Self>,
    textures: Vec<Texture>,
    loading: usize,
    sprites: Vec<DemoSprite>,
    transforms: Vec<Mat4>,
    grayscale: ShaderSource,
    time: f32,
    frames: u64,
}
impl DemoScene {
    fn on_init(&mut self, _: &events::Initialized) {
        let window = self.ctx.get::<WindowSystem>().window_handle();
        window.set_title("Sprite3d demo");
        window.set_visible(true);
    }

    fn on_update(&mut self, event: &events::NewFrame) {
        self.time += event.delta;
        self.frames += 1;

        if self.time > LOAD_DELAY && self.textures[self.loading].uvs().is_none() {
            info!("Texture {:?} finished loading", self.textures[self.loading].base());
            self.textures[self.loading].resolve(128.0, 32.0);
        }

        if self.frames % 300 == 0 {
            let stats = self.ctx.get::<SpriteSystem>().stats();
            info!(
                "{} quads, {} draw calls, {} skipped, {:.1} fps",
                stats.quads,
                stats.draw_calls,
                stats.skipped,
                1.0 / event.delta.max(f32::EPSILON)
            );
        }
    }

    fn on_draw(&mut self, _: &events::Draw) {
        let window = self.ctx.get::<WindowSystem>().window_handle();
        let size = window.inner_size();
        let center = Vec2::new(size.width as f32, size.height as f32) * 0.5;

        self.transforms.clear();
        self.transforms
            .extend(self.sprites.iter().map(|sprite| sprite.transform(center, self.time)));

        let mut sprite_sys = self.ctx.get_mut::<SpriteSystem>();
        for (sprite, transform) in self.sprites.iter().zip(&self.transforms) {
            let mut request = RenderRequest::new(transform, &self.textures[sprite.texture])
                .with_anchor(Vec2::splat(0.5))
                .with_tint(sprite.tint, sprite.alpha)
                .with_blend_mode(sprite.blend_mode);
            if sprite.grayscale {
                request = request.with_shader(&self.grayscale);
            }
            sprite_sys.draw(&request);
        }
    }

    fn checkerboard() -> RgbaImage {
        RgbaImage::from_fn(64, 64, |x, y| {
            if (x / 8 + y / 8) % 2 == 0 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([60, 60, 60, 255])
            }
        })
    }

    /// Four 32x32 cells: a filled square, a ring, a diagonal and a soft dot.
    fn atlas() -> RgbaImage {
        RgbaImage::from_fn(128, 32, |x, y| {
            let (cell, cx, cy) = (x / 32, (x % 32) as f32 - 15.5, y as f32 - 15.5);
            let distance = (cx * cx + cy * cy).sqrt();
            let alpha = match cell {
                0 => 255,
                1 if (10.0..15.0).contains(&distance) => 255,
                2 if (cx - cy).abs() < 4.0 => 255,
                3 => (255.0 * (1.0 - distance / 16.0).clamp(0.0, 1.0)) as u8,
                _ => 0,
            };
            Rgba([255, 255, 255, alpha])
        })
    }
}
impl GeeseSystem for DemoScene {
    const DEPENDENCIES: Dependencies = dependencies()
        .with::<WindowSystem>()
        .with::<Mut<SpriteSystem>>();

    const EVENT_HANDLERS: EventHandlers<Self> = event_handlers()
        .with(Self::on_init)
        .with(Self::on_update)
        .with(Self::on_draw);

    fn new(mut ctx: GeeseContextHandle<Self>) -> Self {
        let mut sprite_sys = ctx.get_mut::<SpriteSystem>();
        let checker = sprite_sys.textures_mut().register(Self::checkerboard());
        let atlas = sprite_sys.textures_mut().register(Self::atlas());
        drop(sprite_sys);

        let mut textures = vec![Texture::whole(checker, 64.0, 64.0)];
        for cell in 0..3 {
            let mut frame = Texture::new(atlas, Rectangle::new(32.0 * cell as f32, 0.0, 32.0, 32.0));
            frame.resolve(128.0, 32.0);
            textures.push(frame);
        }
        // cut to its visible 24x24 pixels, drawn as if it were still 32x32
        let mut trimmed = Texture::new(atlas, Rectangle::new(100.0, 4.0, 24.0, 24.0))
            .with_trim(Rectangle::new(4.0, 4.0, 32.0, 32.0), Rectangle::new(100.0, 4.0, 24.0, 24.0));
        trimmed.resolve(128.0, 32.0);
        textures.push(trimmed);
        // stays unresolved for a moment
        let loading = textures.len();
        textures.push(Texture::new(atlas, Rectangle::new(96.0, 0.0, 32.0, 32.0)));

        let sprites = (0..SPRITE_COUNT)
            .map(|i| {
                let t = i as f32 / SPRITE_COUNT as f32;
                let hsv: Hsv = Hsv::new(t * 360.0, 0.6, 1.0);
                let hue: Srgb = Srgb::from_color(hsv);
                DemoSprite {
                    angle: t * TAU * 3.0,
                    height: (t * TAU * 7.0).sin() * 160.0,
                    spin: 0.5 + (i % 7) as f32 * 0.3,
                    scale: 0.75 + (i % 3) as f32 * 0.25,
                    // runs of ten share a texture
                    texture: (i / 10) % textures.len(),
                    tint: hue.into_format(),
                    alpha: if i % 4 == 0 { 0.6 } else { 1.0 },
                    blend_mode: if i % 50 < 5 { BlendMode::Add } else { BlendMode::Normal },
                    grayscale: i % 90 < 10,
                }
            })
            .collect();

        info!("Demo scene with {SPRITE_COUNT} sprites created");
        Self {
            ctx,
            textures,
            loading,
            sprites,
            transforms: Vec::with_capacity(SPRITE_COUNT),
            grayscale: ShaderSource::new("sprite3d-grayscale", include_str!("../shaders/grayscale.wgsl")),
            time: 0.0,
            frames: 0,
        }
    }
}
