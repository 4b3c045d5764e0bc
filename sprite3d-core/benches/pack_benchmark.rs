//! Benchmarks for quad packing and a full render/flush cycle on the headless context.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::{Mat4, Quat, Vec2, Vec3};
use sprite3d_core::graphics::headless::{HeadlessContext, HeadlessTextures};
use sprite3d_core::graphics::{
    ObjectRenderer, QuadPacker, RenderRequest, Sprite3dRenderer, Texture, TextureId,
    VertexBufferPool,
};
use sprite3d_core::RendererConfig;

/// `n` transforms spread over a screen, rotated around y.
fn make_transforms(n: usize) -> Vec<Mat4> {
    (0..n)
        .map(|i| {
            let fi = i as f32;
            Mat4::from_scale_rotation_translation(
                Vec3::ONE,
                Quat::from_rotation_y(fi * 0.01),
                Vec3::new((fi * 7.3) % 1920.0, (fi * 13.7) % 1080.0, (fi * 3.1) % 400.0),
            )
        })
        .collect()
}

fn bench_pack(c: &mut Criterion) {
    let mut pool = VertexBufferPool::reserve(2000).unwrap();
    let texture = Texture::whole(TextureId(1), 64.0, 64.0);
    let transforms = make_transforms(2000);
    let packer = QuadPacker::new(true);

    c.bench_function("QuadPacker::pack x2000", |b| {
        b.iter(|| {
            for (slot, transform) in transforms.iter().enumerate() {
                let request = RenderRequest::new(transform, &texture).with_anchor(Vec2::splat(0.5));
                black_box(packer.pack(&mut pool, slot, &request));
            }
        });
    });
}

fn bench_render_flush(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_flush");
    let textures: Vec<_> = (0..4).map(|i| Texture::whole(TextureId(i), 64.0, 64.0)).collect();
    let transforms = make_transforms(2000);

    // 1 texture batches everything, 4 alternating textures draw every quad on its own
    for &texture_count in &[1usize, 4] {
        let mut renderer = Sprite3dRenderer::initialized(
            HeadlessContext::new(),
            HeadlessTextures::default(),
            RendererConfig::default(),
        )
        .unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(texture_count), &texture_count, |b, &count| {
            b.iter(|| {
                renderer.start();
                for (i, transform) in transforms.iter().enumerate() {
                    renderer.render(&RenderRequest::new(transform, &textures[i % count]));
                }
                renderer.stop();
                renderer.context_mut().clear_commands();
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_pack, bench_render_flush);
criterion_main!(benches);
