use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use memspan_core::Rgba;
use memspan_experiment::{DrawCommand, Scene};
use memspan_render::SkiaRenderer;

const WIDTH: u32 = 1280;
const HEIGHT: u32 = 720;

/// A 4x4 response grid with a few selected cells and the countdown overlay
fn response_scene() -> Scene {
    let mut scene = Scene::new(Rgba::rgb(128, 128, 128));
    for row in 0..4 {
        for col in 0..4 {
            let pos = (col as f32 * 120.0 - 180.0, 180.0 - row as f32 * 120.0);
            scene.push(DrawCommand::Rect {
                pos,
                size: (100.0, 100.0),
                color: Rgba::WHITE,
            });
            if (row + col) % 3 == 0 {
                scene.push(DrawCommand::Border {
                    pos,
                    size: (100.0, 100.0),
                    width: 5.0,
                    color: Rgba::rgb(255, 0, 0),
                });
            }
        }
    }
    scene.push(DrawCommand::Text {
        text: "7".into(),
        pos: (-330.0, 300.0),
        size: 40.0,
        color: Rgba::BLACK,
    });
    scene
}

pub fn bench_render_scene(c: &mut Criterion) {
    let mut g = c.benchmark_group("render_scene");
    g.sample_size(40);

    g.bench_function("response_grid", |b| {
        b.iter_batched(
            || {
                (
                    SkiaRenderer::new(WIDTH, HEIGHT, None).unwrap(),
                    vec![0u8; (WIDTH * HEIGHT * 4) as usize],
                    response_scene(),
                )
            },
            |(mut r, mut fb, scene)| {
                let stats = r.render(&scene, &mut fb);
                black_box(stats.map(|s| s.total)).ok();
            },
            BatchSize::SmallInput,
        )
    });

    g.bench_function("blank", |b| {
        let mut r = SkiaRenderer::new(WIDTH, HEIGHT, None).unwrap();
        let mut fb = vec![0u8; (WIDTH * HEIGHT * 4) as usize];
        let scene = Scene::new(Rgba::rgb(128, 128, 128));
        b.iter(|| {
            black_box(r.render(&scene, &mut fb).map(|s| s.total)).ok();
        })
    });

    g.finish();
}

criterion_group!(benches, bench_render_scene);
criterion_main!(benches);
