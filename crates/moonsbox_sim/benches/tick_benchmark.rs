//! Benchmark for full simulation ticks.
//!
//! Run with: cargo bench --package moonsbox_sim --bench tick_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use moonsbox_sim::{Brush, Point, Rect, Shape, SimConfig, Simulation};

/// A world with a sand heap, a pool and a lava line, settled for a few ticks.
fn busy_world(size: i32, temp_exchange: bool) -> Simulation {
    let config = SimConfig {
        map_width: size,
        map_height: size,
        temp_exchange,
        ..SimConfig::default()
    };
    let mut sim = Simulation::with_builtin(config).expect("simulation");
    let sand = sim.material_id("Sand").expect("sand");
    let water = sim.material_id("Water").expect("water");
    let lava = sim.material_id("Lava").expect("lava");

    let half = size / 2;
    sim.paint(Shape::Ellipse(Rect::new(0, half, half, half)), Brush::Material(sand))
        .expect("sand");
    sim.paint(Shape::Rect(Rect::new(half, 0, half, half / 2)), Brush::Material(water))
        .expect("water");
    sim.stroke(Point::new(0, size - 2), Point::new(size - 1, size - 2), Brush::Material(lava))
        .expect("lava");
    for _ in 0..5 {
        sim.tick().expect("tick");
    }
    sim
}

fn benchmark_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");

    for size in [64, 128, 256] {
        group.throughput(Throughput::Elements((size * size) as u64));
        for temp_exchange in [false, true] {
            let label = if temp_exchange { "thermal" } else { "plain" };
            let mut sim = busy_world(size, temp_exchange);
            group.bench_with_input(BenchmarkId::new(label, size), &size, |b, _| {
                b.iter(|| black_box(sim.tick().expect("tick")));
            });
        }
    }

    group.finish();
}

fn benchmark_paint(c: &mut Criterion) {
    let mut sim = busy_world(256, true);
    let heat = Brush::heater();

    c.bench_function("paint_heat_stroke", |b| {
        b.iter(|| {
            black_box(
                sim.stroke(Point::new(0, 0), Point::new(255, 255), heat)
                    .expect("stroke"),
            )
        });
    });
}

criterion_group!(benches, benchmark_tick, benchmark_paint);
criterion_main!(benches);
