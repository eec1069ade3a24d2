use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};

use brepkit::geometry::Point3;
use brepkit::mesh::RegularGrid;
use brepkit::tools::{SolidMerger, grid_to_solid};

fn merger(c: &mut Criterion) {
    let mut group = c.benchmark_group("merger");

    for side in [4u32, 10, 20] {
        group.bench_with_input(
            BenchmarkId::new("cells", side * side * side * 2),
            &side,
            |b, &side| {
                b.iter_batched(
                    || {
                        let length = f64::from(side);
                        let left = RegularGrid::new(
                            Point3::new(0.0, 0.0, 0.0),
                            [side, side, side],
                            [1.0, 1.0, 1.0],
                        );
                        let right = RegularGrid::new(
                            Point3::new(length, 0.0, 0.0),
                            [side, side, side],
                            [1.0, 1.0, 1.0],
                        );
                        (
                            grid_to_solid(&left).unwrap(),
                            grid_to_solid(&right).unwrap(),
                        )
                    },
                    |(first, second)| {
                        std::hint::black_box(
                            SolidMerger::new(vec![&first, &second], 1e-9)
                                .merge()
                                .unwrap(),
                        )
                    },
                    BatchSize::LargeInput,
                )
            },
        );
    }
}

criterion_group!(bench, merger);
criterion_main!(bench);
