use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use iconvg::{decode, BrokenCanvas, DecodeOptions, Rectangle};

/// Encodes a coordinate in the 1-byte form, valid for -64..=63.
fn coord1(v: i32) -> u8 {
    ((v + 64) << 1) as u8
}

/// Builds a synthetic icon: an explicit viewbox plus a grid of small
/// filled diamonds, one drawing region each.
fn build_test_icon() -> Vec<u8> {
    let mut data = vec![
        0x89, 0x49, 0x56, 0x47, // magic
        0x02, // one metadata chunk
        0x0A, // chunk length 5
        0x00, // metadata id 0 (viewbox)
        coord1(-32),
        coord1(-32),
        coord1(32),
        coord1(32),
    ];

    for i in 0..16 {
        for j in 0..16 {
            let x = i * 4 - 32;
            let y = j * 4 - 32;
            data.push(0xC0); // begin a flat-color path
            data.push(coord1(x));
            data.push(coord1(y));
            data.push(0x02); // three absolute line_tos
            data.push(coord1(x + 2));
            data.push(coord1(y + 2));
            data.push(coord1(x));
            data.push(coord1(y + 3));
            data.push(coord1(x - 2));
            data.push(coord1(y + 2));
            data.push(0xE1); // close the path
        }
    }

    data
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut g = c.benchmark_group("IconVG");

    let data = build_test_icon();
    let dst = Rectangle::new(0.0, 0.0, 64.0, 64.0);

    g.bench_function(BenchmarkId::new("decode", "diamond-grid"), |b| {
        b.iter(|| {
            let mut canvas = BrokenCanvas::new(None);
            decode(
                &mut canvas,
                dst,
                black_box(&data),
                &DecodeOptions::default(),
            )
            .unwrap();
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
