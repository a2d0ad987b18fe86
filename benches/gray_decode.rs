use criterion::{Criterion, black_box, criterion_group, criterion_main};
use metrology_recon::config::DecoderConfig;
use metrology_recon::decoder::synthetic::render_sequence;
use metrology_recon::decoder::{CenterOffsets, PatternDecoder, build_validity_mask, gray_to_binary};
use metrology_recon::decoder::{InMemorySource, PatternSource};

fn scene(width: usize, height: usize) -> InMemorySource {
    render_sequence(width, height, 10, 10, |x, y| {
        (x > 8 && y > 8).then_some((x as u32, y as u32))
    })
}

fn bench_gray_to_binary(c: &mut Criterion) {
    let codes: Vec<u32> = (0..1u32 << 16).collect();
    c.bench_function("gray_to_binary_65536", |b| {
        b.iter(|| codes.iter().map(|&g| gray_to_binary(black_box(g))).sum::<u32>())
    });
}

fn bench_validity_mask_640x480(c: &mut Criterion) {
    let source = scene(640, 480);
    let (white, blank) = (source.white().unwrap(), source.blank().unwrap());
    let config = DecoderConfig::default();
    c.bench_function("validity_mask_640x480", |b| {
        b.iter(|| build_validity_mask(black_box(&white), black_box(&blank), &config).unwrap())
    });
}

fn bench_decode_sequence_640x480(c: &mut Criterion) {
    let source = scene(640, 480);
    let decoder = PatternDecoder::new(DecoderConfig::default(), CenterOffsets::new(0.0, 0.0));
    c.bench_function("decode_sequence_640x480", |b| {
        b.iter(|| decoder.decode_sequence(black_box(&source)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_gray_to_binary,
    bench_validity_mask_640x480,
    bench_decode_sequence_640x480
);
criterion_main!(benches);
