//! Pipeline Benchmarks
//!
//! Performance benchmarks for feature extraction and segment signing.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use melseal::crypto::MIN_KEY_BITS;
use melseal::{KeyPair, MelSpectrogram, PipelineConfig, SegmentPipeline, Signer, Waveform};

fn benchmark_mel_extraction(c: &mut Criterion) {
    let waveform = Waveform::sine_wave(440.0, 1.0, 16000);
    let extractor = MelSpectrogram::protocol_v1();

    c.bench_function("mel_1s_16k", |b| {
        b.iter(|| extractor.extract(black_box(waveform.samples()), waveform.sample_rate()))
    });
}

fn benchmark_feature_pipeline(c: &mut Criterion) {
    let waveform = Waveform::sine_wave(440.0, 10.0, 16000);
    let pipeline = SegmentPipeline::new(PipelineConfig::default()).unwrap();

    c.bench_function("features_10s_16k", |b| {
        b.iter(|| pipeline.extract_features(black_box(&waveform)).unwrap())
    });
}

fn benchmark_sign_pipeline(c: &mut Criterion) {
    let waveform = Waveform::sine_wave(440.0, 10.0, 16000);
    let pipeline = SegmentPipeline::new(PipelineConfig::default()).unwrap();
    let keys = KeyPair::generate_with_bits(MIN_KEY_BITS).unwrap();
    let signer = Signer::new(&keys);

    c.bench_function("sign_10s_16k", |b| {
        b.iter(|| {
            pipeline
                .sign_and_reconstruct(&signer, black_box(&waveform))
                .unwrap()
        })
    });
}

criterion_group!(
    benches,
    benchmark_mel_extraction,
    benchmark_feature_pipeline,
    benchmark_sign_pipeline
);
criterion_main!(benches);
