//! Mixdown and WAV encode benchmarks

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use mx_core::{DecodedAudio, MasterParams, Track, TrackId};
use mx_offline::{AudioEncoder, WavBitDepth, WavEncoder, mixdown};

const SAMPLE_RATE: u32 = 44100;
const TRACK_COUNTS: &[usize] = &[1, 4, 16];

fn sine_track(id: u64, seconds: usize, freq: f32) -> Track {
    let frames = SAMPLE_RATE as usize * seconds;
    let samples: Vec<f32> = (0..frames)
        .map(|n| (2.0 * std::f32::consts::PI * freq * n as f32 / SAMPLE_RATE as f32).sin() * 0.25)
        .collect();
    let audio = DecodedAudio::mono(SAMPLE_RATE, samples).unwrap();
    Track::with_audio(TrackId::new(id), format!("sine {freq}"), audio).gain_of(0.8)
}

fn bench_mixdown(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixdown_10s");
    let master = MasterParams::new(0.9);

    for &count in TRACK_COUNTS {
        let tracks: Vec<Track> = (0..count)
            .map(|i| sine_track(i as u64, 10, 110.0 * (i + 1) as f32))
            .collect();
        group.throughput(Throughput::Elements((SAMPLE_RATE as u64 * 10) * count as u64));

        group.bench_with_input(BenchmarkId::from_parameter(count), &tracks, |b, tracks| {
            b.iter(|| black_box(mixdown(black_box(tracks), &master)))
        });
    }

    group.finish();
}

fn bench_wav_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("wav_encode_10s");
    let tracks = vec![sine_track(1, 10, 440.0)];
    let mix = mixdown(&tracks, &MasterParams::default()).unwrap();
    group.throughput(Throughput::Elements(mix.frames() as u64 * mix.num_channels() as u64));

    for depth in [WavBitDepth::Int16, WavBitDepth::Float32] {
        let encoder = WavEncoder::new(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth.bits()), &mix, |b, mix| {
            b.iter(|| black_box(encoder.encode(black_box(mix))))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_mixdown, bench_wav_encode);
criterion_main!(benches);
