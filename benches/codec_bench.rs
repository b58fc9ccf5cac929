//! EBL 转换性能基准测试.
//!
//! 覆盖解码、立体声交织编码两条核心路径.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use ebl::format::{DecodedSample, NamingPolicy};

/// 生成 S16 单声道 PCM 数据
fn make_s16_pcm(nb_samples: usize, seed: i16) -> Vec<u8> {
    let mut data = Vec::with_capacity(nb_samples * 2);
    for i in 0..nb_samples {
        let v = ((i % 256) as i16).wrapping_mul(100).wrapping_add(seed);
        data.extend_from_slice(&v.to_le_bytes());
    }
    data
}

/// 构建单声道 EBL 文件 (第二帧头与对齐填充重叠)
fn make_mono_ebl(pcm: &[u8]) -> Vec<u8> {
    let field = |s: &str| {
        let mut f: Vec<u8> = s.encode_utf16().flat_map(u16::to_le_bytes).collect();
        f.resize(64, 0);
        f
    };
    let mut buf = Vec::with_capacity(pcm.len() + 512);
    buf.extend_from_slice(b"FORM");
    buf.extend_from_slice(&0u32.to_be_bytes());
    buf.extend_from_slice(b"E5B0TOC2");
    buf.extend_from_slice(&78u32.to_be_bytes());
    buf.extend_from_slice(b"E5S1");
    buf.extend_from_slice(&0u32.to_be_bytes());
    buf.extend_from_slice(&102u32.to_be_bytes());
    buf.extend_from_slice(&[0, 0]);
    buf.extend_from_slice(&field("Bench"));
    buf.extend_from_slice(b"E5S1");
    buf.extend_from_slice(&0u32.to_be_bytes());
    buf.extend_from_slice(&[0u8; 6]);
    buf.extend_from_slice(&field("Bench"));
    let end = 184 + pcm.len() as u32 - 2;
    let mut words = [0u32; 12];
    words[1] = 184;
    words[2] = 184;
    words[3] = end;
    words[4] = end;
    words[9] = 44100;
    for w in words {
        buf.extend_from_slice(&w.to_le_bytes());
    }
    buf.extend_from_slice(&field(""));
    buf.extend_from_slice(&[0u8; 4]);
    buf.extend_from_slice(pcm);
    let form_size = (buf.len() - 8) as u32;
    buf[4..8].copy_from_slice(&form_size.to_be_bytes());
    buf
}

fn bench_ebl_decode(c: &mut Criterion) {
    c.bench_function("ebl_decode_1s_mono", |b| {
        let data = make_mono_ebl(&make_s16_pcm(44100, 0));
        b.iter(|| {
            let sample = ebl::format::decode_bytes(black_box(data.clone())).unwrap();
            black_box(sample.nb_samples());
        });
    });
}

fn bench_wav_encode_stereo(c: &mut Criterion) {
    c.bench_function("wav_encode_1s_stereo", |b| {
        let left = make_s16_pcm(44100, 0);
        let right = make_s16_pcm(44100, 7);
        let policy = NamingPolicy::new("bench.ebl");
        b.iter(|| {
            let sample = DecodedSample::from_pcm(44100, left.clone(), right.clone());
            let wav = ebl::format::encode(black_box(sample), &policy).unwrap();
            black_box(wav.data.len());
        });
    });
}

criterion_group!(benches, bench_ebl_decode, bench_wav_encode_stereo);
criterion_main!(benches);
