//! WAV (RIFF WAVE) 封装器.
//!
//! 将解码得到的 16 位 PCM 数据写入标准 44 字节头部的 WAV 文件.
//!
//! 整个输出在内存中一次生成: 头部之后紧跟音频数据, 不需要回填大小字段.
//! 立体声时两个声道在写入输出缓冲区的同时完成交织.

use bytes::{BufMut, Bytes, BytesMut};
use ebl_core::{ChannelLayout, EblError, EncodeError};
use log::{debug, warn};

use crate::io::IoContext;
use crate::naming::{NamingPolicy, resolve_output_name};
use crate::sample::DecodedSample;

/// WAV 音频格式码: PCM 整数
const WAV_FORMAT_PCM: u16 = 0x0001;
/// 固定位深
const BITS_PER_SAMPLE: u16 = 16;
/// 每个采样的字节数
const BYTES_PER_SAMPLE: u16 = BITS_PER_SAMPLE / 8;
/// 标准 PCM fmt 块大小
const FMT_CHUNK_SIZE: u32 = 16;
/// RIFF 大小字段中 data 之前的固定部分: "WAVE" + fmt 块 + data 块头
const RIFF_PREAMBLE_LEN: u32 = 36;

/// WAV 头部长度
pub const WAV_HEADER_LEN: usize = 44;

/// WAV 头部字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    /// 声道数
    pub channels: u16,
    /// 采样率
    pub sample_rate: u32,
    /// 字节率 = 采样率 x 声道数 x 2
    pub byte_rate: u32,
    /// 块对齐 = 声道数 x 2
    pub block_align: u16,
    /// data 块大小
    pub data_size: u32,
}

impl WavHeader {
    /// 由采样率、声道布局和音频数据长度计算头部字段
    pub fn new(
        sample_rate: u32,
        layout: ChannelLayout,
        data_len: usize,
    ) -> Result<Self, EncodeError> {
        let channels = layout.channels();
        let block_align = channels * BYTES_PER_SAMPLE;
        let byte_rate = sample_rate
            .checked_mul(u32::from(block_align))
            .ok_or(EncodeError::ByteRateOverflow {
                sample_rate,
                channels,
            })?;
        let data_size = u32::try_from(data_len)
            .ok()
            .filter(|size| size.checked_add(RIFF_PREAMBLE_LEN).is_some())
            .ok_or(EncodeError::PayloadTooLarge { len: data_len })?;

        Ok(Self {
            channels,
            sample_rate,
            byte_rate,
            block_align,
            data_size,
        })
    }

    /// RIFF 大小字段 (文件大小 - 8)
    pub fn riff_size(&self) -> u32 {
        RIFF_PREAMBLE_LEN + self.data_size
    }

    /// 按小端序写入 44 字节头部
    pub fn write_to(&self, buf: &mut impl BufMut) {
        // RIFF header
        buf.put_slice(b"RIFF");
        buf.put_u32_le(self.riff_size());
        buf.put_slice(b"WAVE");

        // fmt chunk
        buf.put_slice(b"fmt ");
        buf.put_u32_le(FMT_CHUNK_SIZE);
        buf.put_u16_le(WAV_FORMAT_PCM);
        buf.put_u16_le(self.channels);
        buf.put_u32_le(self.sample_rate);
        buf.put_u32_le(self.byte_rate);
        buf.put_u16_le(self.block_align);
        buf.put_u16_le(BITS_PER_SAMPLE);

        // data chunk header
        buf.put_slice(b"data");
        buf.put_u32_le(self.data_size);
    }
}

/// 编码结果
#[derive(Debug, Clone)]
pub struct EncodedWav {
    /// 按命名策略确定的输出文件名
    pub filename: String,
    /// 头部字段
    pub header: WavHeader,
    /// 完整的 WAV 文件内容 (头部 + 音频数据)
    pub data: Bytes,
}

impl EncodedWav {
    /// 音频数据部分 (不含头部)
    pub fn payload(&self) -> &[u8] {
        &self.data[WAV_HEADER_LEN..]
    }

    /// 写入输出流
    pub fn write_to(&self, io: &mut IoContext) -> Result<(), EncodeError> {
        io.write_all(&self.data).map_err(io_error)?;
        io.flush().map_err(io_error)?;
        Ok(())
    }
}

/// 将解码结果编码为 WAV
///
/// 声道 B 为空时输出单声道, 数据为声道 A 原样; 否则输出交织后的立体声,
/// 长度以声道 A 为准.
pub fn encode(sample: DecodedSample, policy: &NamingPolicy) -> Result<EncodedWav, EncodeError> {
    let filename = resolve_output_name(&sample, policy);
    let sample_rate = sample.sample_rate();
    let layout = sample.layout();
    let (channel_a, channel_b) = sample.into_channels();

    let data_len = match layout {
        ChannelLayout::Mono => channel_a.len(),
        ChannelLayout::Stereo => (channel_a.len() / 2) * 4,
    };
    let header = WavHeader::new(sample_rate, layout, data_len)?;

    let mut buf = BytesMut::with_capacity(WAV_HEADER_LEN + data_len);
    header.write_to(&mut buf);
    match layout {
        ChannelLayout::Mono => buf.put_slice(&channel_a),
        ChannelLayout::Stereo => interleave_into(&mut buf, &channel_a, &channel_b),
    }

    debug!(
        "WAV 编码: {} -> {} Hz, {} 声道, data_size={}",
        filename, header.sample_rate, header.channels, header.data_size
    );

    Ok(EncodedWav {
        filename,
        header,
        data: buf.freeze(),
    })
}

/// 交织两个声道: A0 B0 A1 B1 ...
///
/// 声道 B 较短时缺失的右声道采样补零; 较长时多余部分被忽略.
pub fn interleave_into(buf: &mut impl BufMut, left: &[u8], right: &[u8]) {
    if left.len() != right.len() {
        warn!(
            "交织时声道长度不一致: A={}, B={}, 以声道 A 为准",
            left.len(),
            right.len()
        );
    }

    let mut right_samples = right.chunks_exact(BYTES_PER_SAMPLE as usize);
    for l in left.chunks_exact(BYTES_PER_SAMPLE as usize) {
        buf.put_slice(l);
        match right_samples.next() {
            Some(r) => buf.put_slice(r),
            None => buf.put_bytes(0, BYTES_PER_SAMPLE as usize),
        }
    }
}

/// 将 I/O 层错误转换为编码错误
fn io_error(err: EblError) -> EncodeError {
    match err {
        EblError::Io(e) => EncodeError::Io(e),
        other => EncodeError::Io(std::io::Error::other(other.to_string())),
    }
}
