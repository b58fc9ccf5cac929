//! 解码结果定义.
//!
//! [`DecodedSample`] 是 EBL 解码器的唯一输出, 也是 WAV 编码器的唯一输入.
//! 解码器分配两个声道缓冲区, 编码器按值接收, 所有权完整转移.

use ebl_core::{Anomaly, ChannelLayout};
use serde::Serialize;

/// 固定元数据块中 32 位字的数量
pub const METADATA_WORD_COUNT: usize = 12;

/// 声道 A 范围起点 (v2) 的下标
pub const WORD_RANGE_START_A: usize = 1;
/// 声道 A 范围终点 (v3) 的下标
pub const WORD_RANGE_END_A: usize = 2;
/// 声道 B 范围起点 (v4) 的下标
pub const WORD_RANGE_START_B: usize = 3;
/// 声道 B 范围终点 (v5) 的下标
pub const WORD_RANGE_END_B: usize = 4;
/// 采样率 (第 10 个字) 的下标
pub const WORD_SAMPLE_RATE: usize = 9;

/// 各级帧头中的描述性字段
///
/// 这些字段只用于记录和诊断, 不参与数据定位.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FrameHeaders {
    /// FORM 声明的剩余大小
    pub form_size: u32,
    /// E5B0TOC2 中的下一头部大小
    pub toc_next_header_size: u32,
    /// 元数据帧头的 data_size
    pub meta_data_size: u32,
    /// 元数据帧头的 data_offset (下一结构的绝对偏移)
    pub meta_data_offset: u32,
    /// 对齐填充的字节数
    pub padding_len: usize,
    /// 第二个 E5S1 头是否与对齐填充重叠
    pub second_header_in_padding: bool,
    /// 第二个 E5S1 头的 size 字段
    pub second_frame_size: u32,
    /// 第二个 E5S1 头的 6 字节不透明数据
    pub second_frame_opaque: [u8; 6],
}

/// EBL 解码结果
#[derive(Debug, Clone)]
pub struct DecodedSample {
    pub(crate) declared_total_size: u64,
    pub(crate) bytes_consumed: u64,
    pub(crate) header_filename: String,
    pub(crate) embedded_filename: String,
    pub(crate) embedded_comment: String,
    pub(crate) metadata_words: [u32; METADATA_WORD_COUNT],
    pub(crate) frames: FrameHeaders,
    pub(crate) channel_a: Vec<u8>,
    pub(crate) channel_b: Vec<u8>,
    pub(crate) anomalies: Vec<Anomaly>,
}

impl DecodedSample {
    /// 由原始 PCM 数据构造, 不经过 EBL 解码
    ///
    /// 用于合成数据和编码器测试. 元数据字中只有采样率有意义.
    pub fn from_pcm(sample_rate: u32, channel_a: Vec<u8>, channel_b: Vec<u8>) -> Self {
        let mut metadata_words = [0u32; METADATA_WORD_COUNT];
        metadata_words[WORD_SAMPLE_RATE] = sample_rate;
        Self {
            declared_total_size: 0,
            bytes_consumed: 0,
            header_filename: String::new(),
            embedded_filename: String::new(),
            embedded_comment: String::new(),
            metadata_words,
            frames: FrameHeaders::default(),
            channel_a,
            channel_b,
            anomalies: Vec::new(),
        }
    }

    /// 设置内嵌文件名 (两处副本相同)
    pub fn with_filename(mut self, name: &str) -> Self {
        self.header_filename = name.to_string();
        self.embedded_filename = name.to_string();
        self
    }

    /// 声明的文件总大小 (FORM 大小 + 8)
    pub fn declared_total_size(&self) -> u64 {
        self.declared_total_size
    }

    /// 解码时实际消耗的字节数
    pub fn bytes_consumed(&self) -> u64 {
        self.bytes_consumed
    }

    /// 元数据帧头中的文件名
    pub fn header_filename(&self) -> &str {
        &self.header_filename
    }

    /// 固定元数据块中的文件名
    pub fn embedded_filename(&self) -> &str {
        &self.embedded_filename
    }

    /// 固定元数据块中的注释
    pub fn embedded_comment(&self) -> &str {
        &self.embedded_comment
    }

    /// 采样率 (Hz)
    pub fn sample_rate(&self) -> u32 {
        self.metadata_words[WORD_SAMPLE_RATE]
    }

    /// 固定元数据块中的全部 12 个原始字
    pub fn metadata_words(&self) -> &[u32; METADATA_WORD_COUNT] {
        &self.metadata_words
    }

    /// 各级帧头字段
    pub fn frames(&self) -> &FrameHeaders {
        &self.frames
    }

    /// 声道 A 数据
    pub fn channel_a(&self) -> &[u8] {
        &self.channel_a
    }

    /// 声道 B 数据 (单声道时为空)
    pub fn channel_b(&self) -> &[u8] {
        &self.channel_b
    }

    /// 声道布局
    pub fn layout(&self) -> ChannelLayout {
        ChannelLayout::from_channel_b_len(self.channel_b.len())
    }

    /// 每声道采样数
    pub fn nb_samples(&self) -> usize {
        self.channel_a.len() / 2
    }

    /// 时长 (秒)
    pub fn duration(&self) -> Option<f64> {
        if self.sample_rate() == 0 {
            return None;
        }
        Some(self.nb_samples() as f64 / f64::from(self.sample_rate()))
    }

    /// 解码过程中记录的非致命异常
    pub fn anomalies(&self) -> &[Anomaly] {
        &self.anomalies
    }

    /// 消耗自身, 取出两个声道缓冲区
    pub fn into_channels(self) -> (Vec<u8>, Vec<u8>) {
        (self.channel_a, self.channel_b)
    }
}
