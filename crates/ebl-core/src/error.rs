//! 统一错误类型定义.
//!
//! - [`EblError`]: I/O 层通用错误, 由 `IoContext` 返回.
//! - [`DecodeError`]: EBL 解码失败, 对单个文件是终止性的.
//! - [`EncodeError`]: WAV 编码失败.
//! - [`Anomaly`]: 解码过程中发现的非致命异常, 记录后继续解码.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// I/O 层通用错误类型
#[derive(Debug, Error)]
pub enum EblError {
    /// I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 已到达流末尾
    #[error("已到达流末尾")]
    Eof,
}

/// I/O 层通用 Result 类型
pub type EblResult<T> = Result<T, EblError>;

/// 音频声道标识
///
/// EBL 文件中两个声道连续存放: 先 A (左/单声道), 后 B (右).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Channel {
    /// 声道 A (左声道, 或单声道文件唯一的声道)
    A,
    /// 声道 B (右声道)
    B,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

/// 错误分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 结构错误: 固定偏移处魔数不符, 文件损坏或不受支持
    Structural,
    /// 截断错误: 流在定长字段或声明长度的数据读完前结束
    Truncation,
    /// 底层 I/O 失败
    Io,
}

/// EBL 解码错误
#[derive(Debug, Error)]
pub enum DecodeError {
    /// 魔数不匹配
    #[error(
        "魔数不匹配 (偏移 {offset}): 期望 \"{}\", 实际 \"{}\" (hex: {})",
        String::from_utf8_lossy(.expected),
        String::from_utf8_lossy(.actual),
        hex(.actual)
    )]
    InvalidMagic {
        /// 期望的魔数
        expected: &'static [u8],
        /// 实际读到的字节
        actual: Vec<u8>,
        /// 魔数所在的流偏移
        offset: u64,
    },

    /// 定长字段读取不完整
    #[error("读取 {field} 时数据不足 (偏移 {offset})")]
    TruncatedRead {
        /// 字段名
        field: &'static str,
        /// 字段起始偏移
        offset: u64,
    },

    /// 音频数据不足
    #[error("声道 {channel} 音频数据不足: 期望 {expected} 字节, 实际 {actual} 字节")]
    TruncatedAudioData {
        /// 声道
        channel: Channel,
        /// 元数据声明的字节数
        expected: usize,
        /// 实际可读的字节数
        actual: usize,
    },

    /// 由元数据推导出的声道范围为负
    ///
    /// 立体声时 v3 < v2 (声道 A) 或 v5 < v4 (声道 B); 单声道时 v4 - v3 + 2 < 0.
    /// 这类文件无法确定音频长度, 按结构错误拒绝, 不尝试分配缓冲区.
    #[error("声道 {channel} 范围无效: 起点 {start} 大于终点 {end}")]
    InvalidChannelExtent {
        /// 声道
        channel: Channel,
        /// 范围起点
        start: u32,
        /// 范围终点
        end: u32,
    },

    /// 底层 I/O 失败
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),
}

impl DecodeError {
    /// 获取错误分类
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidMagic { .. } | Self::InvalidChannelExtent { .. } => ErrorKind::Structural,
            Self::TruncatedRead { .. } | Self::TruncatedAudioData { .. } => ErrorKind::Truncation,
            Self::Io(_) => ErrorKind::Io,
        }
    }
}

/// WAV 编码错误
#[derive(Debug, Error)]
pub enum EncodeError {
    /// 数据超出 RIFF 32 位大小字段的表示范围
    #[error("音频数据过大, 无法写入 WAV: {len} 字节")]
    PayloadTooLarge {
        /// 输出数据长度
        len: usize,
    },

    /// 字节率超出 u32 范围
    #[error("字节率溢出: 采样率 {sample_rate}, 声道数 {channels}")]
    ByteRateOverflow {
        /// 采样率
        sample_rate: u32,
        /// 声道数
        channels: u16,
    },

    /// I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),
}

/// 解码过程中的非致命异常
///
/// 解码器通过 `log::warn!` 输出, 同时记录到解码结果中供调用方检查.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Anomaly {
    /// 元数据帧头与固定元数据块中的文件名不一致
    FilenameMismatch {
        /// 元数据帧头中的文件名
        header: String,
        /// 固定元数据块中的文件名
        block: String,
    },
    /// 两个声道长度均非零但不相等
    UnequalChannelExtents {
        /// 声道 A 字节数
        channel_a: usize,
        /// 声道 B 字节数
        channel_b: usize,
    },
    /// 声道长度为奇数, 末尾的半个采样被丢弃
    OddChannelLength {
        /// 声道
        channel: Channel,
        /// 声明的字节数
        len: usize,
    },
    /// 尾部剩余 40 字节 (已知的附加头部变体), 未读取
    ExtraHeader,
    /// 已读字节数与声明的文件大小不一致
    SizeMismatch {
        /// 已读取的字节数
        consumed: u64,
        /// 声明的文件总大小
        declared: u64,
        /// 差值 (声明 - 已读)
        difference: i64,
    },
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FilenameMismatch { header, block } => {
                write!(f, "文件名不一致: 帧头={header}, 元数据块={block}")
            }
            Self::UnequalChannelExtents {
                channel_a,
                channel_b,
            } => write!(f, "声道长度不一致: A={channel_a}, B={channel_b}"),
            Self::OddChannelLength { channel, len } => {
                write!(f, "声道 {channel} 长度为奇数: {len} 字节")
            }
            Self::ExtraHeader => write!(f, "尾部存在 40 字节附加头部"),
            Self::SizeMismatch {
                consumed,
                declared,
                difference,
            } => write!(
                f,
                "文件大小不一致: 已读 {consumed}, 声明 {declared}, 差值 {difference}"
            ),
        }
    }
}

fn hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{b:02x}")).collect()
}
