//! EBL 采样解封装器.
//!
//! EBL 是一种旧式软件采样器的采样格式, 由四级嵌套的块头和一个定长元数据块组成,
//! 之后是两个声道连续存放的 16 位小端 PCM 数据.
//!
//! EBL 文件结构:
//! ```text
//! FORM header:    "FORM" + remaining_size(BE32)                                 8 字节
//! TOC chunk:      "E5B0TOC2" + next_header_size(BE32)                          12 字节
//! 元数据帧头:     "E5S1" + data_size(BE32) + data_offset(BE32) + 2 字节保留
//!                + filename(UTF-16LE, 64)                                      78 字节
//! 对齐填充:       data_offset - 当前位置, 可能与下一个 E5S1 头重叠
//! 第二帧头:       "E5S1" + size(BE32) + 6 字节不透明数据                 ≤ 14 字节
//! 定长元数据块:   filename(UTF-16LE, 64) + 12 x LE32 + comment(UTF-16LE, 64)  176 字节
//! 音频前填充:     v5 - (声道 A 长度 + 声道 B 长度) - 178
//! 音频数据:       声道 A, 声道 B
//! 尾部:           0 / 4 / 40 字节
//! ```
//!
//! 结构错误和截断是致命的; 文件名不一致、声道长度不一致、尾部长度异常等只记录警告.

use ebl_core::{Anomaly, Channel, DecodeError, EblError, decode_utf16le_field};
use log::{debug, warn};

use crate::io::IoContext;
use crate::sample::{
    DecodedSample, FrameHeaders, METADATA_WORD_COUNT, WORD_RANGE_END_A, WORD_RANGE_END_B,
    WORD_RANGE_START_A, WORD_RANGE_START_B, WORD_SAMPLE_RATE,
};

/// 外层帧魔数
const FORM_MAGIC: &[u8; 4] = b"FORM";
/// 目录块魔数
const TOC_MAGIC: &[u8; 8] = b"E5B0TOC2";
/// 元数据帧/第二帧魔数
const FRAME_MAGIC: &[u8; 4] = b"E5S1";

/// UTF-16LE 文本字段长度
const TEXT_FIELD_LEN: usize = 64;
/// 音频前填充计算中的固定偏差
const PRE_AUDIO_BIAS: i64 = 178;
/// 常见的 4 字节尾部
const TRAILER_LEN: i64 = 4;
/// 已知的 40 字节附加头部变体
const EXTRA_HEADER_LEN: i64 = 40;
/// 对齐填充的前瞻字节数: 魔数 + size 字段
const OVERLAP_PEEK_LEN: u64 = 8;

/// 从输入流解码一个 EBL 采样
///
/// 输入流必须位于文件开头: `data_offset` 是相对文件起始的绝对偏移.
pub fn decode(io: &mut IoContext) -> Result<DecodedSample, DecodeError> {
    let mut reader = ChunkReader::new(io);
    let mut anomalies = Vec::new();

    // 1. FORM 外层帧
    reader.expect_magic(FORM_MAGIC, "form_magic")?;
    let form_size = reader.read_u32_be("form_size")?;
    let declared_total_size = u64::from(form_size) + 8;
    debug!("FORM: 声明大小={}", form_size);
    if let Some(actual) = reader.stream_size() {
        if actual != declared_total_size {
            debug!(
                "FORM 声明的总大小 {} 与实际流大小 {} 不同",
                declared_total_size, actual
            );
        }
    }

    // 2. 目录块
    reader.expect_magic(TOC_MAGIC, "toc_magic")?;
    let toc_next_header_size = reader.read_u32_be("toc_next_header_size")?;
    debug!("E5B0TOC2: 下一头部大小={}", toc_next_header_size);

    // 3. 元数据帧头
    reader.expect_magic(FRAME_MAGIC, "meta_frame_magic")?;
    let meta_data_size = reader.read_u32_be("meta_data_size")?;
    let meta_data_offset = reader.read_u32_be("meta_data_offset")?;
    reader.read_array::<2>("meta_reserved")?;
    let header_filename = reader.read_text("meta_filename")?;
    debug!(
        "E5S1 元数据帧: data_size={}, data_offset={}, 文件名={}",
        meta_data_size, meta_data_offset, header_filename
    );

    // 4~5. 对齐填充与第二帧头
    let second = read_second_header(&mut reader, meta_data_offset)?;

    // 6. 定长元数据块
    let embedded_filename = reader.read_text("block_filename")?;
    let mut metadata_words = [0u32; METADATA_WORD_COUNT];
    for word in &mut metadata_words {
        *word = reader.read_u32_le("metadata_word")?;
    }
    let embedded_comment = reader.read_text("block_comment")?;
    debug!(
        "元数据块: v1..v5={:?}, 采样率={}, 注释={:?}",
        &metadata_words[..5],
        metadata_words[WORD_SAMPLE_RATE],
        embedded_comment
    );

    if header_filename != embedded_filename {
        warn!(
            "文件名不一致: 帧头={}, 元数据块={}",
            header_filename, embedded_filename
        );
        anomalies.push(Anomaly::FilenameMismatch {
            header: header_filename.clone(),
            block: embedded_filename.clone(),
        });
    }

    // 7. 声道范围
    let (size_a, size_b) = derive_channel_extents(&metadata_words, &mut anomalies)?;

    // 8. 音频前填充
    let pre_audio = i64::from(metadata_words[WORD_RANGE_END_B])
        - (size_a + size_b) as i64
        - PRE_AUDIO_BIAS;
    if pre_audio > 0 {
        debug!("跳过 {} 字节音频前填充", pre_audio);
        reader.skip(pre_audio as u64, "pre_audio_padding")?;
    }

    // 9. 音频数据
    let channel_a = read_channel(&mut reader, Channel::A, size_a, &mut anomalies)?;
    let channel_b = read_channel(&mut reader, Channel::B, size_b, &mut anomalies)?;

    // 10. 尾部核对
    reconcile_trailer(&mut reader, declared_total_size, &mut anomalies)?;

    let frames = FrameHeaders {
        form_size,
        toc_next_header_size,
        meta_data_size,
        meta_data_offset,
        padding_len: second.padding_len,
        second_header_in_padding: second.in_padding,
        second_frame_size: second.size,
        second_frame_opaque: second.opaque,
    };

    debug!(
        "EBL 解码完成: {} Hz, 声道 A={} 字节, 声道 B={} 字节, 已读 {} / 声明 {}",
        metadata_words[WORD_SAMPLE_RATE],
        channel_a.len(),
        channel_b.len(),
        reader.consumed,
        declared_total_size
    );

    Ok(DecodedSample {
        declared_total_size,
        bytes_consumed: reader.consumed,
        header_filename,
        embedded_filename,
        embedded_comment,
        metadata_words,
        frames,
        channel_a,
        channel_b,
        anomalies,
    })
}

/// 从内存数据解码一个 EBL 采样
pub fn decode_bytes(data: Vec<u8>) -> Result<DecodedSample, DecodeError> {
    let mut io = IoContext::from_data(data);
    decode(&mut io)
}

/// 对齐填充前瞻的判定结果
#[derive(Debug, PartialEq, Eq)]
enum SecondHeaderStart {
    /// 魔数和 size 字段都在填充内
    InPadding { size: u32 },
    /// 只有魔数在填充内, size 字段紧随填充
    MagicInPadding,
    /// 填充是纯填充, 完整的第二帧头在其后
    AfterPadding,
}

/// 根据填充的前 8 字节决定第二帧头从哪里开始
fn classify_padding(head: &[u8]) -> SecondHeaderStart {
    if head.len() < FRAME_MAGIC.len() || &head[..4] != FRAME_MAGIC {
        return SecondHeaderStart::AfterPadding;
    }
    if head.len() >= OVERLAP_PEEK_LEN as usize {
        SecondHeaderStart::InPadding {
            size: u32::from_be_bytes([head[4], head[5], head[6], head[7]]),
        }
    } else {
        SecondHeaderStart::MagicInPadding
    }
}

/// 第二帧头的解析结果
struct SecondHeader {
    padding_len: usize,
    in_padding: bool,
    size: u32,
    opaque: [u8; 6],
}

/// 读取对齐填充和第二帧头
///
/// 一次前瞻决定两种语法分支: 部分文件把第二个 E5S1 头直接放在填充区内,
/// 此时填充的前 4 (或 8) 字节就是该头部的魔数 (和 size 字段).
fn read_second_header(
    reader: &mut ChunkReader<'_>,
    data_offset: u32,
) -> Result<SecondHeader, DecodeError> {
    let gap = i64::from(data_offset) - reader.consumed as i64;
    let padding_len = gap.max(0) as u64;
    let peek_len = padding_len.min(OVERLAP_PEEK_LEN);

    let head = reader.read_vec(peek_len as usize, "alignment_padding")?;
    reader.skip(padding_len - peek_len, "alignment_padding")?;

    let start = classify_padding(&head);
    debug!("对齐填充 {} 字节, 第二帧头位置: {:?}", padding_len, start);

    let (size, in_padding) = match start {
        SecondHeaderStart::InPadding { size } => (size, true),
        SecondHeaderStart::MagicInPadding => (reader.read_u32_be("second_frame_size")?, true),
        SecondHeaderStart::AfterPadding => {
            reader.expect_magic(FRAME_MAGIC, "second_frame_magic")?;
            (reader.read_u32_be("second_frame_size")?, false)
        }
    };
    let opaque = reader.read_array::<6>("second_frame_opaque")?;
    debug!("E5S1 第二帧: size={}, data={:02x?}", size, opaque);

    Ok(SecondHeader {
        padding_len: padding_len as usize,
        in_padding,
        size,
        opaque,
    })
}

/// 由元数据字推导两个声道的字节数
///
/// 声道 A 范围为空时按单声道处理: A = v4 - v3 + 2, B = 0.
fn derive_channel_extents(
    words: &[u32; METADATA_WORD_COUNT],
    anomalies: &mut Vec<Anomaly>,
) -> Result<(usize, usize), DecodeError> {
    let start_a = words[WORD_RANGE_START_A];
    let end_a = words[WORD_RANGE_END_A];
    let start_b = words[WORD_RANGE_START_B];
    let end_b = words[WORD_RANGE_END_B];

    let size_a = i64::from(end_a) - i64::from(start_a);
    let size_b = i64::from(end_b) - i64::from(start_b);
    debug!("声道范围: A={}, B={}", size_a, size_b);

    if size_a == 0 {
        let mono = i64::from(start_b) - i64::from(end_a) + 2;
        if mono < 0 {
            return Err(DecodeError::InvalidChannelExtent {
                channel: Channel::A,
                start: end_a,
                end: start_b,
            });
        }
        debug!("检测到单声道, 声道 A={} 字节", mono);
        return Ok((mono as usize, 0));
    }

    if size_a < 0 {
        return Err(DecodeError::InvalidChannelExtent {
            channel: Channel::A,
            start: start_a,
            end: end_a,
        });
    }
    if size_b < 0 {
        return Err(DecodeError::InvalidChannelExtent {
            channel: Channel::B,
            start: start_b,
            end: end_b,
        });
    }

    let (size_a, size_b) = (size_a as usize, size_b as usize);
    if size_b != 0 && size_a != size_b {
        warn!("声道长度不一致: A={}, B={}", size_a, size_b);
        anomalies.push(Anomaly::UnequalChannelExtents {
            channel_a: size_a,
            channel_b: size_b,
        });
    }
    Ok((size_a, size_b))
}

/// 读取一个声道的音频数据
///
/// 声明长度为奇数时, 全部字节都会被读取, 但缓冲区末尾的半个采样被丢弃.
fn read_channel(
    reader: &mut ChunkReader<'_>,
    channel: Channel,
    len: usize,
    anomalies: &mut Vec<Anomaly>,
) -> Result<Vec<u8>, DecodeError> {
    let mut data = reader.read_payload(channel, len)?;
    if len % 2 != 0 {
        warn!("声道 {} 长度为奇数 ({} 字节), 丢弃末尾 1 字节", channel, len);
        data.truncate(len - 1);
        anomalies.push(Anomaly::OddChannelLength { channel, len });
    }
    Ok(data)
}

/// 核对已读字节数与声明的文件大小
fn reconcile_trailer(
    reader: &mut ChunkReader<'_>,
    declared_total_size: u64,
    anomalies: &mut Vec<Anomaly>,
) -> Result<(), DecodeError> {
    let difference = declared_total_size as i64 - reader.consumed as i64;
    match difference {
        0 => {}
        TRAILER_LEN => {
            let mut trailer = [0u8; TRAILER_LEN as usize];
            let read = reader.read_up_to(&mut trailer)?;
            if read == trailer.len() {
                debug!("读取 4 字节尾部: {:02x?}", trailer);
            } else {
                warn!("声明了 4 字节尾部, 但只读到 {} 字节", read);
                anomalies.push(reader.size_mismatch(declared_total_size));
            }
        }
        EXTRA_HEADER_LEN => {
            warn!("尾部存在 40 字节附加头部, 未读取");
            anomalies.push(Anomaly::ExtraHeader);
        }
        _ => {
            warn!(
                "文件大小不一致: 已读 {}, 声明 {}, 差值 {}",
                reader.consumed, declared_total_size, difference
            );
            anomalies.push(reader.size_mismatch(declared_total_size));
        }
    }
    Ok(())
}

/// 带字节计数的块读取器
///
/// `consumed` 始终等于流的实际读取位置, 所有读取和跳过都经过这里.
struct ChunkReader<'a> {
    io: &'a mut IoContext,
    consumed: u64,
}

impl<'a> ChunkReader<'a> {
    fn new(io: &'a mut IoContext) -> Self {
        Self { io, consumed: 0 }
    }

    fn stream_size(&self) -> Option<u64> {
        self.io.size()
    }

    fn size_mismatch(&self, declared: u64) -> Anomaly {
        Anomaly::SizeMismatch {
            consumed: self.consumed,
            declared,
            difference: declared as i64 - self.consumed as i64,
        }
    }

    /// 尽量填满缓冲区, 返回实际读取的字节数
    fn read_up_to(&mut self, buf: &mut [u8]) -> Result<usize, DecodeError> {
        let read = self.io.read_up_to(buf).map_err(io_error)?;
        self.consumed += read as u64;
        Ok(read)
    }

    fn read_into(&mut self, buf: &mut [u8], field: &'static str) -> Result<(), DecodeError> {
        let offset = self.consumed;
        if self.read_up_to(buf)? < buf.len() {
            return Err(DecodeError::TruncatedRead { field, offset });
        }
        Ok(())
    }

    fn read_array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], DecodeError> {
        let mut buf = [0u8; N];
        self.read_into(&mut buf, field)?;
        Ok(buf)
    }

    fn read_vec(&mut self, len: usize, field: &'static str) -> Result<Vec<u8>, DecodeError> {
        let mut buf = vec![0u8; len];
        self.read_into(&mut buf, field)?;
        Ok(buf)
    }

    fn read_u32_be(&mut self, field: &'static str) -> Result<u32, DecodeError> {
        Ok(u32::from_be_bytes(self.read_array(field)?))
    }

    fn read_u32_le(&mut self, field: &'static str) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.read_array(field)?))
    }

    fn read_text(&mut self, field: &'static str) -> Result<String, DecodeError> {
        let raw = self.read_array::<TEXT_FIELD_LEN>(field)?;
        Ok(decode_utf16le_field(&raw))
    }

    fn expect_magic<const N: usize>(
        &mut self,
        magic: &'static [u8; N],
        field: &'static str,
    ) -> Result<(), DecodeError> {
        let offset = self.consumed;
        let actual = self.read_array::<N>(field)?;
        if &actual != magic {
            return Err(DecodeError::InvalidMagic {
                expected: magic,
                actual: actual.to_vec(),
                offset,
            });
        }
        Ok(())
    }

    /// 跳过填充字节
    ///
    /// 流大小已知时先检查剩余长度, 避免 seek 越过流末尾.
    fn skip(&mut self, count: u64, field: &'static str) -> Result<(), DecodeError> {
        if count == 0 {
            return Ok(());
        }
        let offset = self.consumed;
        if let Some(size) = self.io.size() {
            if offset + count > size {
                return Err(DecodeError::TruncatedRead { field, offset });
            }
        }
        self.io.skip(count as usize).map_err(|err| match err {
            EblError::Eof => DecodeError::TruncatedRead { field, offset },
            other => io_error(other),
        })?;
        self.consumed += count;
        Ok(())
    }

    /// 读取声明长度的音频数据
    ///
    /// 流大小已知时先检查剩余长度, 损坏的长度字段不会触发超大分配.
    fn read_payload(&mut self, channel: Channel, len: usize) -> Result<Vec<u8>, DecodeError> {
        if let Some(size) = self.io.size() {
            let available = size.saturating_sub(self.consumed);
            if (len as u64) > available {
                return Err(DecodeError::TruncatedAudioData {
                    channel,
                    expected: len,
                    actual: available as usize,
                });
            }
        }
        let mut data = vec![0u8; len];
        let read = self.read_up_to(&mut data)?;
        if read < len {
            return Err(DecodeError::TruncatedAudioData {
                channel,
                expected: len,
                actual: read,
            });
        }
        Ok(data)
    }
}

/// 将非 EOF 的 I/O 层错误转换为解码错误
fn io_error(err: EblError) -> DecodeError {
    match err {
        EblError::Io(e) => DecodeError::Io(e),
        other => DecodeError::Io(std::io::Error::other(other.to_string())),
    }
}
