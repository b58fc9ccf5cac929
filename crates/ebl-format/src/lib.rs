//! # ebl-format
//!
//! EBL 采样格式库, 提供 EBL 解封装 (解码) 和 WAV 封装 (编码).
//!
//! 数据单向流动: 字节流 → [`decode`] → [`DecodedSample`] → [`encode`] → WAV 字节流.
//! 两个方向之间没有共享的可变状态, 每个文件的转换相互独立.

pub mod demuxers;
pub mod io;
pub mod muxers;
pub mod naming;
pub mod probe;
pub mod sample;

// 重导出常用类型
pub use demuxers::ebl::{decode, decode_bytes};
pub use io::IoContext;
pub use muxers::wav::{EncodedWav, WavHeader, encode};
pub use naming::{NamingPolicy, resolve_output_name, sanitize_filename};
pub use probe::{EblProbe, FormatProbe, ProbeScore};
pub use sample::{DecodedSample, FrameHeaders};
