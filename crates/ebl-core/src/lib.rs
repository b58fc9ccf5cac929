//! # ebl-core
//!
//! EBL 采样转换工具核心库, 提供错误类型、声道布局和定长文本字段解码.
//!
//! 解码器 (`ebl-format` 中的 EBL 解封装器) 与编码器 (WAV 封装器) 共用本 crate 的类型.

pub mod channel_layout;
pub mod error;
pub mod text;

// 重导出常用类型
pub use channel_layout::ChannelLayout;
pub use error::{
    Anomaly, Channel, DecodeError, EblError, EblResult, EncodeError, ErrorKind,
};
pub use text::decode_utf16le_field;
