//! # ebl
//!
//! EBL 采样解码与 WAV 编码工具集.
//!
//! EBL 是一种旧式软件采样器的专有采样格式. 本工具集解析其嵌套块结构,
//! 取出采样率、内嵌文件名和两个声道的 16 位 PCM 数据, 再写为标准 WAV 文件.
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use ebl::format::{IoContext, NamingPolicy};
//!
//! let mut io = IoContext::open_read("A001.ebl").unwrap();
//! let sample = ebl::format::decode(&mut io).unwrap();
//! println!("{} Hz, {}", sample.sample_rate(), sample.layout());
//!
//! let wav = ebl::format::encode(sample, &NamingPolicy::new("A001.ebl")).unwrap();
//! println!("输出文件: {}", wav.filename);
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `ebl-core` | 错误类型、声道布局、文本字段解码 |
//! | `ebl-format` | I/O 抽象、格式探测、EBL 解码、WAV 编码、输出命名 |

/// 核心类型与错误定义
pub use ebl_core as core;

/// EBL 解码与 WAV 编码
pub use ebl_format as format;

/// 获取版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
