//! 格式探测.
//!
//! 通过分析文件头部数据和文件扩展名, 判断输入是否为 EBL 采样文件.

/// 探测置信度
///
/// 数值越高, 表示对格式判断越有信心.
pub type ProbeScore = u32;

/// 最低探测分数 (仅根据扩展名)
pub const SCORE_EXTENSION: ProbeScore = 50;

/// 最高探测分数 (魔数完全匹配)
pub const SCORE_MAX: ProbeScore = 100;

/// 探测所需的最少头部字节数: "FORM" + 大小 + "E5B0TOC2"
pub const PROBE_HEADER_LEN: usize = 16;

/// 格式探测器 trait
pub trait FormatProbe {
    /// 根据文件头部数据探测格式
    ///
    /// # 参数
    /// - `data`: 文件开头的若干字节
    /// - `filename`: 文件名 (可选, 用于扩展名匹配)
    ///
    /// # 返回
    /// - `Some(score)`: 探测成功, 返回置信度
    /// - `None`: 不是此格式
    fn probe(&self, data: &[u8], filename: Option<&str>) -> Option<ProbeScore>;

    /// 格式名称
    fn name(&self) -> &str;
}

/// EBL 格式探测器
pub struct EblProbe;

impl FormatProbe for EblProbe {
    fn probe(&self, data: &[u8], filename: Option<&str>) -> Option<ProbeScore> {
        // 检查 FORM + E5B0TOC2 魔数
        if data.len() >= PROBE_HEADER_LEN && &data[0..4] == b"FORM" && &data[8..16] == b"E5B0TOC2"
        {
            return Some(SCORE_MAX);
        }

        // 仅根据扩展名
        if let Some(name) = filename {
            if name.to_ascii_lowercase().ends_with(".ebl") {
                return Some(SCORE_EXTENSION);
            }
        }

        None
    }

    fn name(&self) -> &str {
        "ebl"
    }
}
