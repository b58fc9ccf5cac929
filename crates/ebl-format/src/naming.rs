//! 输出文件命名.
//!
//! 输出文件名的优先级:
//! 1. 保留原名模式: 源文件名去掉扩展名
//! 2. 固定元数据块中的文件名 (清理后)
//! 3. 元数据帧头中的文件名 (清理后)
//! 4. 源文件名去掉扩展名
//!
//! 提供前缀 (例如音色库名称) 时, 结果为 `"<前缀> - <名称>.wav"`, 前缀原样保留.

use std::path::Path;

use crate::sample::DecodedSample;

/// 输出文件扩展名
pub const OUTPUT_EXTENSION: &str = "wav";

/// 源文件扩展名
const SOURCE_EXTENSION: &str = ".ebl";

/// 源文件名和内嵌文件名都为空时使用的名称
const FALLBACK_NAME: &str = "untitled";

/// 输出命名策略
#[derive(Debug, Clone, Default)]
pub struct NamingPolicy {
    /// 源文件名 (可带路径)
    pub source_name: String,
    /// 是否直接沿用源文件名
    pub preserve_original: bool,
    /// 可选的名称前缀
    pub prefix: Option<String>,
}

impl NamingPolicy {
    /// 以源文件名创建默认策略
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            preserve_original: false,
            prefix: None,
        }
    }

    /// 设置是否保留原名
    pub fn with_preserve_original(mut self, preserve: bool) -> Self {
        self.preserve_original = preserve;
        self
    }

    /// 设置名称前缀, 空字符串视为无前缀
    pub fn with_prefix(mut self, prefix: Option<String>) -> Self {
        self.prefix = prefix.filter(|p| !p.is_empty());
        self
    }

    /// 源文件名去掉目录和扩展名
    fn source_stem(&self) -> String {
        Path::new(&self.source_name)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// 判断字符是否允许出现在输出文件名中
fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | ',' | ':' | '%' | '-' | '_' | '#')
}

/// 去掉末尾的 `.ebl` 扩展名 (不区分大小写, 可重复)
fn strip_source_extension(mut name: &str) -> &str {
    while name.len() >= SOURCE_EXTENSION.len() {
        let split = name.len() - SOURCE_EXTENSION.len();
        match name.get(split..) {
            Some(tail) if tail.eq_ignore_ascii_case(SOURCE_EXTENSION) => name = &name[..split],
            _ => break,
        }
    }
    name
}

/// 清理内嵌文件名
///
/// 先去掉末尾的 `.ebl`, 再把每段连续的非法字符替换为单个 `_`.
/// 对已清理的名称再次清理结果不变.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_run = false;
    for c in strip_source_extension(name).chars() {
        if is_allowed(c) {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    out
}

/// 按命名策略确定输出文件名 (含 `.wav` 扩展名)
pub fn resolve_output_name(sample: &DecodedSample, policy: &NamingPolicy) -> String {
    let name = if policy.preserve_original {
        policy.source_stem()
    } else {
        [sample.embedded_filename(), sample.header_filename()]
            .into_iter()
            .map(sanitize_filename)
            .find(|name| !name.is_empty())
            .unwrap_or_else(|| policy.source_stem())
    };
    let name = if name.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        name
    };

    match &policy.prefix {
        Some(prefix) => format!("{} - {}.{}", prefix, name, OUTPUT_EXTENSION),
        None => format!("{}.{}", name, OUTPUT_EXTENSION),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_named(block: &str, header: &str) -> DecodedSample {
        let mut sample = DecodedSample::from_pcm(44100, vec![0, 0], Vec::new());
        sample.embedded_filename = block.to_string();
        sample.header_filename = header.to_string();
        sample
    }

    #[test]
    fn test_清理_非法字符() {
        assert_eq!(sanitize_filename("Pad/1:Warm*.ebl"), "Pad_1:Warm_");
        assert_eq!(sanitize_filename("Warm Pad"), "Warm_Pad");
        assert_eq!(sanitize_filename("a  //  b"), "a_b");
        assert_eq!(sanitize_filename("Kick#2,100%.EBL"), "Kick#2,100%");
        assert_eq!(sanitize_filename("弦乐"), "_");
        assert_eq!(sanitize_filename(""), "");
    }

    #[test]
    fn test_清理_幂等() {
        for name in [
            "Pad/1:Warm*.ebl",
            "x.ebl.EBL",
            "x.ebl*",
            "  leading",
            "弦乐 Strings.ebl",
        ] {
            let once = sanitize_filename(name);
            assert_eq!(sanitize_filename(&once), once, "输入: {name}");
        }
    }

    #[test]
    fn test_命名_内嵌文件名优先() {
        let sample = sample_named("Warm Pad", "Header Name");
        let policy = NamingPolicy::new("banks/A001.ebl");
        assert_eq!(resolve_output_name(&sample, &policy), "Warm_Pad.wav");
    }

    #[test]
    fn test_命名_回退顺序() {
        let policy = NamingPolicy::new("banks/A001.ebl");
        let sample = sample_named("", "Header Name");
        assert_eq!(resolve_output_name(&sample, &policy), "Header_Name.wav");

        let sample = sample_named("", "");
        assert_eq!(resolve_output_name(&sample, &policy), "A001.wav");

        let empty = NamingPolicy::new("");
        assert_eq!(resolve_output_name(&sample, &empty), "untitled.wav");
    }

    #[test]
    fn test_命名_保留原名() {
        let sample = sample_named("Warm Pad", "Warm Pad");
        let policy = NamingPolicy::new("/tmp/My Bass (1).ebl").with_preserve_original(true);
        assert_eq!(resolve_output_name(&sample, &policy), "My Bass (1).wav");
    }

    #[test]
    fn test_命名_前缀() {
        let sample = sample_named("Warm Pad", "Warm Pad");
        let policy = NamingPolicy::new("A001.ebl").with_prefix(Some("Vintage Keys".into()));
        assert_eq!(
            resolve_output_name(&sample, &policy),
            "Vintage Keys - Warm_Pad.wav"
        );

        let policy = NamingPolicy::new("A001.ebl").with_prefix(Some(String::new()));
        assert_eq!(resolve_output_name(&sample, &policy), "Warm_Pad.wav");
    }
}
