//! 单个文件的转换流程: 探测 → 解码 → 编码 → 写出.

use anyhow::{Context, Result, bail};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use ebl_format::probe::PROBE_HEADER_LEN;
use ebl_format::{EblProbe, FormatProbe, IoContext, NamingPolicy};

/// 转换选项
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// 输出目录
    pub output_dir: PathBuf,
    /// 沿用源文件名
    pub preserve_filename: bool,
    /// 输出文件名前缀
    pub prefix: Option<String>,
    /// 解码失败的源文件复制到此目录
    pub error_dir: Option<PathBuf>,
    /// 只确定输出文件名, 不写文件
    pub dry_run: bool,
    /// 覆盖已存在的输出文件
    pub overwrite: bool,
}

/// 单个文件的转换结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertOutcome {
    /// 已写出
    Written {
        /// 输出文件路径
        output: PathBuf,
        /// 解码过程中记录的异常数量
        anomalies: usize,
    },
    /// 试运行, 未写出
    DryRun {
        /// 将要写出的文件路径
        output: PathBuf,
    },
}

/// 转换单个 EBL 文件
pub fn convert_file(input: &Path, options: &ConvertOptions) -> Result<ConvertOutcome> {
    let sample = match decode_input(input) {
        Ok(sample) => sample,
        Err(err) => {
            if let Some(dir) = &options.error_dir {
                save_failed_input(input, dir);
            }
            return Err(err);
        }
    };

    for anomaly in sample.anomalies() {
        warn!("{}: {}", input.display(), anomaly);
    }
    let anomalies = sample.anomalies().len();

    let policy = NamingPolicy::new(input.to_string_lossy())
        .with_preserve_original(options.preserve_filename)
        .with_prefix(options.prefix.clone());
    let wav = ebl_format::encode(sample, &policy)
        .with_context(|| format!("编码 WAV 失败: {}", input.display()))?;
    let output = options.output_dir.join(&wav.filename);

    if !options.overwrite && output.exists() {
        bail!("输出文件已存在 '{}', 使用 -y 覆盖", output.display());
    }

    if options.dry_run {
        info!("[试运行] {} -> {}", input.display(), output.display());
        return Ok(ConvertOutcome::DryRun { output });
    }

    std::fs::create_dir_all(&options.output_dir)
        .with_context(|| format!("创建输出目录失败: {}", options.output_dir.display()))?;
    let mut io = IoContext::open_write(&output)
        .with_context(|| format!("创建输出文件失败: {}", output.display()))?;
    wav.write_to(&mut io)
        .with_context(|| format!("写入输出文件失败: {}", output.display()))?;

    info!(
        "{} -> {} ({} Hz, {} 声道, {} 字节)",
        input.display(),
        output.display(),
        wav.header.sample_rate,
        wav.header.channels,
        wav.header.data_size
    );
    Ok(ConvertOutcome::Written { output, anomalies })
}

/// 打开并解码输入文件
fn decode_input(input: &Path) -> Result<ebl_format::DecodedSample> {
    let mut io = IoContext::open_read(input)
        .with_context(|| format!("无法打开文件: {}", input.display()))?;

    let mut head = [0u8; PROBE_HEADER_LEN];
    let read = io
        .read_up_to(&mut head)
        .with_context(|| format!("读取文件头部失败: {}", input.display()))?;
    let filename = input.file_name().map(|n| n.to_string_lossy());
    match EblProbe.probe(&head[..read], filename.as_deref()) {
        Some(score) => debug!("{}: 探测置信度 {}", input.display(), score),
        None => bail!("不是 EBL 文件: {}", input.display()),
    }
    io.seek(std::io::SeekFrom::Start(0))
        .with_context(|| format!("定位文件开头失败: {}", input.display()))?;

    ebl_format::decode(&mut io).with_context(|| format!("解码失败: {}", input.display()))
}

/// 将解码失败的源文件复制到错误目录
///
/// 复制失败只记录警告, 不覆盖原始错误.
fn save_failed_input(input: &Path, error_dir: &Path) {
    let Some(name) = input.file_name() else {
        return;
    };
    let target = error_dir.join(name);
    let result = std::fs::create_dir_all(error_dir).and_then(|_| std::fs::copy(input, &target));
    match result {
        Ok(_) => info!("已保存失败文件: {}", target.display()),
        Err(e) => warn!("保存失败文件 {} 出错: {}", target.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 构建最小的单声道 EBL 文件
    fn build_mono_ebl(name: &str, pcm: &[u8]) -> Vec<u8> {
        let text = |s: &str| {
            let mut field: Vec<u8> = s.encode_utf16().flat_map(u16::to_le_bytes).collect();
            field.resize(64, 0);
            field
        };
        let mut buf = Vec::new();
        buf.extend_from_slice(b"FORM");
        buf.extend_from_slice(&0u32.to_be_bytes());
        buf.extend_from_slice(b"E5B0TOC2");
        buf.extend_from_slice(&78u32.to_be_bytes());
        buf.extend_from_slice(b"E5S1");
        buf.extend_from_slice(&0u32.to_be_bytes());
        buf.extend_from_slice(&98u32.to_be_bytes());
        buf.extend_from_slice(&[0, 0]);
        buf.extend_from_slice(&text(name));
        buf.extend_from_slice(b"E5S1");
        buf.extend_from_slice(&0u32.to_be_bytes());
        buf.extend_from_slice(&[0u8; 6]);
        buf.extend_from_slice(&text(name));
        // 单声道: v2 = v3, v4 = v5 = v3 + len - 2, 音频前填充 4 字节
        let v3 = 184u32;
        let v4 = v3 + pcm.len() as u32 - 2;
        let mut words = [0u32; 12];
        words[1] = v3;
        words[2] = v3;
        words[3] = v4;
        words[4] = v4;
        words[9] = 32000;
        for w in words {
            buf.extend_from_slice(&w.to_le_bytes());
        }
        buf.extend_from_slice(&text(""));
        buf.extend_from_slice(&[0u8; 4]);
        buf.extend_from_slice(pcm);
        let form_size = (buf.len() - 8) as u32;
        buf[4..8].copy_from_slice(&form_size.to_be_bytes());
        buf
    }

    fn options(output_dir: &Path) -> ConvertOptions {
        ConvertOptions {
            output_dir: output_dir.to_path_buf(),
            preserve_filename: false,
            prefix: None,
            error_dir: None,
            dry_run: false,
            overwrite: false,
        }
    }

    #[test]
    fn test_转换_写出_wav() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("A001.ebl");
        std::fs::write(&input, build_mono_ebl("Soft Bell", &[1, 0, 2, 0, 3, 0])).unwrap();

        let out_dir = dir.path().join("out");
        let outcome = convert_file(&input, &options(&out_dir)).unwrap();
        let expected = out_dir.join("Soft_Bell.wav");
        assert_eq!(
            outcome,
            ConvertOutcome::Written {
                output: expected.clone(),
                anomalies: 0,
            }
        );

        let wav = std::fs::read(&expected).unwrap();
        assert_eq!(wav.len(), 44 + 6);
        assert_eq!(&wav[44..], &[1, 0, 2, 0, 3, 0]);
    }

    #[test]
    fn test_转换_试运行不写文件() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("A001.ebl");
        std::fs::write(&input, build_mono_ebl("Soft Bell", &[1, 0])).unwrap();

        let out_dir = dir.path().join("out");
        let mut opts = options(&out_dir);
        opts.dry_run = true;
        opts.prefix = Some("Bank".into());
        let outcome = convert_file(&input, &opts).unwrap();
        assert_eq!(
            outcome,
            ConvertOutcome::DryRun {
                output: out_dir.join("Bank - Soft_Bell.wav"),
            }
        );
        assert!(!out_dir.exists());
    }

    #[test]
    fn test_转换_拒绝覆盖() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("A001.ebl");
        std::fs::write(&input, build_mono_ebl("Soft Bell", &[1, 0])).unwrap();

        let mut opts = options(dir.path());
        opts.preserve_filename = true;
        std::fs::write(dir.path().join("A001.wav"), b"old").unwrap();
        assert!(convert_file(&input, &opts).is_err());

        opts.overwrite = true;
        convert_file(&input, &opts).unwrap();
        assert_eq!(std::fs::read(dir.path().join("A001.wav")).unwrap().len(), 46);
    }

    #[test]
    fn test_转换_失败文件复制到错误目录() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.ebl");
        let mut data = build_mono_ebl("Soft Bell", &[1, 0, 2, 0]);
        data.truncate(150);
        std::fs::write(&input, &data).unwrap();

        let error_dir = dir.path().join("errors");
        let mut opts = options(&dir.path().join("out"));
        opts.error_dir = Some(error_dir.clone());
        let err = convert_file(&input, &opts).unwrap_err();
        assert!(err.to_string().contains("解码失败"));
        assert_eq!(std::fs::read(error_dir.join("broken.ebl")).unwrap(), data);
    }

    #[test]
    fn test_转换_非_ebl_文件() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("notes.txt");
        std::fs::write(&input, b"hello").unwrap();
        let err = convert_file(&input, &options(dir.path())).unwrap_err();
        assert!(err.to_string().contains("不是 EBL 文件"));
    }
}
