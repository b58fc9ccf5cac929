//! ebl-probe - EBL 采样信息探测工具
//!
//! 解析 EBL 文件的全部头部和元数据, 以文本或 JSON 形式输出, 不写出音频.

use clap::Parser;
use serde::Serialize;
use std::process;

use ebl_core::{Anomaly, ErrorKind};
use ebl_format::probe::PROBE_HEADER_LEN;
use ebl_format::{DecodedSample, EblProbe, FormatProbe, FrameHeaders, IoContext};

/// EBL 采样信息探测工具
#[derive(Parser, Debug)]
#[command(name = "ebl-probe", version, about = "EBL 采样信息探测工具")]
struct Cli {
    /// 输入文件路径
    input: Option<String>,

    /// 输出 JSON 格式
    #[arg(long)]
    json: bool,

    /// 静默模式 (只输出探测结果)
    #[arg(short, long)]
    quiet: bool,
}

// ============================================================
// JSON 输出结构体
// ============================================================

/// 完整探测结果
#[derive(Serialize)]
struct ProbeOutput<'a> {
    format: FormatInfo,
    sample: SampleInfo<'a>,
    frames: &'a FrameHeaders,
    anomalies: &'a [Anomaly],
}

/// 文件层信息
#[derive(Serialize)]
struct FormatInfo {
    filename: String,
    format_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_size: Option<u64>,
    declared_size: u64,
    bytes_consumed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    probe_score: Option<u32>,
}

/// 采样信息
#[derive(Serialize)]
struct SampleInfo<'a> {
    header_filename: &'a str,
    embedded_filename: &'a str,
    comment: &'a str,
    sample_rate: u32,
    channels: u16,
    channel_layout: String,
    nb_samples: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration: Option<f64>,
    channel_a_bytes: usize,
    channel_b_bytes: usize,
    metadata_words: &'a [u32],
}

// ============================================================
// 主逻辑
// ============================================================

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let Some(input_path) = cli.input.as_deref() else {
        print_banner();
        return;
    };

    if !cli.quiet {
        eprintln!("ebl-probe 版本 {}", env!("CARGO_PKG_VERSION"));
        eprintln!("输入文件: {input_path}");
    }

    let mut io = match IoContext::open_read(input_path) {
        Ok(io) => io,
        Err(e) => {
            eprintln!("错误: 无法打开文件 '{input_path}': {e}");
            process::exit(1);
        }
    };

    // 探测格式
    let probe_score = match probe_head(&mut io, input_path) {
        Ok(score) => score,
        Err(e) => {
            eprintln!("错误: 读取文件头部失败: {e}");
            process::exit(1);
        }
    };
    if !cli.quiet {
        match probe_score {
            Some(score) => eprintln!("格式: ebl (置信度: {score})"),
            None => eprintln!("警告: 文件头部不像 EBL, 仍尝试解析"),
        }
    }

    let file_size = io.size();
    let sample = match ebl_format::decode(&mut io) {
        Ok(sample) => sample,
        Err(e) => {
            let kind = match e.kind() {
                ErrorKind::Structural => "结构错误",
                ErrorKind::Truncation => "数据截断",
                ErrorKind::Io => "I/O 错误",
            };
            eprintln!("错误: 无法解析 EBL 文件 ({kind}): {e}");
            process::exit(1);
        }
    };

    let output = ProbeOutput {
        format: FormatInfo {
            filename: input_path.to_string(),
            format_name: EblProbe.name().to_string(),
            file_size,
            declared_size: sample.declared_total_size(),
            bytes_consumed: sample.bytes_consumed(),
            probe_score,
        },
        sample: build_sample_info(&sample),
        frames: sample.frames(),
        anomalies: sample.anomalies(),
    };

    if cli.json {
        match serde_json::to_string_pretty(&output) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("错误: JSON 序列化失败: {e}");
                process::exit(1);
            }
        }
    } else {
        print_format_text(&output.format);
        print_sample_text(&output.sample);
        print_frames_text(output.frames);
        print_anomalies_text(output.anomalies);
    }
}

/// 读取文件头部并探测, 之后回到文件开头
fn probe_head(io: &mut IoContext, filename: &str) -> ebl_core::EblResult<Option<u32>> {
    let mut head = [0u8; PROBE_HEADER_LEN];
    let read = io.read_up_to(&mut head)?;
    io.seek(std::io::SeekFrom::Start(0))?;
    Ok(EblProbe.probe(&head[..read], Some(filename)))
}

/// 从解码结果构建 SampleInfo
fn build_sample_info(sample: &DecodedSample) -> SampleInfo<'_> {
    let layout = sample.layout();
    SampleInfo {
        header_filename: sample.header_filename(),
        embedded_filename: sample.embedded_filename(),
        comment: sample.embedded_comment(),
        sample_rate: sample.sample_rate(),
        channels: layout.channels(),
        channel_layout: layout.to_string(),
        nb_samples: sample.nb_samples(),
        duration: sample.duration(),
        channel_a_bytes: sample.channel_a().len(),
        channel_b_bytes: sample.channel_b().len(),
        metadata_words: sample.metadata_words(),
    }
}

/// 文本输出: 文件层信息
fn print_format_text(info: &FormatInfo) {
    println!("[FORMAT]");
    println!("  文件名       : {}", info.filename);
    println!("  格式名称     : {}", info.format_name);
    if let Some(size) = info.file_size {
        println!("  文件大小     : {size} 字节");
    }
    println!("  声明大小     : {} 字节", info.declared_size);
    println!("  已解析       : {} 字节", info.bytes_consumed);
    if let Some(score) = info.probe_score {
        println!("  探测置信度   : {score}");
    }
    println!("[/FORMAT]");
    println!();
}

/// 文本输出: 采样信息
fn print_sample_text(info: &SampleInfo<'_>) {
    println!("[SAMPLE]");
    println!("  文件名       : {}", info.embedded_filename);
    if info.header_filename != info.embedded_filename {
        println!("  帧头文件名   : {}", info.header_filename);
    }
    if !info.comment.is_empty() {
        println!("  注释         : {}", info.comment);
    }
    println!("  采样率       : {} Hz", info.sample_rate);
    println!("  声道数       : {}", info.channels);
    println!("  声道布局     : {}", info.channel_layout);
    println!("  采样数       : {}", info.nb_samples);
    if let Some(dur) = info.duration {
        println!("  时长         : {dur:.3} 秒");
    }
    println!("  声道 A       : {} 字节", info.channel_a_bytes);
    println!("  声道 B       : {} 字节", info.channel_b_bytes);
    let words: Vec<String> = info.metadata_words.iter().map(u32::to_string).collect();
    println!("  元数据字     : [{}]", words.join(", "));
    println!("[/SAMPLE]");
    println!();
}

/// 文本输出: 帧头字段
fn print_frames_text(frames: &FrameHeaders) {
    println!("[FRAMES]");
    println!("  FORM 大小    : {}", frames.form_size);
    println!("  TOC 头部大小 : {}", frames.toc_next_header_size);
    println!("  元数据大小   : {}", frames.meta_data_size);
    println!("  元数据偏移   : {}", frames.meta_data_offset);
    println!(
        "  对齐填充     : {} 字节{}",
        frames.padding_len,
        if frames.second_header_in_padding {
            " (与第二帧头重叠)"
        } else {
            ""
        }
    );
    println!("  第二帧大小   : {}", frames.second_frame_size);
    println!("  第二帧数据   : {:02x?}", frames.second_frame_opaque);
    println!("[/FRAMES]");
    println!();
}

/// 文本输出: 异常列表
fn print_anomalies_text(anomalies: &[Anomaly]) {
    if anomalies.is_empty() {
        return;
    }
    println!("[ANOMALIES]");
    for anomaly in anomalies {
        println!("  - {anomaly}");
    }
    println!("[/ANOMALIES]");
}

fn print_banner() {
    println!("ebl-probe 版本 {} -- EBL 采样信息探测工具", env!("CARGO_PKG_VERSION"));
    println!();
    println!("用法: ebl-probe [选项] <输入文件>");
    println!();
    println!("选项:");
    println!("  --json      以 JSON 格式输出");
    println!("  -q, --quiet 静默模式");
}
