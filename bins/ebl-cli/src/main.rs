//! ebl2wav - EBL 采样批量转换工具
//!
//! 将旧式软件采样器的 EBL 采样文件转换为标准 16 位 PCM WAV 文件.
//! 每个输入文件是独立的任务, 在线程池中并行转换, 单个文件失败不影响其他文件.

mod converter;
mod logging;

use clap::Parser;
use log::{error, info};
use rayon::prelude::*;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use converter::{ConvertOptions, ConvertOutcome, convert_file};

#[derive(Parser, Debug)]
#[command(name = "ebl2wav", version, about = "EBL 采样转 WAV 工具")]
struct Cli {
    /// 输入 EBL 文件 (可指定多个)
    #[arg(short, long = "input", required = true, num_args = 1..)]
    inputs: Vec<PathBuf>,

    /// 输出目录
    #[arg(short, long, default_value = "E-MU Sounds")]
    output: PathBuf,

    /// 沿用源文件名, 不使用内嵌文件名
    #[arg(long)]
    preserve_filename: bool,

    /// 输出文件名前缀 (如音色库名称), 生成 "<前缀> - <名称>.wav"
    #[arg(long)]
    prefix: Option<String>,

    /// 解码失败的源文件复制到此目录
    #[arg(short, long)]
    error_dir: Option<PathBuf>,

    /// 试运行: 只解码并确定输出文件名, 不写文件
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// 覆盖已存在的输出文件
    #[arg(short = 'y', long)]
    overwrite: bool,

    /// 并行任务数 (默认为 CPU 核心数)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// 日志级别 (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = logging::init("ebl2wav", cli.verbose) {
        eprintln!("警告: 日志初始化失败: {e:#}");
    }

    info!(
        "ebl2wav 版本 {}, {} 个输入文件, 输出目录: {}",
        env!("CARGO_PKG_VERSION"),
        cli.inputs.len(),
        cli.output.display()
    );

    let options = ConvertOptions {
        output_dir: cli.output.clone(),
        preserve_filename: cli.preserve_filename,
        prefix: cli.prefix.clone(),
        error_dir: cli.error_dir.clone(),
        dry_run: cli.dry_run,
        overwrite: cli.overwrite,
    };

    let pool = match rayon::ThreadPoolBuilder::new()
        .num_threads(cli.jobs.unwrap_or(0))
        .build()
    {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("错误: 创建线程池失败: {e}");
            process::exit(1);
        }
    };

    let started = Instant::now();
    let results: Vec<_> = pool.install(|| {
        cli.inputs
            .par_iter()
            .map(|input| (input, convert_file(input, &options)))
            .collect()
    });

    let mut written = 0usize;
    let mut planned = 0usize;
    let mut with_anomalies = 0usize;
    let mut failed = Vec::new();
    for (input, result) in &results {
        match result {
            Ok(ConvertOutcome::Written { anomalies, .. }) => {
                written += 1;
                if *anomalies > 0 {
                    with_anomalies += 1;
                }
            }
            Ok(ConvertOutcome::DryRun { .. }) => planned += 1,
            Err(e) => {
                error!("{}: {e:#}", input.display());
                failed.push(input);
            }
        }
    }

    let elapsed = started.elapsed();
    if cli.dry_run {
        info!(
            "试运行完成: {} 个可转换, {} 个失败, 耗时 {:.2} 秒",
            planned,
            failed.len(),
            elapsed.as_secs_f64()
        );
    } else {
        info!(
            "转换完成: {} 个成功 ({} 个有警告), {} 个失败, 耗时 {:.2} 秒",
            written,
            with_anomalies,
            failed.len(),
            elapsed.as_secs_f64()
        );
    }

    if !failed.is_empty() {
        eprintln!("以下文件转换失败:");
        for input in &failed {
            eprintln!("  {}", input.display());
        }
        process::exit(1);
    }
}
