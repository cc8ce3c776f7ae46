//! 纵隔淋巴结分割算法容器.
//!
//! 对输入目录下的每个 CT 扫描做二值阈值分割, 把分割结果以同名文件写入输出目录.

use clap::Parser;
use lnq_berry::consts::{gray, path, threshold};
use lnq_berry::threshold::BinaryThreshold;
use std::path::PathBuf;
use std::process::ExitCode;

mod result;
mod runner;

/// 命令行参数. 每一项都可由环境变量给出, 缺省为容器内的约定路径.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// CT 扫描所在目录.
    #[arg(long, env = "LNQ_INPUT_DIR", default_value = path::ALGORITHM_INPUT_DIR)]
    input_dir: PathBuf,

    /// 分割结果输出目录. 不存在时自动创建.
    #[arg(long, env = "LNQ_OUTPUT_DIR", default_value = path::ALGORITHM_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// 运行记录文件.
    #[arg(long, env = "LNQ_RESULTS_FILE", default_value = path::ALGORITHM_RESULTS_FILE)]
    results_file: PathBuf,

    /// 阈值下限 (含).
    #[arg(long, env = "LNQ_LOWER_THRESHOLD", default_value_t = threshold::LOWER)]
    lower: f64,

    /// 阈值上限 (含). 缺省无上限.
    #[arg(long, env = "LNQ_UPPER_THRESHOLD", default_value_t = threshold::UPPER)]
    upper: f64,

    /// 并行线程数. 0 表示使用所有核心.
    #[arg(long, env = "LNQ_THREADS", default_value_t = 0)]
    threads: usize,

    /// 输出 debug 日志.
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn config(&self) -> anyhow::Result<runner::Config> {
        let threshold =
            BinaryThreshold::new(self.lower, self.upper, gray::LYMPH_NODE, gray::BACKGROUND)?;
        Ok(runner::Config {
            input_dir: self.input_dir.clone(),
            output_dir: self.output_dir.clone(),
            results_file: self.results_file.clone(),
            threshold,
        })
    }
}

fn try_main(args: &Args) -> anyhow::Result<()> {
    utils::init_thread_pool(Some(args.threads))?;
    let config = args.config()?;
    log::debug!("{config:?}");

    let result = runner::run(&config)?;
    result.analyze();
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = utils::init_logger(args.verbose) {
        eprintln!("{e:#}");
        return ExitCode::FAILURE;
    }

    match try_main(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
