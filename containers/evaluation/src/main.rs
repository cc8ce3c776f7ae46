//! 纵隔淋巴结分割评估容器.
//!
//! 按预测清单把每个作业的分割结果与真值配对, 逐病例计算重叠度与表面距离指标,
//! 并把单病例指标和跨病例汇总写入 `metrics.json`.

use clap::Parser;
use lnq_berry::consts::{path, slug};
use lnq_berry::dataset::cases::Layout;
use std::path::PathBuf;
use std::process::ExitCode;

mod result;
mod runner;

/// 命令行参数. 每一项都可由环境变量给出, 缺省为容器内的约定路径.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// 预测清单.
    #[arg(long, env = "LNQ_PREDICTIONS_FILE", default_value = path::PREDICTIONS_FILE)]
    predictions_file: PathBuf,

    /// 预测根目录.
    #[arg(long, env = "LNQ_PREDICTIONS_ROOT", default_value = path::PREDICTIONS_ROOT)]
    predictions_root: PathBuf,

    /// 真值目录.
    #[arg(long, env = "LNQ_GROUND_TRUTH_DIR", default_value = path::GROUND_TRUTH_DIR)]
    ground_truth_dir: PathBuf,

    /// 指标输出文件.
    #[arg(long, env = "LNQ_METRICS_FILE", default_value = path::METRICS_FILE)]
    metrics_file: PathBuf,

    /// 期望的病例个数. 缺省不检查.
    #[arg(long, env = "LNQ_EXPECTED_CASES")]
    expected_cases: Option<usize>,

    /// 作业输入接口名.
    #[arg(long, env = "LNQ_INPUT_SLUG", default_value = slug::MEDIASTINAL_CT)]
    input_slug: String,

    /// 作业输出接口名.
    #[arg(long, env = "LNQ_OUTPUT_SLUG", default_value = slug::LYMPH_NODE_SEGMENTATION)]
    output_slug: String,

    /// 并行线程数. 0 表示使用所有核心.
    #[arg(long, env = "LNQ_THREADS", default_value_t = 0)]
    threads: usize,

    /// 输出 debug 日志.
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn config(&self) -> runner::Config {
        runner::Config {
            predictions_file: self.predictions_file.clone(),
            layout: Layout {
                predictions_root: self.predictions_root.clone(),
                ground_truth_dir: self.ground_truth_dir.clone(),
                input_slug: self.input_slug.clone(),
                output_slug: self.output_slug.clone(),
            },
            metrics_file: self.metrics_file.clone(),
            expected_cases: self.expected_cases,
        }
    }
}

fn try_main(args: &Args) -> anyhow::Result<()> {
    utils::init_thread_pool(Some(args.threads))?;
    let config = args.config();
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
