//! 两个容器程序依赖的通用组件.

use log::LevelFilter;
use simple_logger::SimpleLogger;

pub mod output;

const SEP: &str = "--------------------------------------------------------";

/// 简单分隔线.
#[inline]
pub fn sep() {
    log::info!("{SEP}");
}

/// 获得可并行核心数.
pub fn cpus() -> usize {
    std::thread::available_parallelism().map_or_else(|_| num_cpus::get(), usize::from)
}

/// 初始化日志. `verbose` 为 `true` 时输出 debug 级别日志.
///
/// 环境变量 `RUST_LOG` 优先于 `verbose`.
pub fn init_logger(verbose: bool) -> anyhow::Result<()> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    SimpleLogger::new()
        .with_level(level)
        .env()
        .init()
        .map_err(|e| anyhow::anyhow!("failed to initialise logger: {e}"))
}

/// 配置全局线程池大小. `threads` 为 `None` 或 0 时使用所有可并行核心.
pub fn init_thread_pool(threads: Option<usize>) -> anyhow::Result<usize> {
    let n = threads.filter(|n| *n > 0).unwrap_or_else(cpus);
    rayon::ThreadPoolBuilder::new()
        .num_threads(n)
        .build_global()
        .map_err(|e| anyhow::anyhow!("failed to build thread pool: {e}"))?;
    log::debug!("thread pool: {n} threads");
    Ok(n)
}
