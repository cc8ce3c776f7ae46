//! 程序运行函数.

use crate::result::AlgorithmResult;
use anyhow::Context;
use lnq_berry::dataset::{self, validate};
use lnq_berry::threshold::BinaryThreshold;
use lnq_berry::CtScan;
use std::path::{Path, PathBuf};
use utils::output;

/// 运行配置.
#[derive(Clone, Debug)]
pub struct Config {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub results_file: PathBuf,
    pub threshold: BinaryThreshold,
}

/// 列出所有输入扫描, 并检查文件名和内容两两不同.
fn collect_inputs(dir: &Path) -> anyhow::Result<Vec<(String, PathBuf)>> {
    let paths = dataset::list_volumes(dir)
        .with_context(|| format!("cannot list input dir {}", dir.display()))?;
    anyhow::ensure!(!paths.is_empty(), "no input scan found in {}", dir.display());

    let inputs = paths
        .into_iter()
        .map(|p| {
            let name = dataset::file_name(&p)
                .with_context(|| format!("invalid file name {}", p.display()))?
                .to_owned();
            Ok((name, p))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let ids = inputs
        .iter()
        .map(|(_, p)| dataset::case_id(p).unwrap_or_default())
        .collect::<Vec<_>>();
    validate::unique_ids(ids.iter().map(String::as_str))?;

    let mut digests = Vec::with_capacity(inputs.len());
    for (name, p) in inputs.iter() {
        log::debug!("hashing {name}");
        let scan = CtScan::open(p).with_context(|| format!("cannot open {name}"))?;
        digests.push(scan.digest());
    }
    validate::unique_images(
        inputs
            .iter()
            .map(|(name, _)| name.as_str())
            .zip(digests.iter().map(String::as_str)),
    )?;

    Ok(inputs)
}

/// 实际运行.
pub fn run(config: &Config) -> anyhow::Result<AlgorithmResult> {
    let inputs = collect_inputs(&config.input_dir)?;
    log::info!("found {} input scans", inputs.len());
    output::ensure_dir(&config.output_dir)?;

    let mut result = AlgorithmResult::default();
    for (name, input) in inputs.iter() {
        let target = config.output_dir.join(name);
        let fg = segment(&config.threshold, input, &target)
            .with_context(|| format!("failed to segment {name}"))?;
        log::info!("{name} -> {}", target.display());
        result.push(name, name, fg);
    }

    output::write_json(&config.results_file, &result.records())?;
    Ok(result)
}

/// 分割 `input` 并写入 `target`. 返回前景体素个数.
fn segment(threshold: &BinaryThreshold, input: &Path, target: &Path) -> anyhow::Result<usize> {
    let scan = CtScan::open(input)?;
    let label = threshold.apply(&scan)?;
    label.save(target)?;
    Ok(label.foreground_count())
}
