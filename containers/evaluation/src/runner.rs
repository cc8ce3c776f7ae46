//! 程序运行函数.

use crate::result::EvaluationResult;
use anyhow::Context;
use lnq_berry::dataset::cases::Layout;
use lnq_berry::dataset::{CaseSet, Manifest};
use std::path::PathBuf;
use utils::output;

/// 运行配置.
#[derive(Clone, Debug)]
pub struct Config {
    pub predictions_file: PathBuf,
    pub layout: Layout,
    pub metrics_file: PathBuf,
    pub expected_cases: Option<usize>,
}

/// 实际运行.
///
/// 任一病例出错都会中止运行, 此时不写出任何指标.
pub fn run(config: &Config) -> anyhow::Result<EvaluationResult> {
    let manifest = Manifest::open(&config.predictions_file).with_context(|| {
        format!("cannot read manifest {}", config.predictions_file.display())
    })?;
    log::info!("{} jobs in manifest", manifest.len());

    let cases = CaseSet::discover(&manifest, &config.layout, config.expected_cases)?;

    let mut scored = Vec::with_capacity(cases.len());
    for (i, case) in cases.iter().enumerate() {
        log::info!("[{}/{}] scoring {}", i + 1, cases.len(), case.id);
        let metrics = case
            .score()
            .with_context(|| format!("failed to score case {}", case.id))?;
        log::debug!("{}: dice = {:.6}", case.id, metrics.dice);
        scored.push((case.id.clone(), metrics));
    }

    let result = EvaluationResult::from_cases(scored);
    output::write_json(&config.metrics_file, &result)?;
    log::info!("metrics written to {}", config.metrics_file.display());
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::{run, Config};
    use lnq_berry::consts::metric::DICE;
    use lnq_berry::dataset::cases::Layout;
    use lnq_berry::dataset::manifest::output_dir;
    use lnq_berry::CtLabel;
    use ndarray::{s, Array3};
    use std::fs;
    use std::path::Path;

    fn config(root: &Path) -> Config {
        Config {
            predictions_file: root.join("predictions.json"),
            layout: Layout {
                predictions_root: root.join("input"),
                ground_truth_dir: root.join("ground-truth"),
                ..Layout::default()
            },
            metrics_file: root.join("output/metrics.json"),
            expected_cases: None,
        }
    }

    /// 在 8x8x8 体内放一个边长为 `side` 的立方体.
    fn cube(side: usize) -> CtLabel {
        let mut data = Array3::<u8>::zeros((8, 8, 8));
        data.slice_mut(s![2..2 + side, 2..2 + side, 2..2 + side]).fill(1);
        CtLabel::new(data, [1.0, 1.0, 1.0])
    }

    fn write_manifest(cfg: &Config, jobs: &[(&str, &str)]) {
        let jobs: Vec<_> = jobs
            .iter()
            .map(|(pk, gt)| {
                let image = |slug: &str, name: &str| {
                    serde_json::json!({"interface": {"slug": slug}, "image": {"name": name}})
                };
                serde_json::json!({
                    "pk": pk,
                    "status": "Succeeded",
                    "inputs": [image(&cfg.layout.input_slug, gt)],
                    "outputs": [image(&cfg.layout.output_slug, "seg.nii.gz")],
                })
            })
            .collect();
        fs::write(&cfg.predictions_file, serde_json::to_string(&jobs).unwrap()).unwrap();
    }

    fn write_case(cfg: &Config, pk: &str, gt_name: &str, gt: &CtLabel, pred: &CtLabel) {
        fs::create_dir_all(&cfg.layout.ground_truth_dir).unwrap();
        gt.save(cfg.layout.ground_truth_dir.join(gt_name)).unwrap();
        let dir = output_dir(&cfg.layout.predictions_root, pk, &cfg.layout.output_slug);
        fs::create_dir_all(&dir).unwrap();
        pred.save(dir.join("seg.nii.gz")).unwrap();
    }

    #[test]
    fn test_evaluate_end_to_end() {
        let root = tempfile::tempdir().unwrap();
        let cfg = config(root.path());
        // 完全一致.
        write_case(&cfg, "job-1", "case_001.nii.gz", &cube(4), &cube(4));
        // 真值 125 个体素, 预测 27 个体素, 全部落在真值内.
        write_case(&cfg, "job-2", "case_002.nii.gz", &cube(5), &cube(3));
        write_manifest(&cfg, &[("job-1", "case_001.nii.gz"), ("job-2", "case_002.nii.gz")]);

        let result = run(&cfg).unwrap();
        let d1 = result.case["case_001"].dice;
        let d2 = result.case["case_002"].dice;
        assert_eq!(d1, 1.0);
        assert!((d2 - 54.0 / 152.0).abs() < 1e-12);
        assert_eq!(result.case["case_001"].hausdorff, Some(0.0));

        let mean = result.aggregates[DICE].mean.unwrap();
        assert!((mean - (d1 + d2) / 2.0).abs() < 1e-12);

        let text = fs::read_to_string(&cfg.metrics_file).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["case"]["case_002"]["gt_fname"], "case_002.nii.gz");
        assert_eq!(json["case"]["case_002"]["pred_fname"], "seg.nii.gz");
    }

    #[test]
    fn test_failure_writes_nothing() {
        let root = tempfile::tempdir().unwrap();
        let mut cfg = config(root.path());
        write_case(&cfg, "job-1", "case_001.nii.gz", &cube(4), &cube(3));
        write_manifest(&cfg, &[("job-1", "case_001.nii.gz")]);

        cfg.expected_cases = Some(2);
        assert!(run(&cfg).is_err());
        assert!(!cfg.metrics_file.exists());

        // 预测与真值形状不一致.
        cfg.expected_cases = Some(1);
        let dir = output_dir(&cfg.layout.predictions_root, "job-1", &cfg.layout.output_slug);
        CtLabel::new(Array3::zeros((4, 4, 4)), [1.0, 1.0, 1.0])
            .save(dir.join("seg.nii.gz"))
            .unwrap();
        assert!(run(&cfg).is_err());
        assert!(!cfg.metrics_file.exists());
    }

    #[test]
    fn test_no_cases_still_reports_every_metric() {
        let root = tempfile::tempdir().unwrap();
        let cfg = config(root.path());
        fs::create_dir_all(&cfg.layout.ground_truth_dir).unwrap();
        write_manifest(&cfg, &[]);

        let result = run(&cfg).unwrap();
        assert!(result.case.is_empty());
        assert_eq!(result.aggregates[DICE].count, 0);

        let text = fs::read_to_string(&cfg.metrics_file).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["aggregates"].as_object().unwrap().len(), 10);
        assert!(json["aggregates"]["HausdorffDistance95"]["mean"].is_null());
    }

    #[test]
    fn test_missing_manifest() {
        let root = tempfile::tempdir().unwrap();
        let cfg = config(root.path());
        assert!(run(&cfg).is_err());
    }
}
