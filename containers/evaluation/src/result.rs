//! 评估结果.

use lnq_berry::metrics::{self, Aggregate, CaseMetrics};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{self, Write};

#[inline]
fn f64_to_display(f: Option<f64>) -> String {
    match f {
        Some(f) => format!("{f:.6}"),
        None => "/".to_string(),
    }
}

/// 将指标 `name` 的汇总 `a` 写进 `w` 中.
fn describe_into<W: Write>(name: &str, a: &Aggregate, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    writeln!(w, "Metric `{name}` over {} cases:", a.count)?;
    writeln!(w, "{S4}mean: {}", f64_to_display(a.mean))?;
    writeln!(w, "{S4}std: {}", f64_to_display(a.std))?;
    writeln!(w, "{S4}median: {}", f64_to_display(a.median))?;
    write!(
        w,
        "{S4}range: [{}, {}]",
        f64_to_display(a.min),
        f64_to_display(a.max)
    )?;
    Ok(())
}

/// 评估最终结果, 即 `metrics.json` 的内容.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// 以病例标识为键的单病例指标.
    pub case: BTreeMap<String, CaseMetrics>,

    /// 以指标名为键的跨病例汇总.
    pub aggregates: BTreeMap<String, Aggregate>,
}

impl EvaluationResult {
    /// 汇总所有病例的指标.
    pub fn from_cases<I: IntoIterator<Item = (String, CaseMetrics)>>(it: I) -> Self {
        let case: BTreeMap<_, _> = it.into_iter().collect();
        let aggregates = metrics::aggregate(case.values());
        Self { case, aggregates }
    }

    /// 分析运行结果.
    pub fn analyze(&self) {
        utils::sep();
        let mut buf = Vec::with_capacity(256);

        for (key, aggregate) in self.aggregates.iter() {
            if describe_into(key, aggregate, &mut buf).is_ok() {
                log::info!("{}", String::from_utf8_lossy(&buf));
            }
            buf.clear();
        }
        utils::sep();
    }
}
