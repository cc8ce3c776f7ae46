//! 算法运行记录.

use serde::Serialize;

/// 运行记录中的一个文件.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FileRecord {
    /// 文件类型.
    #[serde(rename = "type")]
    pub kind: &'static str,

    /// 文件名.
    pub filename: String,
}

impl FileRecord {
    fn image(filename: &str) -> Self {
        Self {
            kind: "metaio_image",
            filename: filename.to_owned(),
        }
    }
}

/// 单个病例的运行记录, 即 `results.json` 数组中的一项.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CaseRecord {
    /// 输出文件.
    pub outputs: Vec<FileRecord>,

    /// 输入文件.
    pub inputs: Vec<FileRecord>,

    /// 错误信息. 出错时整次运行中止, 因此总为空.
    pub error_messages: Vec<String>,
}

/// 算法容器最终结果.
#[derive(Debug, Default)]
pub struct AlgorithmResult {
    records: Vec<CaseRecord>,
    foregrounds: Vec<(String, usize)>,
}

impl AlgorithmResult {
    /// 记录一个已完成的病例.
    pub fn push(&mut self, input: &str, output: &str, foreground: usize) {
        self.records.push(CaseRecord {
            outputs: vec![FileRecord::image(output)],
            inputs: vec![FileRecord::image(input)],
            error_messages: Vec::new(),
        });
        self.foregrounds.push((input.to_owned(), foreground));
    }

    /// 所有病例的运行记录.
    #[inline]
    pub fn records(&self) -> &[CaseRecord] {
        &self.records
    }

    /// 已完成的病例个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// 输出运行摘要.
    pub fn analyze(&self) {
        utils::sep();
        for (name, fg) in self.foregrounds.iter() {
            log::info!("{name}: {fg} foreground voxels");
        }
        utils::sep();
        log::info!("segmented {} cases", self.len());
    }
}
