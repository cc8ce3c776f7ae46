//! 数据集操作: 文件命名约定、预测清单和病例配对.

use crate::consts::VOLUME_SUFFIXES;
use crate::Result;
use std::path::{Path, PathBuf};

pub mod cases;
pub mod manifest;
pub mod validate;

pub use cases::{Case, CaseSet};
pub use manifest::{JobMapping, Manifest};

/// 获取去掉 nifti 后缀之前的文件名. 若不是 nifti 文件, 返回 `None`.
fn strip_volume_suffix(name: &str) -> Option<&str> {
    VOLUME_SUFFIXES
        .iter()
        .find_map(|suffix| name.strip_suffix(suffix))
        .filter(|stem| !stem.is_empty())
}

/// `path` 的文件名是否以 `.nii` 或 `.nii.gz` 结尾?
#[inline]
pub fn is_volume_file<P: AsRef<Path>>(path: P) -> bool {
    file_name(path.as_ref()).is_some_and(|n| strip_volume_suffix(n).is_some())
}

/// 病例标识, 即去掉 nifti 后缀的文件名. 若不是 nifti 文件, 返回 `None`.
///
/// `case_001.nii.gz` -> `case_001`.
#[inline]
pub fn case_id<P: AsRef<Path>>(path: P) -> Option<String> {
    file_name(path.as_ref())
        .and_then(strip_volume_suffix)
        .map(str::to_owned)
}

/// 获取 `path` 的 UTF-8 文件名.
#[inline]
pub fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}

/// 列出 `dir` 下 (不递归) 所有 nifti 文件, 按路径升序排列.
pub fn list_volumes<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let mut ans = Vec::new();
    for entry in std::fs::read_dir(dir.as_ref())? {
        let path = entry?.path();
        if path.is_file() && is_volume_file(&path) {
            ans.push(path);
        }
    }
    ans.sort();
    Ok(ans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn test_volume_names() {
        assert!(is_volume_file("a/case_001.nii.gz"));
        assert!(is_volume_file("case.nii"));
        assert!(!is_volume_file("case.mha"));
        assert!(!is_volume_file("case.nii.zip"));
        assert!(!is_volume_file(".nii"));

        assert_eq!(case_id("x/y/case_001.nii.gz").as_deref(), Some("case_001"));
        assert_eq!(case_id("case.v2.nii").as_deref(), Some("case.v2"));
        assert_eq!(case_id("case.json"), None);
    }

    #[test]
    fn test_list_volumes_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.nii.gz", "a.nii", "notes.txt", "c.mha"] {
            File::create(dir.path().join(name)).unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.nii")).unwrap();

        let found: Vec<_> = list_volumes(dir.path())
            .unwrap()
            .into_iter()
            .map(|p| file_name(&p).unwrap().to_owned())
            .collect();
        assert_eq!(found, vec!["a.nii", "b.nii.gz"]);
    }

    #[test]
    fn test_list_volumes_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_volumes(dir.path().join("absent")).is_err());
    }
}
