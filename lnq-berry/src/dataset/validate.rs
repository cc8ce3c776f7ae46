//! 病例集合校验.

use crate::{BerryError, Result};
use std::collections::{HashMap, HashSet};

/// 检查病例标识两两不同. 否则返回第一个重复的标识.
pub fn unique_ids<'a, I: IntoIterator<Item = &'a str>>(ids: I) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(BerryError::DuplicateCase(id.to_owned()));
        }
    }
    Ok(())
}

/// 检查 `(名称, 摘要)` 中摘要两两不同. 否则返回第一对内容相同的名称.
pub fn unique_images<'a, I: IntoIterator<Item = (&'a str, &'a str)>>(images: I) -> Result<()> {
    let mut seen: HashMap<&str, &str> = HashMap::new();
    for (name, digest) in images {
        if let Some(first) = seen.insert(digest, name) {
            return Err(BerryError::DuplicateImage(first.to_owned(), name.to_owned()));
        }
    }
    Ok(())
}

/// 若给定了期望个数 `expected`, 检查实际个数 `actual` 与之相等.
#[inline]
pub fn case_count(expected: Option<usize>, actual: usize) -> Result<()> {
    match expected {
        Some(n) if n != actual => Err(BerryError::WrongCaseCount(n, actual)),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_ids() {
        assert!(unique_ids(["a", "b", "c"]).is_ok());
        assert!(unique_ids(std::iter::empty()).is_ok());
        assert!(matches!(
            unique_ids(["a", "b", "a"]),
            Err(BerryError::DuplicateCase(id)) if id == "a"
        ));
    }

    #[test]
    fn test_unique_images() {
        assert!(unique_images([("a", "00"), ("b", "01")]).is_ok());
        assert!(matches!(
            unique_images([("a", "00"), ("b", "01"), ("c", "00")]),
            Err(BerryError::DuplicateImage(x, y)) if x == "a" && y == "c"
        ));
    }

    #[test]
    fn test_case_count() {
        assert!(case_count(None, 7).is_ok());
        assert!(case_count(Some(2), 2).is_ok());
        assert!(matches!(
            case_count(Some(2), 3),
            Err(BerryError::WrongCaseCount(2, 3))
        ));
    }
}
