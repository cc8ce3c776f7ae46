//! 体数据内容摘要.

use ndarray::{ArrayView, Ix3};
use sha2::{Digest, Sha256};

/// 单次送入哈希器的缓冲区大小.
const CHUNK: usize = 1 << 16;

/// 计算 `data` 的十六进制 SHA-256 摘要.
///
/// 摘要覆盖形状 (三个 `u64` 小端整数, 按 `(z, h, w)`) 和所有体素值
/// (转换为 `f32` 小端, 行优先). 因此摘要只取决于体素内容, 与 header 无关.
pub(crate) fn digest_voxels<T: Copy + Into<f32>>(data: ArrayView<'_, T, Ix3>) -> String {
    let mut hasher = Sha256::new();
    let (z, h, w) = data.dim();
    for d in [z, h, w] {
        hasher.update((d as u64).to_le_bytes());
    }

    let mut buf = Vec::with_capacity(CHUNK);
    for v in data.iter() {
        buf.extend_from_slice(&(*v).into().to_le_bytes());
        if buf.len() >= CHUNK {
            hasher.update(&buf);
            buf.clear();
        }
    }
    hasher.update(&buf);
    format!("{:x}", hasher.finalize())
}
