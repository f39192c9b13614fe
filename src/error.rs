use thiserror::Error;

/// Errors raised by [`Record`](crate::Record) merge and propagation-copy
/// operations.
///
/// Failures at the propagation boundary are caught by the pool, logged as
/// warnings and swallowed: a sibling collection that cannot absorb an
/// attribute copy must not abort the triggering mutation or affect the other
/// siblings.
///
/// 由 [`Record`](crate::Record) 的合并和传播复制操作引发的错误。
/// 在传播边界处的失败会被池捕获、记录为警告并吞掉：
/// 一个无法吸收属性复制的兄弟集合不能中止触发它的变更，
/// 也不能影响其他兄弟集合。
#[derive(Debug, Error)]
pub enum RecordError {
    /// The source record's attribute state could not be applied to the
    /// target copy.
    /// 源记录的属性状态无法应用到目标副本。
    #[error("failed to apply attributes onto {key}: {reason}")]
    Apply {
        /// Identity key of the record that rejected the copy.
        /// 拒绝该复制的记录的身份键。
        key: String,
        /// Human-readable reason.
        /// 可读的原因描述。
        reason: String,
    },
}
