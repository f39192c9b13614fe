use indexmap::IndexMap;
use tracing::warn;

use crate::event::PoolEvent;
use crate::handle::Handle;
use crate::record::Record;

/// An ordered, identity-unique container of records plus its view metadata.
///
/// The collection owns independent copies of its records; the propagation
/// engine reconciles copies of the same identity across sibling collections.
/// All primitive mutations return the notifications they emitted so the pool
/// pipeline can propagate and dispatch them.
///
/// Defaults on creation: `expired = false`, `complete = false`,
/// `pagination = true`, `sorted = true`, `gc_eligible = true`.
///
/// 有序的、按身份唯一的记录容器，外加其视图元数据。
/// 集合持有其记录的独立副本；传播引擎在兄弟集合之间
/// 调和同一身份的副本。所有基本变更都会返回其发出的通知，
/// 以便池的流水线进行传播和分发。
/// 创建时的默认值：`expired = false`、`complete = false`、
/// `pagination = true`、`sorted = true`、`gc_eligible = true`。
#[derive(Debug)]
pub(crate) struct Collection<R: Record> {
    handle: Handle,
    entries: IndexMap<R::Key, R>,
    pub(crate) expired: bool,
    pub(crate) complete: bool,
    pub(crate) pagination: bool,
    pub(crate) sorted: bool,
    pub(crate) gc_eligible: bool,
}

impl<R: Record> Collection<R> {
    pub(crate) fn new(handle: Handle) -> Self {
        Self {
            handle,
            entries: IndexMap::new(),
            expired: false,
            complete: false,
            pagination: true,
            sorted: true,
            gc_eligible: true,
        }
    }

    pub(crate) fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Insert the record, or merge it into the existing copy when its
    /// identity key is already present. Merge, never duplicate.
    ///
    /// Returns `Added` or `Changed`, or `None` when a merge failed (the
    /// existing copy is kept untouched and the failure is logged).
    ///
    /// 插入记录；当其身份键已存在时合并进已有副本。只合并，绝不重复。
    /// 返回 `Added` 或 `Changed`；合并失败时返回 `None`
    /// （保留已有副本不动，并记录失败日志）。
    pub(crate) fn upsert(&mut self, record: R) -> Option<PoolEvent<R>> {
        let key = record.identity_key();
        match self.entries.get_mut(&key) {
            Some(existing) => {
                if let Err(error) = existing.merge_from(&record) {
                    // A rejected merge leaves the collection untouched,
                    // expired mark included.
                    // 被拒绝的合并使集合原样保留，包括过期标记。
                    warn!(
                        handle = self.handle.as_str(),
                        key = ?key,
                        error = %error,
                        "merge rejected, keeping the existing copy"
                    );
                    return None;
                }
                self.expired = false;
                Some(PoolEvent::changed(self.handle.clone(), existing.clone()))
            }
            None => {
                self.expired = false;
                self.entries.insert(key, record.clone());
                Some(PoolEvent::added(self.handle.clone(), record))
            }
        }
    }

    /// Remove the record with the given identity key. The emitted
    /// notification carries the removed copy's preserve flag.
    ///
    /// 移除给定身份键对应的记录。发出的通知携带被移除副本的保留标志。
    pub(crate) fn remove(&mut self, key: &R::Key) -> Option<PoolEvent<R>> {
        let record = self.entries.shift_remove(key)?;
        self.expired = false;
        let preserved = record.preserve();
        Some(PoolEvent::removed(self.handle.clone(), record, preserved))
    }

    /// Mark the collection expired. Content is untouched. Emits only on the
    /// transition.
    /// 将集合标记为过期。内容不受影响。仅在状态变化时发出通知。
    pub(crate) fn expire(&mut self) -> Option<PoolEvent<R>> {
        if self.expired {
            return None;
        }
        self.expired = true;
        Some(PoolEvent::expired(self.handle.clone()))
    }

    /// Clear the expired mark without mutating content.
    /// 清除过期标记而不改动内容。
    pub(crate) fn touch(&mut self) {
        self.expired = false;
    }

    /// Update the completeness state. A non-paginated collection is always
    /// complete, so this is a no-op without pagination. Emits only on
    /// change.
    ///
    /// 更新完整性状态。非分页集合始终是完整的，因此无分页时为空操作。
    /// 仅在变化时发出通知。
    pub(crate) fn set_complete(&mut self, state: bool) -> Option<PoolEvent<R>> {
        if !self.pagination || self.complete == state {
            return None;
        }
        self.complete = state;
        Some(PoolEvent::complete(self.handle.clone(), state))
    }

    /// Effective completeness: a non-paginated collection is always
    /// complete.
    /// 有效完整性：非分页集合始终是完整的。
    pub(crate) fn is_complete(&self) -> bool {
        !self.pagination || self.complete
    }

    pub(crate) fn get(&self, key: &R::Key) -> Option<&R> {
        self.entries.get(key)
    }

    pub(crate) fn get_mut(&mut self, key: &R::Key) -> Option<&mut R> {
        self.entries.get_mut(key)
    }

    pub(crate) fn contains(&self, key: &R::Key) -> bool {
        self.entries.contains_key(key)
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = &R::Key> {
        self.entries.keys()
    }

    pub(crate) fn records(&self) -> impl Iterator<Item = &R> {
        self.entries.values()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keep only the entries whose key satisfies the predicate, preserving
    /// order.
    /// 只保留键满足谓词的条目，保持顺序。
    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&R::Key) -> bool) {
        self.entries.retain(|key, _| keep(key));
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
