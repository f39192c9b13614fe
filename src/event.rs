use crate::handle::Handle;
use crate::record::Record;

/// Kind of notification emitted by a pool-managed collection.
/// 池管理的集合发出的通知类型。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// A record with a new identity was inserted.
    /// 插入了一个具有新身份的记录。
    Added,
    /// An existing identity was updated in place (merge or propagation).
    /// 已有身份被就地更新（合并或传播）。
    Changed,
    /// A record was removed. `preserved` carries the record's preserve flag
    /// at the moment of removal.
    /// 记录被移除。`preserved` 携带移除时刻该记录的保留标志。
    Removed {
        preserved: bool,
    },
    /// The collection was marked expired. Content is untouched.
    /// 集合被标记为过期。内容不受影响。
    Expired,
    /// The completeness state of a paginated collection changed.
    /// 分页集合的完整性状态发生了变化。
    Complete(bool),
}

/// A notification delivered synchronously to pool subscribers after a
/// mutation batch settles: the primary event first, then the follow-on
/// events its propagation produced in sibling collections.
///
/// 在一次变更批次落定后同步递送给池订阅者的通知：
/// 先是主事件，然后是其传播在兄弟集合中产生的后续事件。
#[derive(Debug, Clone)]
pub struct PoolEvent<R: Record> {
    /// Handle of the collection that emitted the event.
    /// 发出事件的集合的句柄。
    pub handle: Handle,
    /// What happened.
    /// 发生了什么。
    pub kind: EventKind,
    /// The affected record, where one exists (`Added`/`Changed`/`Removed`).
    /// 受影响的记录（存在时：`Added`/`Changed`/`Removed`）。
    pub record: Option<R>,
}

impl<R: Record> PoolEvent<R> {
    pub(crate) fn added(handle: Handle, record: R) -> Self {
        Self {
            handle,
            kind: EventKind::Added,
            record: Some(record),
        }
    }

    pub(crate) fn changed(handle: Handle, record: R) -> Self {
        Self {
            handle,
            kind: EventKind::Changed,
            record: Some(record),
        }
    }

    pub(crate) fn removed(handle: Handle, record: R, preserved: bool) -> Self {
        Self {
            handle,
            kind: EventKind::Removed { preserved },
            record: Some(record),
        }
    }

    pub(crate) fn expired(handle: Handle) -> Self {
        Self {
            handle,
            kind: EventKind::Expired,
            record: None,
        }
    }

    pub(crate) fn complete(handle: Handle, state: bool) -> Self {
        Self {
            handle,
            kind: EventKind::Complete(state),
            record: None,
        }
    }
}
