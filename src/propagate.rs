use std::cell::Cell;

use tracing::{trace, warn};

use crate::event::PoolEvent;
use crate::handle::Handle;
use crate::pool::Pool;
use crate::record::Record;

/// Re-entrancy guard over one of the pool's propagation flags.
///
/// Guards are per pool, not process-wide, so propagation chains in
/// unrelated pools never suppress each other. The flag is released on drop,
/// so a panic while mirroring a mutation into sibling collections cannot
/// leave propagation permanently disabled.
///
/// 池传播标志之一上的重入守卫。
/// 守卫是每个池独立的，而非进程级的，因此不相关池中的传播链
/// 永远不会相互抑制。标志在 drop 时释放，
/// 所以在向兄弟集合镜像变更时发生 panic 也不会让传播被永久禁用。
pub(crate) struct ReentryGuard<'pool> {
    flag: &'pool Cell<bool>,
}

impl<'pool> ReentryGuard<'pool> {
    /// Acquire the guard, or `None` when a propagation pass is already
    /// running (the nested emission is suppressed).
    ///
    /// 获取守卫；当一次传播已在进行中时返回 `None`（抑制嵌套发射）。
    pub(crate) fn try_enter(flag: &'pool Cell<bool>) -> Option<Self> {
        if flag.get() {
            return None;
        }
        flag.set(true);
        Some(Self { flag })
    }
}

impl Drop for ReentryGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

/// Scoped suppression of removal propagation across a whole pool.
///
/// Hold the guard around an operation that would otherwise look like a bulk
/// delete (replacing a collection's full contents, for example) so removals
/// do not cascade into sibling collections. The flag is released when the
/// guard drops, on every exit path, including panics inside the wrapped
/// operation.
///
/// 对整个池的移除传播进行作用域内的抑制。
/// 在一个否则看起来像批量删除的操作（例如整体替换某集合的内容）
/// 周围持有该守卫，使移除不会级联到兄弟集合。
/// 标志在守卫 drop 时释放 —— 覆盖所有退出路径，
/// 包括被包裹操作内部的 panic。
#[must_use = "removal propagation is only suppressed while the guard is held"]
pub struct PreserveBatch<'pool> {
    pub(crate) flag: &'pool Cell<bool>,
}

impl Drop for PreserveBatch<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

/// Mirror a change into every sibling collection holding the same identity.
///
/// Each updated sibling yields a nested `Changed` notification; the guard
/// suppresses further recursive propagation from those emissions. A failure
/// in one sibling is logged and swallowed; it affects neither the
/// triggering mutation nor the siblings already processed.
///
/// 将一次变更镜像到持有相同身份的每个兄弟集合。
/// 每个被更新的兄弟集合产生一个嵌套的 `Changed` 通知；
/// 守卫抑制这些发射的进一步递归传播。
/// 单个兄弟集合的失败会被记录并吞掉 ——
/// 既不影响触发的变更，也不影响已处理的其他兄弟集合。
pub(crate) fn changes<R: Record>(
    pool: &Pool<R>,
    origin: &Handle,
    changed: &R,
) -> Vec<PoolEvent<R>> {
    let Some(_guard) = ReentryGuard::try_enter(&pool.change_guard) else {
        trace!(origin = origin.as_str(), "nested change emission suppressed");
        return Vec::new();
    };

    let key = changed.identity_key();
    let mut inner = pool.inner.borrow_mut();
    let mut emitted = Vec::new();
    for slot in inner.slots.values_mut() {
        let handle = slot.collection.handle().clone();
        if &handle == origin {
            continue;
        }
        let Some(target) = slot.collection.get_mut(&key) else {
            continue;
        };
        match target.copy_propagated(changed) {
            Ok(()) => emitted.push(PoolEvent::changed(handle, target.clone())),
            Err(error) => warn!(
                handle = handle.as_str(),
                key = ?key,
                error = %error,
                "change propagation failed for one sibling"
            ),
        }
    }
    trace!(origin = origin.as_str(), key = ?key, siblings = emitted.len(), "change propagated");
    emitted
}

/// Mirror a removal into every sibling collection holding the same
/// identity.
///
/// The origin copy's preserve flag is carried onto each sibling copy first.
/// A truthy flag suppresses that sibling's removal and is consumed by the
/// decision; the flag is one-shot. Returns immediately when a removal pass
/// is already running or the pool-wide preserve batch is active.
///
/// 将一次移除镜像到持有相同身份的每个兄弟集合。
/// 源副本的保留标志会先被带到每个兄弟副本上。
/// 标志为真会抑制该兄弟集合的移除，并被这次决定消耗 ——
/// 标志是一次性的。当一次移除传播已在进行中、
/// 或池级保留批次处于激活状态时立即返回。
pub(crate) fn removals<R: Record>(
    pool: &Pool<R>,
    origin: &Handle,
    removed: &R,
) -> Vec<PoolEvent<R>> {
    if pool.batch_flag.get() {
        trace!(origin = origin.as_str(), "removal propagation suppressed by preserve batch");
        return Vec::new();
    }
    let Some(_guard) = ReentryGuard::try_enter(&pool.remove_guard) else {
        trace!(origin = origin.as_str(), "nested removal emission suppressed");
        return Vec::new();
    };

    let key = removed.identity_key();
    let mut inner = pool.inner.borrow_mut();
    let mut emitted = Vec::new();
    for slot in inner.slots.values_mut() {
        let handle = slot.collection.handle().clone();
        if &handle == origin {
            continue;
        }
        {
            let Some(target) = slot.collection.get_mut(&key) else {
                continue;
            };
            target.set_preserve(removed.preserve());
            if target.preserve() {
                // One removal decision consumes the one-shot flag.
                // 一次移除决定即消耗这个一次性标志。
                target.set_preserve(false);
                trace!(handle = handle.as_str(), key = ?key, "removal skipped, copy preserved");
                continue;
            }
        }
        if let Some(event) = slot.collection.remove(&key) {
            emitted.push(event);
        }
    }
    trace!(origin = origin.as_str(), key = ?key, siblings = emitted.len(), "removal propagated");
    emitted
}
