use std::collections::HashSet;

use tracing::debug;

use crate::event::PoolEvent;
use crate::handle::Handle;
use crate::pool::Pool;
use crate::record::Record;

/// A feature that implicitly keeps additional entities alive during garbage
/// collection: entities it references without holding them in any
/// collection (grouped or threaded views, for example).
///
/// Register implementations with
/// [`Pool::register_liveness`](crate::Pool::register_liveness) or through
/// the pool builder. During the mark phase every identity key found in a
/// live collection is expanded with the keys returned here.
///
/// 在垃圾回收期间隐式保活额外实体的特性 ——
/// 它引用这些实体但并未将其持有在任何集合中（例如分组或会话视图）。
/// 通过 [`Pool::register_liveness`](crate::Pool::register_liveness)
/// 或池构建器注册实现。标记阶段中，存活集合里找到的每个身份键
/// 都会用这里返回的键进行扩展。
pub trait LivenessSource<R: Record> {
    /// Identity keys that must stay live whenever `key` is live.
    /// 只要 `key` 存活就必须保持存活的身份键。
    fn dependent_keys(&self, key: &R::Key) -> Vec<R::Key>;
}

/// One mark-and-sweep cycle over a pool's registry.
///
/// Each phase is a single bounded pass; there is no recursion and no
/// blocking. The collector performs no debouncing of its own; the
/// triggering invalidation signal is debounced by the caller.
///
/// 1. Sweep expired collections (never `"detail"`, never `"search"`-
///    prefixed ones): clear their entries and unregister them.
/// 2. Mark: collect the identity keys of every surviving non-expired
///    collection other than `"detail"`, expanded with the dependent keys of
///    every registered [`LivenessSource`].
/// 3. Sweep the canonical collection: drop every `"detail"` entry that is
///    neither marked live nor permanently pinned.
/// 4. Re-arm: mark every survivor expired (emitting `Expired`) except
///    `"detail"` and collections with `gc_eligible == false`. A collection
///    that stays expired until the next cycle is reclaimed then; only an
///    explicit `add`/`remove`/`touch` clears the mark.
///
/// 对池注册表的一次标记-清扫周期。
/// 每个阶段都是一次有界遍历；没有递归，也不会阻塞。
/// 回收器自身不做防抖 —— 触发它的失效信号由调用方防抖。
/// 1. 清扫过期集合（永不清扫 `"detail"` 和 `"search"` 前缀的集合）：
///    清空其条目并将其注销。
/// 2. 标记：收集除 `"detail"` 外每个存活且未过期集合的身份键，
///    并用每个已注册 [`LivenessSource`] 的依赖键进行扩展。
/// 3. 清扫规范集合：丢弃 `"detail"` 中既未标记存活也未被永久
///    钉住的每个条目。
/// 4. 重新武装：将除 `"detail"` 和 `gc_eligible == false` 以外的每个
///    幸存集合标记为过期（发出 `Expired`）。到下个周期仍保持过期的
///    集合届时会被回收；只有显式的 `add`/`remove`/`touch` 会清除标记。
pub(crate) fn collect<R: Record>(pool: &Pool<R>) -> Vec<PoolEvent<R>> {
    // Phase 1: sweep expired collections.
    // 阶段 1：清扫过期的集合。
    let mut reclaimed = 0usize;
    {
        let mut inner = pool.inner.borrow_mut();
        let doomed: Vec<Handle> = inner
            .slots
            .iter()
            .filter(|(handle, slot)| {
                !handle.is_detail() && !handle.is_search() && slot.collection.expired
            })
            .map(|(handle, _)| (*handle).clone())
            .collect();
        for handle in doomed {
            if let Some(mut slot) = inner.slots.shift_remove(&handle) {
                slot.collection.clear();
                reclaimed += 1;
                debug!(handle = handle.as_str(), "reclaimed expired collection");
            }
        }
    }

    // Phase 2: mark live identities.
    // 阶段 2：标记存活身份。
    let mut live: HashSet<R::Key> = HashSet::new();
    {
        let inner = pool.inner.borrow();
        for (handle, slot) in inner.slots.iter() {
            if handle.is_detail() || slot.collection.expired {
                continue;
            }
            live.extend(slot.collection.keys().cloned());
        }
    }
    let direct: Vec<R::Key> = live.iter().cloned().collect();
    for key in &direct {
        live.extend(pool.dependent_keys(key));
    }

    // Phase 3: sweep the canonical collection.
    // 阶段 3：清扫规范集合。
    let mut swept = 0usize;
    {
        let pinned = pool.pinned.borrow();
        let mut inner = pool.inner.borrow_mut();
        if let Some(slot) = inner.slots.get_mut(&Handle::detail()) {
            let before = slot.collection.len();
            slot.collection
                .retain(|key| live.contains(key) || pinned.contains(key));
            swept = before - slot.collection.len();
        }
    }

    // Phase 4: re-arm for the next cycle.
    // 阶段 4：为下个周期重新武装。
    let mut events = Vec::new();
    {
        let mut inner = pool.inner.borrow_mut();
        for (handle, slot) in inner.slots.iter_mut() {
            if handle.is_detail() || !slot.collection.gc_eligible {
                continue;
            }
            if let Some(event) = slot.collection.expire() {
                events.push(event);
            }
        }
    }

    debug!(
        domain = pool.domain(),
        reclaimed,
        swept,
        live = live.len(),
        "garbage collection cycle finished"
    );
    events
}
