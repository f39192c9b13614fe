use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;
use std::time::Instant;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::collection::Collection;
use crate::event::{EventKind, PoolEvent};
use crate::gc;
use crate::gc::LivenessSource;
use crate::handle::{ContainerId, Handle, SortKey};
use crate::propagate;
use crate::propagate::PreserveBatch;
use crate::record::Record;

/// Registry slot: one named collection plus the time it was last accessed.
/// 注册表槽位：一个命名集合，外加其最近一次被访问的时间。
pub(crate) struct Slot<R: Record> {
    pub(crate) collection: Collection<R>,
    pub(crate) last_access: Instant,
}

/// The pool's handle registry. Insertion-ordered so garbage collection
/// passes visit collections deterministically.
///
/// 池的句柄注册表。按插入顺序排列，
/// 使垃圾回收的遍历以确定的顺序访问集合。
pub(crate) struct Registry<R: Record> {
    pub(crate) slots: IndexMap<Handle, Slot<R>>,
}

impl<R: Record> Registry<R> {
    fn new() -> Self {
        Self {
            slots: IndexMap::new(),
        }
    }

    /// Look up the slot for `handle`, creating it lazily with collection
    /// defaults. Records the access time either way.
    ///
    /// 查找 `handle` 对应的槽位，必要时以集合默认值惰性创建。
    /// 两种情况都会记录访问时间。
    pub(crate) fn ensure(&mut self, handle: &Handle) -> &mut Slot<R> {
        if !self.slots.contains_key(handle) {
            debug!(handle = handle.as_str(), "collection created");
            self.slots.insert(
                handle.clone(),
                Slot {
                    collection: Collection::new(handle.clone()),
                    last_access: Instant::now(),
                },
            );
        }
        let slot = &mut self.slots[handle];
        slot.last_access = Instant::now();
        slot
    }
}

/// An item accepted by [`Pool::resolve`]: either a bare identity key to look
/// up in the canonical collection, or a record that is passed through
/// as-is.
///
/// [`Pool::resolve`] 接受的条目：要么是在规范集合中查找的裸身份键，
/// 要么是原样返回的记录。
#[derive(Debug, Clone)]
pub enum Lookup<R: Record> {
    Key(R::Key),
    Record(R),
}

/// Builder for configuring a [`Pool`].
///
/// # Example
/// ```
/// use view_pool::{Entity, Pool};
///
/// let pool = Pool::<Entity>::builder("mail")
///     .pin("favorites-root".to_string())
///     .build();
/// ```
///
/// 用于配置 [`Pool`] 的构建器。
pub struct PoolBuilder<R: Record> {
    domain: String,
    map_fn: Box<dyn Fn(R) -> R>,
    pinned: HashSet<R::Key>,
    liveness: Vec<Rc<dyn LivenessSource<R>>>,
}

impl<R: Record> PoolBuilder<R> {
    fn new(domain: String) -> Self {
        Self {
            domain,
            map_fn: Box::new(|record| record),
            pinned: HashSet::new(),
            liveness: Vec::new(),
        }
    }

    /// Set the payload transform applied by `Pool::add` and
    /// `Pool::get_or_create_detail` before a record enters a collection.
    /// Identity by default.
    ///
    /// 设置 `Pool::add` 和 `Pool::get_or_create_detail` 在记录进入集合前
    /// 应用的载荷变换。默认为恒等变换。
    pub fn map_with(mut self, map_fn: impl Fn(R) -> R + 'static) -> Self {
        self.map_fn = Box::new(map_fn);
        self
    }

    /// Permanently pin an identity key: the canonical sweep never collects
    /// it.
    /// 永久钉住一个身份键：规范集合的清扫永远不会回收它。
    pub fn pin(mut self, key: R::Key) -> Self {
        self.pinned.insert(key);
        self
    }

    /// Register a liveness source consulted during the GC mark phase.
    /// 注册一个在 GC 标记阶段被查询的保活源。
    pub fn liveness_source(mut self, source: impl LivenessSource<R> + 'static) -> Self {
        self.liveness.push(Rc::new(source));
        self
    }

    /// Build the pool.
    /// 构建池。
    pub fn build(self) -> Rc<Pool<R>> {
        debug!(domain = %self.domain, "pool created");
        Rc::new(Pool {
            domain: self.domain,
            inner: RefCell::new(Registry::new()),
            subscribers: RefCell::new(Vec::new()),
            liveness: RefCell::new(self.liveness),
            pinned: RefCell::new(self.pinned),
            map_fn: self.map_fn,
            change_guard: Cell::new(false),
            remove_guard: Cell::new(false),
            batch_flag: Cell::new(false),
            disposed: Cell::new(false),
        })
    }
}

/// Per-domain registry of named, identity-unique collections sharing one
/// identity space.
///
/// The pool lazily creates collections on first access, mirrors every
/// change and removal into sibling collections holding the same identity,
/// and reclaims stale collections and orphaned canonical entities when
/// [`gc()`](Pool::gc) runs.
///
/// All operations execute synchronously on the calling thread; the only
/// lock-like constructs are the per-pool boolean re-entrancy guards, which
/// are always released on every exit path.
///
/// # Example
/// ```
/// use serde_json::json;
/// use view_pool::{Entity, Handle, PoolSet};
///
/// let pools: PoolSet<Entity> = PoolSet::new();
/// let mail = pools.acquire("mail");
///
/// let detail = mail.get(Handle::detail());
/// detail.add([Entity::new("m1").with_attr("subject", json!("Hi"))]);
///
/// let inbox = mail.get(Handle::named("inbox"));
/// inbox.add([Entity::new("m1").with_attr("subject", json!("Hi"))]);
/// inbox.add([Entity::new("m1").with_attr("subject", json!("Hello"))]);
///
/// // The update propagated back into the canonical collection.
/// let copy = detail.get(&"m1".to_string()).unwrap();
/// assert_eq!(copy.attr("subject"), Some(&json!("Hello")));
/// ```
///
/// 命名的、按身份唯一的集合的按域注册表，这些集合共享同一个身份空间。
/// 池在首次访问时惰性创建集合，将每次变更和移除镜像到持有相同身份的
/// 兄弟集合中，并在 [`gc()`](Pool::gc) 运行时回收陈旧集合和
/// 孤立的规范实体。
/// 所有操作都在调用线程上同步执行；唯一类似锁的构造是每个池独立的
/// 布尔重入守卫，它们在所有退出路径上都会被释放。
pub struct Pool<R: Record> {
    domain: String,
    pub(crate) inner: RefCell<Registry<R>>,
    subscribers: RefCell<Vec<Rc<dyn Fn(&PoolEvent<R>)>>>,
    liveness: RefCell<Vec<Rc<dyn LivenessSource<R>>>>,
    pub(crate) pinned: RefCell<HashSet<R::Key>>,
    map_fn: Box<dyn Fn(R) -> R>,
    pub(crate) change_guard: Cell<bool>,
    pub(crate) remove_guard: Cell<bool>,
    pub(crate) batch_flag: Cell<bool>,
    disposed: Cell<bool>,
}

impl<R: Record> Pool<R> {
    /// Create a builder for configuring a pool for `domain`.
    /// 创建一个用于配置 `domain` 的池的构建器。
    pub fn builder(domain: impl Into<String>) -> PoolBuilder<R> {
        PoolBuilder::new(domain.into())
    }

    /// The domain this pool serves.
    /// 此池服务的域。
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Access the collection for `handle`, creating it with defaults on
    /// first access. Idempotent per handle; records the access time. Plain
    /// access does not clear an `expired` mark; only `add`/`remove`/
    /// `touch` do.
    ///
    /// 访问 `handle` 对应的集合，首次访问时以默认值创建。
    /// 对每个句柄幂等；记录访问时间。普通访问不会清除 `expired`
    /// 标记 —— 只有 `add`/`remove`/`touch` 会。
    pub fn get(self: &Rc<Self>, handle: impl Into<Handle>) -> CollectionRef<R> {
        let handle = handle.into();
        if !self.disposed.get() {
            self.inner.borrow_mut().ensure(&handle);
        }
        CollectionRef {
            pool: Rc::clone(self),
            handle,
        }
    }

    /// Add payloads to the collection for `handle`, or to the canonical
    /// `"detail"` collection when no handle is given. Applies the map
    /// transform first, then merges by identity key.
    ///
    /// 将载荷添加到 `handle` 对应的集合；未给出句柄时添加到规范的
    /// `"detail"` 集合。先应用映射变换，再按身份键合并。
    pub fn add(
        self: &Rc<Self>,
        handle: impl Into<Option<Handle>>,
        data: impl IntoIterator<Item = R>,
    ) -> CollectionRef<R> {
        let handle = handle.into().unwrap_or_else(Handle::detail);
        let records: Vec<R> = data.into_iter().map(|record| (self.map_fn)(record)).collect();
        self.apply(&handle, move |collection| {
            records
                .into_iter()
                .filter_map(|record| collection.upsert(record))
                .collect()
        });
        self.get(handle)
    }

    /// Resolve each item to a record: records pass through as-is, keys are
    /// looked up in `"detail"`. Misses yield placeholders; this never
    /// fails and never creates canonical entries as a side effect.
    ///
    /// 将每个条目解析为记录：记录原样通过，键在 `"detail"` 中查找。
    /// 未命中产生占位符 —— 此操作永不失败，
    /// 也永远不会作为副作用创建规范条目。
    pub fn resolve(&self, items: impl IntoIterator<Item = Lookup<R>>) -> Vec<R> {
        let detail = Handle::detail();
        let mut inner = self.inner.borrow_mut();
        if let Some(slot) = inner.slots.get_mut(&detail) {
            slot.last_access = Instant::now();
        }
        let inner = &*inner;
        items
            .into_iter()
            .map(|item| match item {
                Lookup::Record(record) => record,
                Lookup::Key(key) => inner
                    .slots
                    .get(&detail)
                    .and_then(|slot| slot.collection.get(&key))
                    .cloned()
                    .unwrap_or_else(|| R::placeholder(key)),
            })
            .collect()
    }

    /// Return the existing `"detail"` record for the payload's identity
    /// key, or construct one. A constructed record is registered into
    /// `"detail"` unless the payload looks like a nested sub-object; only
    /// top-level entities are auto-registered.
    ///
    /// 返回载荷身份键对应的现有 `"detail"` 记录，或构造一个新记录。
    /// 除非载荷看起来像嵌套子对象，否则构造的记录会被注册进
    /// `"detail"` —— 只有顶层实体才会被自动注册。
    pub fn get_or_create_detail(self: &Rc<Self>, data: R) -> R {
        let key = data.identity_key();
        {
            let mut inner = self.inner.borrow_mut();
            let detail = Handle::detail();
            if let Some(slot) = inner.slots.get_mut(&detail) {
                slot.last_access = Instant::now();
                if let Some(found) = slot.collection.get(&key) {
                    return found.clone();
                }
            }
        }
        let record = (self.map_fn)(data);
        if record.is_subobject() {
            trace!(key = ?key, "sub-object payload, not registered in the canonical collection");
            return record;
        }
        let registered = record.clone();
        self.apply(&Handle::detail(), move |collection| {
            collection.upsert(registered).into_iter().collect()
        });
        record
    }

    /// All registered collections whose handle contains every given
    /// substring. Ad hoc bulk discovery over raw handle names.
    ///
    /// 句柄包含每个给定子串的所有已注册集合。
    /// 基于原始句柄名称的临时批量发现。
    pub fn grep(self: &Rc<Self>, tokens: &[&str]) -> Vec<CollectionRef<R>> {
        self.select(|handle| handle.matches(tokens))
    }

    /// All registered collections scoped to the given container.
    /// 作用于给定容器的所有已注册集合。
    pub fn get_by_container(self: &Rc<Self>, id: &ContainerId) -> Vec<CollectionRef<R>> {
        self.select(|handle| handle.container() == Some(id))
    }

    /// All registered collections for the given sort order within a
    /// container.
    /// 给定容器内给定排序方式下的所有已注册集合。
    pub fn get_by_sort(
        self: &Rc<Self>,
        sort: &SortKey,
        container: &ContainerId,
    ) -> Vec<CollectionRef<R>> {
        self.select(|handle| handle.container() == Some(container) && handle.sort() == Some(sort))
    }

    /// Expire every collection scoped to one of the given containers, for
    /// when a container's contents become stale. Returns the matches.
    ///
    /// 使作用于任一给定容器的每个集合过期，
    /// 用于容器内容失效的场景。返回匹配到的集合。
    pub fn reset_container(self: &Rc<Self>, ids: &[ContainerId]) -> Vec<CollectionRef<R>> {
        let matches = self.select(|handle| {
            handle
                .container()
                .is_some_and(|container| ids.contains(container))
        });
        for collection in &matches {
            collection.expire();
        }
        matches
    }

    fn select(self: &Rc<Self>, keep: impl Fn(&Handle) -> bool) -> Vec<CollectionRef<R>> {
        let handles: Vec<Handle> = self
            .inner
            .borrow()
            .slots
            .keys()
            .filter(|handle| keep(handle))
            .cloned()
            .collect();
        handles
            .into_iter()
            .map(|handle| CollectionRef {
                pool: Rc::clone(self),
                handle,
            })
            .collect()
    }

    /// Set the one-shot preserve flag on every copy of `key` across the
    /// pool. Applied immediately before an operation that would otherwise
    /// look like a delete, so the removal does not cascade elsewhere.
    ///
    /// 在池内 `key` 的每个副本上设置一次性保留标志。
    /// 在一个否则看起来像删除的操作之前立即使用，
    /// 使移除不会级联到其他位置。
    pub fn preserve_entity(&self, key: &R::Key, state: bool) {
        let mut inner = self.inner.borrow_mut();
        for slot in inner.slots.values_mut() {
            if let Some(target) = slot.collection.get_mut(key) {
                target.set_preserve(state);
            }
        }
    }

    /// Suppress removal propagation across the whole pool for the lifetime
    /// of the returned guard. The guard releases on drop, on every exit
    /// path.
    ///
    /// 在返回的守卫的生命周期内抑制整个池的移除传播。
    /// 守卫在 drop 时释放，覆盖所有退出路径。
    pub fn preserve_batch(&self) -> PreserveBatch<'_> {
        self.batch_flag.set(true);
        PreserveBatch {
            flag: &self.batch_flag,
        }
    }

    /// Run one mark-and-sweep garbage collection cycle over this pool's
    /// registry. The caller debounces the triggering invalidation signal;
    /// the collector performs no debouncing of its own.
    ///
    /// 对此池的注册表运行一次标记-清扫垃圾回收周期。
    /// 调用方对触发的失效信号做防抖；回收器自身不做防抖。
    pub fn gc(&self) {
        if self.disposed.get() {
            return;
        }
        let events = gc::collect(self);
        self.dispatch(&events);
    }

    /// Union of the dependent keys reported by every registered liveness
    /// source for `key`. Empty when no sources are registered.
    ///
    /// 所有已注册保活源为 `key` 报告的依赖键的并集。
    /// 未注册任何源时为空。
    pub fn dependent_keys(&self, key: &R::Key) -> Vec<R::Key> {
        // Snapshot so a source may register further sources re-entrantly.
        // 快照化，使保活源可以重入地注册更多保活源。
        let sources: Vec<Rc<dyn LivenessSource<R>>> = self.liveness.borrow().clone();
        let mut keys = Vec::new();
        for source in &sources {
            keys.extend(source.dependent_keys(key));
        }
        keys
    }

    /// Register a liveness source consulted during the GC mark phase.
    /// 注册一个在 GC 标记阶段被查询的保活源。
    pub fn register_liveness(&self, source: impl LivenessSource<R> + 'static) {
        self.liveness.borrow_mut().push(Rc::new(source));
    }

    /// Permanently pin an identity key against the canonical sweep.
    /// 永久钉住一个身份键，使其不被规范集合的清扫回收。
    pub fn pin(&self, key: R::Key) {
        self.pinned.borrow_mut().insert(key);
    }

    /// Remove a pin. Returns whether the key was pinned.
    /// 移除钉住。返回该键此前是否被钉住。
    pub fn unpin(&self, key: &R::Key) -> bool {
        self.pinned.borrow_mut().remove(key)
    }

    /// Subscribe to all notifications emitted by this pool's collections.
    /// Subscribers run synchronously, after a mutation batch settles.
    ///
    /// 订阅此池的集合发出的所有通知。
    /// 订阅者在一次变更批次落定后同步运行。
    pub fn subscribe(&self, subscriber: impl Fn(&PoolEvent<R>) + 'static) {
        self.subscribers.borrow_mut().push(Rc::new(subscriber));
    }

    /// Mark this pool disposed. Subsequent `add`/`remove` calls are no-ops.
    /// 将此池标记为已弃置。后续的 `add`/`remove` 调用为空操作。
    pub fn dispose(&self) {
        self.disposed.set(true);
        debug!(domain = %self.domain, "pool disposed");
    }

    /// Whether this pool has been disposed.
    /// 此池是否已被弃置。
    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    /// Run a primitive mutation against one collection, then feed every
    /// change/removal it emitted through the propagation engine and deliver
    /// the settled batch to subscribers.
    ///
    /// 对一个集合执行基本变更，然后将其发出的每个变更/移除送入
    /// 传播引擎，并把落定后的批次递送给订阅者。
    pub(crate) fn apply(
        &self,
        handle: &Handle,
        op: impl FnOnce(&mut Collection<R>) -> Vec<PoolEvent<R>>,
    ) {
        if self.disposed.get() {
            trace!(domain = %self.domain, handle = handle.as_str(), "mutation ignored, pool disposed");
            return;
        }
        let primary = {
            let mut inner = self.inner.borrow_mut();
            let slot = inner.ensure(handle);
            op(&mut slot.collection)
        };
        let mut batch: Vec<PoolEvent<R>> = Vec::with_capacity(primary.len());
        for event in primary {
            let follow = match (&event.kind, &event.record) {
                (EventKind::Changed, Some(record)) => {
                    propagate::changes(self, &event.handle, record)
                }
                (EventKind::Removed { .. }, Some(record)) => {
                    propagate::removals(self, &event.handle, record)
                }
                _ => Vec::new(),
            };
            batch.push(event);
            batch.extend(follow);
        }
        self.dispatch(&batch);
    }

    fn dispatch(&self, events: &[PoolEvent<R>]) {
        if events.is_empty() {
            return;
        }
        // Snapshot so subscribers may subscribe or mutate re-entrantly.
        // 快照化，使订阅者可以重入地订阅或变更。
        let subscribers: Vec<Rc<dyn Fn(&PoolEvent<R>)>> = self.subscribers.borrow().clone();
        for event in events {
            for subscriber in &subscribers {
                subscriber(event);
            }
        }
    }
}

/// Access handle to one named collection of a pool.
///
/// All mutations route through the pool pipeline, so propagation and
/// subscriber dispatch always fire. Cheap to clone.
///
/// 池内某个命名集合的访问句柄。
/// 所有变更都经过池的流水线，因此传播和订阅者分发总是会触发。
/// 克隆开销很低。
pub struct CollectionRef<R: Record> {
    pool: Rc<Pool<R>>,
    handle: Handle,
}

impl<R: Record> Clone for CollectionRef<R> {
    fn clone(&self) -> Self {
        Self {
            pool: Rc::clone(&self.pool),
            handle: self.handle.clone(),
        }
    }
}

impl<R: Record> CollectionRef<R> {
    /// The handle this reference points at.
    /// 此引用指向的句柄。
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Add records with merge semantics: an existing identity is updated in
    /// place (emitting `Changed`), a new one is inserted (emitting
    /// `Added`). Clears the `expired` mark.
    ///
    /// 以合并语义添加记录：已有身份被就地更新（发出 `Changed`），
    /// 新身份被插入（发出 `Added`）。清除 `expired` 标记。
    pub fn add(&self, data: impl IntoIterator<Item = R>) {
        let records: Vec<R> = data.into_iter().collect();
        self.pool.apply(&self.handle, move |collection| {
            records
                .into_iter()
                .filter_map(|record| collection.upsert(record))
                .collect()
        });
    }

    /// Remove the record with the given identity key, emitting `Removed`
    /// with the copy's preserve flag. Clears the `expired` mark.
    ///
    /// 移除给定身份键对应的记录，发出携带该副本保留标志的
    /// `Removed`。清除 `expired` 标记。
    pub fn remove(&self, key: &R::Key) {
        self.pool.apply(&self.handle, |collection| {
            collection.remove(key).into_iter().collect()
        });
    }

    /// Mark the collection expired without removing content.
    /// 将集合标记为过期而不移除内容。
    pub fn expire(&self) {
        self.pool
            .apply(&self.handle, |collection| collection.expire().into_iter().collect());
    }

    /// Clear the `expired` mark and record an access, keeping the
    /// collection alive across the next GC cycle.
    ///
    /// 清除 `expired` 标记并记录一次访问，
    /// 使集合在下个 GC 周期中存活。
    pub fn touch(&self) {
        if self.pool.is_disposed() {
            return;
        }
        let mut inner = self.pool.inner.borrow_mut();
        inner.ensure(&self.handle).collection.touch();
    }

    /// Update the completeness state. No-op without pagination; emits only
    /// on change.
    /// 更新完整性状态。无分页时为空操作；仅在变化时发出通知。
    pub fn set_complete(&self, state: bool) {
        self.pool.apply(&self.handle, |collection| {
            collection.set_complete(state).into_iter().collect()
        });
    }

    /// Toggle pagination. A non-paginated collection is always complete.
    /// 切换分页。非分页集合始终是完整的。
    pub fn set_pagination(&self, state: bool) {
        self.with_slot(|slot| slot.collection.pagination = state);
    }

    /// Toggle the sorted metadata flag.
    /// 切换已排序元数据标志。
    pub fn set_sorted(&self, state: bool) {
        self.with_slot(|slot| slot.collection.sorted = state);
    }

    /// Exclude this collection from (or re-include it in) the GC re-arm
    /// phase. A non-eligible collection is never marked expired by `gc()`.
    ///
    /// 将此集合排除出（或重新纳入）GC 的重新武装阶段。
    /// 不符合条件的集合永远不会被 `gc()` 标记为过期。
    pub fn set_gc_eligible(&self, state: bool) {
        self.with_slot(|slot| slot.collection.gc_eligible = state);
    }

    /// Clone of the record with the given identity key. Records an access.
    /// 给定身份键对应记录的克隆。记录一次访问。
    pub fn get(&self, key: &R::Key) -> Option<R> {
        if self.pool.is_disposed() {
            return None;
        }
        let mut inner = self.pool.inner.borrow_mut();
        let slot = inner.slots.get_mut(&self.handle)?;
        slot.last_access = Instant::now();
        slot.collection.get(key).cloned()
    }

    /// Clones of all records, in collection order. Records an access.
    /// 所有记录的克隆，按集合顺序。记录一次访问。
    pub fn records(&self) -> Vec<R> {
        if self.pool.is_disposed() {
            return Vec::new();
        }
        let mut inner = self.pool.inner.borrow_mut();
        match inner.slots.get_mut(&self.handle) {
            Some(slot) => {
                slot.last_access = Instant::now();
                slot.collection.records().cloned().collect()
            }
            None => Vec::new(),
        }
    }

    pub fn contains(&self, key: &R::Key) -> bool {
        self.peek(|collection| collection.contains(key))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.peek(|collection| collection.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.peek(|collection| collection.is_empty()).unwrap_or(true)
    }

    pub fn expired(&self) -> bool {
        self.peek(|collection| collection.expired).unwrap_or(false)
    }

    /// Effective completeness: a non-paginated collection is always
    /// complete.
    /// 有效完整性：非分页集合始终是完整的。
    pub fn complete(&self) -> bool {
        self.peek(|collection| collection.is_complete())
            .unwrap_or(false)
    }

    pub fn pagination(&self) -> bool {
        self.peek(|collection| collection.pagination).unwrap_or(true)
    }

    pub fn sorted(&self) -> bool {
        self.peek(|collection| collection.sorted).unwrap_or(true)
    }

    pub fn gc_eligible(&self) -> bool {
        self.peek(|collection| collection.gc_eligible).unwrap_or(true)
    }

    /// When this collection was last accessed, if it is registered.
    /// 此集合最近一次被访问的时间（若已注册）。
    pub fn last_access(&self) -> Option<Instant> {
        self.pool
            .inner
            .borrow()
            .slots
            .get(&self.handle)
            .map(|slot| slot.last_access)
    }

    /// Whether the collection is currently registered in the pool. A
    /// reference survives reclamation; the next mutation through it
    /// re-creates an empty collection.
    ///
    /// 集合当前是否注册在池中。引用在回收后仍然有效；
    /// 之后通过它进行的变更会重新创建一个空集合。
    pub fn is_registered(&self) -> bool {
        self.pool.inner.borrow().slots.contains_key(&self.handle)
    }

    // Metadata reads do not count as entity access.
    // 元数据读取不算作实体访问。
    fn peek<T>(&self, read: impl FnOnce(&Collection<R>) -> T) -> Option<T> {
        self.pool
            .inner
            .borrow()
            .slots
            .get(&self.handle)
            .map(|slot| read(&slot.collection))
    }

    fn with_slot(&self, write: impl FnOnce(&mut Slot<R>)) {
        if self.pool.is_disposed() {
            return;
        }
        let mut inner = self.pool.inner.borrow_mut();
        write(inner.ensure(&self.handle));
    }
}

/// The per-domain singleton registry: re-requesting a pool for the same
/// domain returns the same instance.
///
/// # Example
/// ```
/// use std::rc::Rc;
/// use view_pool::{Entity, PoolSet};
///
/// let pools: PoolSet<Entity> = PoolSet::new();
/// let first = pools.acquire("mail");
/// let second = pools.acquire("mail");
/// assert!(Rc::ptr_eq(&first, &second));
/// ```
///
/// 按域的单例注册表：对同一个域重复请求池会返回同一个实例。
pub struct PoolSet<R: Record> {
    pools: RefCell<IndexMap<String, Rc<Pool<R>>>>,
}

impl<R: Record> PoolSet<R> {
    pub fn new() -> Self {
        Self {
            pools: RefCell::new(IndexMap::new()),
        }
    }

    /// The pool for `domain`, created with defaults on first request.
    /// `domain` 对应的池，首次请求时以默认配置创建。
    pub fn acquire(&self, domain: &str) -> Rc<Pool<R>> {
        self.acquire_with(domain, |builder| builder)
    }

    /// The pool for `domain`, created through the configured builder on
    /// first request. The configuration closure is ignored for an existing
    /// pool.
    ///
    /// `domain` 对应的池，首次请求时通过配置后的构建器创建。
    /// 对已存在的池，配置闭包会被忽略。
    pub fn acquire_with(
        &self,
        domain: &str,
        configure: impl FnOnce(PoolBuilder<R>) -> PoolBuilder<R>,
    ) -> Rc<Pool<R>> {
        if let Some(pool) = self.pools.borrow().get(domain) {
            return Rc::clone(pool);
        }
        let pool = configure(Pool::builder(domain)).build();
        self.pools
            .borrow_mut()
            .insert(domain.to_string(), Rc::clone(&pool));
        pool
    }

    /// Dispose the pool for `domain` and unregister it. Returns whether a
    /// pool existed. Live references to the disposed pool keep working but
    /// their mutations are no-ops.
    ///
    /// 弃置 `domain` 对应的池并将其注销。返回池此前是否存在。
    /// 指向已弃置池的引用仍然可用，但其变更为空操作。
    pub fn dispose(&self, domain: &str) -> bool {
        match self.pools.borrow_mut().shift_remove(domain) {
            Some(pool) => {
                pool.dispose();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.pools.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.borrow().is_empty()
    }
}

impl<R: Record> Default for PoolSet<R> {
    fn default() -> Self {
        Self::new()
    }
}
