//! In-process object cache for client applications that keep many
//! simultaneous views (lists, grids, detail panes) over the same domain
//! entities.
//!
//! The heart of the crate is the [`Pool`]: a per-domain registry that lazily
//! creates named, identity-unique collections, propagates attribute changes
//! and removals between all collections holding the same logical entity, and
//! reclaims collections and entities no longer referenced by any live view
//! with a mark-and-sweep strategy driven by an external, throttled
//! invalidation signal.
//!
//! Remote fetch/sync adapters, rendering, and identity-key derivation are
//! external collaborators: the identity function is injected through the
//! [`Record`] trait, and the rendering layer subscribes to pool events to
//! redraw.
//!
//! Everything runs synchronously on the calling thread; the model is
//! single-threaded and cooperative. Re-entrancy, not parallelism, is the
//! hazard, and the per-pool guard flags handle it.
//!
//! # Example
//! ```
//! use serde_json::json;
//! use view_pool::{Entity, Handle, Lookup, PoolSet};
//!
//! let pools: PoolSet<Entity> = PoolSet::new();
//! let mail = pools.acquire("mail");
//!
//! // Populate the canonical collection and a view.
//! mail.add(None, [Entity::new("m1").with_attr("subject", json!("Hi"))]);
//! let inbox = mail.get(Handle::named("inbox"));
//! inbox.add([Entity::new("m1").with_attr("subject", json!("Hi"))]);
//!
//! // A change through one view reaches every sibling copy.
//! inbox.add([Entity::new("m1").with_attr("subject", json!("Hello"))]);
//! let detail = mail.get(Handle::detail());
//! assert_eq!(
//!     detail.get(&"m1".to_string()).unwrap().attr("subject"),
//!     Some(&json!("Hello"))
//! );
//!
//! // Lookup misses resolve to placeholders, never errors.
//! let resolved = mail.resolve([Lookup::Key("m2".to_string())]);
//! assert!(resolved[0].is_placeholder());
//! ```
//!
//! 面向客户端应用的进程内对象缓存，用于在相同领域实体上
//! 同时维护多个视图（列表、网格、详情面板）。
//!
//! 本 crate 的核心是 [`Pool`]：一个按域的注册表，它惰性创建命名的、
//! 按身份唯一的集合，在持有同一逻辑实体的所有集合之间传播属性变更
//! 和移除，并通过由外部节流失效信号驱动的标记-清扫策略，
//! 回收不再被任何存活视图引用的集合和实体。
//!
//! 远程获取/同步适配器、渲染层和身份键派生都是外部协作者：
//! 身份函数通过 [`Record`] trait 注入，渲染层订阅池事件来重绘。
//!
//! 一切都在调用线程上同步运行 —— 模型是单线程协作式的。
//! 危险在于重入而非并行，由每个池独立的守卫标志处理。

mod collection;
mod error;
mod event;
mod gc;
mod handle;
mod pool;
mod propagate;
mod record;

pub use error::RecordError;
pub use event::{EventKind, PoolEvent};
pub use gc::LivenessSource;
pub use handle::{ContainerId, DETAIL_HANDLE, Handle, SEARCH_PREFIX, SortKey};
pub use pool::{CollectionRef, Lookup, Pool, PoolBuilder, PoolSet};
pub use propagate::PreserveBatch;
pub use record::{ENTITY_LOCAL_ATTRS, Entity, Record};

#[cfg(test)]
mod tests;
