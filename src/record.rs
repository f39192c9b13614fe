use std::fmt::Debug;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::RecordError;

/// Attribute names that are collection-local and never propagated between
/// sibling collections. Positional metadata (render order, numeric rank)
/// belongs to one collection only.
///
/// 集合本地的、永远不会在兄弟集合之间传播的属性名。
/// 位置元数据（渲染顺序、数字排名）只属于单个集合。
pub const ENTITY_LOCAL_ATTRS: &[&str] = &["index", "rank"];

/// The domain entity contract stored in pool collections.
///
/// A `Record` carries a stable identity key derived from its semantically
/// meaningful fields (the identity function is whatever the implementation
/// of `identity_key()` does; it is injected through this trait, not
/// implemented by the pool). Two records with the same key represent the
/// same logical entity and are reconciled, never duplicated, within one
/// collection.
///
/// Collections own independent copies of a record; the propagation engine
/// reconciles the copies after every change or removal.
///
/// **Contract**: `identity_key()` is deterministic and must not change as a
/// side effect of ordinary attribute updates. Renames and moves are an
/// explicit identity-changing operation (remove + re-add), never an implicit
/// one.
///
/// 存储在池集合中的领域实体契约。
/// `Record` 携带一个从其语义字段派生的稳定身份键
/// （身份函数就是 `identity_key()` 的实现 —— 它通过此 trait 注入，
/// 而非由池实现）。两个具有相同键的记录代表同一个逻辑实体，
/// 在一个集合内只会被调和，永远不会重复。
/// 各集合持有记录的独立副本；传播引擎在每次变更或移除后调和这些副本。
/// **契约**：`identity_key()` 是确定性的，不能因普通属性更新而改变。
/// 重命名和移动是显式的身份变更操作（移除 + 重新添加），而非隐式的。
pub trait Record: Clone {
    /// Stable identity key type. Equality of keys means "same logical
    /// entity".
    /// 稳定的身份键类型。键相等意味着"同一个逻辑实体"。
    type Key: Clone + Eq + Hash + Debug;

    /// Derive the identity key for this record.
    /// 派生此记录的身份键。
    fn identity_key(&self) -> Self::Key;

    /// Merge another payload for the same identity into this record, in
    /// place. Used by collection `add` so that re-adding an existing
    /// identity updates rather than duplicates.
    ///
    /// 将同一身份的另一个载荷就地合并到此记录中。
    /// 集合的 `add` 使用它，使重复添加已有身份时进行更新而非重复插入。
    fn merge_from(&mut self, other: &Self) -> Result<(), RecordError>;

    /// Copy the propagated attribute set from `source` into this copy,
    /// excluding collection-local metadata such as positional indices.
    ///
    /// 将 `source` 中需要传播的属性集复制到此副本中，
    /// 排除位置索引等集合本地元数据。
    fn copy_propagated(&mut self, source: &Self) -> Result<(), RecordError>;

    /// Current state of the one-shot preserve flag.
    /// 一次性保留标志的当前状态。
    fn preserve(&self) -> bool;

    /// Set or clear the one-shot preserve flag.
    /// 设置或清除一次性保留标志。
    fn set_preserve(&mut self, state: bool);

    /// Construct an empty placeholder for a lookup miss. `Pool::resolve`
    /// never fails; absent identities yield placeholders.
    ///
    /// 为查找未命中构造一个空占位符。`Pool::resolve` 永不失败；
    /// 不存在的身份会得到占位符。
    fn placeholder(key: Self::Key) -> Self;

    /// Whether this payload looks like a nested sub-object rather than a
    /// top-level entity. Sub-objects are not auto-registered into the
    /// canonical `"detail"` collection.
    ///
    /// 此载荷是否看起来像嵌套子对象而非顶层实体。
    /// 子对象不会被自动注册到规范的 `"detail"` 集合中。
    fn is_subobject(&self) -> bool {
        false
    }
}

/// The provided general-purpose record: a mutable attribute bag keyed by a
/// string identity, deserializable straight from a remote JSON payload.
///
/// The sub-object heuristic considers a payload nested when it carries a
/// `"parent"` attribute but no `"container"` attribute, since only
/// top-level entities reference their container directly.
///
/// 提供的通用记录：一个以字符串身份为键的可变属性包，
/// 可直接从远程 JSON 载荷反序列化。
/// 子对象启发式：载荷带有 `"parent"` 属性但没有 `"container"` 属性时
/// 视为嵌套 —— 只有顶层实体直接引用其容器。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    key: String,
    #[serde(default)]
    attributes: Map<String, Value>,
    #[serde(skip)]
    preserve: bool,
}

impl Entity {
    /// Create an entity with the given identity key and no attributes.
    /// 使用给定身份键创建一个没有属性的实体。
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            attributes: Map::new(),
            preserve: false,
        }
    }

    /// Builder-style attribute assignment.
    /// 构建器风格的属性赋值。
    pub fn with_attr(mut self, name: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    /// The identity key string.
    /// 身份键字符串。
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Look up a single attribute.
    /// 查找单个属性。
    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Assign a single attribute in place.
    /// 就地赋值单个属性。
    pub fn set_attr(&mut self, name: impl Into<String>, value: Value) {
        self.attributes.insert(name.into(), value);
    }

    /// All attributes of this entity.
    /// 此实体的全部属性。
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// A placeholder carries no attributes at all.
    /// 占位符不携带任何属性。
    pub fn is_placeholder(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl Record for Entity {
    type Key = String;

    fn identity_key(&self) -> String {
        self.key.clone()
    }

    fn merge_from(&mut self, other: &Self) -> Result<(), RecordError> {
        for (name, value) in &other.attributes {
            self.attributes.insert(name.clone(), value.clone());
        }
        Ok(())
    }

    fn copy_propagated(&mut self, source: &Self) -> Result<(), RecordError> {
        for (name, value) in &source.attributes {
            if ENTITY_LOCAL_ATTRS.contains(&name.as_str()) {
                continue;
            }
            self.attributes.insert(name.clone(), value.clone());
        }
        Ok(())
    }

    fn preserve(&self) -> bool {
        self.preserve
    }

    fn set_preserve(&mut self, state: bool) {
        self.preserve = state;
    }

    fn placeholder(key: String) -> Self {
        Self::new(key)
    }

    fn is_subobject(&self) -> bool {
        self.attributes.contains_key("parent") && !self.attributes.contains_key("container")
    }
}
