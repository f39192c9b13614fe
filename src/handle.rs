use std::fmt;
use std::hash::{Hash, Hasher};

/// Reserved handle of the canonical superset collection. Every top-level
/// entity independently creatable through a pool ends up representable here;
/// all other collections are views holding a subset.
///
/// 规范超集集合的保留句柄。通过池独立创建的每个顶层实体
/// 最终都会在这里有表示；其他所有集合都是持有子集的视图。
pub const DETAIL_HANDLE: &str = "detail";

/// Reserved prefix of search-result collections. They are exempt from the
/// garbage collector's collection sweep because they lack well-defined
/// reset semantics.
///
/// 搜索结果集合的保留前缀。由于缺乏明确定义的重置语义，
/// 它们不参与垃圾回收器的集合清扫。
pub const SEARCH_PREFIX: &str = "search";

/// Identifier of the container (folder, calendar, address book) a view is
/// scoped to.
/// 视图所属容器（文件夹、日历、通讯录）的标识符。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerId(String);

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContainerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Sort order a scoped view is materialized under.
/// 某个作用域视图所使用的排序方式。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortKey(String);

impl SortKey {
    pub fn new(sort: impl Into<String>) -> Self {
        Self(sort.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SortKey {
    fn from(sort: &str) -> Self {
        Self::new(sort)
    }
}

/// Name of a named collection within a pool, with structured scope metadata.
///
/// Registry identity is the raw name only (equality and hashing ignore the
/// metadata fields); handle lookups are case- and form-sensitive, no
/// normalization is performed. The optional container and sort fields carry
/// the scope a view was created for, so bulk discovery
/// (`Pool::get_by_container`, `Pool::get_by_sort`, `Pool::reset_container`)
/// queries explicit fields instead of parsing the name string. Raw
/// substring matching remains available through `Pool::grep` for ad hoc
/// discovery.
///
/// 池内命名集合的名称，带有结构化的作用域元数据。
/// 注册表身份只由原始名称决定（相等性和哈希忽略元数据字段）；
/// 句柄查找区分大小写和形式，不做任何归一化。
/// 可选的容器和排序字段携带视图创建时的作用域，因此批量发现
/// （`Pool::get_by_container`、`Pool::get_by_sort`、`Pool::reset_container`）
/// 查询显式字段而非解析名称字符串。
/// 原始子串匹配仍可通过 `Pool::grep` 用于临时发现。
#[derive(Debug, Clone)]
pub struct Handle {
    raw: String,
    container: Option<ContainerId>,
    sort: Option<SortKey>,
}

impl Handle {
    /// The canonical `"detail"` handle.
    /// 规范的 `"detail"` 句柄。
    pub fn detail() -> Self {
        Self {
            raw: DETAIL_HANDLE.to_string(),
            container: None,
            sort: None,
        }
    }

    /// A plain named handle without scope metadata.
    ///
    /// Fails fast on an empty name: a missing handle is a programming
    /// error, never silently defaulted.
    ///
    /// 不带作用域元数据的普通命名句柄。
    /// 名称为空时立即失败：缺失的句柄是编程错误，绝不静默采用默认值。
    pub fn named(name: impl Into<String>) -> Self {
        let raw = name.into();
        assert!(!raw.is_empty(), "collection handle must not be empty");
        Self {
            raw,
            container: None,
            sort: None,
        }
    }

    /// Handle of a search-result collection for `query`.
    /// `query` 对应的搜索结果集合的句柄。
    pub fn search(query: &str) -> Self {
        Self {
            raw: format!("{SEARCH_PREFIX}/{query}"),
            container: None,
            sort: None,
        }
    }

    /// Handle of a view scoped to a container under a sort order.
    /// 在某排序方式下、作用于某容器的视图句柄。
    pub fn view(container: ContainerId, sort: SortKey) -> Self {
        Self {
            raw: format!("{container}/{sort}"),
            container: Some(container),
            sort: Some(sort),
        }
    }

    /// The raw registry name.
    /// 原始注册表名称。
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Container this view is scoped to, if any.
    /// 此视图所属的容器（如有）。
    pub fn container(&self) -> Option<&ContainerId> {
        self.container.as_ref()
    }

    /// Sort order this view is materialized under, if any.
    /// 此视图使用的排序方式（如有）。
    pub fn sort(&self) -> Option<&SortKey> {
        self.sort.as_ref()
    }

    /// Whether this is the canonical `"detail"` handle.
    /// 是否为规范的 `"detail"` 句柄。
    pub fn is_detail(&self) -> bool {
        self.raw == DETAIL_HANDLE
    }

    /// Whether this names a search-result collection.
    /// 是否命名一个搜索结果集合。
    pub fn is_search(&self) -> bool {
        self.raw.starts_with(SEARCH_PREFIX)
    }

    /// Whether the raw name contains every given substring. Used by
    /// `Pool::grep` for ad hoc bulk discovery.
    ///
    /// 原始名称是否包含每个给定子串。由 `Pool::grep` 用于临时批量发现。
    pub fn matches(&self, tokens: &[&str]) -> bool {
        tokens.iter().all(|token| self.raw.contains(token))
    }
}

impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Handle {}

impl Hash for Handle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for Handle {
    fn from(name: &str) -> Self {
        if name == DETAIL_HANDLE {
            Self::detail()
        } else {
            Self::named(name)
        }
    }
}
