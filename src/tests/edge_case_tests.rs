/// 边界情况测试模块
/// 测试重入级联、句柄边界、占位符和批次内的重复载荷
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::json;

use crate::{Entity, EventKind, Handle, Pool, PoolEvent, Record, RecordError};

fn message(key: &str, subject: &str) -> Entity {
    Entity::new(key).with_attr("subject", json!(subject))
}

/// 测试1: 跨多个集合的级联移除终止且不重复通知
#[test]
fn test_cascading_removal_terminates_without_duplicates() {
    let pool = Pool::<Entity>::builder("mail").build();
    for handle in ["detail", "inbox", "starred", "archive"] {
        pool.add(Some(Handle::from(handle)), [message("m1", "Hi")]);
    }
    let removed: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&removed);
    pool.subscribe(move |event: &PoolEvent<Entity>| {
        if matches!(event.kind, EventKind::Removed { .. }) {
            sink.borrow_mut().push(event.handle.as_str().to_string());
        }
    });

    pool.get(Handle::named("inbox")).remove(&"m1".to_string());

    // 每个持有该身份的集合恰好收到一次移除
    let mut handles = removed.borrow().clone();
    handles.sort();
    assert_eq!(handles, ["archive", "detail", "inbox", "starred"]);
    for handle in ["detail", "inbox", "starred", "archive"] {
        assert!(!pool.get(Handle::from(handle)).contains(&"m1".to_string()));
    }
}

/// 测试2: 订阅者在事件回调中触发进一步变更
#[test]
fn test_subscriber_reentry_terminates() {
    let pool = Pool::<Entity>::builder("mail").build();
    pool.add(None, [message("m1", "Hi"), message("m2", "Bye")]);
    pool.add(
        Some(Handle::named("inbox")),
        [message("m1", "Hi"), message("m2", "Bye")],
    );

    let fired = Rc::new(Cell::new(false));
    let flag = Rc::clone(&fired);
    let reentrant = Rc::clone(&pool);
    pool.subscribe(move |event: &PoolEvent<Entity>| {
        if matches!(event.kind, EventKind::Removed { .. }) && !flag.get() {
            flag.set(true);
            // 第一次移除通知触发对另一个身份的移除
            reentrant
                .get(Handle::named("inbox"))
                .remove(&"m2".to_string());
        }
    });

    pool.get(Handle::named("inbox")).remove(&"m1".to_string());

    assert!(fired.get());
    for key in ["m1", "m2"] {
        assert!(!pool.get(Handle::detail()).contains(&key.to_string()));
        assert!(!pool.get(Handle::named("inbox")).contains(&key.to_string()));
    }
}

/// 测试3: 占位符没有属性且保留标志为未设置
#[test]
fn test_placeholder_shape() {
    let placeholder = Entity::placeholder("missing".to_string());

    assert_eq!(placeholder.key(), "missing");
    assert!(placeholder.is_placeholder());
    assert!(!placeholder.preserve());
    assert!(placeholder.attributes().is_empty());
}

/// 测试4: 移除不存在的身份不发出任何通知
#[test]
fn test_remove_unknown_key_is_silent() {
    let pool = Pool::<Entity>::builder("mail").build();
    let count = Rc::new(Cell::new(0usize));
    let counter = Rc::clone(&count);
    pool.subscribe(move |_event: &PoolEvent<Entity>| counter.set(counter.get() + 1));

    pool.get(Handle::named("inbox")).remove(&"ghost".to_string());

    assert_eq!(count.get(), 0);
}

/// 测试5: expire 只在状态变化时发出通知
#[test]
fn test_expire_emits_only_on_transition() {
    let pool = Pool::<Entity>::builder("mail").build();
    let inbox = pool.get(Handle::named("inbox"));
    let count = Rc::new(Cell::new(0usize));
    let counter = Rc::clone(&count);
    pool.subscribe(move |event: &PoolEvent<Entity>| {
        if event.kind == EventKind::Expired {
            counter.set(counter.get() + 1);
        }
    });

    inbox.expire();
    inbox.expire();

    assert_eq!(count.get(), 1);
    assert!(inbox.expired());
    // 过期不清空内容
    inbox.touch();
    assert!(!inbox.expired());
}

/// 测试6: 句柄身份只由原始名称决定
#[test]
fn test_handle_identity_ignores_scope_metadata() {
    let pool = Pool::<Entity>::builder("mail").build();
    let structured = Handle::view("folder1".into(), "date".into());
    let raw = Handle::named("folder1/date");
    assert_eq!(structured, raw);

    pool.get(structured).add([message("m1", "Hi")]);
    // 同名句柄落在同一个集合上
    assert!(pool.get(raw).contains(&"m1".to_string()));
}

/// 测试7: 空句柄名立即失败
#[test]
#[should_panic(expected = "collection handle must not be empty")]
fn test_empty_handle_name_fails_fast() {
    let _ = Handle::named("");
}

/// 测试8: 同一批次内的重复载荷先插入再合并
#[test]
fn test_duplicate_payloads_in_one_batch() {
    let pool = Pool::<Entity>::builder("mail").build();
    let seen: Rc<RefCell<Vec<EventKind>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    pool.subscribe(move |event: &PoolEvent<Entity>| sink.borrow_mut().push(event.kind.clone()));

    let inbox = pool.get(Handle::named("inbox"));
    inbox.add([
        message("m1", "Hi"),
        message("m1", "Hello").with_attr("flagged", json!(true)),
    ]);

    assert_eq!(inbox.len(), 1);
    let copy = inbox.get(&"m1".to_string()).unwrap();
    assert_eq!(copy.attr("subject"), Some(&json!("Hello")));
    assert_eq!(
        seen.borrow().as_slice(),
        &[EventKind::Added, EventKind::Changed]
    );
}

/// 测试9: 对未注册句柄的读取返回默认值
#[test]
fn test_reads_on_unregistered_handle_use_defaults() {
    let pool = Pool::<Entity>::builder("mail").build();
    pool.dispose();
    let phantom = pool.get(Handle::named("phantom"));

    assert!(!phantom.is_registered());
    assert!(phantom.is_empty());
    assert_eq!(phantom.len(), 0);
    assert!(!phantom.expired());
    assert!(phantom.get(&"m1".to_string()).is_none());
    assert!(phantom.last_access().is_none());
}

/// 测试10: 不同身份的并行更新互不干扰
#[test]
fn test_distinct_identities_do_not_interfere() {
    let pool = Pool::<Entity>::builder("mail").build();
    pool.add(None, [message("m1", "One"), message("m2", "Two")]);
    pool.add(Some(Handle::named("inbox")), [message("m1", "One")]);
    pool.add(Some(Handle::named("outbox")), [message("m2", "Two")]);

    pool.get(Handle::named("inbox")).add([message("m1", "One!")]);
    pool.get(Handle::named("outbox")).add([message("m2", "Two!")]);

    let detail = pool.get(Handle::detail());
    assert_eq!(
        detail.get(&"m1".to_string()).unwrap().attr("subject"),
        Some(&json!("One!"))
    );
    assert_eq!(
        detail.get(&"m2".to_string()).unwrap().attr("subject"),
        Some(&json!("Two!"))
    );
    // 视图只持有自己的子集
    assert_eq!(pool.get(Handle::named("inbox")).len(), 1);
    assert_eq!(pool.get(Handle::named("outbox")).len(), 1);
}

/// 测试11: 合并被拒绝时集合原样保留，包括过期标记
#[test]
fn test_rejected_merge_keeps_expired_mark() {
    #[derive(Debug, Clone)]
    struct Sealed {
        key: String,
        preserve: bool,
    }

    impl Record for Sealed {
        type Key = String;

        fn identity_key(&self) -> String {
            self.key.clone()
        }

        fn merge_from(&mut self, _other: &Self) -> Result<(), RecordError> {
            Err(RecordError::Apply {
                key: self.key.clone(),
                reason: "record is sealed".to_string(),
            })
        }

        fn copy_propagated(&mut self, _source: &Self) -> Result<(), RecordError> {
            Ok(())
        }

        fn preserve(&self) -> bool {
            self.preserve
        }

        fn set_preserve(&mut self, state: bool) {
            self.preserve = state;
        }

        fn placeholder(key: String) -> Self {
            Self {
                key,
                preserve: false,
            }
        }
    }

    fn sealed(key: &str) -> Sealed {
        Sealed {
            key: key.to_string(),
            preserve: false,
        }
    }

    let pool = Pool::<Sealed>::builder("mail").build();
    let inbox = pool.get(Handle::named("inbox"));
    inbox.add([sealed("m1")]);
    inbox.expire();
    assert!(inbox.expired());

    // 合并失败：已有副本和过期标记都保持不变
    inbox.add([sealed("m1")]);
    assert!(inbox.expired());
    assert_eq!(inbox.len(), 1);

    // 插入新身份仍会清除过期标记
    inbox.add([sealed("m2")]);
    assert!(!inbox.expired());
}
