/// 传播引擎测试模块
/// 测试变更与移除在兄弟集合之间的镜像、保留标志和批量保留作用域
use std::cell::RefCell;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use serde_json::json;

use crate::{Entity, EventKind, Handle, Pool, PoolEvent};

fn message(key: &str, subject: &str) -> Entity {
    Entity::new(key).with_attr("subject", json!(subject))
}

fn mail_pool_with_inbox() -> Rc<Pool<Entity>> {
    let pool = Pool::<Entity>::builder("mail").build();
    pool.add(None, [message("m1", "Hi")]);
    pool.add(Some(Handle::named("inbox")), [message("m1", "Hi")]);
    pool
}

/// 测试1: 经由一个视图的变更到达规范集合
#[test]
fn test_change_propagates_to_detail() {
    let pool = mail_pool_with_inbox();

    pool.get(Handle::named("inbox"))
        .add([message("m1", "Hello")]);

    let copy = pool.get(Handle::detail()).get(&"m1".to_string()).unwrap();
    assert_eq!(copy.attr("subject"), Some(&json!("Hello")));
}

/// 测试2: 变更传播到所有持有该身份的兄弟集合
#[test]
fn test_change_propagates_to_every_sibling() {
    let pool = mail_pool_with_inbox();
    pool.add(Some(Handle::named("starred")), [message("m1", "Hi")]);
    pool.add(Some(Handle::named("archive")), [message("m2", "Other")]);

    pool.get(Handle::detail())
        .add([message("m1", "Hello again")]);

    for handle in ["inbox", "starred"] {
        let copy = pool.get(Handle::named(handle)).get(&"m1".to_string()).unwrap();
        assert_eq!(copy.attr("subject"), Some(&json!("Hello again")));
    }
    // 不持有该身份的集合不受影响
    assert_eq!(pool.get(Handle::named("archive")).len(), 1);
}

/// 测试3: 集合本地的位置元数据不参与传播
#[test]
fn test_positional_metadata_is_not_propagated() {
    let pool = mail_pool_with_inbox();
    pool.get(Handle::detail())
        .add([message("m1", "Hi").with_attr("index", json!(7))]);

    pool.get(Handle::named("inbox"))
        .add([message("m1", "Hello").with_attr("index", json!(2))]);

    let detail_copy = pool.get(Handle::detail()).get(&"m1".to_string()).unwrap();
    assert_eq!(detail_copy.attr("subject"), Some(&json!("Hello")));
    // 传播覆盖了主题，但保住了本集合的位置
    assert_eq!(detail_copy.attr("index"), Some(&json!(7)));
}

/// 测试4: 移除传播到持有该身份的兄弟集合
#[test]
fn test_remove_propagates_to_siblings() {
    let pool = mail_pool_with_inbox();

    pool.get(Handle::named("inbox")).remove(&"m1".to_string());

    assert!(!pool.get(Handle::named("inbox")).contains(&"m1".to_string()));
    assert!(!pool.get(Handle::detail()).contains(&"m1".to_string()));
}

/// 测试5: 保留标志抑制移除传播
#[test]
fn test_preserve_flag_suppresses_remove_propagation() {
    let pool = mail_pool_with_inbox();

    pool.preserve_entity(&"m1".to_string(), true);
    pool.get(Handle::named("inbox")).remove(&"m1".to_string());

    // 源集合移除了，兄弟集合保留
    assert!(!pool.get(Handle::named("inbox")).contains(&"m1".to_string()));
    assert!(pool.get(Handle::detail()).contains(&"m1".to_string()));
}

/// 测试6: 保留标志是一次性的，被一次移除决定消耗
#[test]
fn test_preserve_flag_is_single_use() {
    let pool = mail_pool_with_inbox();

    pool.preserve_entity(&"m1".to_string(), true);
    pool.get(Handle::named("inbox")).remove(&"m1".to_string());
    assert!(pool.get(Handle::detail()).contains(&"m1".to_string()));

    // 标志已被消耗，第二轮移除正常传播
    pool.add(Some(Handle::named("inbox")), [message("m1", "Back")]);
    pool.get(Handle::named("inbox")).remove(&"m1".to_string());
    assert!(!pool.get(Handle::detail()).contains(&"m1".to_string()));
}

/// 测试7: 批量保留作用域内不传播移除
#[test]
fn test_preserve_batch_suppresses_remove_propagation() {
    let pool = mail_pool_with_inbox();

    {
        let _batch = pool.preserve_batch();
        pool.get(Handle::named("inbox")).remove(&"m1".to_string());
        assert!(pool.get(Handle::detail()).contains(&"m1".to_string()));
    }

    // 守卫释放后传播恢复
    pool.add(Some(Handle::named("inbox")), [message("m1", "Back")]);
    pool.get(Handle::named("inbox")).remove(&"m1".to_string());
    assert!(!pool.get(Handle::detail()).contains(&"m1".to_string()));
}

/// 测试8: 包裹操作 panic 时批量保留守卫仍然释放
#[test]
fn test_preserve_batch_releases_on_panic() {
    let pool = mail_pool_with_inbox();

    let result = catch_unwind(AssertUnwindSafe(|| {
        let _batch = pool.preserve_batch();
        panic!("wrapped operation failed");
    }));
    assert!(result.is_err());

    // 守卫已随栈展开释放，移除传播未被永久禁用
    pool.get(Handle::named("inbox")).remove(&"m1".to_string());
    assert!(!pool.get(Handle::detail()).contains(&"m1".to_string()));
}

/// 测试9: 订阅者先收到主事件，再收到传播产生的后续事件
#[test]
fn test_event_order_primary_then_follow_on() {
    let pool = mail_pool_with_inbox();
    let seen: Rc<RefCell<Vec<(String, EventKind)>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    pool.subscribe(move |event: &PoolEvent<Entity>| {
        sink.borrow_mut()
            .push((event.handle.as_str().to_string(), event.kind.clone()));
    });

    pool.get(Handle::named("inbox"))
        .add([message("m1", "Hello")]);

    assert_eq!(
        seen.borrow().as_slice(),
        &[
            ("inbox".to_string(), EventKind::Changed),
            ("detail".to_string(), EventKind::Changed),
        ]
    );
}

/// 测试10: 不相关池的传播互不抑制
#[test]
fn test_unrelated_pools_do_not_suppress_each_other() {
    let mail = Pool::<Entity>::builder("mail").build();
    mail.add(None, [message("m1", "Hi")]);
    mail.add(Some(Handle::named("inbox")), [message("m1", "Hi")]);

    let events = Pool::<Entity>::builder("events").build();
    events.add(None, [message("e1", "Standup")]);
    events.add(Some(Handle::named("today")), [message("e1", "Standup")]);

    // mail 池的订阅者在事件回调中触发 events 池的移除
    let other = Rc::clone(&events);
    mail.subscribe(move |event: &PoolEvent<Entity>| {
        if matches!(event.kind, EventKind::Removed { .. }) {
            other.get(Handle::named("today")).remove(&"e1".to_string());
        }
    });

    mail.get(Handle::named("inbox")).remove(&"m1".to_string());

    // 两个池的传播各自完成
    assert!(!mail.get(Handle::detail()).contains(&"m1".to_string()));
    assert!(!events.get(Handle::detail()).contains(&"e1".to_string()));
}

/// 测试11: 移除通知携带移除时刻的保留标志
#[test]
fn test_remove_event_carries_preserve_state() {
    let pool = mail_pool_with_inbox();
    let seen: Rc<RefCell<Vec<EventKind>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    pool.subscribe(move |event: &PoolEvent<Entity>| sink.borrow_mut().push(event.kind.clone()));

    pool.preserve_entity(&"m1".to_string(), true);
    pool.get(Handle::named("inbox")).remove(&"m1".to_string());

    assert_eq!(
        seen.borrow().as_slice(),
        &[EventKind::Removed { preserved: true }]
    );
}

/// 测试12: 首次插入（Added）不传播，就地更新（Changed）才传播
#[test]
fn test_first_insert_does_not_propagate() {
    let pool = Pool::<Entity>::builder("mail").build();
    pool.add(None, [message("m1", "Hi")]);

    // 向一个此前不持有该身份的视图插入属于 Added，不镜像到兄弟集合
    pool.get(Handle::named("inbox"))
        .add([message("m1", "Hello")]);
    let copy = pool.get(Handle::detail()).get(&"m1".to_string()).unwrap();
    assert_eq!(copy.attr("subject"), Some(&json!("Hi")));

    // 同一视图中的再次 add 是 Changed，这次会传播
    pool.get(Handle::named("inbox"))
        .add([message("m1", "Hello again")]);
    let copy = pool.get(Handle::detail()).get(&"m1".to_string()).unwrap();
    assert_eq!(copy.attr("subject"), Some(&json!("Hello again")));
}
