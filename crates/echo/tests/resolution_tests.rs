//! Handle caching, staleness recovery and display gating against the
//! in-memory driver.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use echo::mock::{MockDriver, MockElement, MockKey};
use echo::{Browser, BrowserConfig, EchoError, Locator, Node, StaleKind};

struct Fixture {
    driver: Arc<MockDriver>,
    browser: Browser,
    list: MockKey,
}

fn fixture() -> Fixture {
    let driver = Arc::new(MockDriver::new());
    let body = driver.insert(None, MockElement::new("body"));
    let list = driver.insert(Some(body), MockElement::new("ul").id("todo"));
    for item in ["write", "test", "ship"] {
        driver.insert(Some(list), MockElement::new("li").class("item").text(item));
    }
    let config = BrowserConfig::default().with_timeout(1_000).with_poll_frequency(10);
    let browser = Browser::new(driver.clone(), config);
    Fixture { driver, browser, list }
}

// ============================================================================
// Caching
// ============================================================================

#[test]
fn repeated_resolution_reuses_the_handle() {
    let f = fixture();
    let list = f.browser.node(Locator::id("todo"));
    let first = list.resolve().unwrap();
    f.driver.reset_find_calls();
    for _ in 0..5 {
        assert_eq!(list.resolve().unwrap(), first);
    }
    assert_eq!(f.driver.find_calls(), 0);
}

#[test]
fn clones_share_the_cache() {
    let f = fixture();
    let list = f.browser.node(Locator::id("todo"));
    let twin = list.clone();
    list.resolve().unwrap();
    f.driver.reset_find_calls();
    twin.resolve().unwrap();
    assert_eq!(f.driver.find_calls(), 0);
    assert_eq!(list.cached_id(), twin.cached_id());
}

// ============================================================================
// Staleness
// ============================================================================

#[test]
fn rerendered_element_is_found_again() {
    let f = fixture();
    let list = f.browser.node(Locator::id("todo"));
    let before = list.resolve().unwrap();
    let fresh = f.driver.rerender(f.list).unwrap();
    f.driver.reset_find_calls();
    let after = list.resolve().unwrap();
    assert_ne!(before, after);
    assert_eq!(f.driver.key_of(&after), Some(fresh));
    assert_eq!(f.driver.find_calls(), 1);
}

#[test]
fn nested_node_follows_rerendered_parent() {
    let f = fixture();
    let list = f.browser.node(Locator::id("todo"));
    let first_item = list.child(Locator::class_name("item"));
    assert_eq!(first_item.text().unwrap(), "write");
    f.driver.rerender(f.list).unwrap();
    assert_eq!(first_item.text().unwrap(), "write");
}

#[test]
fn handle_children_do_not_survive_rerender() {
    let f = fixture();
    let list = f.browser.node(Locator::id("todo"));
    let items = list.find_elements(&Locator::tag_name("li")).unwrap();
    assert_eq!(items.len(), 3);
    f.driver.rerender(f.list).unwrap();
    match items[1].text().unwrap_err() {
        EchoError::StaleHandle {
            kind: StaleKind::Detached,
            ..
        } => {}
        other => panic!("expected a detached handle, got {other:?}"),
    }
}

#[test]
fn identity_flags_a_swap_exactly_once() {
    let f = fixture();
    let list = f.browser.node(Locator::id("todo"));
    list.identity().unwrap();
    f.driver.rerender(f.list).unwrap();
    assert!(list.identity().unwrap_err().is_stale_or_missing());
    assert!(list.identity().is_ok());
}

#[test]
fn dropped_parent_is_reported() {
    let f = fixture();
    let child = {
        let list = f.browser.node(Locator::id("todo"));
        list.child(Locator::class_name("item"))
    };
    assert!(matches!(
        child.resolve().unwrap_err(),
        EchoError::StaleHandle {
            kind: StaleKind::ParentReleased,
            ..
        }
    ));
}

// ============================================================================
// Waiting through churn
// ============================================================================

#[test]
fn gated_read_survives_concurrent_rerenders() {
    let f = fixture();
    let list = f.browser.node(Locator::id("todo"));
    let item = list.child(Locator::class_name("item"));
    item.resolve().unwrap();

    let driver = Arc::clone(&f.driver);
    let mut key = f.list;
    let churn = thread::spawn(move || {
        for _ in 0..5 {
            key = driver.rerender(key).unwrap();
            thread::sleep(Duration::from_millis(5));
        }
    });
    for _ in 0..20 {
        match item.text() {
            Ok(text) => assert_eq!(text, "write"),
            Err(err) => assert!(err.is_stale_or_missing(), "unexpected {err:?}"),
        }
    }
    churn.join().unwrap();
    assert_eq!(item.text().unwrap(), "write");
}

#[test]
fn element_appearing_late_is_waited_for() {
    let f = fixture();
    let banner = f.browser.node(Locator::id("banner"));
    let driver = Arc::clone(&f.driver);
    let list = f.list;
    let writer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(80));
        driver.insert(Some(list), MockElement::new("li").id("banner").text("done!"));
    });
    banner.waiting().until_present().unwrap();
    assert_eq!(banner.text().unwrap(), "done!");
    writer.join().unwrap();
}

#[test]
fn gate_guard_restores_on_panic_free_scope_exit() {
    let f = fixture();
    f.driver.set_displayed(f.list, false);
    let list: Node = f.browser.node(Locator::id("todo"));
    let tag = {
        let _guard = list.ignore_display();
        list.attribute("id").unwrap()
    };
    assert_eq!(tag.as_deref(), Some("todo"));
    assert!(list.display_gate());
    assert!(!list.is_displayed());
}
