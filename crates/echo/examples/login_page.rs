//! Example: Page objects over the in-memory driver
//!
//! Demonstrates: declaring a page, filling a form, and waiting for a
//! re-rendered element without sleeping
//!
//! Run with: `cargo run --example login_page`

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use echo::prelude::*;

fn main() -> EchoResult<()> {
    echo::logging::init();
    println!("=== Login Page Example ===\n");

    // 1. Build a small DOM
    println!("1. Building the login form...");
    let driver = Arc::new(MockDriver::new());
    let body = driver.insert(None, MockElement::new("body"));
    let form = driver.insert(Some(body), MockElement::new("form").id("login"));
    driver.insert(Some(form), MockElement::new("input").attr("name", "user"));
    driver.insert(
        Some(form),
        MockElement::new("input").attr("type", "password").attr("name", "pass"),
    );
    driver.insert(Some(form), MockElement::new("input").attr("type", "checkbox").id("remember"));
    driver.insert(Some(form), MockElement::new("button").attr("type", "submit").text("Sign in"));

    let config = BrowserConfig::from_env().with_timeout(2_000).with_poll_frequency(20);
    let browser = Browser::new(driver.clone(), config);

    // 2. Declare the page
    println!("\n2. Declaring the page object...");
    let page = PageObjectBuilder::new(&browser, "http://localhost/login")
        .with_node("form", Locator::id("login"))
        .with_child("user", "form", Locator::name("user"))
        .with_child("pass", "form", Locator::name("pass"))
        .with_child("remember", "form", Locator::id("remember"))
        .with_child("submit", "form", Locator::css("button[type=submit]"))
        .with_ungated_node("banner", Locator::class_name("welcome"))
        .required("form")
        .build()?;
    for name in page.node_names() {
        println!("   {name} -> {}", page.expect_node(name)?);
    }

    // 3. Open and wait for load
    println!("\n3. Opening...");
    let url = page.open(Some("next=/home"))?;
    page.wait_until_loaded()?;
    println!("   Loaded {url}");

    // 4. Fill the form
    println!("\n4. Filling the form...");
    let form_node = page.expect_node("form")?;
    let user = Input::within(form_node, Locator::name("user"), InputKind::Text);
    let pass = Input::detect(&browser, Locator::name("pass"))?;
    let remember = Checkbox::from_node(page.expect_node("remember")?.clone());
    user.set_value("ada")?;
    pass.set_value("correct horse")?;
    remember.check()?;
    println!("   user = {:?}, remember = {}", user.value()?, remember.is_checked()?);

    // 5. Submit; the app re-renders the form and shows a banner later
    println!("\n5. Submitting...");
    let server = {
        let driver = Arc::clone(&driver);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            driver.rerender(form);
            driver.insert(Some(body), MockElement::new("p").class("welcome").text("Welcome, ada"));
        })
    };
    Button::from_node(page.expect_node("submit")?.clone()).click()?;

    let banner = page.expect_node("banner")?;
    banner.waiting().until_displayed()?;
    println!("   Banner: {}", banner.text()?);

    let _ = server.join();

    // 6. Node references heal after the re-render
    println!("\n6. Reading through the re-rendered form...");
    println!("   user value is still {:?}", user.value()?);

    println!("\n=== Done ===");
    Ok(())
}
