//! Content-script entry point: wires browser events into the overlay core.

pub mod dom;
pub mod net;
pub mod storage;

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Element, Event, MessageEvent, MutationObserver, MutationObserverInit};
use wecomment_core::comments::CommentId;
use wecomment_core::config::POLL_INTERVAL_MS;
use wecomment_core::host::Field;
use wecomment_core::render::{HUB_ID, OVERLAY_ID};
use wecomment_core::watcher::Trigger;
use wecomment_core::{OverlayCore, PendingRequest, UiAction};

use dom::DomPage;
use storage::ChromeStorage;

const NAVIGATION_EVENTS: [&str; 4] = ["yt-navigate", "yt-navigate-finish", "popstate", "hashchange"];

struct App {
    core: OverlayCore<ChromeStorage>,
    page: DomPage,
}

type Shared = Rc<RefCell<App>>;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::new(log::Level::Info));
    spawn_local(async {
        if let Err(err) = boot().await {
            log::error!("wecomment failed to start: {err:?}");
        }
    });
}

async fn boot() -> Result<(), JsValue> {
    let page = DomPage::new().ok_or_else(|| JsValue::from_str("no document"))?;
    let store = ChromeStorage::load().await;
    let app: Shared = Rc::new(RefCell::new(App { core: OverlayCore::initialize(store), page }));

    observe_mutations(&app)?;
    listen_navigation(&app)?;
    start_polling(&app)?;
    listen_auth_messages(&app)?;
    listen_actions(&app)?;

    with_app(&app, |core, page| {
        core.on_possible_change(page, Trigger::Navigation);
    });
    Ok(())
}

/// Run `f` against the core and the page, then send whatever it queued.
/// Skips the call if the app is already borrowed further up the stack.
fn with_app(app: &Shared, f: impl FnOnce(&mut OverlayCore<ChromeStorage>, &mut DomPage)) {
    let requests = match app.try_borrow_mut() {
        Ok(mut guard) => {
            let App { core, page } = &mut *guard;
            f(core, page);
            core.take_requests()
        }
        Err(_) => {
            log::debug!("reentrant event skipped");
            return;
        }
    };
    dispatch(app, requests);
}

fn dispatch(app: &Shared, requests: Vec<PendingRequest>) {
    for PendingRequest { ticket, request } in requests {
        let app = Rc::clone(app);
        spawn_local(async move {
            let result = net::execute(&request).await;
            if let Err(err) = &result {
                log::warn!("{} {} failed: {err}", request.method.as_str(), request.url);
            }
            with_app(&app, |core, page| core.on_response(page, ticket, result));
        });
    }
}

fn trigger(app: &Shared, kind: Trigger) {
    with_app(app, |core, page| {
        core.on_possible_change(page, kind);
    });
}

fn observe_mutations(app: &Shared) -> Result<(), JsValue> {
    let root = {
        let guard = app.borrow();
        guard.page.document().document_element()
    };
    let root = root.ok_or_else(|| JsValue::from_str("no document element"))?;

    let app = Rc::clone(app);
    let callback = Closure::<dyn FnMut(js_sys::Array, MutationObserver)>::new(move |_records, _observer| {
        trigger(&app, Trigger::Mutation);
    });
    let observer = MutationObserver::new(callback.as_ref().unchecked_ref())?;
    let init = MutationObserverInit::new();
    init.set_child_list(true);
    init.set_subtree(true);
    observer.observe_with_options(&root, &init)?;
    callback.forget();
    Ok(())
}

fn listen_navigation(app: &Shared) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let app = Rc::clone(app);
    let callback = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
        trigger(&app, Trigger::Navigation);
    });
    for name in NAVIGATION_EVENTS {
        window.add_event_listener_with_callback(name, callback.as_ref().unchecked_ref())?;
    }
    callback.forget();
    Ok(())
}

fn start_polling(app: &Shared) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let app = Rc::clone(app);
    let callback = Closure::<dyn FnMut()>::new(move || {
        trigger(&app, Trigger::Poll);
    });
    window.set_interval_with_callback_and_timeout_and_arguments_0(
        callback.as_ref().unchecked_ref(),
        POLL_INTERVAL_MS,
    )?;
    callback.forget();
    Ok(())
}

fn listen_auth_messages(app: &Shared) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let app = Rc::clone(app);
    let callback = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
        let Some(data) = message_payload(&event.data()) else { return };
        with_app(&app, |core, page| {
            if core.on_auth_message(page, &data) {
                log::info!("login message accepted");
            }
        });
    });
    window.add_event_listener_with_callback("message", callback.as_ref().unchecked_ref())?;
    callback.forget();
    Ok(())
}

/// JSON view of a posted message. `None` for values JSON cannot carry,
/// such as `undefined` or functions.
fn message_payload(data: &JsValue) -> Option<serde_json::Value> {
    let raw = js_sys::JSON::stringify(data).ok()?.as_string()?;
    serde_json::from_str(&raw).ok()
}

/// Turn a click inside the overlay or the hub into a `UiAction`.
fn action_for_click(event: &Event) -> Option<UiAction> {
    let target = event.target()?.dyn_into::<Element>().ok()?;
    let actor = target.closest("[data-act]").ok()??;
    actor.closest(&format!("#{OVERLAY_ID}, #{HUB_ID}")).ok().flatten()?;
    let act = actor.get_attribute("data-act")?;
    let comment = actor
        .closest(".wec-item")
        .ok()
        .flatten()
        .and_then(|item| item.get_attribute("data-id"))
        .and_then(|id| id.parse::<CommentId>().ok());
    UiAction::from_act(&act, comment)
}

fn listen_actions(app: &Shared) -> Result<(), JsValue> {
    let document = app.borrow().page.document().clone();

    let clicks = {
        let app = Rc::clone(app);
        Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let Some(action) = action_for_click(&event) else { return };
            with_app(&app, |core, page| {
                if let Err(err) = core.on_action(page, action) {
                    log::debug!("{action:?} rejected: {err}");
                }
            });
        })
    };
    document.add_event_listener_with_callback("click", clicks.as_ref().unchecked_ref())?;
    clicks.forget();

    let changes = {
        let app = Rc::clone(app);
        Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let is_sort = event
                .target()
                .and_then(|t| t.dyn_into::<Element>().ok())
                .map(|el| el.id() == Field::SortSelect.element_id())
                .unwrap_or(false);
            if !is_sort {
                return;
            }
            with_app(&app, |core, page| {
                if let Err(err) = core.on_action(page, UiAction::SortChanged) {
                    log::warn!("sort change rejected: {err}");
                }
            });
        })
    };
    document.add_event_listener_with_callback("change", changes.as_ref().unchecked_ref())?;
    changes.forget();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;
    use wecomment_core::host::HostPage;
    use wecomment_core::render;

    wasm_bindgen_test::wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn overlay_lands_after_notice() {
        let mut page = DomPage::new().unwrap();
        let fixture = page.document().create_element("div").unwrap();
        fixture.set_inner_html(
            "<div id=\"comments\"><ytd-message-renderer><yt-formatted-string>Comments are turned off. Learn more</yt-formatted-string></ytd-message-renderer></div>",
        );
        page.document().body().unwrap().append_child(&fixture).unwrap();
        assert!(page.has_disabled_notice());
        assert!(!page.overlay_present());
        assert!(page.insert_overlay(&render::overlay_shell(Default::default())));
        assert!(page.overlay_present());
        assert_eq!(page.field_value(Field::SortSelect).as_deref(), Some("top"));

        assert!(page.replace_notice_text(render::NOTICE_REPLACEMENT) > 0);
        assert_eq!(page.replace_notice_text(render::NOTICE_REPLACEMENT), 0);
        page.remove_overlay();
        assert!(!page.overlay_present());
        fixture.remove();
    }

    #[wasm_bindgen_test]
    fn reused_comments_section_is_not_a_notice() {
        let mut page = DomPage::new().unwrap();
        let fixture = page.document().create_element("div").unwrap();
        fixture.set_inner_html(
            "<div id=\"comments\"><ytd-message-renderer><yt-formatted-string>Comments are turned off. Learn more</yt-formatted-string></ytd-message-renderer></div>",
        );
        page.document().body().unwrap().append_child(&fixture).unwrap();
        assert!(page.replace_notice_text(render::NOTICE_REPLACEMENT) > 0);
        assert!(page.has_disabled_notice());

        let comments = page.document().get_element_by_id("comments").unwrap();
        comments.set_inner_html("<ytd-comment-thread-renderer>Great video</ytd-comment-thread-renderer>");
        assert!(!page.has_disabled_notice());
        assert!(!page.insert_overlay(&render::overlay_shell(Default::default())));
        fixture.remove();
    }

    #[wasm_bindgen_test]
    fn message_payload_ignores_non_json_values() {
        assert_eq!(message_payload(&JsValue::UNDEFINED), None);
        let object = js_sys::JSON::parse(r#"{"type":"wecomment-auth","token":"t"}"#).unwrap();
        let payload = message_payload(&object).unwrap();
        assert_eq!(payload["token"], "t");
    }
}
