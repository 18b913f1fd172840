use futures::future::LocalBoxFuture;
use wasm_bindgen::JsCast;

pub(crate) type TimerId = i32;

/// Timers, task spawning and wall-clock time for the autosave controller.
pub(crate) trait Runtime: Clone + 'static {
    fn set_timeout(&self, delay_ms: u32, f: Box<dyn FnOnce()>) -> Option<TimerId>;

    fn clear_timeout(&self, id: TimerId);

    fn spawn(&self, fut: LocalBoxFuture<'static, ()>);

    /// Timestamp sent along with each body update.
    fn timestamp(&self) -> String;
}

/// Browser event loop: `window.setTimeout` plus `spawn_local`.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct BrowserRuntime;

impl Runtime for BrowserRuntime {
    fn set_timeout(&self, delay_ms: u32, f: Box<dyn FnOnce()>) -> Option<TimerId> {
        let win = web_sys::window()?;
        let cb = wasm_bindgen::closure::Closure::once_into_js(move || f());
        win.set_timeout_with_callback_and_timeout_and_arguments_0(
            cb.as_ref().unchecked_ref(),
            delay_ms.min(i32::MAX as u32) as i32,
        )
        .ok()
    }

    fn clear_timeout(&self, id: TimerId) {
        if let Some(win) = web_sys::window() {
            win.clear_timeout_with_handle(id);
        }
    }

    fn spawn(&self, fut: LocalBoxFuture<'static, ()>) {
        leptos::task::spawn_local(fut);
    }

    fn timestamp(&self) -> String {
        crate::util::now_iso()
    }
}
