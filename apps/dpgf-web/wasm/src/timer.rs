//! `setTimeout` handle that cancels itself
//!
//! Scheduling again replaces the pending timeout, and dropping the timer
//! (with the view that owns it) clears whatever is still pending, so no
//! callback ever fires into a torn-down view.

use std::cell::Cell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

#[derive(Default)]
pub struct DebounceTimer {
    pending: Option<Pending>,
}

struct Pending {
    handle: i32,
    fired: Rc<Cell<bool>>,
    // kept alive until the timeout fires or is cleared
    _callback: Closure<dyn FnMut()>,
}

impl DebounceTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `callback` after `delay_ms`, cancelling any earlier schedule
    pub fn schedule<F>(&mut self, delay_ms: u64, mut callback: F) -> Result<(), JsValue>
    where
        F: FnMut() + 'static,
    {
        self.cancel();

        let window = web_sys::window().ok_or("No window")?;
        let fired = Rc::new(Cell::new(false));
        let callback = {
            let fired = Rc::clone(&fired);
            Closure::wrap(Box::new(move || {
                fired.set(true);
                callback();
            }) as Box<dyn FnMut()>)
        };
        let delay = i32::try_from(delay_ms).unwrap_or(i32::MAX);
        let handle = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.as_ref().unchecked_ref(),
            delay,
        )?;

        self.pending = Some(Pending {
            handle,
            fired,
            _callback: callback,
        });
        Ok(())
    }

    /// Scheduled and not yet fired
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| !pending.fired.get())
    }

    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            if let Some(window) = web_sys::window() {
                window.clear_timeout_with_handle(pending.handle);
            }
        }
    }
}

impl Drop for DebounceTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(target_arch = "wasm32")]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_futures::JsFuture;
    use wasm_bindgen_test::*;

    use crate::transport::sleep;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    async fn test_reschedule_fires_once() {
        let fired = Rc::new(Cell::new(0));
        let mut timer = DebounceTimer::new();

        for _ in 0..3 {
            let fired = Rc::clone(&fired);
            timer
                .schedule(20, move || fired.set(fired.get() + 1))
                .unwrap();
        }
        assert!(timer.is_pending());

        JsFuture::from(sleep(std::time::Duration::from_millis(60)))
            .await
            .unwrap();
        assert_eq!(fired.get(), 1);
        assert!(!timer.is_pending());
    }

    #[wasm_bindgen_test]
    async fn test_drop_cancels() {
        let fired = Rc::new(Cell::new(false));
        {
            let mut timer = DebounceTimer::new();
            let fired = Rc::clone(&fired);
            timer.schedule(10, move || fired.set(true)).unwrap();
        }

        JsFuture::from(sleep(std::time::Duration::from_millis(40)))
            .await
            .unwrap();
        assert!(!fired.get());
    }
}
