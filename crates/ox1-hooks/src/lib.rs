//! Component hook store.
//!
//! Each mounted component owns an ordered list of hook slots. A render gets an
//! explicit [`RenderContext`] for one component, and hooks are addressed by
//! call index inside it:
//!
//! ```
//! use ox1_hooks::HookStore;
//!
//! let mut store = HookStore::new();
//! let counter = store.mount();
//!
//! let setter = store
//!     .render(counter, |cx| {
//!         let (count, set_count) = cx.use_state(|| 0u32)?;
//!         assert_eq!(count, 0);
//!         Ok(set_count)
//!     })
//!     .unwrap();
//!
//! setter.set(1);
//! assert_eq!(store.take_dirty(), vec![counter]);
//! ```

mod context;
mod error;
mod store;

pub use context::{Cleanup, RenderContext, StateSetter};
pub use error::{HookError, HookKind};
pub use store::{ComponentId, HookStore};
