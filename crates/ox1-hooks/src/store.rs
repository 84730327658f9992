use std::any::Any;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use crate::context::{Cleanup, RenderContext};
use crate::error::{HookError, HookKind};

/// Handle to a mounted component instance.
///
/// Arena slots are reused after unmount; the generation keeps a stale handle
/// from reaching the slot's new occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId {
    index: usize,
    generation: u32,
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index)?;
        if self.generation > 0 {
            write!(f, "@{}", self.generation)?;
        }
        Ok(())
    }
}

pub(crate) type DirtySet = Rc<RefCell<BTreeSet<ComponentId>>>;

pub(crate) type Effect = Box<dyn FnOnce() -> Option<Cleanup>>;

pub(crate) struct EffectSlot {
    pub(crate) deps: Box<dyn Any>,
    pub(crate) cleanup: Option<Cleanup>,
    pub(crate) pending: Option<Effect>,
}

pub(crate) enum HookSlot {
    State(Rc<dyn Any>),
    Effect(EffectSlot),
    Memo {
        deps: Box<dyn Any>,
        value: Box<dyn Any>,
    },
    Ref(Rc<dyn Any>),
}

impl HookSlot {
    pub(crate) fn kind(&self) -> HookKind {
        match self {
            HookSlot::State(_) => HookKind::State,
            HookSlot::Effect(_) => HookKind::Effect,
            HookSlot::Memo { .. } => HookKind::Memo,
            HookSlot::Ref(_) => HookKind::Ref,
        }
    }
}

#[derive(Default)]
pub(crate) struct Instance {
    pub(crate) slots: Vec<HookSlot>,
    pub(crate) rendered: bool,
}

impl Instance {
    fn run_cleanups(&mut self) {
        for slot in &mut self.slots {
            if let HookSlot::Effect(effect) = slot {
                effect.pending = None;
                if let Some(cleanup) = effect.cleanup.take() {
                    cleanup();
                }
            }
        }
    }
}

#[derive(Default)]
struct Entry {
    generation: u32,
    instance: Option<Instance>,
}

/// Arena of mounted components and their hook slots.
#[derive(Default)]
pub struct HookStore {
    entries: Vec<Entry>,
    free: Vec<usize>,
    dirty: DirtySet,
}

impl fmt::Debug for HookStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookStore")
            .field("mounted", &self.mounted())
            .field("dirty", &self.dirty.borrow().len())
            .finish()
    }
}

impl HookStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mount(&mut self) -> ComponentId {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.entries.push(Entry::default());
                self.entries.len() - 1
            }
        };
        let entry = &mut self.entries[index];
        entry.instance = Some(Instance::default());

        let id = ComponentId {
            index,
            generation: entry.generation,
        };
        tracing::trace!(component = %id, "mounted");
        id
    }

    /// Run effect cleanups and drop the component's hooks.
    pub fn unmount(&mut self, id: ComponentId) -> Result<(), HookError> {
        let entry = self
            .entries
            .get_mut(id.index)
            .filter(|entry| entry.generation == id.generation)
            .ok_or(HookError::UnknownComponent(id))?;
        let mut instance = entry.instance.take().ok_or(HookError::UnknownComponent(id))?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(id.index);

        instance.run_cleanups();
        self.dirty.borrow_mut().remove(&id);
        tracing::trace!(component = %id, "unmounted");
        Ok(())
    }

    fn instance_mut(&mut self, id: ComponentId) -> Option<&mut Instance> {
        self.entries
            .get_mut(id.index)
            .filter(|entry| entry.generation == id.generation)?
            .instance
            .as_mut()
    }

    pub fn is_mounted(&self, id: ComponentId) -> bool {
        self.entries
            .get(id.index)
            .is_some_and(|entry| entry.generation == id.generation && entry.instance.is_some())
    }

    pub fn mounted(&self) -> usize {
        self.entries.len() - self.free.len()
    }

    /// Slots allocated in the arena, mounted or free.
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Render component `id`.
    ///
    /// Every render after the first must call the same hooks in the same
    /// order; a deviation fails the render.
    pub fn render<R>(
        &mut self,
        id: ComponentId,
        f: impl FnOnce(&mut RenderContext<'_>) -> Result<R, HookError>,
    ) -> Result<R, HookError> {
        let dirty = Rc::clone(&self.dirty);
        let instance = self.instance_mut(id).ok_or(HookError::UnknownComponent(id))?;

        dirty.borrow_mut().remove(&id);

        let mut cx = RenderContext::new(id, instance, &dirty);
        let result = f(&mut cx);
        let used = cx.hooks_called();

        let out = match result {
            Ok(out) => out,
            Err(err) => {
                if !instance.rendered {
                    instance.slots.clear();
                }
                return Err(err);
            }
        };

        if instance.rendered && used != instance.slots.len() {
            return Err(HookError::CountMismatch {
                component: id,
                expected: instance.slots.len(),
                found: used,
            });
        }
        instance.rendered = true;
        Ok(out)
    }

    /// Run effects queued by renders since the last flush.
    ///
    /// An effect's previous cleanup runs before the effect itself. Returns the
    /// number of effects run.
    pub fn flush_effects(&mut self) -> usize {
        let mut ran = 0;
        for instance in self.entries.iter_mut().filter_map(|entry| entry.instance.as_mut()) {
            for slot in &mut instance.slots {
                let HookSlot::Effect(effect) = slot else { continue };
                let Some(run) = effect.pending.take() else { continue };
                if let Some(cleanup) = effect.cleanup.take() {
                    cleanup();
                }
                effect.cleanup = run();
                ran += 1;
            }
        }
        ran
    }

    /// Components whose state changed since their last render.
    pub fn take_dirty(&mut self) -> Vec<ComponentId> {
        std::mem::take(&mut *self.dirty.borrow_mut())
            .into_iter()
            .filter(|id| self.is_mounted(*id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn state_persists_between_renders() {
        let mut store = HookStore::new();
        let id = store.mount();

        let setter = store
            .render(id, |cx| {
                let (n, set) = cx.use_state(|| 1)?;
                assert_eq!(n, 1);
                Ok(set)
            })
            .unwrap();

        setter.update(|n| n + 41);
        assert_eq!(store.take_dirty(), vec![id]);
        assert!(store.take_dirty().is_empty());

        let n = store.render(id, |cx| Ok(cx.use_state(|| 0)?.0)).unwrap();
        assert_eq!(n, 42);
    }

    #[test]
    fn components_do_not_share_state() {
        let mut store = HookStore::new();
        let a = store.mount();
        let b = store.mount();

        let set_a = store.render(a, |cx| Ok(cx.use_state(|| "a".to_string())?.1)).unwrap();
        store.render(b, |cx| Ok(cx.use_state(|| "b".to_string())?.1)).unwrap();

        set_a.set("changed".into());
        assert_eq!(store.take_dirty(), vec![a]);

        let b_value = store.render(b, |cx| Ok(cx.use_state(String::new)?.0)).unwrap();
        assert_eq!(b_value, "b");
    }

    #[test]
    fn effects_run_on_dep_change_with_cleanup_first() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut store = HookStore::new();
        let id = store.mount();

        let render = |store: &mut HookStore, dep: u32| {
            let log = log.clone();
            store
                .render(id, move |cx| {
                    let log2 = log.clone();
                    cx.use_effect(dep, move || {
                        log.borrow_mut().push(format!("run {dep}"));
                        Some(Box::new(move || log2.borrow_mut().push(format!("cleanup {dep}"))) as Cleanup)
                    })
                })
                .unwrap();
        };

        render(&mut store, 1);
        assert_eq!(store.flush_effects(), 1);
        render(&mut store, 1);
        assert_eq!(store.flush_effects(), 0);
        render(&mut store, 2);
        assert_eq!(store.flush_effects(), 1);
        store.unmount(id).unwrap();

        assert_eq!(*log.borrow(), vec!["run 1", "cleanup 1", "run 2", "cleanup 2"]);
    }

    #[test]
    fn memo_recomputes_only_on_dep_change() {
        let calls = Rc::new(Cell::new(0));
        let mut store = HookStore::new();
        let id = store.mount();

        for (dep, expected) in [(2, 4), (2, 4), (3, 9)] {
            let calls = calls.clone();
            let value = store
                .render(id, move |cx| {
                    cx.use_memo(dep, || {
                        calls.set(calls.get() + 1);
                        dep * dep
                    })
                })
                .unwrap();
            assert_eq!(value, expected);
        }
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn refs_are_stable_and_do_not_mark_dirty() {
        let mut store = HookStore::new();
        let id = store.mount();

        let first = store.render(id, |cx| cx.use_ref(|| 0)).unwrap();
        *first.borrow_mut() += 5;
        let second = store.render(id, |cx| cx.use_ref(|| 0)).unwrap();

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(*second.borrow(), 5);
        assert!(store.take_dirty().is_empty());
    }

    #[test]
    fn hook_order_change_is_an_error() {
        let mut store = HookStore::new();
        let id = store.mount();

        store
            .render(id, |cx| {
                cx.use_state(|| 0)?;
                cx.use_ref(|| 0)?;
                Ok(())
            })
            .unwrap();

        let err = store
            .render(id, |cx| {
                cx.use_ref(|| 0)?;
                Ok(())
            })
            .unwrap_err();
        assert_eq!(
            err,
            HookError::OrderMismatch {
                component: id,
                index: 0,
                expected: HookKind::State,
                found: HookKind::Ref,
            }
        );
    }

    #[test]
    fn fewer_hooks_than_before_is_an_error() {
        let mut store = HookStore::new();
        let id = store.mount();

        store
            .render(id, |cx| {
                cx.use_state(|| 0)?;
                cx.use_state(|| 0)?;
                Ok(())
            })
            .unwrap();

        let err = store.render(id, |cx| cx.use_state(|| 0).map(|_| ())).unwrap_err();
        assert!(matches!(err, HookError::CountMismatch { expected: 2, found: 1, .. }));
    }

    #[test]
    fn state_type_change_is_an_error() {
        let mut store = HookStore::new();
        let id = store.mount();

        store.render(id, |cx| cx.use_state(|| 0u8).map(|_| ())).unwrap();
        let err = store
            .render(id, |cx| cx.use_state(String::new).map(|_| ()))
            .unwrap_err();
        assert!(matches!(err, HookError::TypeMismatch { kind: HookKind::State, .. }));
    }

    #[test]
    fn unmounted_components_are_rejected() {
        let mut store = HookStore::new();
        let id = store.mount();
        let setter = store.render(id, |cx| Ok(cx.use_state(|| 0)?.1)).unwrap();

        store.unmount(id).unwrap();
        setter.set(1);

        assert!(!store.is_mounted(id));
        assert!(store.take_dirty().is_empty());
        assert_eq!(store.unmount(id), Err(HookError::UnknownComponent(id)));
        assert!(matches!(
            store.render(id, |_| Ok(())),
            Err(HookError::UnknownComponent(_))
        ));
    }

    #[test]
    fn unmounted_slots_are_reused() {
        let mut store = HookStore::new();
        let first = store.mount();
        let stale_setter = store.render(first, |cx| Ok(cx.use_state(|| 1)?.1)).unwrap();
        store.unmount(first).unwrap();

        let second = store.mount();
        assert_eq!(store.capacity(), 1);
        assert_eq!(store.mounted(), 1);
        assert_ne!(first, second);

        // The old handle does not reach the new occupant.
        assert!(!store.is_mounted(first));
        assert!(store.is_mounted(second));
        assert_eq!(store.unmount(first), Err(HookError::UnknownComponent(first)));
        stale_setter.set(5);
        assert!(store.take_dirty().is_empty());

        let fresh = store.render(second, |cx| Ok(cx.use_state(|| 0)?.0)).unwrap();
        assert_eq!(fresh, 0);
    }

    #[test]
    fn churn_does_not_grow_the_arena() {
        let mut store = HookStore::new();
        let keep = store.mount();
        for _ in 0..100 {
            let id = store.mount();
            store.render(id, |cx| cx.use_ref(|| 0u8).map(|_| ())).unwrap();
            store.unmount(id).unwrap();
        }
        assert_eq!(store.capacity(), 2);
        assert_eq!(store.mounted(), 1);
        assert!(store.is_mounted(keep));
    }
}
