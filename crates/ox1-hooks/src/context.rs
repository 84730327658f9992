use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{HookError, HookKind};
use crate::store::{ComponentId, DirtySet, EffectSlot, HookSlot, Instance};

/// Cleanup returned by an effect; runs before the effect re-runs and on unmount.
pub type Cleanup = Box<dyn FnOnce()>;

/// Hooks for one render of one component.
pub struct RenderContext<'a> {
    component: ComponentId,
    instance: &'a mut Instance,
    dirty: &'a DirtySet,
    index: usize,
}

impl<'a> RenderContext<'a> {
    pub(crate) fn new(component: ComponentId, instance: &'a mut Instance, dirty: &'a DirtySet) -> Self {
        Self {
            component,
            instance,
            dirty,
            index: 0,
        }
    }

    pub fn component(&self) -> ComponentId {
        self.component
    }

    pub(crate) fn hooks_called(&self) -> usize {
        self.index
    }

    /// Advance to the next hook; `None` means the slot is new and must be pushed.
    fn existing(&mut self, kind: HookKind) -> Result<Option<(usize, &mut HookSlot)>, HookError> {
        let index = self.index;
        self.index += 1;

        let known = self.instance.slots.len();
        if index >= known {
            if self.instance.rendered {
                return Err(HookError::CountMismatch {
                    component: self.component,
                    expected: known,
                    found: index + 1,
                });
            }
            return Ok(None);
        }

        let slot = &mut self.instance.slots[index];
        if slot.kind() != kind {
            return Err(HookError::OrderMismatch {
                component: self.component,
                index,
                expected: slot.kind(),
                found: kind,
            });
        }
        Ok(Some((index, slot)))
    }

    fn type_mismatch(&self, index: usize, kind: HookKind) -> HookError {
        HookError::TypeMismatch {
            component: self.component,
            index,
            kind,
        }
    }

    /// Component-local state. The setter marks the component dirty.
    pub fn use_state<T: Clone + 'static>(
        &mut self,
        init: impl FnOnce() -> T,
    ) -> Result<(T, StateSetter<T>), HookError> {
        let index = self.index;
        let shared: Rc<dyn Any> = match self.existing(HookKind::State)? {
            Some((_, HookSlot::State(cell))) => Rc::clone(cell),
            Some(_) => return Err(self.type_mismatch(index, HookKind::State)),
            None => {
                let cell: Rc<dyn Any> = Rc::new(RefCell::new(init()));
                self.instance.slots.push(HookSlot::State(Rc::clone(&cell)));
                cell
            }
        };

        let cell = shared
            .downcast::<RefCell<T>>()
            .map_err(|_| self.type_mismatch(index, HookKind::State))?;
        let value = cell.borrow().clone();

        Ok((
            value,
            StateSetter {
                cell,
                component: self.component,
                dirty: Rc::clone(self.dirty),
            },
        ))
    }

    /// Queue `effect` to run after this render when `deps` changed (always on
    /// the first render).
    pub fn use_effect<D, F>(&mut self, deps: D, effect: F) -> Result<(), HookError>
    where
        D: PartialEq + 'static,
        F: FnOnce() -> Option<Cleanup> + 'static,
    {
        let index = self.index;
        let mismatch = self.type_mismatch(index, HookKind::Effect);

        match self.existing(HookKind::Effect)? {
            Some((_, HookSlot::Effect(slot))) => match slot.deps.downcast_ref::<D>() {
                None => Err(mismatch),
                Some(prev) if *prev == deps => Ok(()),
                Some(_) => {
                    slot.deps = Box::new(deps);
                    slot.pending = Some(Box::new(effect));
                    Ok(())
                }
            },
            Some(_) => Err(mismatch),
            None => {
                self.instance.slots.push(HookSlot::Effect(EffectSlot {
                    deps: Box::new(deps),
                    cleanup: None,
                    pending: Some(Box::new(effect)),
                }));
                Ok(())
            }
        }
    }

    /// Value recomputed only when `deps` change.
    pub fn use_memo<D, T>(&mut self, deps: D, compute: impl FnOnce() -> T) -> Result<T, HookError>
    where
        D: PartialEq + 'static,
        T: Clone + 'static,
    {
        let index = self.index;
        let mismatch = self.type_mismatch(index, HookKind::Memo);

        match self.existing(HookKind::Memo)? {
            Some((_, HookSlot::Memo { deps: prev, value })) => {
                match prev.downcast_ref::<D>() {
                    None => return Err(mismatch),
                    Some(prev) if *prev == deps => {
                        return value.downcast_ref::<T>().cloned().ok_or(mismatch);
                    }
                    Some(_) => {}
                }
                let fresh = compute();
                *prev = Box::new(deps);
                *value = Box::new(fresh.clone());
                Ok(fresh)
            }
            Some(_) => Err(mismatch),
            None => {
                let fresh = compute();
                self.instance.slots.push(HookSlot::Memo {
                    deps: Box::new(deps),
                    value: Box::new(fresh.clone()),
                });
                Ok(fresh)
            }
        }
    }

    /// Mutable cell that survives renders without triggering them.
    pub fn use_ref<T: 'static>(&mut self, init: impl FnOnce() -> T) -> Result<Rc<RefCell<T>>, HookError> {
        let index = self.index;
        let shared: Rc<dyn Any> = match self.existing(HookKind::Ref)? {
            Some((_, HookSlot::Ref(cell))) => Rc::clone(cell),
            Some(_) => return Err(self.type_mismatch(index, HookKind::Ref)),
            None => {
                let cell: Rc<dyn Any> = Rc::new(RefCell::new(init()));
                self.instance.slots.push(HookSlot::Ref(Rc::clone(&cell)));
                cell
            }
        };

        shared
            .downcast::<RefCell<T>>()
            .map_err(|_| self.type_mismatch(index, HookKind::Ref))
    }
}

/// Updates one `use_state` slot and schedules its component for re-render.
pub struct StateSetter<T> {
    cell: Rc<RefCell<T>>,
    component: ComponentId,
    dirty: DirtySet,
}

impl<T> Clone for StateSetter<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
            component: self.component,
            dirty: Rc::clone(&self.dirty),
        }
    }
}

impl<T> StateSetter<T> {
    pub fn set(&self, value: T) {
        *self.cell.borrow_mut() = value;
        self.dirty.borrow_mut().insert(self.component);
    }

    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = f(&self.cell.borrow());
        self.set(next);
    }

    pub fn component(&self) -> ComponentId {
        self.component
    }
}

impl<T: Clone> StateSetter<T> {
    pub fn get(&self) -> T {
        self.cell.borrow().clone()
    }
}
