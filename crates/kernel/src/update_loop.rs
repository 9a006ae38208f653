use crate::KernelError;
use fieldwarning_common::FrameTime;

/// What an updatable wants the loop to do after this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Stop,
}

impl LoopControl {
    /// `Stop` wins.
    pub fn and(self, other: Self) -> Self {
        if self == Self::Stop || other == Self::Stop {
            Self::Stop
        } else {
            Self::Continue
        }
    }
}

/// Something updated once per frame.
pub trait Updatable {
    fn update(&mut self, time: &FrameTime) -> Result<LoopControl, KernelError>;
}

/// Handle returned by [`UpdateLoop::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UpdatableId(u64);

struct Entry<T: ?Sized> {
    id: UpdatableId,
    item: Box<T>,
}

/// Ordered registry of updatables.
pub struct UpdateLoop<T: ?Sized + Updatable = dyn Updatable> {
    entries: Vec<Entry<T>>,
    next_id: u64,
}

impl<T: ?Sized + Updatable> Default for UpdateLoop<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }
}

impl<T: ?Sized + Updatable> UpdateLoop<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an updatable; it runs after everything registered before it.
    pub fn register(&mut self, item: Box<T>) -> UpdatableId {
        let id = UpdatableId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry { id, item });
        id
    }

    /// Remove an updatable, handing it back to the caller.
    pub fn deregister(&mut self, id: UpdatableId) -> Option<Box<T>> {
        let index = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(index).item)
    }

    /// Run every updatable once, in registration order.
    ///
    /// All updatables run even if an earlier one asked to stop; an error
    /// aborts the frame immediately.
    pub fn update_all(&mut self, time: &FrameTime) -> Result<LoopControl, KernelError> {
        let mut control = LoopControl::Continue;
        for entry in &mut self.entries {
            control = control.and(entry.item.update(time)?);
        }
        Ok(control)
    }

    pub fn get_mut(&mut self, id: UpdatableId) -> Option<&mut T> {
        self.entries
            .iter_mut()
            .find(|e| e.id == id)
            .map(|e| &mut *e.item)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entries.iter_mut().map(|e| &mut *e.item)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recorder {
        name: &'static str,
        log: Rc<RefCell<Vec<(u64, &'static str)>>>,
        stop_on: Option<u64>,
    }

    impl Updatable for Recorder {
        fn update(&mut self, time: &FrameTime) -> Result<LoopControl, KernelError> {
            self.log.borrow_mut().push((time.index, self.name));
            if self.stop_on == Some(time.index) {
                Ok(LoopControl::Stop)
            } else {
                Ok(LoopControl::Continue)
            }
        }
    }

    struct Failing;

    impl Updatable for Failing {
        fn update(&mut self, _: &FrameTime) -> Result<LoopControl, KernelError> {
            Err(KernelError::service("failing", "boom"))
        }
    }

    fn frame(index: u64) -> FrameTime {
        FrameTime {
            index,
            ..FrameTime::default()
        }
    }

    fn recorder(name: &'static str, log: &Rc<RefCell<Vec<(u64, &'static str)>>>) -> Box<Recorder> {
        Box::new(Recorder {
            name,
            log: log.clone(),
            stop_on: None,
        })
    }

    #[test]
    fn runs_in_registration_order_once_per_frame() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut updates: UpdateLoop = UpdateLoop::new();
        updates.register(recorder("a", &log));
        updates.register(recorder("b", &log));
        updates.register(recorder("c", &log));

        updates.update_all(&frame(0)).unwrap();
        updates.update_all(&frame(1)).unwrap();

        assert_eq!(
            *log.borrow(),
            vec![(0, "a"), (0, "b"), (0, "c"), (1, "a"), (1, "b"), (1, "c")]
        );
    }

    #[test]
    fn deregistered_items_stop_running() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut updates: UpdateLoop = UpdateLoop::new();
        updates.register(recorder("a", &log));
        let b = updates.register(recorder("b", &log));
        updates.register(recorder("c", &log));

        assert!(updates.deregister(b).is_some());
        assert!(updates.deregister(b).is_none());
        updates.update_all(&frame(0)).unwrap();

        assert_eq!(*log.borrow(), vec![(0, "a"), (0, "c")]);
        assert_eq!(updates.len(), 2);
    }

    #[test]
    fn stop_still_runs_remaining_items() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut updates: UpdateLoop = UpdateLoop::new();
        updates.register(Box::new(Recorder {
            name: "a",
            log: log.clone(),
            stop_on: Some(0),
        }));
        updates.register(recorder("b", &log));

        let control = updates.update_all(&frame(0)).unwrap();
        assert_eq!(control, LoopControl::Stop);
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn error_aborts_the_frame() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut updates: UpdateLoop = UpdateLoop::new();
        updates.register(recorder("a", &log));
        updates.register(Box::new(Failing));
        updates.register(recorder("c", &log));

        assert!(updates.update_all(&frame(0)).is_err());
        assert_eq!(*log.borrow(), vec![(0, "a")]);
    }

    #[test]
    fn loop_control_and() {
        use LoopControl::*;
        assert_eq!(Continue.and(Continue), Continue);
        assert_eq!(Continue.and(Stop), Stop);
        assert_eq!(Stop.and(Continue), Stop);
    }
}
