//! One-shot hook on the return trigger.

use std::cell::Cell;
use std::rc::Rc;

use emu_core::{Hook, Registrar, Trigger};

use crate::registers::Registers;

#[derive(Default)]
struct Arming {
    active: Cell<bool>,
    sp: Cell<u16>,
}

/// Calls back once when execution returns to a recorded stack depth.
///
/// Arm it with the stack pointer at the point of interest (typically just
/// after an interrupt pushed its return address). Every RET and taken
/// conditional return fires the return trigger before popping; when the
/// stack pointer then equals the armed value the callback runs and the hook
/// disarms. Returns from deeper or shallower frames are ignored.
pub struct ReturnHook {
    arming: Rc<Arming>,
    hook: Hook<Registers>,
}

impl ReturnHook {
    /// Subscribe to `trigger`, disarmed.
    pub fn new<F>(trigger: &Trigger<Registers>, func: F) -> Self
    where
        F: FnMut(&mut Registers) + 'static,
    {
        let arming = Rc::new(Arming::default());
        let hook = trigger.hook(guard(Rc::clone(&arming), func));
        Self { arming, hook }
    }

    /// Subscribe through a registrar, or `None` if the trigger is gone.
    pub fn with_registrar<F>(registrar: &Registrar<Registers>, func: F) -> Option<Self>
    where
        F: FnMut(&mut Registers) + 'static,
    {
        let arming = Rc::new(Arming::default());
        let hook = registrar.hook(guard(Rc::clone(&arming), func))?;
        Some(Self { arming, hook })
    }

    /// Arm at the current stack pointer.
    pub fn activate(&self, regs: &Registers) {
        self.activate_at(regs.sp);
    }

    /// Arm at an explicit stack pointer.
    pub fn activate_at(&self, sp: u16) {
        self.arming.sp.set(sp);
        self.arming.active.set(true);
    }

    /// Disarm without firing. Safe to call when not armed.
    pub fn deactivate(&self) {
        self.arming.active.set(false);
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.arming.active.get()
    }

    /// Replace the callback. The armed state is kept.
    pub fn set_hook_func<F>(&self, func: F)
    where
        F: FnMut(&mut Registers) + 'static,
    {
        self.hook.set_func(guard(Rc::clone(&self.arming), func));
    }
}

fn guard<F>(arming: Rc<Arming>, mut func: F) -> impl FnMut(&mut Registers) + 'static
where
    F: FnMut(&mut Registers) + 'static,
{
    move |regs: &mut Registers| {
        if arming.active.get() && regs.sp == arming.sp.get() {
            arming.active.set(false);
            func(regs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regs_at(sp: u16) -> Registers {
        Registers { sp, ..Registers::default() }
    }

    #[test]
    fn fires_once_at_armed_depth() {
        let trigger = Trigger::new();
        let count = Rc::new(Cell::new(0));
        let seen = Rc::clone(&count);
        let ret = ReturnHook::new(&trigger, move |_| seen.set(seen.get() + 1));

        trigger.fire(&mut regs_at(0x0FFE));
        assert_eq!(count.get(), 0, "disarmed hook must not fire");

        ret.activate(&regs_at(0x0FFE));
        assert!(ret.is_active());
        trigger.fire(&mut regs_at(0x0FFC));
        trigger.fire(&mut regs_at(0x1000));
        assert_eq!(count.get(), 0);

        trigger.fire(&mut regs_at(0x0FFE));
        assert_eq!(count.get(), 1);
        assert!(!ret.is_active());

        trigger.fire(&mut regs_at(0x0FFE));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn rearming_from_the_callback() {
        let trigger = Trigger::new();
        let count = Rc::new(Cell::new(0));
        let seen = Rc::clone(&count);
        let ret = Rc::new(ReturnHook::new(&trigger, |_| {}));
        let again = Rc::downgrade(&ret);
        ret.set_hook_func(move |regs| {
            seen.set(seen.get() + 1);
            if let Some(ret) = again.upgrade() {
                ret.activate(regs);
            }
        });

        ret.activate_at(0x2000);
        trigger.fire(&mut regs_at(0x2000));
        trigger.fire(&mut regs_at(0x2000));
        assert_eq!(count.get(), 2);
        assert!(ret.is_active());

        ret.deactivate();
        trigger.fire(&mut regs_at(0x2000));
        assert_eq!(count.get(), 2);
    }
}
