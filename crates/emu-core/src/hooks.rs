//! Ordered multicast hooks.
//!
//! A [`Trigger`] owns a list of subscriber callbacks. A [`Hook`] is the handle
//! that keeps one callback subscribed: dropping it unsubscribes. Firing calls
//! the most recently added subscriber first and passes every callback the
//! same `&mut` argument, so a callback can report back to the ones after it
//! (for example by setting a `consumed` flag).
//!
//! Callbacks may drop hooks, replace callbacks or add hooks on the same
//! trigger while it is firing:
//!
//! - dropping a hook that has not been called yet in this fire skips it;
//! - dropping the running hook or one already called has no effect on the
//!   rest of the fire;
//! - a hook added during a fire is first called by the next fire.
//!
//! Removal renumbers the positions of the hooks after the removed one, so
//! every handle's position stays valid without a search.
//!
//! A hook that outlives its trigger is inert.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

type Callback<A> = Rc<RefCell<dyn FnMut(&mut A)>>;

struct Entry<A> {
    pos: Rc<Cell<usize>>,
    callback: Callback<A>,
}

struct Subscribers<A> {
    entries: Vec<Entry<A>>,
    /// While firing: entries below this index are still to be called.
    cursor: Option<usize>,
}

impl<A> Subscribers<A> {
    fn push(&mut self, callback: Callback<A>) -> Rc<Cell<usize>> {
        let pos = Rc::new(Cell::new(self.entries.len()));
        self.entries.push(Entry {
            pos: Rc::clone(&pos),
            callback,
        });
        pos
    }

    /// Unlink the entry at `pos`. The caller drops it after releasing the
    /// borrow, since dropping a callback may drop other hooks.
    fn remove(&mut self, pos: usize) -> Entry<A> {
        let entry = self.entries.remove(pos);
        for (i, later) in self.entries.iter().enumerate().skip(pos) {
            later.pos.set(i);
        }
        if let Some(cursor) = self.cursor {
            if pos < cursor {
                self.cursor = Some(cursor - 1);
            }
        }
        entry
    }
}

fn subscribe<A, F>(subscribers: &Rc<RefCell<Subscribers<A>>>, func: F) -> Hook<A>
where
    F: FnMut(&mut A) + 'static,
{
    let callback: Callback<A> = Rc::new(RefCell::new(func));
    let pos = subscribers.borrow_mut().push(callback);
    Hook {
        subscribers: Rc::downgrade(subscribers),
        pos,
    }
}

/// An event source with an ordered list of subscribers.
pub struct Trigger<A> {
    subscribers: Rc<RefCell<Subscribers<A>>>,
}

impl<A> Trigger<A> {
    /// Create a trigger with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: Rc::new(RefCell::new(Subscribers {
                entries: Vec::new(),
                cursor: None,
            })),
        }
    }

    /// Subscribe `func` at the end of the list.
    ///
    /// The subscription lasts as long as the returned hook.
    #[must_use = "dropping the hook unsubscribes immediately"]
    pub fn hook<F>(&self, func: F) -> Hook<A>
    where
        F: FnMut(&mut A) + 'static,
    {
        subscribe(&self.subscribers, func)
    }

    /// A handle that can subscribe to this trigger without borrowing it.
    #[must_use]
    pub fn registrar(&self) -> Registrar<A> {
        Registrar {
            subscribers: Rc::downgrade(&self.subscribers),
        }
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers.borrow().entries.len()
    }

    /// True if nothing is subscribed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribers.borrow().entries.is_empty()
    }

    /// Call every subscriber, newest first.
    ///
    /// # Panics
    ///
    /// Panics if a callback fires the same trigger and that nested fire
    /// reaches the callback that is already running.
    pub fn fire(&self, args: &mut A) {
        let outer = {
            let mut subscribers = self.subscribers.borrow_mut();
            if subscribers.entries.is_empty() {
                return;
            }
            let len = subscribers.entries.len();
            subscribers.cursor.replace(len)
        };
        while let Some(callback) = self.next_callback() {
            (&mut *callback.borrow_mut())(&mut *args);
        }
        self.subscribers.borrow_mut().cursor = outer;
    }

    fn next_callback(&self) -> Option<Callback<A>> {
        let mut subscribers = self.subscribers.borrow_mut();
        let next = subscribers.cursor?.checked_sub(1)?;
        subscribers.cursor = Some(next);
        Some(Rc::clone(&subscribers.entries[next].callback))
    }
}

impl<A> Default for Trigger<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for Trigger<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger")
            .field("subscribers", &self.len())
            .finish()
    }
}

/// A subscription to a [`Trigger`].
pub struct Hook<A> {
    subscribers: Weak<RefCell<Subscribers<A>>>,
    pos: Rc<Cell<usize>>,
}

impl<A> Hook<A> {
    /// Current index in the trigger's subscriber list.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos.get()
    }

    /// True while the trigger this hook subscribes to still exists.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.subscribers.strong_count() > 0
    }

    /// Replace the callback. Safe to call from inside the callback itself;
    /// the new callback runs from the next fire.
    pub fn set_func<F>(&self, func: F)
    where
        F: FnMut(&mut A) + 'static,
    {
        let Some(subscribers) = self.subscribers.upgrade() else {
            return;
        };
        let callback: Callback<A> = Rc::new(RefCell::new(func));
        let old = std::mem::replace(
            &mut subscribers.borrow_mut().entries[self.pos.get()].callback,
            callback,
        );
        drop(old);
    }
}

impl<A> Drop for Hook<A> {
    fn drop(&mut self) {
        if let Some(subscribers) = self.subscribers.upgrade() {
            let entry = subscribers.borrow_mut().remove(self.pos.get());
            drop(entry);
        }
    }
}

impl<A> fmt::Debug for Hook<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("position", &self.position())
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// Subscribes to a trigger it does not own.
///
/// Callbacks capture a registrar to add hooks to the trigger that is
/// calling them.
pub struct Registrar<A> {
    subscribers: Weak<RefCell<Subscribers<A>>>,
}

impl<A> Registrar<A> {
    /// Subscribe `func`, or return `None` if the trigger is gone.
    #[must_use = "dropping the hook unsubscribes immediately"]
    pub fn hook<F>(&self, func: F) -> Option<Hook<A>>
    where
        F: FnMut(&mut A) + 'static,
    {
        let subscribers = self.subscribers.upgrade()?;
        Some(subscribe(&subscribers, func))
    }
}

impl<A> Clone for Registrar<A> {
    fn clone(&self) -> Self {
        Self {
            subscribers: Weak::clone(&self.subscribers),
        }
    }
}

impl<A> fmt::Debug for Registrar<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registrar")
            .field("attached", &(self.subscribers.strong_count() > 0))
            .finish()
    }
}
