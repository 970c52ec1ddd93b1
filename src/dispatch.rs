//! Listener registration and fan-out for decoded records.
//!
//! A broadcaster owns a set of listeners, each either bound to one global
//! message number or registered as a catch-all for messages nothing else
//! claimed. Dispatch is strictly in registration order and never stops
//! early: every interested listener sees the record even if an earlier one
//! failed, and the first failure is reported after the fan-out completes.

use log::trace;

use crate::errors::Error;
use crate::mesg::Mesg;

/// A sink for decoded data records.
///
/// Listener failures are application errors, so the error type is open;
/// the broadcaster wraps the first one in [`Error::ListenerFailure`].
pub trait MesgListener {
    fn on_mesg(&mut self, mesg: &Mesg) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Any `FnMut(&Mesg)` closure that can fail is a listener.
impl<F> MesgListener for F
where
    F: FnMut(&Mesg) -> Result<(), Box<dyn std::error::Error + Send + Sync>>,
{
    fn on_mesg(&mut self, mesg: &Mesg) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self(mesg)
    }
}

enum Binding {
    Number(u16),
    Fallback,
}

/// Routes records to listeners by global message number.
#[derive(Default)]
pub struct MesgBroadcaster {
    listeners: Vec<(Binding, Box<dyn MesgListener>)>,
}

impl MesgBroadcaster {
    pub fn new() -> MesgBroadcaster {
        MesgBroadcaster::default()
    }

    /// Registers a listener for one global message number. Multiple
    /// listeners may share a number; they run in registration order.
    pub fn add_listener_for_num(&mut self, num: u16, listener: impl MesgListener + 'static) {
        self.listeners.push((Binding::Number(num), Box::new(listener)));
    }

    /// Registers a fallback listener: it receives only records whose
    /// message number has no numbered listener.
    pub fn add_fallback_listener(&mut self, listener: impl MesgListener + 'static) {
        self.listeners.push((Binding::Fallback, Box::new(listener)));
    }

    /// Fans one record out to every interested listener. All of them run;
    /// the first failure is returned once the fan-out is complete.
    pub fn dispatch(&mut self, mesg: &Mesg) -> Result<(), Error> {
        trace!(
            "dispatching mesg {} ({})",
            mesg.num(),
            mesg.name().unwrap_or("unknown")
        );
        let claimed = self
            .listeners
            .iter()
            .any(|(binding, _)| matches!(binding, Binding::Number(num) if *num == mesg.num()));
        let mut first_failure = None;
        for (binding, listener) in &mut self.listeners {
            let interested = match binding {
                Binding::Number(num) => *num == mesg.num(),
                Binding::Fallback => !claimed,
            };
            if !interested {
                continue;
            }
            if let Err(source) = listener.on_mesg(mesg) {
                if first_failure.is_none() {
                    first_failure = Some(Error::ListenerFailure { mesg_num: mesg.num(), source });
                }
            }
        }
        match first_failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::profile::mesg_num;

    fn counter(log: Rc<RefCell<Vec<&'static str>>>, label: &'static str) -> impl MesgListener {
        move |_: &Mesg| {
            log.borrow_mut().push(label);
            Ok(())
        }
    }

    #[test]
    fn dispatch_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut broadcaster = MesgBroadcaster::new();
        broadcaster.add_listener_for_num(mesg_num::RECORD, counter(Rc::clone(&log), "first"));
        broadcaster.add_listener_for_num(mesg_num::RECORD, counter(Rc::clone(&log), "second"));
        broadcaster.dispatch(&Mesg::new(mesg_num::RECORD)).unwrap();
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn fallback_sees_only_unclaimed() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut broadcaster = MesgBroadcaster::new();
        broadcaster.add_listener_for_num(mesg_num::RECORD, counter(Rc::clone(&log), "record"));
        broadcaster.add_fallback_listener(counter(Rc::clone(&log), "fallback"));
        broadcaster.dispatch(&Mesg::new(mesg_num::RECORD)).unwrap();
        broadcaster.dispatch(&Mesg::new(mesg_num::LAP)).unwrap();
        assert_eq!(*log.borrow(), vec!["record", "fallback"]);
    }

    #[test]
    fn all_listeners_run_despite_failure() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut broadcaster = MesgBroadcaster::new();
        broadcaster.add_listener_for_num(mesg_num::EVENT, |_: &Mesg| {
            Err("listener one broke".into())
        });
        broadcaster.add_listener_for_num(mesg_num::EVENT, counter(Rc::clone(&log), "survivor"));
        let result = broadcaster.dispatch(&Mesg::new(mesg_num::EVENT));
        assert!(matches!(
            result,
            Err(Error::ListenerFailure { mesg_num: mesg_num::EVENT, .. })
        ));
        assert_eq!(*log.borrow(), vec!["survivor"]);
    }
}
