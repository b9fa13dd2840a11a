use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

cfg_if::cfg_if! {
    if #[cfg(target_family = "wasm")] {
        use web_time::{Duration, Instant};
    } else {
        use std::time::{Duration, Instant};
    }
}

#[derive(Debug, Default)]
struct InnerTimer {
    start: Option<Instant>,
    elapsed: Duration,
    subtimers: SubTimersMap,
}

impl InnerTimer {
    fn reset(&mut self) {
        self.start = None;
        self.elapsed = Duration::ZERO;
        self.subtimers.clear();
    }

    fn start(&mut self) {
        self.start = Some(Instant::now());
    }

    fn stop(&mut self) {
        if let Some(instant) = self.start.take() {
            self.elapsed += instant.elapsed();
        }
    }

    // bank the elapsed time and pause, if running
    fn suspend(&mut self) {
        if let Some(instant) = self.start {
            self.elapsed += instant.elapsed();
            self.subtimers.suspend();
        }
    }

    // restart the clock, if running
    fn resume(&mut self) {
        if self.start.is_some() {
            self.start = Some(Instant::now());
            self.subtimers.resume();
        }
    }
}

#[derive(Debug, Default)]
struct SubTimersMap(HashMap<&'static str, InnerTimer>);

impl Deref for SubTimersMap {
    type Target = HashMap<&'static str, InnerTimer>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl DerefMut for SubTimersMap {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl SubTimersMap {
    fn suspend(&mut self) {
        self.values_mut().for_each(InnerTimer::suspend);
    }

    fn resume(&mut self) {
        self.values_mut().for_each(InnerTimer::resume);
    }

    fn total_time(&self) -> Duration {
        self.values().map(|t| t.elapsed).sum()
    }

    fn find(&self, path: &[&str]) -> Option<&InnerTimer> {
        let (first, rest) = path.split_first()?;
        let mut timer = self.get(*first)?;
        for key in rest {
            timer = timer.subtimers.get(*key)?;
        }
        Some(timer)
    }

    fn log(&self, depth: usize) {
        let mut keys: Vec<_> = self.keys().collect();
        keys.sort();
        for key in keys {
            let val = &self[key];
            log::info!("{:indent$}{} : {:?}", "", key, val.elapsed, indent = 4 * depth);
            val.subtimers.log(depth + 1);
        }
    }
}

/// Hierarchical wall clock timers.  Timers started while another is
/// running are recorded as its children.
#[derive(Default, Debug)]
pub struct Timers {
    stack: Vec<&'static str>,
    subtimers: SubTimersMap,
}

impl Timers {
    fn active_timer_mut(&mut self) -> Option<&mut InnerTimer> {
        let (first, rest) = self.stack.split_first()?;
        let mut active = self.subtimers.get_mut(first)?;
        for key in rest {
            active = active.subtimers.get_mut(key)?;
        }
        Some(active)
    }

    /// clear a top level timer and all of its children
    pub fn reset_timer(&mut self, key: &'static str) {
        self.subtimers.entry(key).or_default().reset();
    }

    /// start the timer `key` as a child of the running timer, if any
    pub fn start_as_current(&mut self, key: &'static str) {
        match self.active_timer_mut() {
            Some(active) => active.subtimers.entry(key).or_default().start(),
            None => self.subtimers.entry(key).or_default().start(),
        }
        self.stack.push(key);
    }

    pub fn stop_current(&mut self) {
        match self.active_timer_mut() {
            Some(active) => active.stop(),
            None => log::warn!("stop_current called with no running timer"),
        }
        self.stack.pop();
    }

    // Suspend / resume every timer in the collection.   Used for notimeit!
    pub fn suspend(&mut self) {
        self.subtimers.suspend();
    }

    pub fn resume(&mut self) {
        self.subtimers.resume();
    }

    pub fn total_time(&self) -> Duration {
        self.subtimers.total_time()
    }

    /// elapsed time of the timer at `path` (outermost key first),
    /// or zero if it never ran
    pub fn elapsed(&self, path: &[&str]) -> Duration {
        self.subtimers
            .find(path)
            .map_or(Duration::ZERO, |t| t.elapsed)
    }

    /// seconds spent in the timer at `path`
    pub fn seconds(&self, path: &[&str]) -> f64 {
        self.elapsed(path).as_secs_f64()
    }

    /// write all timers to the log
    pub fn log(&self) {
        self.subtimers.log(0);
    }
}

macro_rules! timeit {
    ($timer:ident => $key:literal; $($tt:tt)+) => {
        $timer.start_as_current($key);
        $(
            $tt
        )+
        $timer.stop_current();
    }
}
pub(crate) use timeit;

macro_rules! notimeit {
    ($timer:ident; $($tt:tt)+) => {
        $timer.suspend();
        $(
            $tt
        )+
        $timer.resume();
    }
}
pub(crate) use notimeit;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_nested_timers() {
        let mut timers = Timers::default();
        let v: Vec<u32>;
        let s: u32;

        timeit! {timers => "solve"; {
            timeit! {timers => "setup"; {
                v = (0..1000).collect();
            }}
            timeit! {timers => "iterate"; {
                s = v.iter().sum();
            }}
        }}
        assert_eq!(s, 499500);

        let total = timers.elapsed(&["solve"]);
        let setup = timers.elapsed(&["solve", "setup"]);
        let iter = timers.elapsed(&["solve", "iterate"]);
        assert!(setup + iter <= total);
        assert_eq!(timers.total_time(), total);
        assert_eq!(timers.elapsed(&["solve", "missing"]), Duration::ZERO);
        assert_eq!(timers.elapsed(&["setup"]), Duration::ZERO);

        // lookups do not need static keys
        let key = String::from("iterate");
        assert_eq!(timers.elapsed(&["solve", key.as_str()]), iter);

        timers.reset_timer("solve");
        assert_eq!(timers.elapsed(&["solve"]), Duration::ZERO);
        assert_eq!(timers.elapsed(&["solve", "setup"]), Duration::ZERO);
    }

    #[test]
    fn test_suspended_timer() {
        let mut timers = Timers::default();
        let mut count = 0;
        timeit! {timers => "outer"; {
            notimeit! {timers; {
                count += 1;
            }}
        }}
        assert_eq!(count, 1);
        assert!(timers.seconds(&["outer"]) >= 0.);
    }
}
