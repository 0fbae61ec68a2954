//! In-flight tile cap.
//!
//! ```text
//!   request ──► try_acquire ──► Some(permit) ──► ... work ... ──► drop(permit)
//!                    │                                               │
//!                    └──► None (Busy)                  in_flight -= 1
//! ```
//!
//! The permit owns the decrement, so it happens on success, on error and when
//! a worker unwinds.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Caps the number of concurrently synthesizing tiles.
#[derive(Clone, Debug)]
pub struct ConcurrencyGovernor {
  in_flight: Arc<AtomicUsize>,
  max_in_flight: usize,
}

impl ConcurrencyGovernor {
  pub fn new(max_in_flight: usize) -> Self {
    Self {
      in_flight: Arc::new(AtomicUsize::new(0)),
      max_in_flight,
    }
  }

  /// Take a slot, or `None` if the cap is reached. Never blocks.
  pub fn try_acquire(&self) -> Option<InFlightPermit> {
    let mut current = self.in_flight.load(Ordering::Acquire);
    loop {
      if current >= self.max_in_flight {
        return None;
      }
      match self.in_flight.compare_exchange_weak(
        current,
        current + 1,
        Ordering::AcqRel,
        Ordering::Acquire,
      ) {
        Ok(_) => {
          return Some(InFlightPermit {
            in_flight: Arc::clone(&self.in_flight),
          })
        }
        Err(actual) => current = actual,
      }
    }
  }

  pub fn in_flight(&self) -> usize {
    self.in_flight.load(Ordering::Acquire)
  }

  pub fn max_in_flight(&self) -> usize {
    self.max_in_flight
  }
}

/// One in-flight slot. Released on drop.
#[derive(Debug)]
pub struct InFlightPermit {
  in_flight: Arc<AtomicUsize>,
}

impl Drop for InFlightPermit {
  fn drop(&mut self) {
    self.in_flight.fetch_sub(1, Ordering::AcqRel);
  }
}

#[cfg(test)]
mod tests {
  use std::thread;

  use super::*;

  #[test]
  fn test_cap_rejects_extra_request() {
    let governor = ConcurrencyGovernor::new(3);
    let permits: Vec<_> = (0..3).map(|_| governor.try_acquire().unwrap()).collect();
    assert_eq!(governor.in_flight(), 3);
    assert!(governor.try_acquire().is_none());

    drop(permits);
    assert_eq!(governor.in_flight(), 0);
    assert!(governor.try_acquire().is_some());
  }

  #[test]
  fn test_release_admits_next() {
    let governor = ConcurrencyGovernor::new(1);
    let first = governor.try_acquire().unwrap();
    assert!(governor.try_acquire().is_none());
    drop(first);
    let second = governor.try_acquire();
    assert!(second.is_some());
    assert_eq!(governor.in_flight(), 1);
  }

  #[test]
  fn test_permit_released_on_panic() {
    let governor = ConcurrencyGovernor::new(1);
    let permit = governor.try_acquire().unwrap();
    let result = thread::spawn(move || {
      let _permit = permit;
      panic!("synthesis blew up");
    })
    .join();
    assert!(result.is_err());
    assert_eq!(governor.in_flight(), 0);
  }

  #[test]
  fn test_concurrent_acquire_never_exceeds_cap() {
    let governor = ConcurrencyGovernor::new(4);
    let handles: Vec<_> = (0..16)
      .map(|_| {
        let governor = governor.clone();
        thread::spawn(move || {
          let mut held = 0;
          for _ in 0..1000 {
            if let Some(permit) = governor.try_acquire() {
              assert!(governor.in_flight() <= 4);
              held += 1;
              drop(permit);
            }
          }
          held
        })
      })
      .collect();
    let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert!(total > 0);
    assert_eq!(governor.in_flight(), 0);
  }

  #[test]
  fn test_zero_cap_always_busy() {
    let governor = ConcurrencyGovernor::new(0);
    assert!(governor.try_acquire().is_none());
  }
}
