//! Serialises code issuance per phone and per sending IP within a process
//!
//! Keys hash onto a fixed set of lock stripes, so memory stays bounded no
//! matter how many distinct phones or addresses are seen.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tokio::sync::{Mutex, MutexGuard};

const STRIPES: usize = 64;

pub(crate) struct SendGuard {
    phones: Vec<Mutex<()>>,
    ips: Vec<Mutex<()>>,
}

/// Held from the limit checks until the new record is stored
pub(crate) struct SendPermit<'a> {
    _phone: MutexGuard<'a, ()>,
    _ip: Option<MutexGuard<'a, ()>>,
}

impl SendGuard {
    pub(crate) fn new() -> Self {
        Self {
            phones: (0..STRIPES).map(|_| Mutex::new(())).collect(),
            ips: (0..STRIPES).map(|_| Mutex::new(())).collect(),
        }
    }

    /// Lock the phone stripe, then the IP stripe
    ///
    /// Phone and IP stripes live in separate tables and are always taken in
    /// that order, so two permits can never wait on each other.
    pub(crate) async fn acquire(&self, phone: &str, ip: Option<&str>) -> SendPermit<'_> {
        let phone_guard = self.phones[stripe(phone)].lock().await;
        let ip_guard = match ip {
            Some(ip) => Some(self.ips[stripe(ip)].lock().await),
            None => None,
        };
        SendPermit {
            _phone: phone_guard,
            _ip: ip_guard,
        }
    }
}

fn stripe(key: &str) -> usize {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    (hasher.finish() % STRIPES as u64) as usize
}
