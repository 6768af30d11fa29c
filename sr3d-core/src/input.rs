/// Held-key state shared between an input source and the frame loop
use std::sync::atomic::{AtomicU8, Ordering};

/// Movement and look keys the engine reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Forward,
    Back,
    Left,
    Right,
    LookUp,
    LookDown,
    LookLeft,
    LookRight,
}

impl Key {
    pub const ALL: [Key; 8] = [
        Key::Forward,
        Key::Back,
        Key::Left,
        Key::Right,
        Key::LookUp,
        Key::LookDown,
        Key::LookLeft,
        Key::LookRight,
    ];

    fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Read side of the input collaborator
pub trait KeyState {
    fn is_held(&self, key: Key) -> bool;
}

/// Lock-free set of held keys.
///
/// Writers (an event thread or callback) press and release; the frame loop
/// reads once per tick. Reads are not synchronized with a batch of writes,
/// so a frame may see a key a moment early or late.
#[derive(Debug, Default)]
pub struct KeySet {
    bits: AtomicU8,
}

impl KeySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&self, key: Key) {
        self.bits.fetch_or(key.bit(), Ordering::Relaxed);
    }

    pub fn release(&self, key: Key) {
        self.bits.fetch_and(!key.bit(), Ordering::Relaxed);
    }

    pub fn release_all(&self) {
        self.bits.store(0, Ordering::Relaxed);
    }

    pub fn is_empty(&self) -> bool {
        self.bits.load(Ordering::Relaxed) == 0
    }

    pub fn held(&self) -> impl Iterator<Item = Key> {
        let bits = self.bits.load(Ordering::Relaxed);
        Key::ALL.into_iter().filter(move |k| bits & k.bit() != 0)
    }
}

impl KeyState for KeySet {
    fn is_held(&self, key: Key) -> bool {
        self.bits.load(Ordering::Relaxed) & key.bit() != 0
    }
}

/// No keys held
pub struct NoInput;

impl KeyState for NoInput {
    fn is_held(&self, _key: Key) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_press_release() {
        let keys = KeySet::new();
        keys.press(Key::Forward);
        keys.press(Key::LookLeft);
        assert!(keys.is_held(Key::Forward));
        assert!(!keys.is_held(Key::Back));
        assert_eq!(keys.held().collect::<Vec<_>>(), vec![Key::Forward, Key::LookLeft]);

        keys.release(Key::Forward);
        assert!(!keys.is_held(Key::Forward));
        keys.release_all();
        assert!(keys.is_empty());
    }

    #[test]
    fn test_shared_between_threads() {
        let keys = Arc::new(KeySet::new());
        let writer = Arc::clone(&keys);
        thread::spawn(move || {
            for key in Key::ALL {
                writer.press(key);
            }
        })
        .join()
        .unwrap();
        assert!(Key::ALL.iter().all(|&k| keys.is_held(k)));
    }
}
