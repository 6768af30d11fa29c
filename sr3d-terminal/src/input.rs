/// Keyboard capture thread feeding the shared held-key set
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use sr3d_core::{Key, KeySet};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Without release events a key counts as held this long after its last
/// press or auto-repeat.
const HOLD_WINDOW: Duration = Duration::from_millis(250);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Non-key events for the frame loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Quit,
    Resize(u16, u16),
}

/// Handle to the running input thread
pub struct InputThread {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl InputThread {
    /// Start capturing. `release_events` tells whether the terminal reports
    /// key releases; otherwise holds expire after [`HOLD_WINDOW`].
    pub fn spawn(keys: Arc<KeySet>, release_events: bool) -> (Self, Receiver<Control>) {
        let (tx, rx) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);

        let handle = thread::spawn(move || {
            let mut reader = KeyReader::new(keys, release_events);
            if let Err(e) = reader.run(&flag, &tx) {
                log::error!("input thread failed: {}", e);
                let _ = tx.send(Control::Quit);
            }
        });

        (
            Self {
                stop,
                handle: Some(handle),
            },
            rx,
        )
    }

    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for InputThread {
    fn drop(&mut self) {
        self.stop();
    }
}

struct KeyReader {
    keys: Arc<KeySet>,
    release_events: bool,
    last_seen: [Option<Instant>; Key::ALL.len()],
}

impl KeyReader {
    fn new(keys: Arc<KeySet>, release_events: bool) -> Self {
        Self {
            keys,
            release_events,
            last_seen: [None; Key::ALL.len()],
        }
    }

    fn run(&mut self, stop: &AtomicBool, tx: &Sender<Control>) -> io::Result<()> {
        while !stop.load(Ordering::Relaxed) {
            if event::poll(POLL_INTERVAL)? {
                match event::read()? {
                    Event::Key(key_event) => {
                        if let Some(control) = self.on_key(key_event, Instant::now()) {
                            if tx.send(control).is_err() {
                                return Ok(());
                            }
                        }
                    }
                    Event::Resize(cols, rows) => {
                        if tx.send(Control::Resize(cols, rows)).is_err() {
                            return Ok(());
                        }
                    }
                    _ => {}
                }
            }
            if !self.release_events {
                self.expire(Instant::now());
            }
        }
        Ok(())
    }

    fn on_key(&mut self, event: KeyEvent, now: Instant) -> Option<Control> {
        let KeyEvent {
            code,
            modifiers,
            kind,
            ..
        } = event;

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Some(Control::Quit),
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                return Some(Control::Quit)
            }
            _ => {}
        }

        let key = map_key(code)?;
        match kind {
            KeyEventKind::Release => self.keys.release(key),
            KeyEventKind::Press | KeyEventKind::Repeat => {
                self.keys.press(key);
                self.last_seen[key as usize] = Some(now);
            }
        }
        None
    }

    fn expire(&mut self, now: Instant) {
        for key in Key::ALL {
            if let Some(seen) = self.last_seen[key as usize] {
                if now.duration_since(seen) > HOLD_WINDOW {
                    self.keys.release(key);
                    self.last_seen[key as usize] = None;
                }
            }
        }
    }
}

/// WASD moves, arrows look around
pub fn map_key(code: KeyCode) -> Option<Key> {
    let key = match code {
        KeyCode::Char('w') | KeyCode::Char('W') => Key::Forward,
        KeyCode::Char('s') | KeyCode::Char('S') => Key::Back,
        KeyCode::Char('a') | KeyCode::Char('A') => Key::Left,
        KeyCode::Char('d') | KeyCode::Char('D') => Key::Right,
        KeyCode::Up => Key::LookUp,
        KeyCode::Down => Key::LookDown,
        KeyCode::Left => Key::LookLeft,
        KeyCode::Right => Key::LookRight,
        _ => return None,
    };
    Some(key)
}
