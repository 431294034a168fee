// event.rs
use std::{
    path::PathBuf,
    sync::mpsc::{self, Receiver, RecvTimeoutError, Sender},
    thread,
    time::{Duration, Instant},
};

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, MouseEvent};
use tracing::warn;

use gewog_hazard_mapper::buildings::{BuildingLayer, load_buildings};
use gewog_hazard_mapper::render::OverlayRequest;

pub enum Event {
    Tick,
    Input(KeyEvent),
    Mouse(MouseEvent),
    Resize,
    /// Building overlay finished loading for render `generation`.
    OverlayLoaded {
        generation: u64,
        layer: Option<BuildingLayer>,
    },
}

pub struct EventHandler {
    sender: Sender<Event>,
    receiver: Receiver<Event>,
    #[allow(dead_code)]
    event_thread: thread::JoinHandle<()>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> EventHandler {
        let (sender, receiver) = mpsc::channel();
        let input_sender = sender.clone();
        let event_thread = thread::spawn(move || {
            let mut last_tick = Instant::now();
            loop {
                let timeout = tick_rate
                    .checked_sub(last_tick.elapsed())
                    .unwrap_or_else(|| Duration::from_secs(0));

                // Poll for a crossterm event.
                let polled = match event::poll(timeout) {
                    Ok(ready) => ready,
                    Err(err) => {
                        warn!(error = %err, "terminal event polling failed");
                        break;
                    }
                };
                if polled {
                    let forwarded = match event::read() {
                        Ok(CrosstermEvent::Key(e)) => input_sender.send(Event::Input(e)),
                        Ok(CrosstermEvent::Mouse(e)) => input_sender.send(Event::Mouse(e)),
                        Ok(CrosstermEvent::Resize(_, _)) => input_sender.send(Event::Resize),
                        Ok(_) => Ok(()),
                        Err(err) => {
                            warn!(error = %err, "failed to read terminal event");
                            break;
                        }
                    };
                    // The receiver is gone once the UI has shut down.
                    if forwarded.is_err() {
                        break;
                    }
                }

                // If enough time has passed, send a `Tick` event.
                if last_tick.elapsed() >= tick_rate {
                    if input_sender.send(Event::Tick).is_err() {
                        break;
                    }
                    last_tick = Instant::now();
                }
            }
        });
        EventHandler {
            sender,
            receiver,
            event_thread,
        }
    }

    /// Next event, or `None` if nothing arrived within `timeout`.
    pub fn next(&self, timeout: Duration) -> Result<Option<Event>, mpsc::RecvTimeoutError> {
        match self.receiver.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Loads the building overlay off the UI thread; the result comes back
    /// as [`Event::OverlayLoaded`].
    pub fn load_overlay(&self, request: OverlayRequest, buildings_dir: PathBuf) {
        let sender = self.sender.clone();
        thread::spawn(move || {
            let layer = load_buildings(&buildings_dir, &request.region, request.mode);
            // The receiver is gone once the UI has shut down.
            let _ = sender.send(Event::OverlayLoaded {
                generation: request.generation,
                layer,
            });
        });
    }
}
