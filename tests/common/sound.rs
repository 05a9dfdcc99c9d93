use chess3d::game::{SoundEvent, SoundSink};
use std::sync::{Arc, Mutex};

/// Sound sink that remembers what it was asked to play
#[derive(Clone, Default)]
pub struct RecordingSound {
    events: Arc<Mutex<Vec<SoundEvent>>>,
}

impl RecordingSound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SoundEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<SoundEvent> {
        self.events.lock().unwrap().last().copied()
    }

    pub fn boxed(&self) -> Box<dyn SoundSink> {
        Box::new(self.clone())
    }
}

impl SoundSink for RecordingSound {
    fn play(&mut self, event: SoundEvent) {
        self.events.lock().unwrap().push(event);
    }
}
