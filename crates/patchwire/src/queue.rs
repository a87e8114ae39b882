//! Outbound MIDI staging queue.
//!
//! Sysex produced by the control surface is staged here and later drained
//! by the audio/MIDI output path, which usually runs on another thread. A
//! single mutex guards both append and drain; it is held only for the
//! container operation, never across I/O. The queue is unbounded - keeping
//! it small is the producer's job.

use std::sync::Mutex;

/// Logical origin of a MIDI event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiSource {
    /// Produced by the control surface / editor.
    Editor,
    /// Produced by the host (automation, state restore).
    Host,
    /// Received from the hardware device.
    Device,
}

/// One outbound MIDI event carrying a sysex payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiEvent {
    /// Raw sysex bytes, framing included.
    pub sysex: Vec<u8>,
    /// Where the event originated.
    pub source: MidiSource,
}

impl MidiEvent {
    /// Create a sysex event.
    pub fn sysex(sysex: Vec<u8>, source: MidiSource) -> Self {
        Self { sysex, source }
    }
}

/// Mutex-protected, append-only staging buffer for outbound events.
#[derive(Debug, Default)]
pub struct MidiOutQueue {
    events: Mutex<Vec<MidiEvent>>,
}

impl MidiOutQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one event under the lock.
    pub fn push(&self, event: MidiEvent) {
        self.guard().push(event);
    }

    /// Append a batch of events under the lock.
    pub fn extend(&self, events: impl IntoIterator<Item = MidiEvent>) {
        self.guard().extend(events);
    }

    /// Atomically take everything queued so far, leaving the queue empty.
    pub fn drain_all(&self) -> Vec<MidiEvent> {
        std::mem::take(&mut *self.guard())
    }

    /// Number of staged events.
    pub fn len(&self) -> usize {
        self.guard().len()
    }

    /// `true` if nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, Vec<MidiEvent>> {
        // A poisoned lock only means a producer panicked mid-push; the
        // event vector itself is still valid.
        match self.events.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_push_and_drain() {
        let queue = MidiOutQueue::new();
        queue.push(MidiEvent::sysex(vec![0xf0, 0xf7], MidiSource::Editor));
        queue.push(MidiEvent::sysex(vec![0xf0, 0x01, 0xf7], MidiSource::Device));
        assert_eq!(queue.len(), 2);

        let drained = queue.drain_all();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].sysex, [0xf0, 0xf7]);
        assert_eq!(drained[1].source, MidiSource::Device);

        assert!(queue.is_empty());
        assert!(queue.drain_all().is_empty());
    }

    #[test]
    fn test_extend() {
        let queue = MidiOutQueue::new();
        queue.extend((0..4).map(|i| MidiEvent::sysex(vec![i], MidiSource::Host)));
        assert_eq!(queue.len(), 4);
    }

    #[test]
    fn test_cross_thread_producer() {
        let queue = Arc::new(MidiOutQueue::new());

        let producer = {
            let queue = Arc::clone(&queue);
            std::thread::spawn(move || {
                for i in 0..100u8 {
                    queue.push(MidiEvent::sysex(vec![0xf0, i, 0xf7], MidiSource::Editor));
                }
            })
        };

        producer.join().expect("producer thread panicked");
        assert_eq!(queue.drain_all().len(), 100);
    }
}
