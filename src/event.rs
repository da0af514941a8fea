//! The event pump: one persistent interrupt read at a time, decoded and
//! dispatched synchronously to registered handlers, then the next read.
//! There is no internal queue; a slow handler back-pressures the device
//! through the host stack's NAKs. Vendors without interrupt events swap
//! in a polling loop at the same dispatch contract.

use crate::container::{Container, ContainerKind};
use crate::registry::Registry;
use crate::transport::{EndpointKind, Transport};
use crate::error::TransportError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Poll granularity for the interrupt read; a lapsed read is simply
/// reissued, so this only bounds shutdown latency.
const INTERRUPT_READ_TIMEOUT: Duration = Duration::from_millis(500);

/// A decoded device event.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraEvent {
    pub code: u16,
    /// Symbolic name when the active registry knows the code.
    pub name: Option<&'static str>,
    pub transaction_id: u32,
    pub params: Vec<u32>,
}

/// Turns an EVENT container into zero or more camera events. Vendors
/// with non-standard payload layouts substitute their own.
pub type EventDecoder = Arc<dyn Fn(&Container, &Registry) -> Vec<CameraEvent> + Send + Sync>;

/// The standard layout: up to five u32 parameter slots.
pub fn standard_decoder() -> EventDecoder {
    Arc::new(|container, registry| {
        vec![CameraEvent {
            code: container.code,
            name: registry.event_by_code(container.code).map(|def| def.name),
            transaction_id: container.transaction_id,
            params: container.params(),
        }]
    })
}

pub type Handler = Box<dyn Fn(&CameraEvent) + Send + Sync>;

/// Token returned by `on`, consumed by `off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerId(u64);

/// Handlers keyed by event name. `"*"` receives every event. Dispatch
/// order within one event follows registration order.
#[derive(Default)]
pub struct HandlerRegistry {
    next_id: u64,
    handlers: HashMap<String, Vec<(u64, Handler)>>,
}

impl HandlerRegistry {
    pub fn new() -> HandlerRegistry {
        HandlerRegistry::default()
    }

    pub fn add(&mut self, event: &str, handler: Handler) -> HandlerId {
        self.next_id += 1;
        let id = self.next_id;
        self.handlers
            .entry(event.to_owned())
            .or_default()
            .push((id, handler));
        HandlerId(id)
    }

    pub fn remove(&mut self, id: HandlerId) -> bool {
        let mut removed = false;
        self.handlers.retain(|_, list| {
            let before = list.len();
            list.retain(|(hid, _)| *hid != id.0);
            removed |= list.len() != before;
            !list.is_empty()
        });
        removed
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    /// Invoke handlers for `event` sequentially: named subscribers first,
    /// then wildcards.
    pub fn dispatch(&self, event: &CameraEvent) {
        if let Some(name) = event.name {
            if let Some(list) = self.handlers.get(name) {
                for (_, handler) in list {
                    handler(event);
                }
            }
        }
        if let Some(list) = self.handlers.get("*") {
            for (_, handler) in list {
                handler(event);
            }
        }
    }
}

/// A running pump. Dropped or stopped, the thread exits after its current
/// read completes.
pub struct EventPump {
    thread: Option<JoinHandle<()>>,
    listening: Arc<AtomicBool>,
    interrupt_based: bool,
}

impl EventPump {
    /// The canonical pump: a persistent interrupt listener.
    pub fn spawn_interrupt<T: Transport + 'static>(
        transport: Arc<T>,
        registry: Arc<Registry>,
        handlers: Arc<Mutex<HandlerRegistry>>,
        decoder: EventDecoder,
    ) -> EventPump {
        let listening = Arc::new(AtomicBool::new(true));
        let flag = listening.clone();
        let thread = thread::Builder::new()
            .name("ptp-event-pump".into())
            .spawn(move || {
                debug!("event pump started");
                while flag.load(Ordering::SeqCst) {
                    match transport.receive_interrupt(INTERRUPT_READ_TIMEOUT) {
                        Ok(bytes) => {
                            dispatch_frame(&bytes, &registry, &handlers, &decoder);
                        }
                        Err(TransportError::Timeout) | Err(TransportError::Cancelled) => {}
                        Err(TransportError::Stall) => {
                            warn!("interrupt endpoint stalled, clearing");
                            let _ = transport.clear_halt(EndpointKind::Interrupt);
                        }
                        Err(TransportError::Disconnected) => {
                            warn!("interrupt endpoint gone, pump exiting");
                            break;
                        }
                        Err(e) => {
                            warn!("interrupt read failed: {}", e);
                        }
                    }
                }
                debug!("event pump stopped");
            })
            .expect("spawn event pump thread");
        EventPump {
            thread: Some(thread),
            listening,
            interrupt_based: true,
        }
    }

    /// The substitute for devices that never signal the interrupt pipe:
    /// call `poll` at a fixed interval and dispatch whatever it returns.
    pub fn spawn_polling(
        interval: Duration,
        mut poll: Box<dyn FnMut() -> Vec<CameraEvent> + Send>,
        handlers: Arc<Mutex<HandlerRegistry>>,
    ) -> EventPump {
        let listening = Arc::new(AtomicBool::new(true));
        let flag = listening.clone();
        let thread = thread::Builder::new()
            .name("ptp-event-poll".into())
            .spawn(move || {
                debug!("polling pump started, interval {:?}", interval);
                while flag.load(Ordering::SeqCst) {
                    thread::sleep(interval);
                    if !flag.load(Ordering::SeqCst) {
                        break;
                    }
                    for event in poll() {
                        handlers.lock().unwrap().dispatch(&event);
                    }
                }
                debug!("polling pump stopped");
            })
            .expect("spawn polling pump thread");
        EventPump {
            thread: Some(thread),
            listening,
            interrupt_based: false,
        }
    }

    /// Stop listening and join the thread. For the interrupt pump a
    /// `Clear_Halt` breaks the pending read so the join is prompt.
    pub fn stop<T: Transport>(&mut self, transport: &T) {
        self.listening.store(false, Ordering::SeqCst);
        if self.interrupt_based {
            let _ = transport.clear_halt(EndpointKind::Interrupt);
        }
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }
}

impl Drop for EventPump {
    fn drop(&mut self) {
        // without a transport the read only lapses at its own timeout
        self.listening.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

/// Parse failures are logged and swallowed; the pump never stops over a
/// malformed frame.
fn dispatch_frame(
    bytes: &[u8],
    registry: &Registry,
    handlers: &Arc<Mutex<HandlerRegistry>>,
    decoder: &EventDecoder,
) {
    let container = match Container::parse(bytes) {
        Ok(c) => c,
        Err(e) => {
            warn!("dropping malformed interrupt frame: {}", e);
            return;
        }
    };
    if container.kind != ContainerKind::Event {
        warn!(
            "dropping {} container on interrupt pipe",
            container.kind.name()
        );
        return;
    }
    for event in decoder(&container, registry) {
        trace!(
            "event 0x{:04x} ({}) txn {} params {:?}",
            event.code,
            event.name.unwrap_or("unknown"),
            event.transaction_id,
            event.params
        );
        handlers.lock().unwrap().dispatch(&event);
    }
}
