/* Scroll layer gate: relative X/Y motion is routed through a chain of
 * downstream input processors only while one of the two configured scroll
 * trigger layers is active. Otherwise events pass through untouched. */

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use anyhow::Result;
use tokio::sync::watch;
use tracing::trace;

use crate::state::ConfigState;

/* Largest layer count the gate accepts; layer activity is a 32-bit mask. */
pub const MAX_LAYERS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Key,
    Rel,
    Abs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelCode {
    X,
    Y,
    Wheel,
    HWheel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub ev_type: EventType,
    pub code: RelCode,
    pub value: i32,
}

impl InputEvent {
    pub fn rel(code: RelCode, value: i32) -> Self {
        Self {
            ev_type: EventType::Rel,
            code,
            value,
        }
    }

    fn is_motion(&self) -> bool {
        self.ev_type == EventType::Rel && matches!(self.code, RelCode::X | RelCode::Y)
    }
}

/* Per-event state threaded through a processor chain. */
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessorState {
    pub input_device_index: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    /* Hand the event to the next processor. */
    Continue,
    /* Swallow the event; later processors never see it. */
    Stop,
}

pub trait InputProcessor: Send {
    fn handle_event(
        &mut self,
        event: &mut InputEvent,
        param1: u32,
        param2: u32,
        state: &mut ProcessorState,
    ) -> Result<ProcessStatus>;
}

/* A processor together with the parameters it was bound with. */
pub struct ProcessorEntry {
    pub processor: Box<dyn InputProcessor>,
    pub param1: u32,
    pub param2: u32,
}

impl ProcessorEntry {
    pub fn new(processor: Box<dyn InputProcessor>) -> Self {
        Self {
            processor,
            param1: 0,
            param2: 0,
        }
    }
}

/* Live keymap layer information. */
pub trait LayerState: Send + Sync {
    fn layer_count(&self) -> usize;
    fn is_layer_active(&self, layer: u8) -> bool;
}

/* Lock-free active-layer mask. */
#[derive(Debug)]
pub struct LayerMask {
    count: usize,
    active: AtomicU32,
}

impl LayerMask {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            active: AtomicU32::new(0),
        }
    }

    pub fn activate(&self, layer: u8) {
        if let Some(bit) = 1u32.checked_shl(u32::from(layer)) {
            self.active.fetch_or(bit, Ordering::SeqCst);
        }
    }

    pub fn deactivate(&self, layer: u8) {
        if let Some(bit) = 1u32.checked_shl(u32::from(layer)) {
            self.active.fetch_and(!bit, Ordering::SeqCst);
        }
    }
}

impl LayerState for LayerMask {
    fn layer_count(&self) -> usize {
        self.count
    }

    fn is_layer_active(&self, layer: u8) -> bool {
        1u32.checked_shl(u32::from(layer))
            .is_some_and(|bit| self.active.load(Ordering::SeqCst) & bit != 0)
    }
}

pub struct ScrollLayerGate {
    config: watch::Receiver<ConfigState>,
    layers: Arc<dyn LayerState>,
    processors: Vec<ProcessorEntry>,
}

impl ScrollLayerGate {
    pub fn new(
        config: watch::Receiver<ConfigState>,
        layers: Arc<dyn LayerState>,
        processors: Vec<ProcessorEntry>,
    ) -> Self {
        Self {
            config,
            layers,
            processors,
        }
    }

    /* True when either trigger layer, reduced modulo the layer count, is active. */
    pub fn scroll_layers_active(&self) -> bool {
        let count = self.layers.layer_count();
        if count == 0 || count > MAX_LAYERS {
            return false;
        }

        let (layer_1, layer_2) = {
            let cfg = self.config.borrow();
            (cfg.scroll_trigger_layer_1, cfg.scroll_trigger_layer_2)
        };
        let layer_1 = (usize::from(layer_1) % count) as u8;
        let layer_2 = (usize::from(layer_2) % count) as u8;

        self.layers.is_layer_active(layer_1) || self.layers.is_layer_active(layer_2)
    }
}

impl InputProcessor for ScrollLayerGate {
    fn handle_event(
        &mut self,
        event: &mut InputEvent,
        _param1: u32,
        _param2: u32,
        state: &mut ProcessorState,
    ) -> Result<ProcessStatus> {
        if !self.scroll_layers_active() || !event.is_motion() {
            return Ok(ProcessStatus::Continue);
        }

        /* The chain gets its own state; only the device index carries over. */
        let mut local = ProcessorState {
            input_device_index: state.input_device_index,
        };

        for (i, entry) in self.processors.iter_mut().enumerate() {
            let status = entry
                .processor
                .handle_event(event, entry.param1, entry.param2, &mut local)?;
            if status != ProcessStatus::Continue {
                trace!("Scroll chain stopped at processor {i}");
                return Ok(status);
            }
        }

        Ok(ProcessStatus::Continue)
    }
}
