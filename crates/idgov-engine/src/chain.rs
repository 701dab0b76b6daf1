//! Dispatch chain builder.
//!
//! Selection depends only on the registry, the event type, the event's
//! properties and the disabled set, so rebuilding the chain on resume yields
//! the same sequence as long as conditionals are evaluated against the same
//! properties. Conditionals that depend on properties delivered by a resume
//! signal must therefore belong to processors ordered after the suspension
//! point.

use std::collections::HashSet;
use std::sync::Arc;

use idgov_core::error::DomainError;
use idgov_core::event::Event;
use idgov_core::event_type::EventType;
use idgov_core::processor::EntityEventProcessor;

use crate::registry::ProcessorRegistry;

/// One step of an ordered chain.
pub struct ChainEntry<T: EventType> {
    /// Registration sequence, the tie-break for equal `order`.
    pub sequence: usize,
    /// Declared order.
    pub order: i32,
    /// The processor.
    pub processor: Arc<dyn EntityEventProcessor<T>>,
}

impl<T: EventType> ChainEntry<T> {
    /// Processor id.
    #[must_use]
    pub fn id(&self) -> &str {
        self.processor.id()
    }
}

/// Builds the ordered chain for `event`.
///
/// A processor is selected when it supports the event type, is not
/// disabled, belongs to the event's chain kind (close processors only run on
/// close sub-events) and its conditional holds. The result is sorted by
/// `order`, ties broken by registration sequence.
///
/// # Errors
///
/// Returns `DomainError::ProcessorFailed` if a conditional fails.
pub fn build_chain<T: EventType>(
    registry: &ProcessorRegistry<T>,
    event: &Event<T>,
    disabled: &HashSet<String>,
) -> Result<Vec<ChainEntry<T>>, DomainError> {
    let close = event.is_close_event();
    let mut chain = Vec::new();

    for registered in registry.processors_for(event.event_type) {
        let processor = &registered.processor;
        if disabled.contains(processor.id()) || processor.close_after() != close {
            continue;
        }
        let selected = processor
            .conditional(event)
            .map_err(|err| err.in_processor(processor.id(), event.id))?;
        if selected {
            chain.push(ChainEntry {
                sequence: registered.sequence,
                order: processor.order(),
                processor: Arc::clone(processor),
            });
        }
    }

    chain.sort_by_key(|entry| (entry.order, entry.sequence));
    Ok(chain)
}
