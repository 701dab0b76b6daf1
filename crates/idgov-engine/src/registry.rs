//! Processor registry.
//!
//! The registry is assembled explicitly at startup. Registration order is
//! recorded and used as the tie-break between processors of equal order.

use std::collections::HashMap;
use std::sync::Arc;

use idgov_core::error::DomainError;
use idgov_core::event_type::EventType;
use idgov_core::processor::EntityEventProcessor;

/// A processor together with its registration sequence number.
pub struct RegisteredProcessor<T: EventType> {
    /// Position in registration order, starting at 0.
    pub sequence: usize,
    /// The processor.
    pub processor: Arc<dyn EntityEventProcessor<T>>,
}

impl<T: EventType> Clone for RegisteredProcessor<T> {
    fn clone(&self) -> Self {
        Self {
            sequence: self.sequence,
            processor: Arc::clone(&self.processor),
        }
    }
}

/// All processors of one domain, indexed by the event types they support.
pub struct ProcessorRegistry<T: EventType> {
    processors: Vec<RegisteredProcessor<T>>,
    by_type: HashMap<T, Vec<usize>>,
}

impl<T: EventType> Default for ProcessorRegistry<T> {
    fn default() -> Self {
        Self {
            processors: Vec::new(),
            by_type: HashMap::new(),
        }
    }
}

impl<T: EventType> ProcessorRegistry<T> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `processor`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if a processor with the same id is
    /// already registered or the processor supports no event type.
    pub fn register(
        &mut self,
        processor: impl EntityEventProcessor<T> + 'static,
    ) -> Result<(), DomainError> {
        self.register_shared(Arc::new(processor))
    }

    /// Registers a processor shared with other owners.
    ///
    /// # Errors
    ///
    /// See [`ProcessorRegistry::register`].
    pub fn register_shared(
        &mut self,
        processor: Arc<dyn EntityEventProcessor<T>>,
    ) -> Result<(), DomainError> {
        let id = processor.id();
        if self.processors.iter().any(|p| p.processor.id() == id) {
            return Err(DomainError::Validation(format!(
                "processor {id} is already registered for {}",
                T::OWNER_TYPE
            )));
        }
        if processor.supported_types().is_empty() {
            return Err(DomainError::Validation(format!(
                "processor {id} supports no event type"
            )));
        }

        let sequence = self.processors.len();
        for event_type in processor.supported_types() {
            let indexes = self.by_type.entry(*event_type).or_default();
            if !indexes.contains(&sequence) {
                indexes.push(sequence);
            }
        }
        tracing::debug!(
            processor = id,
            owner_type = T::OWNER_TYPE,
            order = processor.order(),
            sequence,
            "registered processor"
        );
        self.processors.push(RegisteredProcessor {
            sequence,
            processor,
        });
        Ok(())
    }

    /// Builder-style [`ProcessorRegistry::register`].
    ///
    /// # Errors
    ///
    /// See [`ProcessorRegistry::register`].
    pub fn with_processor(
        mut self,
        processor: impl EntityEventProcessor<T> + 'static,
    ) -> Result<Self, DomainError> {
        self.register(processor)?;
        Ok(self)
    }

    /// Processors supporting `event_type`, in registration order.
    pub fn processors_for(&self, event_type: T) -> impl Iterator<Item = &RegisteredProcessor<T>> {
        self.by_type
            .get(&event_type)
            .into_iter()
            .flatten()
            .map(|&index| &self.processors[index])
    }

    /// Returns `true` if any close processor supports `event_type`.
    #[must_use]
    pub fn has_close_processors(&self, event_type: T) -> bool {
        self.processors_for(event_type)
            .any(|registered| registered.processor.close_after())
    }

    /// Looks a processor up by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Arc<dyn EntityEventProcessor<T>>> {
        self.processors
            .iter()
            .find(|registered| registered.processor.id() == id)
            .map(|registered| &registered.processor)
    }

    /// Number of registered processors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.processors.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}
