//! Event store database schema.

/// SQL to create the entity events table.
///
/// Mirrors `migrations/20260115100000_create_entity_events.sql`.
pub const CREATE_ENTITY_EVENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS entity_events (
    id                     UUID PRIMARY KEY,
    event_type             VARCHAR(255) NOT NULL,
    owner_type             VARCHAR(255) NOT NULL,
    owner_id               UUID,
    content                JSONB NOT NULL,
    original_content       JSONB,
    properties             JSONB NOT NULL DEFAULT '{}'::jsonb,
    state                  VARCHAR(32) NOT NULL,
    closed_processor_index INTEGER,
    parent_event_id        UUID,
    root_event_id          UUID,
    instance_id            VARCHAR(255) NOT NULL,
    result_message         TEXT,
    version                BIGINT NOT NULL,
    created_at             TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at             TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_entity_events_state_instance
    ON entity_events (state, instance_id);

CREATE INDEX IF NOT EXISTS idx_entity_events_parent_event_id
    ON entity_events (parent_event_id);

CREATE INDEX IF NOT EXISTS idx_entity_events_owner
    ON entity_events (owner_type, owner_id);
";

/// Column list shared by every `SELECT`.
pub(crate) const EVENT_COLUMNS: &str = "id, event_type, owner_type, owner_id, content, \
     original_content, properties, state, closed_processor_index, parent_event_id, \
     root_event_id, instance_id, result_message, version, created_at, updated_at";
