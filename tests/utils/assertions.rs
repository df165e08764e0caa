//! Test assertion helpers - fluent API for verifying relay deliveries
#![allow(dead_code)] // Test utilities may not all be used in every test

use serde_json::Value;

use coedit::relay::{RelayEventKind, RelayFrame};

use super::setup::RelayTestBed;

// ============================================================================
// Assertion Helpers
// ============================================================================

pub struct FrameAssertion<'a> {
    bed: &'a RelayTestBed,
    connections: Vec<&'a str>,
}

impl<'a> FrameAssertion<'a> {
    /// Create an assertion for a single connection
    pub fn for_connection(bed: &'a RelayTestBed, connection_id: &'a str) -> Self {
        Self {
            bed,
            connections: vec![connection_id],
        }
    }

    /// Create an assertion for several connections at once
    pub fn for_connections(bed: &'a RelayTestBed, connections: Vec<&'a str>) -> Self {
        Self { bed, connections }
    }

    /// Assert that each connection received exactly one frame of the given
    /// kind (consumes the delivered frames)
    pub async fn received_exactly_one(self, expected: RelayEventKind) -> FrameContent {
        let mut frames: Vec<RelayFrame> = vec![];

        for connection in &self.connections {
            let mut delivered = self.bed.drain_frames(connection).await;
            assert_eq!(
                delivered.len(),
                1,
                "{} should have received exactly one frame, got {:?}",
                connection,
                delivered
            );

            let frame = delivered.remove(0);
            assert_eq!(
                frame.event, expected,
                "{} received the wrong event kind",
                connection
            );
            frames.push(frame);
        }

        // Fan-out hands every peer the same frame, so the payloads must agree
        if frames.len() > 1 {
            let first_payload = &frames[0].payload;
            for (i, frame) in frames.iter().enumerate().skip(1) {
                assert_eq!(
                    &frame.payload, first_payload,
                    "{} payload differs from {}",
                    self.connections[i], self.connections[0]
                );
            }
        }

        FrameContent {
            payload: frames.remove(0).payload,
        }
    }

    /// Assert that no connection received anything
    pub async fn received_nothing(self) {
        for connection in &self.connections {
            let delivered = self.bed.drain_frames(connection).await;
            assert!(
                delivered.is_empty(),
                "{} should not have received any frames, got {:?}",
                connection,
                delivered
            );
        }
    }

    /// Assert that each connection received exactly this sequence of event
    /// kinds, in order, returning the payloads from the first connection
    pub async fn received_sequence(self, expected: Vec<RelayEventKind>) -> Vec<FrameContent> {
        let mut result = vec![];

        for connection in &self.connections {
            let delivered = self.bed.drain_frames(connection).await;
            let kinds: Vec<RelayEventKind> = delivered.iter().map(|frame| frame.event).collect();
            assert_eq!(
                kinds, expected,
                "{} received the wrong frame sequence",
                connection
            );

            if connection == &self.connections[0] {
                result = delivered
                    .into_iter()
                    .map(|frame| FrameContent {
                        payload: frame.payload,
                    })
                    .collect();
            }
        }

        result
    }
}

// ============================================================================
// Frame Content Assertions
// ============================================================================

pub struct FrameContent {
    payload: Value,
}

impl FrameContent {
    /// Assert the frame carried exactly this payload
    pub fn with_payload(self, expected: Value) -> Self {
        assert_eq!(self.payload, expected);
        self
    }

    /// Assert one field of the payload without pinning the rest
    pub fn with_field(self, key: &str, expected: &str) -> Self {
        assert_eq!(self.payload[key], expected);
        self
    }
}
