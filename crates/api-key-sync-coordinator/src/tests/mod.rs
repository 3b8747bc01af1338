//! Behavioral tests for the sync coordinator.


mod failures;
