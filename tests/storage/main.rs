//! Integration tests for Layer 1: Storage
//!
//! Tests for window cells, hitmaps, and the timing queue.

mod windows;
