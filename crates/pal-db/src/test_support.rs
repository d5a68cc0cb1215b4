//! Shared test utilities for pal-db unit tests.
