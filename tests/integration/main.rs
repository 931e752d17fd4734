//! Integration tests for the harvest pipeline
//!
//! These tests use wiremock to stand in for both the listing site and the
//! geocoding service, and run the full pipeline end-to-end.

mod harvest_tests;
