//! Shared scaffolding for client integration tests.

pub mod mock_esign_server;
