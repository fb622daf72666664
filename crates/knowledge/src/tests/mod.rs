//! Cross-module tests: ingest, persist, reload and answer.
