//! Behavioral compatibility tests for the fgadsl compiler.
//!
//! The tests live under `tests/`. Each `test_section_*` file pins one area
//! of compiler behavior against the fixture models in `tests/common`.
