// Integration tests for shell-core
// Exercises the public API end to end: loop, router, window, peers

mod bridge;
mod helpers;
