// Unit tests for the skiff application crate

mod renderer;
