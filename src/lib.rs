// src/lib.rs
#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod util;

pub mod project;
pub mod index;
pub mod cpp_index;

pub mod declarations;
pub mod linkage;
pub mod interleave;
pub mod assembler;

pub mod commands;
