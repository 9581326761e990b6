//! StudyForge Control - command-line front end for the progress store

pub mod cli;
pub mod commands;
pub mod display;
