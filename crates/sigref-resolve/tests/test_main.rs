// Main test entry point for sigref-resolve
// This file organizes and loads all test modules

mod common;

mod module_type_tests;
mod path_tests;
mod property_tests;
mod scenario_tests;
