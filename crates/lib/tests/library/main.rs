mod common;
mod pipeline_tests;
mod plugin_tests;
