mod common;
mod ranking_tests;
