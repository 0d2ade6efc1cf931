#![allow(dead_code)]

pub mod dns_server_mock;
pub mod pipeline_harness;
