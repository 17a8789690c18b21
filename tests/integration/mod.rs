/// Integration tests driving the server end to end

mod basic_integration;
mod mcp_workflow;
mod timer_workflow;
