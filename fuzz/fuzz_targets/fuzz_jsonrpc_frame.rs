#![no_main]

use libfuzzer_sys::fuzz_target;
use toggl_mcp::config::ResourceApi;
use toggl_mcp::mcp::JsonRpcRequest;
use toggl_mcp::prompts;
use toggl_mcp::tools::args;

fuzz_target!(|data: &[u8]| {
    let Ok(request) = serde_json::from_slice::<JsonRpcRequest>(data) else {
        return;
    };
    let params = request.params.unwrap_or(serde_json::Value::Null);
    let arguments = params.get("arguments").cloned().unwrap_or_default();

    // Argument extraction must reject bad input without panicking.
    let _ = args::require_id(&arguments, "workspace_id");
    let _ = args::optional_string_list(&arguments, "tags");
    let today = args::Now::current().today;
    let _ = args::date_range(&arguments, "start_date", "end_date", today);
    if let Some(name) = params.get("name").and_then(|n| n.as_str()) {
        for api in [ResourceApi::V8, ResourceApi::V9] {
            let _ = prompts::render(name, &arguments, today, api);
        }
    }
});

