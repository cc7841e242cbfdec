#![no_main]

use libfuzzer_sys::fuzz_target;
use std::sync::Arc;
use toggl_mcp::config::ResourceApi;
use toggl_mcp::resources::{ResourceCatalog, UriTemplate};
use toggl_mcp::toggl::{ApiBase, TogglClient};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    // Arbitrary templates must parse or fail cleanly, and match without panicking.
    if let Ok(template) = UriTemplate::parse(input) {
        let _ = template.matches(input);
    }

    let client = Arc::new(TogglClient::new(None, ApiBase::default(), "TogglMCP"));
    for api in [ResourceApi::V8, ResourceApi::V9] {
        let catalog = ResourceCatalog::new(client.clone(), api);
        let _ = catalog.resolve(input);
    }
});
