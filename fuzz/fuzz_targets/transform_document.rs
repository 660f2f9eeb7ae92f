#![no_main]

use chrono::{TimeZone, Utc};
use libfuzzer_sys::fuzz_target;
use tickview_core::config::ViewConfig;
use tickview_core::view::{Document, ViewContext, transform};

fuzz_target!(|data: &[u8]| {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let Ok(doc) = Document::from_value(value) else {
        return;
    };
    let Some(now) = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).single() else {
        return;
    };
    let ctx = ViewContext::new(&now, ViewConfig::default());
    let _ = doc.title(ctx.config());
    let _ = transform(doc.page, &ctx);
});
