// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Feeds arbitrary bytes to the response decoder and, when they decode,
//! through projection and both report formats.

#![no_main]

use chrono::{TimeZone, Utc};
use libfuzzer_sys::fuzz_target;

use newsclassify::model::AnalysisResult;
use newsclassify::render::{render_html, render_text, ResultRenderer};

fuzz_target!(|data: &[u8]| {
    let Ok(result) = serde_json::from_slice::<AnalysisResult>(data) else {
        return;
    };

    let mut renderer = ResultRenderer::new();
    renderer.expand_all(&result);
    let view = renderer.project(&result);
    assert_eq!(view.category_count, result.categories.len());

    let _ = render_text(&view);
    if let Some(generated_at) = Utc.timestamp_opt(0, 0).single() {
        let _ = render_html(&view, generated_at);
    }
});
