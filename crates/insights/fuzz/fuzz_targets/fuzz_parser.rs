//! Fuzz target for the upload parser.
//!
//! Parsing arbitrary bytes under any supported extension must return
//! `Ok` or `Err`, never panic, and any dataset it builds must analyze cleanly.

#![no_main]

use arbitrary::Arbitrary;
use insights::{generate_insights, InsightConfig, Parser};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    extension: u8,
    data: &'a [u8],
}

const EXTENSIONS: &[&str] = &["csv", "tsv", "txt", "xlsx", "xls", "ods"];

fuzz_target!(|input: Input<'_>| {
    // Avoid OOM on huge inputs
    if input.data.len() > 100_000 {
        return;
    }

    let extension = EXTENSIONS[input.extension as usize % EXTENSIONS.len()];
    if let Ok(dataset) = Parser::new().parse(input.data, extension) {
        let insights = generate_insights(&dataset, &InsightConfig::default())
            .expect("analyzers accept every parsed dataset");
        assert!(insights.len() <= 5);
        assert!(insights.iter().all(|i| (0.0..=1.0).contains(&i.confidence)));
    }
});
