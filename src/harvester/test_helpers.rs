//! Shared test helpers for harvester and API tests.

use std::time::Duration;

use crate::config::Config;
use crate::harvester::ImageHarvester;
use crate::types::{Event, TemplateSpec};

/// Encode a small RGB PNG carrying the given tEXt chunks
pub(crate) fn png_fixture(width: u32, height: u32, text: &[(&str, &str)]) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        for (keyword, value) in text {
            encoder
                .add_text_chunk(keyword.to_string(), value.to_string())
                .unwrap();
        }
        let mut writer = encoder.write_header().unwrap();
        let data = vec![0u8; (width * height * 3) as usize];
        writer.write_image_data(&data).unwrap();
    }
    out
}

/// PNG that classifies as a NovelAI image with full parameters
pub(crate) fn novelai_png() -> Vec<u8> {
    png_fixture(
        8,
        4,
        &[
            ("Software", "NovelAI"),
            ("Source", "NovelAI Diffusion V4.5 4BDE2A90"),
            (
                "Comment",
                r#"{"prompt": "1girl", "steps": 28, "width": 832, "height": 1216,
                    "request_type": "PromptGenerateRequest", "signed_hash": "abc",
                    "sampler": "k_euler", "noise_schedule": "karras", "seed": 42}"#,
            ),
        ],
    )
}

/// Harvester with default settings
pub(crate) fn create_test_harvester() -> ImageHarvester {
    let mut config = Config::default();
    config.fetch.request_timeout = Duration::from_secs(10);
    ImageHarvester::new(config).unwrap()
}

/// Template with a `{num}` placeholder over `start..=end`
pub(crate) fn numbered_spec(base_url: &str, template: &str, start: i64, end: i64) -> TemplateSpec {
    TemplateSpec {
        base_url: base_url.to_string(),
        template: template.to_string(),
        num_start: start,
        num_end: end,
        ..Default::default()
    }
}

/// Poll until a `Complete` event arrives, returning every event seen
pub(crate) async fn collect_until_complete(harvester: &ImageHarvester) -> Vec<Event> {
    let mut events = Vec::new();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(20);
    loop {
        events.extend(harvester.poll_events());
        if events.iter().any(|e| matches!(e, Event::Complete)) {
            // Anything pushed after Complete would be a bug; pick it up too
            tokio::time::sleep(Duration::from_millis(20)).await;
            events.extend(harvester.poll_events());
            return events;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "run did not complete, events so far: {:?}",
            events
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Count events by kind: (progress, image, complete)
pub(crate) fn count_events(events: &[Event]) -> (usize, usize, usize) {
    events.iter().fold((0, 0, 0), |(p, i, c), e| match e {
        Event::Progress { .. } => (p + 1, i, c),
        Event::Image { .. } => (p, i + 1, c),
        Event::Complete => (p, i, c + 1),
    })
}
