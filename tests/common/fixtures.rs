//! Image fixtures and mock servers

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// NovelAI V4.5 parameter blob with two characters
pub const NOVELAI_COMMENT: &str = r#"{
    "prompt": "fur dataset, 2girls, park",
    "steps": 23,
    "height": 1216,
    "width": 832,
    "scale": 6.5,
    "uncond_scale": 1.0,
    "cfg_rescale": 0.0,
    "seed": 3141592653,
    "n_samples": 1,
    "noise_schedule": "karras",
    "sampler": "k_euler_ancestral",
    "request_type": "PromptGenerateRequest",
    "signed_hash": "c2lnbmF0dXJl",
    "v4_prompt": {
        "caption": {
            "base_caption": "2girls, park",
            "char_captions": [
                {"char_caption": "girl, blonde"},
                {"char_caption": "girl, black hair"}
            ]
        },
        "use_coords": false
    },
    "v4_negative_prompt": {
        "caption": {
            "base_caption": "lowres, blurry",
            "char_captions": [
                {"char_caption": "extra fingers"},
                {"char_caption": ""}
            ]
        }
    }
}"#;

/// Encode an RGB PNG with the given tEXt chunks
pub fn png_with_text(width: u32, height: u32, text: &[(&str, &str)]) -> Vec<u8> {
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
        writer
            .write_image_data(&vec![0u8; (width * height * 3) as usize])
            .unwrap();
    }
    out
}

/// A NovelAI-style PNG as written by the generator
pub fn novelai_png(width: u32, height: u32) -> Vec<u8> {
    png_with_text(
        width,
        height,
        &[
            ("Title", "NovelAI generated image"),
            ("Description", "fur dataset, 2girls, park"),
            ("Software", "NovelAI"),
            ("Source", "NovelAI Diffusion V4.5 C02D4F98"),
            ("Generation time", "3.5"),
            ("Comment", NOVELAI_COMMENT),
        ],
    )
}

/// A PNG with no metadata
pub fn plain_png(width: u32, height: u32) -> Vec<u8> {
    png_with_text(width, height, &[])
}

/// Mount `body` with `content_type` at `route`
pub async fn serve(server: &MockServer, route: &str, content_type: &str, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(route.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, content_type))
        .mount(server)
        .await;
}

/// Mount a bare status response at `route`
pub async fn serve_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route.to_string()))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}
