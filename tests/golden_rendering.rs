#![cfg(feature = "resvg")]

use sha2::{Digest, Sha256};
use std::fs;
use std::path::PathBuf;

use wordglyph::assets::{AssetCache, AssetLayout, DirectorySource, GlyphPayload};
use wordglyph::glyph::resolve;
use wordglyph::platform::Immediate;
use wordglyph::rendering::layout::{compose, RenderConfig};
use wordglyph::rendering::raster::{CaptureOptions, Rasterizer, ResvgRasterizer};
use wordglyph::rendering::readiness::{await_ready, ReadinessPolicy};

fn golden_path(name: &str) -> PathBuf {
    let mut p = PathBuf::from("tests/goldens/expected");
    p.push(name);
    p
}

fn glyph(fill: &str) -> Vec<u8> {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="30" height="50"><rect x="5" y="5" width="20" height="40" fill="{}"/></svg>"#,
        fill
    )
    .into_bytes()
}

fn decode(png_data: &[u8]) -> (u32, u32, Vec<u8>) {
    let decoder = png::Decoder::new(png_data);
    let mut reader = decoder.read_info().expect("decode");
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf).expect("frame");
    buf.truncate(info.buffer_size());
    (info.width, info.height, buf)
}

fn pixel(buf: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * width + x) * 4) as usize;
    [buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]
}

#[tokio::test]
async fn golden_capture_matches_fixture() {
    let layout = AssetLayout::default();
    let cache: AssetCache = [('K', "#87ceeb"), ('Y', "#ffb6c1")]
        .into_iter()
        .map(|(c, fill)| {
            let path = layout.path_for(c);
            (c, GlyphPayload::from_bytes(&path, &glyph(fill)).unwrap())
        })
        .collect();

    let config = RenderConfig {
        background: "white".parse().unwrap(),
        ..Default::default()
    };
    let tree = compose(&resolve("KY YK", Some(&cache), &layout), &config);
    // every glyph is embedded, so the store is never touched
    let store = DirectorySource::new("/nonexistent");
    let canvas = await_ready(&tree, &store, ReadinessPolicy::Strict, &Immediate)
        .await
        .expect("ready");
    let image = ResvgRasterizer::default()
        .capture(&canvas, &CaptureOptions::from_config(&config))
        .await
        .expect("capture");
    assert_eq!(&image.png[0..8], b"\x89PNG\r\n\x1a\n");

    // 30x50 glyphs, 2px letter gap, 25px word gap, 16px padding, at 2x
    let (w, h, buf) = decode(&image.png);
    assert_eq!((w, h), (362, 164));
    assert_eq!(pixel(&buf, w, 1, 1), [255, 255, 255, 255]);
    // centre of the K slot, then of the Y slot
    assert_eq!(pixel(&buf, w, 62, 82), [0x87, 0xce, 0xeb, 255]);
    assert_eq!(pixel(&buf, w, 126, 82), [0xff, 0xb6, 0xc1, 255]);
    // the letter gap between them stays background
    assert_eq!(pixel(&buf, w, 94, 82), [255, 255, 255, 255]);

    let digest = hex::encode(Sha256::digest(&image.png));
    let expected_path = golden_path("ky-yk.sha256");
    if std::env::var("UPDATE_GOLDENS").is_ok() {
        fs::create_dir_all("tests/goldens/expected").ok();
        fs::write(&expected_path, &digest).expect("write golden");
        println!("Updated golden: {:?}", expected_path);
        return;
    }

    if !expected_path.exists() {
        println!(
            "No golden at {:?}; run with UPDATE_GOLDENS=1 to create it. Skipping.",
            expected_path
        );
        return;
    }

    let exp = fs::read_to_string(&expected_path).expect("unable to read golden");
    assert_eq!(digest, exp.trim());
}
