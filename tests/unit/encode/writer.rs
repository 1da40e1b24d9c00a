use super::*;
use crate::encode::meme::AnimationFrame;
use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, Rgba};
use std::io::Cursor;

fn animation(n: u8, transparent: bool) -> Meme {
    Meme::Animation(Animation {
        width: 4,
        height: 3,
        repeat: Repeat::Infinite,
        frames: (0..n)
            .map(|i| AnimationFrame {
                image: RgbaImage::from_pixel(4, 3, Rgba([i * 60, 0, 0, 255])),
                delay_cs: 5,
                disposal: Disposal::Background,
                transparent,
            })
            .collect(),
    })
}

#[test]
fn flatten_straight_over_black_produces_expected_rgb() {
    let img = RgbaImage::from_pixel(1, 1, Rgba([255, 0, 0, 128]));
    assert_eq!(flatten_to_opaque_rgb8(&img, [0, 0, 0, 255]), vec![128, 0, 0]);
}

#[test]
fn flatten_transparent_takes_background() {
    let img = RgbaImage::from_pixel(2, 1, Rgba([9, 9, 9, 0]));
    assert_eq!(
        flatten_to_opaque_rgb8(&img, [10, 20, 30, 255]),
        vec![10, 20, 30, 10, 20, 30]
    );
}

#[test]
fn still_round_trips_through_png() {
    let mut img = RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 255]));
    img.put_pixel(2, 1, Rgba([200, 100, 50, 128]));
    let meme = Meme::Still(img.clone());
    let bytes = meme.to_bytes(&EncodeOptions::default()).unwrap();
    assert_eq!(&bytes[1..4], b"PNG");
    let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
    assert_eq!(decoded, img);
}

#[test]
fn animation_round_trips_frame_count_and_delay() {
    let bytes = animation(3, false).to_bytes(&EncodeOptions::default()).unwrap();
    assert_eq!(&bytes[..6], b"GIF89a");
    let frames = GifDecoder::new(Cursor::new(bytes))
        .unwrap()
        .into_frames()
        .collect_frames()
        .unwrap();
    assert_eq!(frames.len(), 3);
    for f in &frames {
        assert_eq!(f.buffer().dimensions(), (4, 3));
        let (num, den) = f.delay().numer_denom_ms();
        assert_eq!(num / den, 50);
    }
}

#[test]
fn transparent_frames_keep_alpha() {
    let meme = Meme::Animation(Animation {
        width: 2,
        height: 1,
        repeat: Repeat::Finite(2),
        frames: (0..2)
            .map(|_| AnimationFrame {
                image: RgbaImage::from_fn(2, 1, |x, _| {
                    if x == 0 {
                        Rgba([255, 0, 0, 255])
                    } else {
                        Rgba([0, 0, 0, 0])
                    }
                }),
                delay_cs: 0,
                disposal: Disposal::Keep,
                transparent: true,
            })
            .collect(),
    });
    let bytes = meme.to_bytes(&EncodeOptions::default()).unwrap();
    let first = GifDecoder::new(Cursor::new(bytes))
        .unwrap()
        .into_frames()
        .next()
        .unwrap()
        .unwrap();
    assert_eq!(first.buffer().get_pixel(1, 0).0[3], 0);
    assert_eq!(first.buffer().get_pixel(0, 0).0[3], 255);
}

#[test]
fn still_can_be_written_as_gif_but_animation_not_as_png() {
    let still = Meme::Still(RgbaImage::from_pixel(2, 2, Rgba([0, 255, 0, 255])));
    let mut out = Vec::new();
    encode_meme(&still, MemeFormat::Gif, &mut out, &EncodeOptions::default()).unwrap();
    assert_eq!(&out[..3], b"GIF");

    let err = encode_meme(
        &animation(2, false),
        MemeFormat::Png,
        &mut Vec::new(),
        &EncodeOptions::default(),
    )
    .unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Encode));
}

#[test]
fn oversized_or_mismatched_gif_canvas_is_rejected() {
    let Meme::Animation(mut anim) = animation(2, false) else {
        unreachable!()
    };
    anim.frames[1].image = RgbaImage::new(5, 3);
    assert!(Meme::Animation(anim).to_bytes(&EncodeOptions::default()).is_err());
    assert!(gif_dimensions(70_000, 1).is_err());
    assert!(gif_dimensions(0, 1).is_err());
}

#[test]
fn bad_quantizer_speed_is_rejected() {
    let opts = EncodeOptions {
        gif_speed: 31,
        ..EncodeOptions::default()
    };
    assert!(animation(2, false).to_bytes(&opts).is_err());
}

#[test]
fn save_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let meme = animation(2, false);
    let path = dir.path().join("nested").join(format!("out.{}", meme.extension()));
    meme.save(&path, &EncodeOptions::default()).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..6], b"GIF89a");
}

#[test]
fn unwritable_path_is_an_encode_error() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("taken");
    std::fs::write(&blocker, b"file, not a directory").unwrap();
    let meme = Meme::Still(RgbaImage::new(1, 1));
    let err = meme
        .save(blocker.join("out.png"), &EncodeOptions::default())
        .unwrap_err();
    assert!(matches!(err, LoopsmithError::Upstream { .. }));
    assert_eq!(err.stage(), Some(Stage::Encode));
}
